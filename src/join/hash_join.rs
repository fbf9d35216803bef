//! Partitioned hash join
//!
//! Inner equi-join of two relations on their keys. Small inputs (or inputs
//! whose remaining key width is short) are joined through an open-addressed
//! hash table or a direct-address table; larger ones are radix clustered on
//! successive key-bit groups until the pieces are small enough. The output
//! is a pair of `DoubleArray`s whose group `i` on either side share one key.
//! Group order follows table bucket order.

use log::trace;

use crate::error::{try_with_capacity, Result};
use crate::join::double_array::DoubleArray;
use crate::join::radix::{cluster_start, radix_cluster, radix_cluster_parallel};
use crate::join::relation::{check_key_widths, ExtractBits, JoinRecord, Relation};

/// Tuning knobs for `hash_join`.
#[derive(Debug, Clone, Copy)]
pub struct JoinConfig {
    /// Below this many R entries, join directly instead of clustering.
    pub split_size: usize,
    /// Below this many remaining key bits, join directly.
    pub split_key_len: u32,
    /// Key bits consumed per clustering pass.
    pub radix_bits: u32,
    /// Hash table size factor relative to R.
    pub ht_factor: f64,
    /// Build the table over the smaller relation.
    pub swap: bool,
    /// Slices used by the first (parallel) clustering pass.
    pub threads: usize,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            split_size: 100_000,
            split_key_len: 17,
            radix_bits: 8,
            ht_factor: 1.3,
            swap: true,
            threads: 1,
        }
    }
}

/// Join output: query-side and reference-side groups, index aligned.
pub type JoinResult<V> = (DoubleArray<V>, DoubleArray<V>);

/// Join `r` with `s`.
pub fn hash_join<T: JoinRecord>(
    r: Relation<'_, T>,
    s: Relation<'_, T>,
    cfg: &JoinConfig,
) -> Result<JoinResult<T::Value>> {
    let total_bits = check_key_widths(&r, &s)?;
    let swap = cfg.swap && r.len() > s.len();
    let (r, s) = if swap { (s, r) } else { (r, s) };

    let mut out_r = DoubleArray::new();
    let mut out_s = DoubleArray::new();
    if !r.is_empty() && !s.is_empty() {
        Joiner::new(r.data(), s.data(), total_bits, cfg)?.run(&mut out_r, &mut out_s);
    }

    if swap {
        Ok((out_s, out_r))
    } else {
        Ok((out_r, out_s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Input,
    Scratch(usize),
}

/// One pending sub-join over matching ranges of R and S.
#[derive(Debug, Clone)]
struct Task {
    r: std::ops::Range<usize>,
    s: std::ops::Range<usize>,
    shift: u32,
    source: Source,
}

struct Joiner<'a, T> {
    input_r: &'a [T],
    input_s: &'a [T],
    scratch_r: [Vec<T>; 2],
    scratch_s: [Vec<T>; 2],
    total_bits: u32,
    cfg: &'a JoinConfig,
}

impl<'a, T: JoinRecord> Joiner<'a, T> {
    fn new(input_r: &'a [T], input_s: &'a [T], total_bits: u32, cfg: &'a JoinConfig) -> Result<Self> {
        let needs_split =
            input_r.len() >= cfg.split_size && total_bits >= cfg.split_key_len && total_bits > 0;
        let alloc = |n: usize, what| -> Result<[Vec<T>; 2]> {
            if !needs_split {
                return Ok([Vec::new(), Vec::new()]);
            }
            let mut a = try_with_capacity(n, what)?;
            a.resize(n, T::default());
            let mut b = try_with_capacity(n, what)?;
            b.resize(n, T::default());
            Ok([a, b])
        };
        Ok(Self {
            input_r,
            input_s,
            scratch_r: alloc(input_r.len(), "join buffer (R)")?,
            scratch_s: alloc(input_s.len(), "join buffer (S)")?,
            total_bits,
            cfg,
        })
    }

    fn run(&mut self, out_r: &mut DoubleArray<T::Value>, out_s: &mut DoubleArray<T::Value>) {
        let mut stack = vec![Task {
            r: 0..self.input_r.len(),
            s: 0..self.input_s.len(),
            shift: 0,
            source: Source::Input,
        }];

        while let Some(task) = stack.pop() {
            if task.r.is_empty() || task.s.is_empty() {
                continue;
            }
            let key_bits = self.total_bits.saturating_sub(task.shift);
            if task.r.len() < self.cfg.split_size || key_bits < self.cfg.split_key_len || key_bits == 0 {
                let (r, s) = (self.slice_r(&task), self.slice_s(&task));
                if ht_size(r.len(), self.cfg.ht_factor) < key_space(key_bits) {
                    hash_table_join(r, s, task.shift, self.cfg.ht_factor, out_r, out_s);
                } else {
                    table_join(r, s, key_bits, task.shift, out_r, out_s);
                }
                continue;
            }

            let bits = self.cfg.radix_bits.min(key_bits).max(1);
            let dst = match task.source {
                Source::Input => 0,
                Source::Scratch(i) => 1 - i,
            };
            let parallel = task.source == Source::Input && self.cfg.threads > 1;
            let ends_r = self.cluster_r(&task, dst, bits, parallel);
            let ends_s = self.cluster_s(&task, dst, bits, parallel);
            trace!(
                "radix pass shift={} bits={} r={} s={}",
                task.shift,
                bits,
                task.r.len(),
                task.s.len()
            );

            for c in (0..ends_r.len()).rev() {
                stack.push(Task {
                    r: task.r.start + cluster_start(&ends_r, c)..task.r.start + ends_r[c],
                    s: task.s.start + cluster_start(&ends_s, c)..task.s.start + ends_s[c],
                    shift: task.shift + bits,
                    source: Source::Scratch(dst),
                });
            }
        }
    }

    fn slice_r(&self, t: &Task) -> &[T] {
        match t.source {
            Source::Input => &self.input_r[t.r.clone()],
            Source::Scratch(i) => &self.scratch_r[i][t.r.clone()],
        }
    }

    fn slice_s(&self, t: &Task) -> &[T] {
        match t.source {
            Source::Input => &self.input_s[t.s.clone()],
            Source::Scratch(i) => &self.scratch_s[i][t.s.clone()],
        }
    }

    fn cluster_r(&mut self, t: &Task, dst: usize, bits: u32, parallel: bool) -> Vec<usize> {
        let parts = parallel.then_some(self.cfg.threads);
        cluster_into(self.input_r, &mut self.scratch_r, t.source, t.r.clone(), dst, t.shift, bits, parts)
    }

    fn cluster_s(&mut self, t: &Task, dst: usize, bits: u32, parallel: bool) -> Vec<usize> {
        let parts = parallel.then_some(self.cfg.threads);
        cluster_into(self.input_s, &mut self.scratch_s, t.source, t.s.clone(), dst, t.shift, bits, parts)
    }
}

#[allow(clippy::too_many_arguments)]
fn cluster_into<T: JoinRecord>(
    input: &[T],
    scratch: &mut [Vec<T>; 2],
    source: Source,
    range: std::ops::Range<usize>,
    dst: usize,
    shift: u32,
    bits: u32,
    parts: Option<usize>,
) -> Vec<usize> {
    let [a, b] = scratch;
    let (src, out): (&[T], &mut [T]) = match (source, dst) {
        (Source::Input, 0) => (&input[range.clone()], &mut a[range]),
        (Source::Input, _) => (&input[range.clone()], &mut b[range]),
        (Source::Scratch(_), 0) => (&b[range.clone()], &mut a[range]),
        (Source::Scratch(_), _) => (&a[range.clone()], &mut b[range]),
    };
    match parts {
        Some(p) => radix_cluster_parallel(src, shift, bits, out, p),
        None => radix_cluster(src, shift, bits, out),
    }
}

#[inline]
fn ht_size(n: usize, factor: f64) -> u64 {
    ((n as f64 * factor).ceil() as u64).max(1).next_power_of_two()
}

#[inline]
fn key_space(bits: u32) -> u64 {
    1u64.checked_shl(bits).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    key: u64,
    r: u32,
    s: u32,
    used: bool,
}

/// Hash-table join: open addressing with linear probing over R's keys,
/// hashed by the key bits above `shift`.
pub fn hash_table_join<T: JoinRecord>(
    r: &[T],
    s: &[T],
    shift: u32,
    ht_factor: f64,
    out_r: &mut DoubleArray<T::Value>,
    out_s: &mut DoubleArray<T::Value>,
) {
    let n = ht_size(r.len(), ht_factor);
    let hash = ExtractBits::new(n, shift);
    let mask = (n - 1) as usize;
    let mut table = vec![Slot::default(); n as usize];

    let find = |table: &[Slot], key: u64| -> (usize, bool) {
        let mut i = hash.apply(key);
        loop {
            let slot = &table[i];
            if !slot.used {
                return (i, false);
            }
            if slot.key == key {
                return (i, true);
            }
            i = (i + 1) & mask;
        }
    };

    let mut r_slot = Vec::with_capacity(r.len());
    for e in r {
        let (i, found) = find(&table, e.key());
        if !found {
            table[i] = Slot {
                key: e.key(),
                r: 0,
                s: 0,
                used: true,
            };
        }
        table[i].r += 1;
        r_slot.push(i as u32);
    }

    let mut s_hits: Vec<(u32, T::Value)> = Vec::with_capacity(s.len().min(r.len() * 4));
    for e in s {
        let (i, found) = find(&table, e.key());
        if found {
            table[i].s += 1;
            s_hits.push((i as u32, e.value()));
        }
    }

    // Assign output offsets in bucket order; slot counters become write cursors.
    let mut cursor: Vec<(usize, usize)> = vec![(0, 0); table.len()];
    for (i, slot) in table.iter().enumerate() {
        if slot.s > 0 {
            cursor[i] = (
                out_r.alloc_group(slot.r as usize),
                out_s.alloc_group(slot.s as usize),
            );
        }
    }

    let values_r = out_r.values_mut();
    for (e, &i) in r.iter().zip(&r_slot) {
        let i = i as usize;
        if table[i].s > 0 {
            values_r[cursor[i].0] = e.value();
            cursor[i].0 += 1;
        }
    }
    let values_s = out_s.values_mut();
    for (i, v) in s_hits {
        let i = i as usize;
        values_s[cursor[i].1] = v;
        cursor[i].1 += 1;
    }
}

/// Direct-address join over the `key_bits` key bits above `shift`.
pub fn table_join<T: JoinRecord>(
    r: &[T],
    s: &[T],
    key_bits: u32,
    shift: u32,
    out_r: &mut DoubleArray<T::Value>,
    out_s: &mut DoubleArray<T::Value>,
) {
    let keys = key_space(key_bits) as usize;
    let key = ExtractBits::new(keys as u64, shift);
    let mut counts = vec![(0u32, 0u32); keys];

    for e in r {
        counts[key.apply(e.key())].0 += 1;
    }
    let mut s_hits: Vec<(usize, T::Value)> = Vec::with_capacity(s.len().min(r.len() * 4));
    for e in s {
        let k = key.apply(e.key());
        if counts[k].0 > 0 {
            counts[k].1 += 1;
            s_hits.push((k, e.value()));
        }
    }

    let mut cursor: Vec<(usize, usize)> = vec![(0, 0); keys];
    for (k, &(nr, ns)) in counts.iter().enumerate() {
        if ns > 0 {
            cursor[k] = (out_r.alloc_group(nr as usize), out_s.alloc_group(ns as usize));
        }
    }

    let values_r = out_r.values_mut();
    for e in r {
        let k = key.apply(e.key());
        if counts[k].1 > 0 {
            values_r[cursor[k].0] = e.value();
            cursor[k].0 += 1;
        }
    }
    let values_s = out_s.values_mut();
    for (k, v) in s_hits {
        values_s[cursor[k].1] = v;
        cursor[k].1 += 1;
    }
}
