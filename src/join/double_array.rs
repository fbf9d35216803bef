//! Grouped join output
//!
//! A `DoubleArray` is a flat values buffer plus a table of groups. Erasing a
//! group only sets its tombstone; values stay in place and iteration skips
//! the group.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Group {
    offset: usize,
    count: u32,
    erased: bool,
}

#[derive(Debug, Clone)]
pub struct DoubleArray<V> {
    values: Vec<V>,
    groups: Vec<Group>,
}

impl<V> Default for DoubleArray<V> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            groups: Vec::new(),
        }
    }
}

impl<V: Copy + Default> DoubleArray<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group holding a copy of `values`.
    pub fn push_group(&mut self, values: &[V]) -> usize {
        let offset = self.values.len();
        self.values.extend_from_slice(values);
        self.groups.push(Group {
            offset,
            count: values.len() as u32,
            erased: false,
        });
        self.groups.len() - 1
    }

    /// Reserve a group of `count` default values; returns its offset in the
    /// values buffer so the caller can scatter into it.
    pub(crate) fn alloc_group(&mut self, count: usize) -> usize {
        let offset = self.values.len();
        self.values.resize(offset + count, V::default());
        self.groups.push(Group {
            offset,
            count: count as u32,
            erased: false,
        });
        offset
    }

    pub(crate) fn values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    /// Append every group of `other`, keeping tombstones.
    pub fn append(&mut self, other: DoubleArray<V>) {
        let base = self.values.len();
        self.values.extend(other.values);
        self.groups.extend(other.groups.into_iter().map(|g| Group {
            offset: g.offset + base,
            ..g
        }));
    }
}

impl<V> DoubleArray<V> {
    /// Number of groups, erased ones included.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of live groups.
    pub fn len(&self) -> usize {
        self.groups.iter().filter(|g| !g.erased).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values of group `i`, or None if it was erased.
    pub fn get(&self, i: usize) -> Option<&[V]> {
        let g = self.groups.get(i)?;
        if g.erased {
            return None;
        }
        Some(&self.values[g.offset..g.offset + g.count as usize])
    }

    pub fn erase(&mut self, i: usize) {
        if let Some(g) = self.groups.get_mut(i) {
            g.erased = true;
        }
    }

    pub fn is_erased(&self, i: usize) -> bool {
        self.groups.get(i).map(|g| g.erased).unwrap_or(true)
    }

    /// Live groups with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[V])> + '_ {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, g)| !g.erased)
            .map(move |(i, g)| (i, &self.values[g.offset..g.offset + g.count as usize]))
    }

    /// Values held by live groups.
    pub fn total(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| !g.erased)
            .map(|g| g.count as usize)
            .sum()
    }

    /// Size of the values buffer; equals the sum of all group counts.
    pub fn buffer_len(&self) -> usize {
        self.values.len()
    }

    /// Count of group `i` regardless of tombstone.
    pub fn raw_count(&self, i: usize) -> usize {
        self.groups.get(i).map(|g| g.count as usize).unwrap_or(0)
    }
}
