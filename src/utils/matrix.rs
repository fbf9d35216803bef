//! Residue alphabet and substitution scores
//!
//! Letters are stored in NCBIstdaa encoding (0-27). Code 0 ('-') doubles as
//! the record delimiter inside concatenated sequence buffers.
//!
//! The core only needs `ScoreMatrix`; the BLOSUM62 table and the identity
//! scorer are the two implementations carried here.

/// Size of the NCBIstdaa alphabet
pub const ALPHABET_SIZE: usize = 28;

/// Size of the packed BLOSUM62 table (25x25)
pub const BLOSUM62_SIZE: usize = 25;

/// Score against the delimiter / sentinel letter
pub const DEFSCORE: i32 = -4;

/// Record delimiter written between sequences of a collection.
pub const DELIMITER: u8 = ncbistdaa::GAP;

/// Number of standard amino acids
pub const TRUE_AA: usize = 20;

/// NCBIstdaa letter codes
///   '-','A','B','C','D','E','F','G','H','I','K','L','M',
///   'N','P','Q','R','S','T','V','W','X','Y','Z','U','*','O','J'
pub mod ncbistdaa {
    pub const GAP: u8 = 0;
    pub const A: u8 = 1;
    pub const B: u8 = 2;
    pub const C: u8 = 3;
    pub const D: u8 = 4;
    pub const E: u8 = 5;
    pub const F: u8 = 6;
    pub const G: u8 = 7;
    pub const H: u8 = 8;
    pub const I: u8 = 9;
    pub const K: u8 = 10;
    pub const L: u8 = 11;
    pub const M: u8 = 12;
    pub const N: u8 = 13;
    pub const P: u8 = 14;
    pub const Q: u8 = 15;
    pub const R: u8 = 16;
    pub const S: u8 = 17;
    pub const T: u8 = 18;
    pub const V: u8 = 19;
    pub const W: u8 = 20;
    pub const X: u8 = 21;    // Unknown
    pub const Y: u8 = 22;
    pub const Z: u8 = 23;
    pub const U: u8 = 24;
    pub const STOP: u8 = 25;
    pub const O: u8 = 26;
    pub const J: u8 = 27;
}

const NCBISTDAA_CHARS: &[u8; ALPHABET_SIZE] = b"-ABCDEFGHIKLMNPQRSTVWXYZU*OJ";

/// Standard amino acids in NCBIstdaa encoding, ordered by code.
pub const STANDARD_AA: [u8; TRUE_AA] = [
    ncbistdaa::A, ncbistdaa::C, ncbistdaa::D, ncbistdaa::E, ncbistdaa::F,
    ncbistdaa::G, ncbistdaa::H, ncbistdaa::I, ncbistdaa::K, ncbistdaa::L,
    ncbistdaa::M, ncbistdaa::N, ncbistdaa::P, ncbistdaa::Q, ncbistdaa::R,
    ncbistdaa::S, ncbistdaa::T, ncbistdaa::V, ncbistdaa::W, ncbistdaa::Y,
];

/// True for the 20 standard amino acids; ambiguity codes, stop and the
/// delimiter are degenerate and never seed.
#[inline(always)]
pub fn is_standard(letter: u8) -> bool {
    matches!(letter, 1 | 3..=20 | 22)
}

/// Convert an ASCII residue (either case) to NCBIstdaa. Unknown characters,
/// including the gap character `-`, become X so text never yields the
/// record delimiter.
#[inline]
pub fn aa_char_to_ncbistdaa(aa: u8) -> u8 {
    const TABLE: [u8; 128] = [
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 25, 0, 0, 0, 0, 0, // '*' = 25
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 27, 10, 11, 12, 13, 26,
        // A   B   C   D   E   F   G   H   I   J   K   L   M   N   O
        14, 15, 16, 17, 18, 24, 19, 20, 21, 22, 23, 0, 0, 0, 0, 0,
        // P   Q   R   S   T   U   V   W   X   Y   Z
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    ];
    let upper = aa.to_ascii_uppercase();
    match TABLE.get(upper as usize) {
        Some(&0) | None => ncbistdaa::X,
        Some(&code) => code,
    }
}

#[inline]
pub fn ncbistdaa_to_char(letter: u8) -> char {
    NCBISTDAA_CHARS
        .get(letter as usize)
        .map(|&c| c as char)
        .unwrap_or('X')
}

/// Encode an ASCII protein string.
pub fn encode_protein(s: &[u8]) -> Vec<u8> {
    s.iter().map(|&c| aa_char_to_ncbistdaa(c)).collect()
}

/// Convert NCBIstdaa index (0-27) to BLOSUM62 matrix index (0-24).
#[inline(always)]
fn ncbistdaa_to_blosum62(ncbi: u8) -> u8 {
    const TABLE: [u8; 28] = [
        23, // 0: '-' (gap) -> X
        0,  // 1: A -> 0
        20, // 2: B -> 20
        4,  // 3: C -> 4
        3,  // 4: D -> 3
        6,  // 5: E -> 6
        13, // 6: F -> 13
        7,  // 7: G -> 7
        8,  // 8: H -> 8
        9,  // 9: I -> 9
        11, // 10: K -> 11
        10, // 11: L -> 10
        12, // 12: M -> 12
        2,  // 13: N -> 2
        14, // 14: P -> 14
        5,  // 15: Q -> 5
        1,  // 16: R -> 1
        15, // 17: S -> 15
        16, // 18: T -> 16
        19, // 19: V -> 19
        17, // 20: W -> 17
        23, // 21: X -> 23
        18, // 22: Y -> 18
        22, // 23: Z -> 22
        23, // 24: U -> X
        24, // 25: '*' -> 24
        23, // 26: O -> X
        21, // 27: J -> 21
    ];
    if (ncbi as usize) < ALPHABET_SIZE {
        TABLE[ncbi as usize]
    } else {
        23
    }
}

/// BLOSUM62 in packed order ARNDCQEGHILKMFPSTWYVBJZX*
static BLOSUM62_PACKED: [i8; BLOSUM62_SIZE * BLOSUM62_SIZE] = [
    //       A,  R,  N,  D,  C,  Q,  E,  G,  H,  I,  L,  K,  M,  F,  P,  S,  T,  W,  Y,  V,  B,  J,  Z,  X,  *
    /*A*/    4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0, -2, -1, -1, -1, -4,
    /*R*/   -1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3, -1, -2,  0, -1, -4,
    /*N*/   -2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3,  4, -3,  0, -1, -4,
    /*D*/   -2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3,  4, -3,  1, -1, -4,
    /*C*/    0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1, -3, -1, -3, -1, -4,
    /*Q*/   -1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2,  0, -2,  4, -1, -4,
    /*E*/   -1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2,  1, -3,  4, -1, -4,
    /*G*/    0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3, -1, -4, -2, -1, -4,
    /*H*/   -2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3,  0, -3,  0, -1, -4,
    /*I*/   -1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3, -3,  3, -3, -1, -4,
    /*L*/   -1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1, -4,  3, -3, -1, -4,
    /*K*/   -1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2,  0, -3,  1, -1, -4,
    /*M*/   -1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1, -3,  2, -1, -1, -4,
    /*F*/   -2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1, -3,  0, -3, -1, -4,
    /*P*/   -1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2, -2, -3, -1, -1, -4,
    /*S*/    1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2,  0, -2,  0, -1, -4,
    /*T*/    0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0, -1, -1, -1, -1, -4,
    /*W*/   -3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3, -4, -2, -2, -1, -4,
    /*Y*/   -2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1, -3, -1, -2, -1, -4,
    /*V*/    0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4, -3,  2, -2, -1, -4,
    /*B*/   -2, -1,  4,  4, -3,  0,  1, -1,  0, -3, -4,  0, -3, -3, -2,  0, -1, -4, -3, -3,  4, -3,  0, -1, -4,
    /*J*/   -1, -2, -3, -3, -1, -2, -3, -4, -3,  3,  3, -3,  2,  0, -3, -2, -1, -2, -1,  2, -3,  3, -3, -1, -4,
    /*Z*/   -1,  0,  0,  1, -3,  4,  4, -2,  0, -3, -3,  1, -1, -3, -1,  0, -1, -2, -2, -2,  0, -3,  4, -1, -4,
    /*X*/   -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -4,
    /***/   -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4,  1,
];

/// Symmetric substitution scores over NCBIstdaa letters.
pub trait ScoreMatrix: Sync {
    fn score(&self, a: u8, b: u8) -> i32;

    /// Largest entry of the matrix.
    fn max_score(&self) -> i32;
}

/// BLOSUM62, expanded to a full 28x28 table indexed by NCBIstdaa codes.
#[derive(Clone)]
pub struct Blosum62 {
    table: [[i8; ALPHABET_SIZE]; ALPHABET_SIZE],
}

impl Blosum62 {
    pub fn new() -> Self {
        let mut table = [[0i8; ALPHABET_SIZE]; ALPHABET_SIZE];
        for (a, row) in table.iter_mut().enumerate() {
            for (b, cell) in row.iter_mut().enumerate() {
                *cell = if a == DELIMITER as usize || b == DELIMITER as usize {
                    DEFSCORE as i8
                } else {
                    let pa = ncbistdaa_to_blosum62(a as u8) as usize;
                    let pb = ncbistdaa_to_blosum62(b as u8) as usize;
                    BLOSUM62_PACKED[pa * BLOSUM62_SIZE + pb]
                };
            }
        }
        Self { table }
    }
}

impl Default for Blosum62 {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreMatrix for Blosum62 {
    #[inline(always)]
    fn score(&self, a: u8, b: u8) -> i32 {
        let a = (a as usize).min(ALPHABET_SIZE - 1);
        let b = (b as usize).min(ALPHABET_SIZE - 1);
        self.table[a][b] as i32
    }

    fn max_score(&self) -> i32 {
        11
    }
}

/// Match/mismatch scorer; the delimiter always scores `DEFSCORE`.
#[derive(Debug, Clone, Copy)]
pub struct IdentityScores {
    pub matched: i32,
    pub mismatched: i32,
}

impl IdentityScores {
    pub fn new(matched: i32, mismatched: i32) -> Self {
        Self { matched, mismatched }
    }
}

impl ScoreMatrix for IdentityScores {
    #[inline(always)]
    fn score(&self, a: u8, b: u8) -> i32 {
        if a == DELIMITER || b == DELIMITER {
            DEFSCORE.min(self.mismatched)
        } else if a == b {
            self.matched
        } else {
            self.mismatched
        }
    }

    fn max_score(&self) -> i32 {
        self.matched
    }
}
