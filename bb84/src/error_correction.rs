//! Information reconciliation.
//!
//! Two families are provided. Syndrome decoding with a fixed parity-check
//! matrix is one-way: Alice publishes `H·x_A` block by block and Bob corrects
//! with the coset leader of the syndrome sum. Cascade is interactive: both
//! sides compare block parities and binary-search the odd ones.

use std::collections::HashMap;

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::Bb84Error;

/// Widest code for which the coset-leader table is enumerated.
const MAX_CODE_LEN: usize = 16;

/// Binary parity-check matrix with a syndrome decoding table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParityCheckMatrix {
    rows: Vec<Vec<u8>>,
    cols: usize,
    leaders: HashMap<Vec<u8>, Vec<u8>>,
}

impl ParityCheckMatrix {
    pub fn new(rows: Vec<Vec<u8>>) -> Result<Self, Bb84Error> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.is_empty() || cols == 0 {
            return Err(Bb84Error::InvalidCode("matrix is empty".into()));
        }
        if cols > MAX_CODE_LEN {
            return Err(Bb84Error::InvalidCode(format!(
                "{cols} columns, at most {MAX_CODE_LEN} supported"
            )));
        }
        if rows.iter().any(|r| r.len() != cols) {
            return Err(Bb84Error::InvalidCode("rows differ in length".into()));
        }
        if rows.iter().flatten().any(|&b| b > 1) {
            return Err(Bb84Error::InvalidCode("entries must be 0 or 1".into()));
        }

        let mut matrix = Self {
            rows,
            cols,
            leaders: HashMap::new(),
        };
        matrix.leaders = matrix.coset_leaders();
        Ok(matrix)
    }

    /// The 2×3 matrix `[[1,1,0],[0,1,1]]`: syndrome `01 → 001`, `10 → 100`,
    /// `11 → 010`.
    pub fn three_bit() -> Self {
        Self::from_rows(vec![vec![1, 1, 0], vec![0, 1, 1]])
    }

    /// Hamming(7,4) check matrix; column `j` is `j + 1` in binary.
    pub fn hamming74() -> Self {
        Self::from_rows(vec![
            vec![0, 0, 0, 1, 1, 1, 1],
            vec![0, 1, 1, 0, 0, 1, 1],
            vec![1, 0, 1, 0, 1, 0, 1],
        ])
    }

    fn from_rows(rows: Vec<Vec<u8>>) -> Self {
        let cols = rows[0].len();
        let mut matrix = Self {
            rows,
            cols,
            leaders: HashMap::new(),
        };
        matrix.leaders = matrix.coset_leaders();
        matrix
    }

    /// Lowest-weight error pattern for every reachable syndrome.
    fn coset_leaders(&self) -> HashMap<Vec<u8>, Vec<u8>> {
        let mut patterns: Vec<u32> = (0..1u32 << self.cols).collect();
        patterns.sort_by_key(|p| (p.count_ones(), *p));

        let mut leaders = HashMap::new();
        for mask in patterns {
            let pattern: Vec<u8> = (0..self.cols)
                .map(|j| ((mask >> (self.cols - 1 - j)) & 1) as u8)
                .collect();
            leaders
                .entry(self.syndrome_unchecked(&pattern))
                .or_insert(pattern);
        }
        leaders
    }

    pub fn block_len(&self) -> usize {
        self.cols
    }

    pub fn syndrome_len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    fn syndrome_unchecked(&self, bits: &[u8]) -> Vec<u8> {
        self.rows
            .iter()
            .map(|row| row.iter().zip(bits).fold(0, |acc, (h, x)| acc ^ (h & x)))
            .collect()
    }

    /// `H·x` over GF(2).
    pub fn syndrome(&self, bits: &[u8]) -> Result<Vec<u8>, Bb84Error> {
        if bits.len() != self.cols {
            return Err(Bb84Error::InputLength {
                expected: self.cols,
                got: bits.len(),
            });
        }
        Ok(self.syndrome_unchecked(bits))
    }

    pub fn error_estimate(&self, syndrome: &[u8]) -> Option<&[u8]> {
        self.leaders.get(syndrome).map(Vec::as_slice)
    }
}

/// Hamming(7,4): four data bits, three parity bits at positions 1, 2 and 4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hamming74 {
    check: ParityCheckMatrix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedBlock {
    pub data: [u8; 4],
    /// Zero-based position of the flipped bit, if one was corrected.
    pub corrected: Option<usize>,
}

impl Default for Hamming74 {
    fn default() -> Self {
        Self::new()
    }
}

impl Hamming74 {
    pub fn new() -> Self {
        Self {
            check: ParityCheckMatrix::hamming74(),
        }
    }

    pub fn check_matrix(&self) -> &ParityCheckMatrix {
        &self.check
    }

    pub fn encode(&self, data: [u8; 4]) -> [u8; 7] {
        let [d1, d2, d3, d4] = data.map(|b| b & 1);
        let p1 = d1 ^ d2 ^ d4;
        let p2 = d1 ^ d3 ^ d4;
        let p4 = d2 ^ d3 ^ d4;
        [p1, p2, d1, p4, d2, d3, d4]
    }

    pub fn syndrome(&self, word: &[u8; 7]) -> [u8; 3] {
        let s = self.check.syndrome_unchecked(word);
        [s[0], s[1], s[2]]
    }

    pub fn decode(&self, word: [u8; 7]) -> DecodedBlock {
        let mut word = word.map(|b| b & 1);
        let [s4, s2, s1] = self.syndrome(&word);
        let position = usize::from(s4) * 4 + usize::from(s2) * 2 + usize::from(s1);
        let corrected = (position != 0).then(|| {
            word[position - 1] ^= 1;
            position - 1
        });
        DecodedBlock {
            data: [word[2], word[4], word[5], word[6]],
            corrected,
        }
    }
}

/// Outcome of a reconciliation run on Bob's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub corrected: Vec<u8>,
    /// Positions Bob flipped, in the order he flipped them.
    pub flipped: Vec<usize>,
    /// Parity or syndrome bits disclosed on the public channel.
    pub leaked_bits: usize,
}

fn check_lengths(alice: &[u8], bob: &[u8]) -> Result<(), Bb84Error> {
    if alice.len() != bob.len() {
        return Err(Bb84Error::LengthMismatch {
            alice: alice.len(),
            bob: bob.len(),
        });
    }
    Ok(())
}

/// One-way syndrome reconciliation. A trailing partial block is zero-padded
/// on both sides.
pub fn reconcile(alice: &[u8], bob: &[u8], code: &ParityCheckMatrix) -> Result<Reconciled, Bb84Error> {
    check_lengths(alice, bob)?;
    let k = code.block_len();
    let mut corrected = bob.to_vec();
    let mut flipped = Vec::new();
    let mut leaked_bits = 0;

    for start in (0..alice.len()).step_by(k) {
        let end = (start + k).min(alice.len());
        let mut alice_block = alice[start..end].to_vec();
        let mut bob_block = corrected[start..end].to_vec();
        alice_block.resize(k, 0);
        bob_block.resize(k, 0);

        let alice_syndrome = code.syndrome(&alice_block)?;
        let bob_syndrome = code.syndrome(&bob_block)?;
        leaked_bits += alice_syndrome.len();

        let sum: Vec<u8> = alice_syndrome
            .iter()
            .zip(&bob_syndrome)
            .map(|(a, b)| a ^ b)
            .collect();
        if let Some(estimate) = code.error_estimate(&sum) {
            for (j, _) in estimate.iter().enumerate().filter(|(_, &e)| e == 1) {
                if start + j < end {
                    corrected[start + j] ^= 1;
                    flipped.push(start + j);
                }
            }
        }
    }

    debug!(
        "syndrome reconciliation over {} bits: {} flips, {} bits leaked",
        alice.len(),
        flipped.len(),
        leaked_bits
    );
    Ok(Reconciled {
        corrected,
        flipped,
        leaked_bits,
    })
}

fn determine_optimal_block_size(length: usize) -> usize {
    std::cmp::max(4, length / 8)
}

fn block_parity(bits: &[u8], positions: &[usize]) -> u8 {
    positions.iter().fold(0, |acc, &i| acc ^ bits[i])
}

/// Halves an odd-parity block until the flipped bit is isolated.
fn binary_search_error(
    alice: &[u8],
    bob: &[u8],
    mut positions: &[usize],
    leaked_bits: &mut usize,
) -> usize {
    while positions.len() > 1 {
        let (left, right) = positions.split_at(positions.len() / 2);
        *leaked_bits += 1;
        positions = if block_parity(alice, left) != block_parity(bob, left) {
            left
        } else {
            right
        };
    }
    positions[0]
}

/// Cascade-style interactive reconciliation. Pass 0 uses the natural order;
/// later passes shuffle positions with a permutation both sides derive from
/// `seed`. The block size doubles every pass until one block spans the key.
pub fn cascade_correction(
    alice: &[u8],
    bob: &[u8],
    passes: usize,
    seed: u64,
) -> Result<Reconciled, Bb84Error> {
    check_lengths(alice, bob)?;
    let mut corrected = bob.to_vec();
    let mut flipped = Vec::new();
    let mut leaked_bits = 0;
    if alice.is_empty() {
        return Ok(Reconciled {
            corrected,
            flipped,
            leaked_bits,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut block_size = determine_optimal_block_size(alice.len());
    let mut order: Vec<usize> = (0..alice.len()).collect();

    for pass in 0..passes {
        if pass > 0 {
            order.shuffle(&mut rng);
        }
        for block in order.chunks(block_size) {
            leaked_bits += 1;
            if block_parity(alice, block) != block_parity(&corrected, block) {
                let position = binary_search_error(alice, &corrected, block, &mut leaked_bits);
                corrected[position] ^= 1;
                flipped.push(position);
            }
        }
        debug!(
            "cascade pass {} (block size {}): {} flips so far",
            pass,
            block_size,
            flipped.len()
        );
        block_size = block_size.saturating_mul(2).min(alice.len());
    }

    Ok(Reconciled {
        corrected,
        flipped,
        leaked_bits,
    })
}
