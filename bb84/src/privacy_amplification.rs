//! Privacy amplification with universal hash families, plus SHA-256 key
//! confirmation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ring::digest::{Context, SHA256};

use crate::bits::bools_to_bytes;
use crate::error::Bb84Error;

/// A hash family member, fixed by a seed both parties share.
pub trait UniversalHash {
    fn input_len(&self) -> usize;
    fn output_len(&self) -> usize;
    fn hash(&self, input: &[u8]) -> Result<Vec<u8>, Bb84Error>;

    fn check_input(&self, input: &[u8]) -> Result<(), Bb84Error> {
        if input.len() != self.input_len() {
            return Err(Bb84Error::InputLength {
                expected: self.input_len(),
                got: input.len(),
            });
        }
        Ok(())
    }
}

fn check_shape(input_len: usize, output_len: usize) -> Result<(), Bb84Error> {
    if input_len == 0 || output_len == 0 {
        return Err(Bb84Error::InvalidParameter(format!(
            "hash shape {input_len} -> {output_len} must be non-empty"
        )));
    }
    Ok(())
}

fn random_bits(rng: &mut StdRng, n: usize) -> Vec<u8> {
    (0..n).map(|_| rng.gen_range(0..2)).collect()
}

/// One random `input_len × m` matrix per output bit, `m = ⌊output_len · load_factor⌋`.
/// Output bit `i` is the parity of `x·M_i` over GF(2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoUniversalHash {
    input_len: usize,
    output_len: usize,
    width: usize,
    seed: u64,
    matrices: Vec<Vec<Vec<u8>>>,
}

impl TwoUniversalHash {
    pub fn new(
        input_len: usize,
        output_len: usize,
        load_factor: f64,
        seed: u64,
    ) -> Result<Self, Bb84Error> {
        check_shape(input_len, output_len)?;
        if !(load_factor > 0.0 && load_factor.is_finite()) {
            return Err(Bb84Error::InvalidParameter(format!(
                "load factor {load_factor} must be positive"
            )));
        }
        let width = ((output_len as f64 * load_factor) as usize).max(1);
        let mut rng = StdRng::seed_from_u64(seed);
        let matrices = (0..output_len)
            .map(|_| (0..input_len).map(|_| random_bits(&mut rng, width)).collect())
            .collect();
        Ok(Self {
            input_len,
            output_len,
            width,
            seed,
            matrices,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

impl UniversalHash for TwoUniversalHash {
    fn input_len(&self) -> usize {
        self.input_len
    }

    fn output_len(&self) -> usize {
        self.output_len
    }

    fn hash(&self, input: &[u8]) -> Result<Vec<u8>, Bb84Error> {
        self.check_input(input)?;
        Ok(self
            .matrices
            .iter()
            .map(|matrix| {
                (0..self.width).fold(0u8, |acc, col| {
                    let product = input
                        .iter()
                        .zip(matrix)
                        .fold(0u8, |p, (x, row)| p ^ (x & row[col]));
                    acc ^ product
                })
            })
            .collect())
    }
}

/// Toeplitz matrix hash: `T[i][j] = d[i - j + input_len - 1]` for a random
/// diagonal vector `d` of `input_len + output_len - 1` bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToeplitzHash {
    input_len: usize,
    output_len: usize,
    diagonals: Vec<u8>,
}

impl ToeplitzHash {
    pub fn new(input_len: usize, output_len: usize, seed: u64) -> Result<Self, Bb84Error> {
        check_shape(input_len, output_len)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let diagonals = random_bits(&mut rng, input_len + output_len - 1);
        Ok(Self {
            input_len,
            output_len,
            diagonals,
        })
    }

    fn entry(&self, row: usize, col: usize) -> u8 {
        self.diagonals[row + self.input_len - 1 - col]
    }
}

impl UniversalHash for ToeplitzHash {
    fn input_len(&self) -> usize {
        self.input_len
    }

    fn output_len(&self) -> usize {
        self.output_len
    }

    fn hash(&self, input: &[u8]) -> Result<Vec<u8>, Bb84Error> {
        self.check_input(input)?;
        Ok((0..self.output_len)
            .map(|row| {
                input
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (col, &x)| acc ^ (x & self.entry(row, col)))
            })
            .collect())
    }
}

/// Compresses a reconciled key to `output_len` bits with a Toeplitz hash.
pub fn apply_privacy_amplification(
    shared_key: &[u8],
    output_len: usize,
    seed: u64,
) -> Result<Vec<u8>, Bb84Error> {
    ToeplitzHash::new(shared_key.len(), output_len, seed)?.hash(shared_key)
}

fn hash_chunk(chunk: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(chunk);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// SHA-256 of the packed key, exchanged to confirm both sides agree.
pub fn key_digest(bits: &[u8]) -> Vec<u8> {
    let mut packed = (bits.len() as u64).to_be_bytes().to_vec();
    packed.extend(bools_to_bytes(bits));
    hash_chunk(&packed)
}

pub fn keys_match(alice: &[u8], bob: &[u8]) -> bool {
    key_digest(alice) == key_digest(bob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::digest;

    #[test]
    fn test_shared_seed_gives_shared_secret() {
        let weak_shared_secret = [0, 1, 0];
        let alice = TwoUniversalHash::new(3, 2, 0.75, 11).unwrap();
        let bob = TwoUniversalHash::new(3, 2, 0.75, 11).unwrap();
        assert_eq!(alice.width(), 1);
        assert_eq!(
            alice.hash(&weak_shared_secret).unwrap(),
            bob.hash(&weak_shared_secret).unwrap()
        );
    }

    #[test]
    fn test_two_universal_output_length() {
        let hash = TwoUniversalHash::new(10, 8, 1.0, 42).unwrap();
        let out = hash.hash(&[1, 0, 1, 0, 1, 0, 1, 0, 1, 0]).unwrap();
        assert_eq!(out.len(), 8);
        assert!(out.iter().all(|&b| b <= 1));
    }

    #[test]
    fn test_wrong_input_length() {
        let hash = TwoUniversalHash::new(3, 2, 0.75, 11).unwrap();
        assert!(matches!(
            hash.hash(&[0, 1]),
            Err(Bb84Error::InputLength { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn test_toeplitz_structure() {
        let hash = ToeplitzHash::new(5, 3, 9).unwrap();
        for row in 1..3 {
            for col in 1..5 {
                assert_eq!(hash.entry(row, col), hash.entry(row - 1, col - 1));
            }
        }
    }

    #[test]
    fn test_toeplitz_is_linear() {
        let hash = ToeplitzHash::new(8, 4, 3).unwrap();
        let a = [1, 0, 1, 1, 0, 0, 1, 0];
        let b = [0, 1, 1, 0, 1, 0, 0, 1];
        let sum: Vec<u8> = a.iter().zip(&b).map(|(x, y)| x ^ y).collect();
        let ha = hash.hash(&a).unwrap();
        let hb = hash.hash(&b).unwrap();
        let expected: Vec<u8> = ha.iter().zip(&hb).map(|(x, y)| x ^ y).collect();
        assert_eq!(hash.hash(&sum).unwrap(), expected);
    }

    #[test]
    fn test_apply_privacy_amplification() {
        let shared_key = vec![1, 0, 1, 0, 1, 0, 1, 0];
        let amplified_key = apply_privacy_amplification(&shared_key, 4, 5).unwrap();
        assert_eq!(amplified_key.len(), 4);
        assert_eq!(amplified_key, apply_privacy_amplification(&shared_key, 4, 5).unwrap());
    }

    #[test]
    fn test_empty_shape_rejected() {
        assert!(apply_privacy_amplification(&[], 4, 1).is_err());
        assert!(ToeplitzHash::new(4, 0, 1).is_err());
    }

    #[test]
    fn test_hash_function_accuracy() {
        let input_chunk = [0b10101010, 0b11001100, 0b11110000, 0b00001111];
        let expected_output = digest::digest(&SHA256, &input_chunk).as_ref().to_vec();
        assert_eq!(hash_chunk(&input_chunk), expected_output);
    }

    #[test]
    fn test_key_confirmation() {
        assert!(keys_match(&[1, 0, 1], &[1, 0, 1]));
        assert!(!keys_match(&[1, 0, 1], &[1, 1, 1]));
        assert!(!keys_match(&[1, 0], &[1, 0, 0]));
    }
}
