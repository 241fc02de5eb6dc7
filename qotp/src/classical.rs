//! The classical one-time pad: XOR with key bits that are used once.

use log::debug;
use qcircuit::RandomBitSource;

use crate::error::PadError;

pub(crate) fn check_bits(bits: &[u8]) -> Result<(), PadError> {
    match bits.iter().find(|&&b| b > 1) {
        Some(&b) => Err(PadError::InvalidBit(b)),
        None => Ok(()),
    }
}

/// Bitwise XOR. Applying it twice with the same key restores the input.
pub fn xor_bits(a: &[u8], b: &[u8]) -> Result<Vec<u8>, PadError> {
    if a.len() != b.len() {
        return Err(PadError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x ^ y).collect())
}

/// UTF-8 bytes of `text`, most significant bit first.
pub fn text_to_bits(text: &str) -> Vec<u8> {
    text.bytes()
        .flat_map(|byte| (0..8).rev().map(move |i| (byte >> i) & 1))
        .collect()
}

/// Inverse of [`text_to_bits`]. A trailing partial byte is dropped.
pub fn bits_to_text(bits: &[u8]) -> Result<String, PadError> {
    check_bits(bits)?;
    let bytes: Vec<u8> = bits
        .chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b))
        .collect();
    String::from_utf8(bytes).map_err(|_| PadError::InvalidText)
}

/// Key material consumed front to back. Both parties hold a copy and advance
/// it in lockstep; bits handed out once are never handed out again.
#[derive(Debug, Clone)]
pub struct OneTimePad {
    key: Vec<u8>,
    offset: usize,
}

impl OneTimePad {
    pub fn new(key: Vec<u8>) -> Result<Self, PadError> {
        check_bits(&key)?;
        Ok(Self { key, offset: 0 })
    }

    /// Fresh pad of `length` bits drawn from `source`.
    pub fn generate<S: RandomBitSource>(source: &mut S, length: usize) -> Result<Self, PadError> {
        Self::new(source.generate_bits(length)?)
    }

    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    pub fn used(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.key.len() - self.offset
    }

    /// XORs `bits` with the next unused key bits and retires them.
    pub fn apply(&mut self, bits: &[u8]) -> Result<Vec<u8>, PadError> {
        check_bits(bits)?;
        if bits.len() > self.remaining() {
            return Err(PadError::Exhausted {
                requested: bits.len(),
                remaining: self.remaining(),
            });
        }
        let segment = &self.key[self.offset..self.offset + bits.len()];
        let out = xor_bits(bits, segment)?;
        self.offset += bits.len();
        debug!(
            "pad used {} bits, {} remaining",
            bits.len(),
            self.remaining()
        );
        Ok(out)
    }

    pub fn encrypt(&mut self, message: &[u8]) -> Result<Vec<u8>, PadError> {
        self.apply(message)
    }

    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, PadError> {
        self.apply(ciphertext)
    }
}
