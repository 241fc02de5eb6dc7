//! Bit-string helpers. Bits are `u8` values 0 or 1, the form measurement
//! records come in.

use crate::error::Bb84Error;

/// Packs bits into bytes, least significant bit first.
pub fn bools_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0, |acc, (i, &bit)| acc | ((bit & 1) << i))
        })
        .collect()
}

pub fn bytes_to_bools(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).map(move |i| (byte >> i) & 1))
        .collect()
}

pub fn bits_to_string(bits: &[u8]) -> String {
    bits.iter().map(|&b| if b == 1 { '1' } else { '0' }).collect()
}

pub fn parse_bits(text: &str) -> Result<Vec<u8>, Bb84Error> {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '0' => Ok(0),
            '1' => Ok(1),
            other => Err(Bb84Error::InvalidParameter(format!(
                "'{other}' is not a bit"
            ))),
        })
        .collect()
}

pub fn xor(a: &[u8], b: &[u8]) -> Result<Vec<u8>, Bb84Error> {
    if a.len() != b.len() {
        return Err(Bb84Error::LengthMismatch {
            alice: a.len(),
            bob: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x ^ y).collect())
}

pub fn hamming_distance(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

pub fn parity(bits: &[u8]) -> u8 {
    bits.iter().fold(0, |acc, b| acc ^ (b & 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let bits = vec![1, 0, 1, 1, 0, 0, 0, 0, 1];
        let bytes = bools_to_bytes(&bits);
        assert_eq!(bytes, vec![0b0000_1101, 0b0000_0001]);
        assert_eq!(&bytes_to_bools(&bytes)[..9], &bits[..]);
    }

    #[test]
    fn test_parse_and_print() {
        let bits = parse_bits("01 10").unwrap();
        assert_eq!(bits, vec![0, 1, 1, 0]);
        assert_eq!(bits_to_string(&bits), "0110");
        assert!(parse_bits("012").is_err());
    }

    #[test]
    fn test_xor_and_distance() {
        let a = vec![1, 0, 1, 0];
        let b = vec![1, 1, 0, 0];
        assert_eq!(xor(&a, &b).unwrap(), vec![0, 1, 1, 0]);
        assert_eq!(hamming_distance(&a, &b), 2);
        assert_eq!(parity(&a), 0);
        assert!(xor(&a, &b[..3]).is_err());
    }
}
