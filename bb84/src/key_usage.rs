//! Putting a distilled key to work: SHA-256 key stretching into AES-256-GCM.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::bits::bools_to_bytes;
use crate::error::Bb84Error;

/// Ciphertext with the nonce it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub nonce: [u8; 12],
    pub ciphertext: Vec<u8>,
}

/// Stretches key bits of any length to a 256-bit AES key. The bit count is
/// hashed ahead of the packed bytes so trailing zero bits change the key.
pub fn derive_aes_key(key_bits: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update((key_bits.len() as u64).to_be_bytes());
    hasher.update(bools_to_bytes(key_bits));
    hasher.finalize().into()
}

fn cipher(key_bits: &[u8]) -> Aes256Gcm {
    let stretched = derive_aes_key(key_bits);
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&stretched))
}

pub fn encrypt(key_bits: &[u8], plaintext: &[u8]) -> Result<Sealed, Bb84Error> {
    let mut nonce = [0u8; 12];
    OsRng.fill_bytes(&mut nonce);
    let ciphertext = cipher(key_bits)
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| Bb84Error::Cipher(e.to_string()))?;
    Ok(Sealed { nonce, ciphertext })
}

pub fn decrypt(key_bits: &[u8], sealed: &Sealed) -> Result<Vec<u8>, Bb84Error> {
    cipher(key_bits)
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
        .map_err(|e| Bb84Error::Cipher(e.to_string()))
}
