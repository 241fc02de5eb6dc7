use anyhow::Result;
use bb84::bits::{bits_to_string, parse_bits};
use bb84::privacy_amplification::{ToeplitzHash, TwoUniversalHash, UniversalHash};

use super::heading;

pub fn run(secret: &str, output_len: usize, load_factor: f64, hash_seed: u64) -> Result<()> {
    let secret = parse_bits(secret)?;

    heading("Two-universal hashing");
    println!("Weak shared secret: {}", bits_to_string(&secret));
    println!("Shared seed:        {hash_seed}");
    let alice = TwoUniversalHash::new(secret.len(), output_len, load_factor, hash_seed)?;
    let bob = TwoUniversalHash::new(secret.len(), output_len, load_factor, hash_seed)?;
    println!(
        "{} -> {} bits, {} columns per matrix",
        alice.input_len(),
        alice.output_len(),
        alice.width()
    );
    println!("Alice: {}", bits_to_string(&alice.hash(&secret)?));
    println!("Bob:   {}", bits_to_string(&bob.hash(&secret)?));

    heading("Toeplitz hashing");
    let toeplitz = ToeplitzHash::new(secret.len(), output_len, hash_seed)?;
    println!("Alice and Bob: {}", bits_to_string(&toeplitz.hash(&secret)?));
    Ok(())
}
