use anyhow::{anyhow, bail, Result};
use bb84::bits::{bits_to_string, parse_bits, xor};
use bb84::error_correction::{reconcile, Hamming74, ParityCheckMatrix};

use super::heading;

pub fn run(bits: &str, noise: &str) -> Result<()> {
    let alice = parse_bits(bits)?;
    let noise = parse_bits(noise)?;
    if alice.len() != 3 || noise.len() != 3 {
        bail!("the parity-check example works on exactly three bits");
    }

    heading("Syndrome decoding with a 3-bit parity check");
    let code = ParityCheckMatrix::three_bit();
    for row in code.rows() {
        println!("H row: {}", bits_to_string(row));
    }
    let bob = xor(&alice, &noise)?;
    let alice_syndrome = code.syndrome(&alice)?;
    let bob_syndrome = code.syndrome(&bob)?;
    let sum = xor(&alice_syndrome, &bob_syndrome)?;
    let estimate = code
        .error_estimate(&sum)
        .ok_or_else(|| anyhow!("no error estimate for syndrome {}", bits_to_string(&sum)))?;
    let decoded = xor(&bob, estimate)?;
    println!("Alice x_a:       {}", bits_to_string(&alice));
    println!("Noise:           {}", bits_to_string(&noise));
    println!("Bob received:    {}", bits_to_string(&bob));
    println!("Alice syndrome:  {}", bits_to_string(&alice_syndrome));
    println!("Bob syndrome:    {}", bits_to_string(&bob_syndrome));
    println!("Sum syndrome:    {}", bits_to_string(&sum));
    println!("Error estimate:  {}", bits_to_string(estimate));
    println!("Bob decoded:     {}", bits_to_string(&decoded));

    heading("Hamming(7,4)");
    let hamming = Hamming74::new();
    let data = [1, 0, 1, 1];
    let mut word = hamming.encode(data);
    println!("Data:     {}", bits_to_string(&data));
    println!("Codeword: {}", bits_to_string(&word));
    word[4] ^= 1;
    println!("Received: {}  (bit 4 flipped)", bits_to_string(&word));
    println!("Syndrome: {}", bits_to_string(&hamming.syndrome(&word)));
    let decoded = hamming.decode(word);
    println!(
        "Decoded:  {}  (corrected position {:?})",
        bits_to_string(&decoded.data),
        decoded.corrected
    );

    heading("Blockwise reconciliation");
    let alice_key = parse_bits("1011001110001011")?;
    let mut bob_key = alice_key.clone();
    bob_key[2] ^= 1;
    bob_key[12] ^= 1;
    let result = reconcile(&alice_key, &bob_key, &ParityCheckMatrix::hamming74())?;
    println!("Alice key:     {}", bits_to_string(&alice_key));
    println!("Bob key:       {}", bits_to_string(&bob_key));
    println!("Bob corrected: {}", bits_to_string(&result.corrected));
    println!(
        "Flipped {:?}, leaked {} syndrome bits",
        result.flipped, result.leaked_bits
    );
    Ok(())
}
