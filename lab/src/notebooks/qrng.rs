use anyhow::Result;
use bb84::bits::bits_to_string;
use qcircuit::{QuantumRng, RandomBitSource};

use super::{classical_rng, heading, quantum_rng};

fn draw<S: RandomBitSource>(source: &mut S, length: usize, count: usize) -> Result<()> {
    let mut ones = 0;
    for _ in 0..count {
        let bits = source.generate_bits(length)?;
        ones += bits.iter().filter(|&&b| b == 1).count();
        println!("{}", bits_to_string(&bits));
    }
    let total = length * count;
    if total > 0 {
        println!("\nShare of ones: {:.3}", ones as f64 / total as f64);
    }
    Ok(())
}

pub fn run(seed: Option<u64>, length: usize, count: usize, classical: bool) -> Result<()> {
    if classical {
        heading("Classical random bits");
        return draw(&mut classical_rng(seed), length, count);
    }

    heading("Quantum random bits");
    let shown = length.clamp(1, 4);
    println!("Circuit for {shown} bits:\n");
    println!("{}\n", QuantumRng::circuit(shown)?);
    draw(&mut quantum_rng(seed), length, count)
}
