use anyhow::{Context, Result};
use bb84::bits::bits_to_string;
use bb84::{Bb84Params, Bb84Session, Bb84Transcript};
use qcircuit::RandomBitSource;

use super::{classical_rng, heading, quantum_rng};

fn exchange<S: RandomBitSource>(
    params: Bb84Params,
    source: S,
    seed: Option<u64>,
) -> Result<(Bb84Transcript, usize)> {
    let mut session = match seed {
        Some(seed) => Bb84Session::seeded(params, source, seed)?,
        None => Bb84Session::new(params, source)?,
    };
    let outcome = session
        .run_with_restarts()
        .context("BB84 did not produce a key")?;
    Ok((outcome.transcript, outcome.attempts))
}

pub fn run(params: Bb84Params, seed: Option<u64>, classical: bool) -> Result<()> {
    heading("BB84");
    println!(
        "n = {}, delta = {}, {} qubits per round, noise {}, eavesdropper {}, {} reconciliation",
        params.n,
        params.delta,
        params.string_length(),
        params.noise,
        params.eavesdropper,
        params.reconciliation
    );

    let (t, attempts) = if classical {
        exchange(params, classical_rng(seed), seed)?
    } else {
        exchange(params, quantum_rng(seed), seed)?
    };
    print_transcript(&t, attempts);
    Ok(())
}

fn print_transcript(t: &Bb84Transcript, attempts: usize) {
    if attempts > 1 {
        println!("Succeeded after {attempts} rounds.");
    }
    println!("\nBob: Hey Alice, I received and measured the states you sent me!\n");
    println!("Alice b string:     {}", bits_to_string(&t.alice_bases));
    println!("Bob b string:       {}\n", bits_to_string(&t.bob_bases));
    println!("Alice a string:     {}", bits_to_string(&t.alice_bits));
    println!("Bob decoded string: {}\n", bits_to_string(&t.bob_bits));
    println!("Alice kept: {}", bits_to_string(&t.alice_sifted));
    println!("Bob kept:   {}\n", bits_to_string(&t.bob_sifted));
    if !t.intercepted_positions.is_empty() {
        println!("Eve intercepted {} qubits.", t.intercepted_positions.len());
    }
    println!("Check positions:  {:?}", t.check_positions);
    println!("Alice check bits: {}", bits_to_string(&t.alice_check_bits));
    println!("Bob check bits:   {}", bits_to_string(&t.bob_check_bits));
    println!(
        "Error rate: {:.3} ({} of {})\n",
        t.error_rate,
        t.mismatches,
        t.check_positions.len()
    );
    println!("Alice raw key:      {}", bits_to_string(&t.alice_raw_key));
    println!("Bob raw key:        {}", bits_to_string(&t.bob_raw_key));
    println!(
        "Bob reconciled key: {}  ({} flipped, {} bits leaked)\n",
        bits_to_string(&t.reconciliation.corrected),
        t.reconciliation.flipped.len(),
        t.reconciliation.leaked_bits
    );
    println!("Alice final key: {}", bits_to_string(&t.alice_key));
    println!("Bob final key:   {}", bits_to_string(&t.bob_key));
    println!("Keys confirmed:  {}", t.keys_confirmed);
}
