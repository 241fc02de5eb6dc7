use anyhow::{bail, Result};
use bb84::bits::bits_to_string;
use bb84::{Bb84Params, Bb84Session};
use log::warn;
use qotp::{bits_to_text, key_averaged, text_to_bits, OneTimePad, QuantumOneTimePad};
use qcircuit::gate::Matrix2;
use qcircuit::Simulator;

use super::{classical_rng, heading, quantum_rng, simulator};

const MAX_KEY_ROUNDS: usize = 256;

/// Runs BB84 until both sides hold at least `length` confirmed key bits.
fn distil_key(params: Bb84Params, seed: Option<u64>, length: usize) -> Result<(Vec<u8>, Vec<u8>)> {
    let source = classical_rng(seed);
    let mut session = match seed {
        Some(seed) => Bb84Session::seeded(params, source, seed)?,
        None => Bb84Session::new(params, source)?,
    };
    let (mut alice, mut bob) = (Vec::new(), Vec::new());
    for _ in 0..MAX_KEY_ROUNDS {
        if alice.len() >= length {
            return Ok((alice, bob));
        }
        let t = session.run_with_restarts()?.transcript;
        if !t.keys_confirmed {
            warn!("key confirmation failed, discarding the round");
            continue;
        }
        alice.extend(t.alice_key);
        bob.extend(t.bob_key);
    }
    if alice.len() >= length {
        return Ok((alice, bob));
    }
    bail!("{MAX_KEY_ROUNDS} BB84 rounds gave only {} of {length} key bits", alice.len())
}

fn print_matrix(label: &str, m: &Matrix2) {
    println!(
        "{label}: [[{:.3}, {:.3}], [{:.3}, {:.3}]]",
        m[0][0], m[0][1], m[1][0], m[1][1]
    );
}

pub fn run(message: &str, params: Bb84Params, seed: Option<u64>) -> Result<()> {
    let bits = text_to_bits(message);

    heading("Classical one-time pad with a BB84 key");
    let (alice_key, bob_key) = distil_key(params, seed, bits.len())?;
    println!("Key bits distilled: {}", alice_key.len());
    let mut alice_pad = OneTimePad::new(alice_key)?;
    let mut bob_pad = OneTimePad::new(bob_key)?;
    let cipher = alice_pad.encrypt(&bits)?;
    let plain = bob_pad.decrypt(&cipher)?;
    println!("Message:    {}", bits_to_string(&bits));
    println!("Ciphertext: {}", bits_to_string(&cipher));
    println!("Decrypted:  {}", bits_to_string(&plain));
    println!("Bob reads:  {:?}", bits_to_text(&plain)?);
    println!("Pad bits left: {}", alice_pad.remaining());

    heading("Quantum one-time pad");
    let pad = QuantumOneTimePad::generate(&mut quantum_rng(seed), bits.len())?;
    let mut simulator: Simulator = simulator(seed);
    let transmission = pad.send_classical_message(&bits, &mut simulator)?;
    println!("Eve measures: {}", bits_to_string(&transmission.intercepted));
    println!("Bob receives: {}", bits_to_string(&transmission.received));
    println!("Bob reads:    {:?}", bits_to_text(&transmission.received)?);

    println!("\nWithout the key every qubit looks maximally mixed:");
    let h = std::f64::consts::FRAC_1_SQRT_2;
    let plus: Matrix2 = [
        [(h * h).into(), (h * h).into()],
        [(h * h).into(), (h * h).into()],
    ];
    print_matrix("rho(|+>)        ", &plus);
    print_matrix("key averaged rho", &key_averaged(&plus));
    Ok(())
}
