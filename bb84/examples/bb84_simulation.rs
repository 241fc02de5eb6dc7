use bb84::bits::bits_to_string;
use bb84::prelude::*;
use qcircuit::ClassicalRng;

fn main() -> Result<(), Bb84Error> {
    env_logger::init();

    let params = Bb84Params {
        delta: 1.0,
        ..Bb84Params::default()
    };
    let mut session = Bb84Session::new(params, ClassicalRng::new())?;
    let outcome = session.run_with_restarts()?;
    let t = &outcome.transcript;

    println!("Rounds needed: {}", outcome.attempts);
    println!("Alice's bits   a : {}", bits_to_string(&t.alice_bits));
    println!("Alice's bases  b : {}", bits_to_string(&t.alice_bases));
    println!("Bob's bases    b': {}", bits_to_string(&t.bob_bases));
    println!("Bob's results  a': {}", bits_to_string(&t.bob_bits));
    println!("Alice kept       : {}", bits_to_string(&t.alice_sifted));
    println!("Bob kept         : {}", bits_to_string(&t.bob_sifted));
    println!("Check positions  : {:?}", t.check_positions);
    println!(
        "Error rate       : {:.3} ({} of {})",
        t.error_rate,
        t.mismatches,
        t.check_positions.len()
    );
    println!("Raw key          : {}", bits_to_string(&t.alice_raw_key));
    println!("Leaked bits      : {}", t.reconciliation.leaked_bits);
    println!("Alice's key      : {}", bits_to_string(&t.alice_key));
    println!("Bob's key        : {}", bits_to_string(&t.bob_key));
    println!("Keys confirmed   : {}", t.keys_confirmed);
    Ok(())
}
