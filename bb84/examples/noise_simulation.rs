use bb84::prelude::*;
use qcircuit::ClassicalRng;

fn main() -> Result<(), Bb84Error> {
    env_logger::init();
    println!("BB84 Protocol with Noise Simulation");

    for noise in [0.0, 0.05, 0.1, 0.2] {
        let params = Bb84Params {
            n: 64,
            delta: 1.0,
            noise,
            max_attempts: 3,
            ..Bb84Params::default()
        };
        let mut session = Bb84Session::new(params, ClassicalRng::new())?;
        match session.run_with_restarts() {
            Ok(outcome) => {
                let t = outcome.transcript;
                println!(
                    "noise {:.2}: error rate {:.3}, {} bits corrected, {}-bit key, confirmed: {}",
                    noise,
                    t.error_rate,
                    t.reconciliation.flipped.len(),
                    t.alice_key.len(),
                    t.keys_confirmed
                );
            }
            Err(e) => println!("noise {:.2}: {}", noise, e),
        }
    }
    Ok(())
}
