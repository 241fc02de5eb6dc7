use bb84::prelude::*;
use qcircuit::ClassicalRng;

fn main() -> Result<(), Bb84Error> {
    env_logger::init();
    println!("BB84 Eavesdropping Simulation");

    for eavesdropper in [0.0, 0.25, 0.5, 1.0] {
        // Never abort, so the error rate Eve causes can be read off.
        let params = Bb84Params {
            n: 64,
            delta: 1.0,
            eavesdropper,
            max_error_rate: 1.0,
            max_attempts: 10,
            ..Bb84Params::default()
        };
        let mut session = Bb84Session::new(params, ClassicalRng::new())?;
        let t = session.run_with_restarts()?.transcript;
        let detected = t.error_rate > Bb84Params::default().max_error_rate;
        println!(
            "intercept probability {:.2}: {} qubits intercepted, error rate {:.3}, detected: {}",
            eavesdropper,
            t.intercepted_positions.len(),
            t.error_rate,
            detected
        );
    }
    Ok(())
}
