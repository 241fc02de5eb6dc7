use bb84::key_usage::{decrypt, encrypt};
use bb84::prelude::*;
use qcircuit::QuantumRng;

fn main() -> Result<(), Bb84Error> {
    env_logger::init();

    let params = Bb84Params {
        delta: 1.0,
        ..Bb84Params::default()
    };
    let mut session = Bb84Session::new(params, QuantumRng::new())?;
    let t = session.run_with_restarts()?.transcript;
    if !t.keys_confirmed {
        println!("Key confirmation failed, discarding the key.");
        return Ok(());
    }

    let message = b"Your secret message";
    let sealed = encrypt(&t.alice_key, message)?;
    let decrypted = decrypt(&t.bob_key, &sealed)?;

    assert_eq!(&message[..], &decrypted[..]);
    println!("Success! The message was correctly encrypted and decrypted using a quantum key.");
    Ok(())
}
