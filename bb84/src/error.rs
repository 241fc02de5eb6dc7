use qcircuit::CircuitError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Bb84Error {
    #[error("Only {got} bases matched, at least {needed} are required")]
    InsufficientSiftedBits { got: usize, needed: usize },

    #[error("Error rate {rate:.3} on {checks} check bits exceeds threshold {threshold:.3}")]
    ErrorRateExceeded {
        rate: f64,
        threshold: f64,
        mismatches: usize,
        checks: usize,
    },

    #[error("Gave up after {attempts} attempts: {last}")]
    AttemptsExhausted {
        attempts: usize,
        last: Box<Bb84Error>,
    },

    #[error("Alice's and Bob's bit strings differ in length ({alice} vs {bob})")]
    LengthMismatch { alice: usize, bob: usize },

    #[error("Expected an input of {expected} bits, got {got}")]
    InputLength { expected: usize, got: usize },

    #[error("Invalid parity-check matrix: {0}")]
    InvalidCode(String),

    #[error("Invalid protocol parameter: {0}")]
    InvalidParameter(String),

    #[error("Reconciliation leaked {leaked} of {raw} raw key bits, nothing left to distil")]
    NoKeyMaterial { raw: usize, leaked: usize },

    #[error("Cipher failure: {0}")]
    Cipher(String),

    #[error("Circuit error: {0}")]
    Circuit(#[from] CircuitError),
}

impl Bb84Error {
    /// Aborts that a fresh round can recover from.
    pub fn is_restartable(&self) -> bool {
        matches!(
            self,
            Bb84Error::InsufficientSiftedBits { .. } | Bb84Error::ErrorRateExceeded { .. }
        )
    }
}
