use qcircuit::CircuitError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PadError {
    #[error("Pad exhausted: {requested} key bits requested, {remaining} left")]
    Exhausted { requested: usize, remaining: usize },

    #[error("Key of {got} bits is too short, {needed} are required")]
    KeyTooShort { needed: usize, got: usize },

    #[error("Operands differ in length ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("Expected a bit (0 or 1), got {0}")]
    InvalidBit(u8),

    #[error("Decrypted bits are not valid UTF-8")]
    InvalidText,

    #[error("Circuit error: {0}")]
    Circuit(#[from] CircuitError),
}
