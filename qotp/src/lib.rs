//! # qotp
//!
//! One-time pads for the walkthroughs: the classical XOR pad whose key bits
//! are spent exactly once, and the quantum one-time pad that hides a qubit
//! behind a random Pauli.
//!
//! Neither is hardened for real use. Keys live in ordinary memory and the
//! quantum pad runs on the `qcircuit` simulator.

pub mod classical;
pub mod error;
pub mod quantum;

pub use classical::{bits_to_text, text_to_bits, xor_bits, OneTimePad};
pub use error::PadError;
pub use quantum::{key_averaged, QuantumOneTimePad, Transmission};
