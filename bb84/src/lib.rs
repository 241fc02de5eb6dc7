//! # bb84
//!
//! BB84 quantum key distribution on top of the `qcircuit` simulator, with the
//! classical post-processing a complete round needs: sifting, error-rate
//! estimation, information reconciliation, privacy amplification and key
//! confirmation. Final keys can be stretched into AES-256-GCM keys.
//!
//! This is a teaching implementation. The channel is simulated and no
//! finite-key security analysis is attempted.
//!
//! ```
//! use bb84::prelude::*;
//! use qcircuit::ClassicalRng;
//!
//! let params = Bb84Params { delta: 1.0, max_attempts: 10, ..Bb84Params::default() };
//! let mut session = Bb84Session::seeded(params, ClassicalRng::seeded(3), 3).unwrap();
//! let outcome = session.run_with_restarts().unwrap();
//! assert!(outcome.transcript.keys_confirmed);
//! ```

pub mod bb84;
pub mod bb84_states;
pub mod bits;
pub mod error;
pub mod error_correction;
pub mod key_usage;
pub mod privacy_amplification;

#[cfg(test)]
mod tests;

pub use crate::bb84::{Bb84Outcome, Bb84Params, Bb84Session, Bb84Transcript, Reconciliation};
pub use crate::bb84_states::{BB84State, MeasurementBasis};
pub use crate::error::Bb84Error;

pub mod prelude {
    pub use crate::bb84::*;
    pub use crate::bb84_states::*;
    pub use crate::bits::*;
    pub use crate::error::*;
    pub use crate::error_correction::*;
    pub use crate::key_usage::*;
    pub use crate::privacy_amplification::*;
}
