//! # qcircuit
//!
//! A small exact state-vector simulator used by the protocol walkthroughs.
//!
//! Circuits are built from named qubits and are organised in moments. The
//! simulator runs them on a dense state vector (at most [`MAX_QUBITS`]
//! qubits), records measurements under string keys, can expose the state after
//! every moment, and can sample a circuit many times.
//!
//! ```
//! use qcircuit::prelude::*;
//!
//! let q = Qubit::named("Apolonia");
//! let circuit = Circuit::from_operations([Gate::H.on(&q)]).unwrap();
//! let result = Simulator::seeded(1).simulate(&circuit).unwrap();
//! assert!((result.final_state.norm() - 1.0).abs() < 1e-9);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod qrng;
pub mod qubit;
pub mod simulator;
pub mod state;

pub use circuit::{Circuit, Moment, Operation};
pub use error::CircuitError;
pub use gate::{Gate, Matrix2};
pub use qrng::{ClassicalRng, QuantumRng, RandomBitSource};
pub use qubit::Qubit;
pub use simulator::{RunResult, SimulationResult, Simulator, StepResult};
pub use state::{StateVector, MAX_QUBITS};

pub mod prelude {
    pub use crate::circuit::*;
    pub use crate::error::*;
    pub use crate::gate::*;
    pub use crate::qrng::*;
    pub use crate::qubit::*;
    pub use crate::simulator::*;
    pub use crate::state::*;
}
