//! Random bit sources: a classical PRNG and a simulated quantum generator
//! that measures qubits in equal superposition.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::circuit::{Circuit, Operation};
use crate::error::CircuitError;
use crate::gate::Gate;
use crate::qubit::Qubit;
use crate::simulator::Simulator;

pub trait RandomBitSource {
    /// `length` bits, each 0 or 1.
    fn generate_bits(&mut self, length: usize) -> Result<Vec<u8>, CircuitError>;

    /// Packs freshly generated bits into bytes, most significant bit first.
    fn generate_bytes(&mut self, length: usize) -> Result<Vec<u8>, CircuitError> {
        let bits = self.generate_bits(length * 8)?;
        Ok(bits
            .chunks(8)
            .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b))
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct ClassicalRng {
    rng: StdRng,
}

impl ClassicalRng {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ClassicalRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomBitSource for ClassicalRng {
    fn generate_bits(&mut self, length: usize) -> Result<Vec<u8>, CircuitError> {
        Ok((0..length).map(|_| self.rng.gen_range(0..2)).collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuantumRng {
    simulator: Simulator,
}

impl QuantumRng {
    pub const MEASUREMENT_KEY: &'static str = "qrng_measure";
    pub const QUBIT_PREFIX: &'static str = "qrng_";
    /// The qubits are independent, so long requests are simulated in batches.
    pub const BATCH_QUBITS: usize = 16;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simulator(simulator: Simulator) -> Self {
        Self { simulator }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_simulator(Simulator::seeded(seed))
    }

    /// Hadamard on every qubit, then one measurement over all of them.
    pub fn circuit(length: usize) -> Result<Circuit, CircuitError> {
        let qubits = Qubit::range(length, Self::QUBIT_PREFIX);
        let mut circuit = Circuit::new();
        for q in &qubits {
            circuit.append(Gate::H.on(q))?;
        }
        circuit.append(Operation::measure(&qubits, Self::MEASUREMENT_KEY))?;
        Ok(circuit)
    }
}

impl RandomBitSource for QuantumRng {
    fn generate_bits(&mut self, length: usize) -> Result<Vec<u8>, CircuitError> {
        let mut bits = Vec::with_capacity(length);
        while bits.len() < length {
            let batch = (length - bits.len()).min(Self::BATCH_QUBITS);
            let result = self.simulator.simulate(&Self::circuit(batch)?)?;
            bits.extend_from_slice(result.measurement(Self::MEASUREMENT_KEY)?);
        }
        Ok(bits)
    }
}
