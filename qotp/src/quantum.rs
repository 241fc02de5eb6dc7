//! The quantum one-time pad.
//!
//! Two key bits `(a, b)` per qubit. Encryption applies `Z^b X^a`, decryption
//! the inverse `X^a Z^b`. Averaged over the four keys every single-qubit state
//! becomes `I/2`, so a party without the key learns nothing from the qubit.

use log::debug;
use num_complex::Complex64;
use num_traits::Zero;
use qcircuit::gate::{conjugate_by, dagger, mat_mul, IDENTITY, PAULI_X, PAULI_Z};
use qcircuit::{Circuit, Gate, Matrix2, Operation, Qubit, RandomBitSource, Simulator};

use crate::classical::check_bits;
use crate::error::PadError;

pub const MESSAGE_QUBIT_PREFIX: &str = "msg_";
pub const INTERCEPT_KEY: &str = "intercepted";
pub const RECEIVED_KEY: &str = "received";
/// Message qubits are independent, so each circuit carries at most this many.
pub const MESSAGE_BATCH: usize = 16;

/// `Z^b X^a`.
pub fn encryption_unitary(a: u8, b: u8) -> Matrix2 {
    let x = if a == 1 { PAULI_X } else { IDENTITY };
    let z = if b == 1 { PAULI_Z } else { IDENTITY };
    mat_mul(&z, &x)
}

/// `¼ Σ_{a,b} (Z^b X^a) ρ (Z^b X^a)†`, what an observer without the key sees.
pub fn key_averaged(rho: &Matrix2) -> Matrix2 {
    let mut out = [[Complex64::zero(); 2]; 2];
    for a in 0..2 {
        for b in 0..2 {
            let term = conjugate_by(&encryption_unitary(a, b), rho);
            for (row, term_row) in out.iter_mut().zip(term.iter()) {
                for (cell, value) in row.iter_mut().zip(term_row.iter()) {
                    *cell += *value * 0.25;
                }
            }
        }
    }
    out
}

/// Bits measured in transit and after decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    /// What an eavesdropper reads by measuring the encrypted qubits.
    pub intercepted: Vec<u8>,
    /// What the receiver reads after decrypting.
    pub received: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct QuantumOneTimePad {
    key: Vec<u8>,
}

impl QuantumOneTimePad {
    /// `key[2i]` is `a_i`, `key[2i + 1]` is `b_i`.
    pub fn new(key: Vec<u8>) -> Result<Self, PadError> {
        check_bits(&key)?;
        Ok(Self { key })
    }

    /// Key for `qubits` qubits drawn from `source`.
    pub fn generate<S: RandomBitSource>(source: &mut S, qubits: usize) -> Result<Self, PadError> {
        Self::new(source.generate_bits(2 * qubits)?)
    }

    /// Number of qubits the key can encrypt.
    pub fn capacity(&self) -> usize {
        self.key.len() / 2
    }

    pub fn key_pair(&self, index: usize) -> Option<(u8, u8)> {
        Some((*self.key.get(2 * index)?, *self.key.get(2 * index + 1)?))
    }

    fn require(&self, qubits: usize) -> Result<(), PadError> {
        if qubits > self.capacity() {
            return Err(PadError::KeyTooShort {
                needed: 2 * qubits,
                got: self.key.len(),
            });
        }
        Ok(())
    }

    fn pair(&self, index: usize) -> Result<(u8, u8), PadError> {
        self.key_pair(index).ok_or(PadError::KeyTooShort {
            needed: 2 * (index + 1),
            got: self.key.len(),
        })
    }

    /// `X` then `Z` on each qubit, as selected by its key pair.
    pub fn encrypt_ops(&self, qubits: &[Qubit]) -> Result<Vec<Operation>, PadError> {
        self.require(qubits.len())?;
        let mut ops = Vec::new();
        for (i, q) in qubits.iter().enumerate() {
            let (a, b) = self.pair(i)?;
            if a == 1 {
                ops.push(Gate::X.on(q));
            }
            if b == 1 {
                ops.push(Gate::Z.on(q));
            }
        }
        Ok(ops)
    }

    /// `Z` then `X`, undoing [`encrypt_ops`](Self::encrypt_ops).
    pub fn decrypt_ops(&self, qubits: &[Qubit]) -> Result<Vec<Operation>, PadError> {
        self.require(qubits.len())?;
        let mut ops = Vec::new();
        for (i, q) in qubits.iter().enumerate() {
            let (a, b) = self.pair(i)?;
            if b == 1 {
                ops.push(Gate::Z.on(q));
            }
            if a == 1 {
                ops.push(Gate::X.on(q));
            }
        }
        Ok(ops)
    }

    /// Encrypts the density matrix of qubit `index`.
    pub fn encrypt_density(&self, index: usize, rho: &Matrix2) -> Result<Matrix2, PadError> {
        let (a, b) = self.pair(index)?;
        Ok(conjugate_by(&encryption_unitary(a, b), rho))
    }

    pub fn decrypt_density(&self, index: usize, rho: &Matrix2) -> Result<Matrix2, PadError> {
        let (a, b) = self.pair(index)?;
        Ok(conjugate_by(&dagger(&encryption_unitary(a, b)), rho))
    }

    /// Sends classical bits as computational-basis qubits under the pad.
    ///
    /// Each batch is simulated twice from the same preparation: once measured
    /// straight off the channel, once decrypted first.
    pub fn send_classical_message(
        &self,
        bits: &[u8],
        simulator: &mut Simulator,
    ) -> Result<Transmission, PadError> {
        check_bits(bits)?;
        self.require(bits.len())?;
        let mut transmission = Transmission {
            intercepted: Vec::with_capacity(bits.len()),
            received: Vec::with_capacity(bits.len()),
        };

        for start in (0..bits.len()).step_by(MESSAGE_BATCH) {
            let end = (start + MESSAGE_BATCH).min(bits.len());
            let qubits = Qubit::range_from(start, end - start, MESSAGE_QUBIT_PREFIX);
            let batch_pad = QuantumOneTimePad {
                key: self.key[2 * start..2 * end].to_vec(),
            };

            let mut encoded = Vec::new();
            for (q, &bit) in qubits.iter().zip(&bits[start..end]) {
                encoded.push(Gate::I.on(q));
                if bit == 1 {
                    encoded.push(Gate::X.on(q));
                }
            }
            let encrypted = batch_pad.encrypt_ops(&qubits)?;

            let mut tapped = Circuit::from_operations(encoded.iter().cloned())?;
            tapped.extend(encrypted.iter().cloned())?;
            tapped.append(Operation::measure(&qubits, INTERCEPT_KEY))?;
            let result = simulator.simulate(&tapped)?;
            transmission
                .intercepted
                .extend_from_slice(result.measurement(INTERCEPT_KEY)?);

            let mut delivered = Circuit::from_operations(encoded)?;
            delivered.extend(encrypted)?;
            delivered.extend(batch_pad.decrypt_ops(&qubits)?)?;
            delivered.append(Operation::measure(&qubits, RECEIVED_KEY))?;
            let result = simulator.simulate(&delivered)?;
            transmission
                .received
                .extend_from_slice(result.measurement(RECEIVED_KEY)?);
        }
        debug!(
            "sent {} bits under the quantum pad, {} flipped in transit",
            bits.len(),
            transmission
                .intercepted
                .iter()
                .zip(bits)
                .filter(|(x, y)| x != y)
                .count()
        );
        Ok(transmission)
    }
}
