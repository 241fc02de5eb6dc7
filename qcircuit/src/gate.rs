//! Gate set and 2x2 matrix helpers.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

use num_complex::Complex64;
use num_traits::{One, Zero};

use crate::circuit::Operation;
use crate::error::CircuitError;
use crate::qubit::Qubit;

/// A single-qubit operator, row major.
pub type Matrix2 = [[Complex64; 2]; 2];

/// Tolerance used for normalisation checks.
pub const NORM_TOLERANCE: f64 = 1e-9;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

pub const IDENTITY: Matrix2 = [[ONE, ZERO], [ZERO, ONE]];
pub const PAULI_X: Matrix2 = [[ZERO, ONE], [ONE, ZERO]];
pub const PAULI_Z: Matrix2 = [[ONE, ZERO], [ZERO, Complex64::new(-1.0, 0.0)]];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gate {
    I,
    X,
    Y,
    Z,
    H,
    S,
    T,
    Rx(f64),
    Ry(f64),
    Rz(f64),
    /// Control first, target second.
    Cnot,
    Cz,
    Swap,
    /// Resets the qubit and prepares the given normalised state.
    Prepare([Complex64; 2]),
}

impl Gate {
    /// Builds a state preparation gate, rejecting unnormalised amplitudes.
    pub fn prepare(amplitudes: [Complex64; 2]) -> Result<Self, CircuitError> {
        let gate = Gate::Prepare(amplitudes);
        gate.check_normalized()?;
        Ok(gate)
    }

    /// `Prepare` built directly from the variant skips [`Gate::prepare`];
    /// circuits re-check it on append.
    pub(crate) fn check_normalized(&self) -> Result<(), CircuitError> {
        if let Gate::Prepare([alpha, beta]) = self {
            let norm_sqr = alpha.norm_sqr() + beta.norm_sqr();
            if !((norm_sqr - 1.0).abs() <= NORM_TOLERANCE) {
                return Err(CircuitError::NotNormalized(norm_sqr));
            }
        }
        Ok(())
    }

    pub fn num_qubits(&self) -> usize {
        match self {
            Gate::Cnot | Gate::Cz | Gate::Swap => 2,
            _ => 1,
        }
    }

    /// Unitary of a single-qubit gate. For `Prepare` this is the rotation
    /// taking |0> to the target state.
    pub fn matrix(&self) -> Option<Matrix2> {
        let zero = Complex64::zero();
        let one = Complex64::one();
        let m = match *self {
            Gate::I => IDENTITY,
            Gate::X => PAULI_X,
            Gate::Y => [[zero, -Complex64::i()], [Complex64::i(), zero]],
            Gate::Z => PAULI_Z,
            Gate::H => {
                let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
                [[h, h], [h, -h]]
            }
            Gate::S => [[one, zero], [zero, Complex64::i()]],
            Gate::T => [[one, zero], [zero, Complex64::from_polar(1.0, FRAC_PI_4)]],
            Gate::Rx(theta) => {
                let c = Complex64::new((theta / 2.0).cos(), 0.0);
                let s = Complex64::new(0.0, -(theta / 2.0).sin());
                [[c, s], [s, c]]
            }
            Gate::Ry(theta) => {
                let c = Complex64::new((theta / 2.0).cos(), 0.0);
                let s = Complex64::new((theta / 2.0).sin(), 0.0);
                [[c, -s], [s, c]]
            }
            Gate::Rz(theta) => [
                [Complex64::from_polar(1.0, -theta / 2.0), zero],
                [zero, Complex64::from_polar(1.0, theta / 2.0)],
            ],
            Gate::Prepare([alpha, beta]) => [[alpha, -beta.conj()], [beta, alpha.conj()]],
            Gate::Cnot | Gate::Cz | Gate::Swap => return None,
        };
        Some(m)
    }

    /// Diagram symbols, one per qubit the gate acts on.
    pub fn symbols(&self) -> Vec<String> {
        match self {
            Gate::Cnot => vec!["@".into(), "X".into()],
            Gate::Cz => vec!["@".into(), "@".into()],
            Gate::Swap => vec!["×".into(), "×".into()],
            Gate::Rx(t) => vec![format!("Rx({t:.2})")],
            Gate::Ry(t) => vec![format!("Ry({t:.2})")],
            Gate::Rz(t) => vec![format!("Rz({t:.2})")],
            Gate::Prepare([a, b]) => vec![format!("Prep({:.2},{:.2})", a.re, b.re)],
            other => vec![format!("{other:?}")],
        }
    }

    pub fn on(self, qubit: &Qubit) -> Operation {
        Operation::gate(self, vec![qubit.clone()])
    }

    pub fn on_pair(self, first: &Qubit, second: &Qubit) -> Operation {
        Operation::gate(self, vec![first.clone(), second.clone()])
    }
}

pub fn mat_mul(a: &Matrix2, b: &Matrix2) -> Matrix2 {
    let mut out = [[Complex64::zero(); 2]; 2];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = a[r][0] * b[0][c] + a[r][1] * b[1][c];
        }
    }
    out
}

/// Conjugate transpose.
pub fn dagger(m: &Matrix2) -> Matrix2 {
    [
        [m[0][0].conj(), m[1][0].conj()],
        [m[0][1].conj(), m[1][1].conj()],
    ]
}

/// `U ρ U†`.
pub fn conjugate_by(u: &Matrix2, rho: &Matrix2) -> Matrix2 {
    mat_mul(&mat_mul(u, rho), &dagger(u))
}

pub fn approx_eq(a: &Matrix2, b: &Matrix2, tolerance: f64) -> bool {
    a.iter()
        .flatten()
        .zip(b.iter().flatten())
        .all(|(x, y)| (x - y).norm() < tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Matrix2 {
        Gate::I.matrix().unwrap()
    }

    #[test]
    fn test_single_qubit_gates_are_unitary() {
        let gates = [
            Gate::X,
            Gate::Y,
            Gate::Z,
            Gate::H,
            Gate::S,
            Gate::T,
            Gate::Rx(0.3),
            Gate::Ry(1.1),
            Gate::Rz(2.5),
        ];
        for gate in gates {
            let m = gate.matrix().unwrap();
            assert!(
                approx_eq(&mat_mul(&m, &dagger(&m)), &identity(), 1e-12),
                "{gate:?} is not unitary"
            );
        }
    }

    #[test]
    fn test_hadamard_squares_to_identity() {
        let h = Gate::H.matrix().unwrap();
        assert!(approx_eq(&mat_mul(&h, &h), &identity(), 1e-12));
    }

    #[test]
    fn test_prepare_maps_zero_to_target() {
        let minus = [
            Complex64::new(FRAC_1_SQRT_2, 0.0),
            Complex64::new(-FRAC_1_SQRT_2, 0.0),
        ];
        let m = Gate::prepare(minus).unwrap().matrix().unwrap();
        assert!((m[0][0] - minus[0]).norm() < 1e-12);
        assert!((m[1][0] - minus[1]).norm() < 1e-12);
        assert!(approx_eq(&mat_mul(&m, &dagger(&m)), &identity(), 1e-12));
    }

    #[test]
    fn test_prepare_rejects_unnormalised_state() {
        let bad = [Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)];
        assert!(matches!(
            Gate::prepare(bad),
            Err(CircuitError::NotNormalized(_))
        ));
    }

    #[test]
    fn test_two_qubit_gates_have_no_single_matrix() {
        assert_eq!(Gate::Cnot.num_qubits(), 2);
        assert!(Gate::Cnot.matrix().is_none());
        assert_eq!(Gate::Cnot.symbols(), vec!["@", "X"]);
    }
}
