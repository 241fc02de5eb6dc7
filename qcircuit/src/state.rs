//! Dense state vector over `n` qubits, qubit 0 most significant.

use std::fmt;

use num_complex::Complex64;
use num_traits::Zero;
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::CircuitError;
use crate::gate::{Matrix2, NORM_TOLERANCE};

/// Largest register the simulator will allocate.
pub const MAX_QUBITS: usize = 24;

/// Registers at least this wide update amplitudes on the rayon pool.
const PARALLEL_THRESHOLD: usize = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
}

impl StateVector {
    /// |0...0> on `num_qubits` qubits.
    pub fn zero(num_qubits: usize) -> Result<Self, CircuitError> {
        if num_qubits > MAX_QUBITS {
            return Err(CircuitError::TooManyQubits {
                requested: num_qubits,
                max: MAX_QUBITS,
            });
        }
        let mut amplitudes = vec![Complex64::zero(); 1 << num_qubits];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> Result<Self, CircuitError> {
        let dim = amplitudes.len();
        if !dim.is_power_of_two() {
            return Err(CircuitError::InvalidDimension(dim));
        }
        let num_qubits = dim.trailing_zeros() as usize;
        if num_qubits > MAX_QUBITS {
            return Err(CircuitError::TooManyQubits {
                requested: num_qubits,
                max: MAX_QUBITS,
            });
        }
        let norm_sqr: f64 = amplitudes.iter().map(|a| a.norm_sqr()).sum();
        if (norm_sqr - 1.0).abs() > NORM_TOLERANCE {
            return Err(CircuitError::NotNormalized(norm_sqr));
        }
        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub fn norm(&self) -> f64 {
        self.amplitudes
            .iter()
            .map(|a| a.norm_sqr())
            .sum::<f64>()
            .sqrt()
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    fn mask(&self, qubit: usize) -> usize {
        1 << (self.num_qubits - 1 - qubit)
    }

    pub fn apply_single(&mut self, target: usize, m: &Matrix2) {
        let stride = self.mask(target);
        let parallel = self.num_qubits >= PARALLEL_THRESHOLD;
        for_each_chunk(&mut self.amplitudes, 2 * stride, parallel, |chunk| {
            let (lo, hi) = chunk.split_at_mut(stride);
            for (a0, a1) in lo.iter_mut().zip(hi.iter_mut()) {
                let (x0, x1) = (*a0, *a1);
                *a0 = m[0][0] * x0 + m[0][1] * x1;
                *a1 = m[1][0] * x0 + m[1][1] * x1;
            }
        });
    }

    /// Applies `m` to `target` on the branch where `control` is |1>.
    pub fn apply_controlled(&mut self, control: usize, target: usize, m: &Matrix2) {
        let cmask = self.mask(control);
        let tmask = self.mask(target);
        for i in 0..self.amplitudes.len() {
            if i & cmask != 0 && i & tmask == 0 {
                let j = i | tmask;
                let (x0, x1) = (self.amplitudes[i], self.amplitudes[j]);
                self.amplitudes[i] = m[0][0] * x0 + m[0][1] * x1;
                self.amplitudes[j] = m[1][0] * x0 + m[1][1] * x1;
            }
        }
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        let amask = self.mask(a);
        let bmask = self.mask(b);
        for i in 0..self.amplitudes.len() {
            if i & amask != 0 && i & bmask == 0 {
                self.amplitudes.swap(i, i ^ amask ^ bmask);
            }
        }
    }

    /// Born-rule probability of reading 1 on `target`.
    pub fn probability_of_one(&self, target: usize) -> f64 {
        let mask = self.mask(target);
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum()
    }

    /// Projective Z measurement of `target`; the state collapses onto the outcome.
    pub fn measure<R: Rng>(&mut self, target: usize, rng: &mut R) -> u8 {
        let p_one = self.probability_of_one(target).clamp(0.0, 1.0);
        let outcome = u8::from(rng.gen::<f64>() < p_one);
        let kept = if outcome == 1 { p_one } else { 1.0 - p_one };
        let scale = 1.0 / kept.sqrt();
        let mask = self.mask(target);
        for (i, a) in self.amplitudes.iter_mut().enumerate() {
            if u8::from(i & mask != 0) == outcome {
                *a *= scale;
            } else {
                *a = Complex64::zero();
            }
        }
        outcome
    }

    /// Returns `target` to |0>.
    pub fn reset<R: Rng>(&mut self, target: usize, rng: &mut R) {
        if self.measure(target, rng) == 1 {
            let mask = self.mask(target);
            for i in 0..self.amplitudes.len() {
                if i & mask == 0 {
                    self.amplitudes.swap(i, i | mask);
                }
            }
        }
    }

    /// Reduced density matrix of one qubit, tracing out the rest.
    pub fn density_matrix_of(&self, target: usize) -> Matrix2 {
        let mask = self.mask(target);
        let mut rho = [[Complex64::zero(); 2]; 2];
        for i in (0..self.amplitudes.len()).filter(|i| i & mask == 0) {
            let a0 = self.amplitudes[i];
            let a1 = self.amplitudes[i | mask];
            rho[0][0] += a0 * a0.conj();
            rho[0][1] += a0 * a1.conj();
            rho[1][0] += a1 * a0.conj();
            rho[1][1] += a1 * a1.conj();
        }
        rho
    }
}

#[cfg(feature = "parallel")]
fn for_each_chunk<F>(amplitudes: &mut [Complex64], size: usize, parallel: bool, kernel: F)
where
    F: Fn(&mut [Complex64]) + Sync + Send,
{
    if parallel {
        amplitudes.par_chunks_mut(size).for_each(kernel);
    } else {
        amplitudes.chunks_mut(size).for_each(kernel);
    }
}

#[cfg(not(feature = "parallel"))]
fn for_each_chunk<F>(amplitudes: &mut [Complex64], size: usize, _parallel: bool, kernel: F)
where
    F: Fn(&mut [Complex64]),
{
    amplitudes.chunks_mut(size).for_each(kernel);
}

fn format_amplitude(a: Complex64) -> String {
    if a.im.abs() < 1e-9 {
        format!("{:.3}", a.re)
    } else if a.re.abs() < 1e-9 {
        format!("{:.3}i", a.im)
    } else {
        format!("({:.3}{:+.3}i)", a.re, a.im)
    }
}

impl fmt::Display for StateVector {
    /// Dirac notation, skipping zero amplitudes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.norm() > 1e-9)
            .map(|(i, a)| {
                format!(
                    "{}|{:0width$b}⟩",
                    format_amplitude(*a),
                    i,
                    width = self.num_qubits.max(1)
                )
            })
            .collect();
        if terms.is_empty() {
            write!(f, "0")
        } else {
            write!(f, "{}", terms.join(" + "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Gate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::FRAC_1_SQRT_2;

    #[test]
    fn test_hadamard_superposition() {
        let mut state = StateVector::zero(1).unwrap();
        state.apply_single(0, &Gate::H.matrix().unwrap());
        let probs = state.probabilities();
        assert!((probs[0] - 0.5).abs() < 1e-12);
        assert!((probs[1] - 0.5).abs() < 1e-12);
        assert!((state.norm() - 1.0).abs() < 1e-12);
        assert_eq!(state.to_string(), "0.707|0⟩ + 0.707|1⟩");
    }

    #[test]
    fn test_first_qubit_is_most_significant() {
        let mut state = StateVector::zero(2).unwrap();
        state.apply_single(0, &Gate::X.matrix().unwrap());
        assert!((state.amplitudes()[0b10].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bell_pair() {
        let mut state = StateVector::zero(2).unwrap();
        state.apply_single(0, &Gate::H.matrix().unwrap());
        state.apply_controlled(0, 1, &Gate::X.matrix().unwrap());
        let probs = state.probabilities();
        assert!((probs[0b00] - 0.5).abs() < 1e-12);
        assert!((probs[0b11] - 0.5).abs() < 1e-12);
        assert!(probs[0b01].abs() < 1e-12);
    }

    #[test]
    fn test_measurement_collapses_entangled_partner() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut state = StateVector::zero(2).unwrap();
            state.apply_single(0, &Gate::H.matrix().unwrap());
            state.apply_controlled(0, 1, &Gate::X.matrix().unwrap());
            let first = state.measure(0, &mut rng);
            let second = state.measure(1, &mut rng);
            assert_eq!(first, second);
            assert!((state.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_measurement_statistics() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 4000;
        let ones: usize = (0..trials)
            .map(|_| {
                let mut state = StateVector::zero(1).unwrap();
                state.apply_single(0, &Gate::H.matrix().unwrap());
                state.measure(0, &mut rng) as usize
            })
            .sum();
        let ratio = ones as f64 / trials as f64;
        assert!((ratio - 0.5).abs() < 0.05, "ratio {ratio}");
    }

    #[test]
    fn test_reset_returns_to_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = StateVector::zero(1).unwrap();
        state.apply_single(0, &Gate::X.matrix().unwrap());
        state.reset(0, &mut rng);
        assert!((state.amplitudes()[0].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_swap() {
        let mut state = StateVector::zero(2).unwrap();
        state.apply_single(1, &Gate::X.matrix().unwrap());
        state.swap(0, 1);
        assert!((state.amplitudes()[0b10].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_density_matrix_of_plus_state() {
        let mut state = StateVector::zero(1).unwrap();
        state.apply_single(0, &Gate::H.matrix().unwrap());
        let rho = state.density_matrix_of(0);
        for row in rho {
            for cell in row {
                assert!((cell.re - 0.5).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_rejects_oversized_register() {
        assert!(matches!(
            StateVector::zero(MAX_QUBITS + 1),
            Err(CircuitError::TooManyQubits { .. })
        ));
    }

    #[test]
    fn test_from_amplitudes_validates() {
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        assert!(StateVector::from_amplitudes(vec![h, h]).is_ok());
        assert!(matches!(
            StateVector::from_amplitudes(vec![h, h, h]),
            Err(CircuitError::InvalidDimension(3))
        ));
        assert!(matches!(
            StateVector::from_amplitudes(vec![h, h, h, h]),
            Err(CircuitError::NotNormalized(_))
        ));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_path_matches_serial_result() {
        let mut state = StateVector::zero(PARALLEL_THRESHOLD).unwrap();
        for q in 0..PARALLEL_THRESHOLD {
            state.apply_single(q, &Gate::H.matrix().unwrap());
        }
        let expected = 1.0 / (1u64 << PARALLEL_THRESHOLD) as f64;
        assert!(state
            .probabilities()
            .iter()
            .all(|p| (p - expected).abs() < 1e-12));
    }
}
