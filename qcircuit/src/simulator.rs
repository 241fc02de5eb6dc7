//! Exact state-vector simulation of a [`Circuit`].

use std::collections::{BTreeMap, HashMap};

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::circuit::{Circuit, Moment, Operation};
use crate::error::CircuitError;
use crate::gate::Gate;
use crate::qubit::Qubit;
use crate::state::{StateVector, MAX_QUBITS};

/// Spreads repetition seeds apart (golden-ratio increment).
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub qubits: Vec<Qubit>,
    pub final_state: StateVector,
    pub measurements: BTreeMap<String, Vec<u8>>,
}

impl SimulationResult {
    pub fn measurement(&self, key: &str) -> Result<&[u8], CircuitError> {
        self.measurements
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| CircuitError::UnknownMeasurementKey(key.to_string()))
    }
}

/// State after one moment of a step-wise simulation.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub step: usize,
    pub moment: Moment,
    pub state: StateVector,
}

/// Measurement records of repeated runs, one bit string per repetition.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub repetitions: usize,
    pub records: BTreeMap<String, Vec<Vec<u8>>>,
}

impl RunResult {
    /// Outcome counts keyed by bit string, e.g. `"01" -> 512`.
    pub fn histogram(&self, key: &str) -> Result<BTreeMap<String, usize>, CircuitError> {
        let records = self
            .records
            .get(key)
            .ok_or_else(|| CircuitError::UnknownMeasurementKey(key.to_string()))?;
        let mut counts = BTreeMap::new();
        for bits in records {
            let label: String = bits.iter().map(|b| if *b == 1 { '1' } else { '0' }).collect();
            *counts.entry(label).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[derive(Debug, Clone)]
pub struct Simulator {
    rng: StdRng,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
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

    pub fn simulate(&mut self, circuit: &Circuit) -> Result<SimulationResult, CircuitError> {
        let mut run = Run::start(circuit)?;
        for moment in circuit.moments() {
            run.apply_moment(moment, &mut self.rng)?;
        }
        Ok(run.finish())
    }

    /// Simulates moment by moment, keeping the state after each one.
    pub fn simulate_moment_steps(
        &mut self,
        circuit: &Circuit,
    ) -> Result<Vec<StepResult>, CircuitError> {
        let mut run = Run::start(circuit)?;
        let mut steps = Vec::with_capacity(circuit.len());
        for (step, moment) in circuit.moments().iter().enumerate() {
            run.apply_moment(moment, &mut self.rng)?;
            steps.push(StepResult {
                step,
                moment: moment.clone(),
                state: run.state.clone(),
            });
        }
        Ok(steps)
    }

    /// Samples the circuit `repetitions` times. Each repetition gets its own
    /// seed drawn up front, so results depend only on this simulator's seed.
    pub fn run(&mut self, circuit: &Circuit, repetitions: usize) -> Result<RunResult, CircuitError> {
        let base: u64 = self.rng.gen();
        let seeds: Vec<u64> = (0..repetitions as u64)
            .map(|i| base.wrapping_add(i.wrapping_mul(SEED_STRIDE)))
            .collect();
        debug!(
            "sampling {} repetitions over {} qubits",
            repetitions,
            circuit.all_qubits().len()
        );

        let outcomes = sample_all(circuit, &seeds)?;
        let mut records: BTreeMap<String, Vec<Vec<u8>>> = BTreeMap::new();
        for measurements in outcomes {
            for (key, bits) in measurements {
                records.entry(key).or_default().push(bits);
            }
        }
        Ok(RunResult {
            repetitions,
            records,
        })
    }
}

fn sample_once(circuit: &Circuit, seed: u64) -> Result<BTreeMap<String, Vec<u8>>, CircuitError> {
    Simulator::seeded(seed)
        .simulate(circuit)
        .map(|result| result.measurements)
}

#[cfg(feature = "parallel")]
fn sample_all(
    circuit: &Circuit,
    seeds: &[u64],
) -> Result<Vec<BTreeMap<String, Vec<u8>>>, CircuitError> {
    seeds
        .par_iter()
        .map(|&seed| sample_once(circuit, seed))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn sample_all(
    circuit: &Circuit,
    seeds: &[u64],
) -> Result<Vec<BTreeMap<String, Vec<u8>>>, CircuitError> {
    seeds.iter().map(|&seed| sample_once(circuit, seed)).collect()
}

/// In-flight simulation over the circuit's qubits.
struct Run {
    qubits: Vec<Qubit>,
    index: HashMap<Qubit, usize>,
    state: StateVector,
    measurements: BTreeMap<String, Vec<u8>>,
}

impl Run {
    fn start(circuit: &Circuit) -> Result<Self, CircuitError> {
        let qubits = circuit.all_qubits();
        if qubits.len() > MAX_QUBITS {
            return Err(CircuitError::TooManyQubits {
                requested: qubits.len(),
                max: MAX_QUBITS,
            });
        }
        let index = qubits
            .iter()
            .enumerate()
            .map(|(i, q)| (q.clone(), i))
            .collect();
        let state = StateVector::zero(qubits.len())?;
        Ok(Self {
            qubits,
            index,
            state,
            measurements: BTreeMap::new(),
        })
    }

    fn position(&self, qubit: &Qubit) -> Result<usize, CircuitError> {
        self.index
            .get(qubit)
            .copied()
            .ok_or_else(|| CircuitError::UnknownQubit(qubit.name().to_string()))
    }

    fn apply_moment(&mut self, moment: &Moment, rng: &mut StdRng) -> Result<(), CircuitError> {
        for op in moment.operations() {
            self.apply(op, rng)?;
        }
        Ok(())
    }

    fn apply(&mut self, op: &Operation, rng: &mut StdRng) -> Result<(), CircuitError> {
        match op {
            Operation::Gate { gate, qubits } => {
                let targets = qubits
                    .iter()
                    .map(|q| self.position(q))
                    .collect::<Result<Vec<_>, _>>()?;
                match gate {
                    Gate::Cnot => {
                        let x = Gate::X.matrix().ok_or_else(|| arity(gate))?;
                        self.state.apply_controlled(targets[0], targets[1], &x);
                    }
                    Gate::Cz => {
                        let z = Gate::Z.matrix().ok_or_else(|| arity(gate))?;
                        self.state.apply_controlled(targets[0], targets[1], &z);
                    }
                    Gate::Swap => self.state.swap(targets[0], targets[1]),
                    Gate::Prepare(_) => {
                        let m = gate.matrix().ok_or_else(|| arity(gate))?;
                        self.state.reset(targets[0], rng);
                        self.state.apply_single(targets[0], &m);
                    }
                    single => {
                        let m = single.matrix().ok_or_else(|| arity(gate))?;
                        self.state.apply_single(targets[0], &m);
                    }
                }
            }
            Operation::Measure { qubits, key } => {
                let mut bits = Vec::with_capacity(qubits.len());
                for q in qubits {
                    let target = self.position(q)?;
                    bits.push(self.state.measure(target, rng));
                }
                self.measurements.insert(key.clone(), bits);
            }
        }
        Ok(())
    }

    fn finish(self) -> SimulationResult {
        SimulationResult {
            qubits: self.qubits,
            final_state: self.state,
            measurements: self.measurements,
        }
    }
}

fn arity(gate: &Gate) -> CircuitError {
    CircuitError::ArityMismatch {
        gate: format!("{gate:?}"),
        expected: gate.num_qubits(),
        got: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn superposition_circuit() -> (Qubit, Circuit) {
        let q = Qubit::named("Apolonia");
        let circuit =
            Circuit::from_operations([Gate::H.on(&q), Operation::measure(&[q.clone()], "m")])
                .unwrap();
        (q, circuit)
    }

    #[test]
    fn test_simulate_records_measurements() {
        let (_, circuit) = superposition_circuit();
        let result = Simulator::seeded(3).simulate(&circuit).unwrap();
        let bits = result.measurement("m").unwrap();
        assert_eq!(bits.len(), 1);
        assert!(bits[0] <= 1);
        assert!((result.final_state.norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_key() {
        let (_, circuit) = superposition_circuit();
        let result = Simulator::seeded(3).simulate(&circuit).unwrap();
        assert_eq!(
            result.measurement("nope").unwrap_err(),
            CircuitError::UnknownMeasurementKey("nope".into())
        );
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let qubits = Qubit::range(8, "rng_");
        let mut circuit = Circuit::new();
        for q in &qubits {
            circuit.append(Gate::H.on(q)).unwrap();
        }
        circuit.append(Operation::measure(&qubits, "m")).unwrap();

        let a = Simulator::seeded(99).simulate(&circuit).unwrap();
        let b = Simulator::seeded(99).simulate(&circuit).unwrap();
        assert_eq!(a.measurements, b.measurements);
    }

    #[test]
    fn test_moment_steps() {
        let (_, circuit) = superposition_circuit();
        let steps = Simulator::seeded(5).simulate_moment_steps(&circuit).unwrap();
        assert_eq!(steps.len(), 2);
        let probs = steps[0].state.probabilities();
        assert!((probs[0] - 0.5).abs() < 1e-12);
        let after_measure = steps[1].state.probabilities();
        assert!(after_measure.iter().any(|p| (p - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_prepare_resets_before_preparing() {
        let q = Qubit::named("q");
        let one = [num_complex::Complex64::new(0.0, 0.0), num_complex::Complex64::new(1.0, 0.0)];
        let circuit = Circuit::from_operations([
            Gate::X.on(&q),
            Gate::prepare(one).unwrap().on(&q),
            Operation::measure(&[q.clone()], "m"),
        ])
        .unwrap();
        for seed in 0..10 {
            let result = Simulator::seeded(seed).simulate(&circuit).unwrap();
            assert_eq!(result.measurement("m").unwrap(), &[1]);
        }
    }

    #[test]
    fn test_bell_histogram() {
        let q = Qubit::range(2, "q");
        let circuit = Circuit::from_operations([
            Gate::H.on(&q[0]),
            Gate::Cnot.on_pair(&q[0], &q[1]),
            Operation::measure(&q, "bell"),
        ])
        .unwrap();
        let run = Simulator::seeded(11).run(&circuit, 400).unwrap();
        let histogram = run.histogram("bell").unwrap();
        assert_eq!(histogram.keys().cloned().collect::<Vec<_>>(), vec!["00", "11"]);
        let zeros = histogram["00"] as f64 / 400.0;
        assert!((zeros - 0.5).abs() < 0.1, "ratio {zeros}");
    }

    #[test]
    fn test_run_is_reproducible() {
        let q = Qubit::range(3, "q");
        let mut circuit = Circuit::new();
        for qubit in &q {
            circuit.append(Gate::H.on(qubit)).unwrap();
        }
        circuit.append(Operation::measure(&q, "m")).unwrap();
        let a = Simulator::seeded(21).run(&circuit, 50).unwrap();
        let b = Simulator::seeded(21).run(&circuit, 50).unwrap();
        assert_eq!(a.records, b.records);
    }

    #[test]
    fn test_too_many_qubits_is_rejected_before_allocating() {
        let q = Qubit::range(MAX_QUBITS + 1, "q");
        let circuit = Circuit::from_operations([Operation::measure(&q, "m")]).unwrap();
        let expected = CircuitError::TooManyQubits {
            requested: MAX_QUBITS + 1,
            max: MAX_QUBITS,
        };
        let mut simulator = Simulator::seeded(1);
        assert_eq!(simulator.simulate(&circuit).unwrap_err(), expected);
        assert_eq!(simulator.simulate_moment_steps(&circuit).unwrap_err(), expected);
        assert_eq!(simulator.run(&circuit, 3).unwrap_err(), expected);
    }
}
