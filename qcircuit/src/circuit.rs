//! Operations, moments and circuits.
//!
//! Operations are placed with the "earliest" strategy: an appended operation
//! lands in the moment right after the last moment touching any of its qubits.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use smallvec::SmallVec;

use crate::error::CircuitError;
use crate::gate::Gate;
use crate::qubit::Qubit;

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Gate {
        gate: Gate,
        qubits: SmallVec<[Qubit; 2]>,
    },
    Measure {
        qubits: Vec<Qubit>,
        key: String,
    },
}

impl Operation {
    pub fn gate(gate: Gate, qubits: Vec<Qubit>) -> Self {
        Operation::Gate {
            gate,
            qubits: SmallVec::from_vec(qubits),
        }
    }

    pub fn measure(qubits: &[Qubit], key: impl Into<String>) -> Self {
        Operation::Measure {
            qubits: qubits.to_vec(),
            key: key.into(),
        }
    }

    pub fn qubits(&self) -> &[Qubit] {
        match self {
            Operation::Gate { qubits, .. } => qubits.as_slice(),
            Operation::Measure { qubits, .. } => qubits.as_slice(),
        }
    }

    fn validate(&self) -> Result<(), CircuitError> {
        match self {
            Operation::Gate { gate, qubits } => {
                if gate.num_qubits() != qubits.len() {
                    return Err(CircuitError::ArityMismatch {
                        gate: format!("{gate:?}"),
                        expected: gate.num_qubits(),
                        got: qubits.len(),
                    });
                }
                gate.check_normalized()?;
            }
            Operation::Measure { qubits, .. } => {
                if qubits.is_empty() {
                    return Err(CircuitError::EmptyMeasurement);
                }
            }
        }
        let mut seen = HashSet::new();
        for q in self.qubits() {
            if !seen.insert(q) {
                return Err(CircuitError::DuplicateQubit(q.name().to_string()));
            }
        }
        Ok(())
    }

    fn symbol_for(&self, qubit: &Qubit) -> Option<String> {
        let position = self.qubits().iter().position(|q| q == qubit)?;
        match self {
            Operation::Gate { gate, .. } => gate.symbols().into_iter().nth(position),
            Operation::Measure { key, .. } if position == 0 => Some(format!("M('{key}')")),
            Operation::Measure { .. } => Some("M".to_string()),
        }
    }
}

/// Operations that run in the same time slice on disjoint qubits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Moment {
    operations: Vec<Operation>,
}

impl Moment {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn touches(&self, qubits: &[Qubit]) -> bool {
        self.operations
            .iter()
            .any(|op| op.qubits().iter().any(|q| qubits.contains(q)))
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .operations
            .iter()
            .map(|op| {
                let names: Vec<&str> = op.qubits().iter().map(Qubit::name).collect();
                match op {
                    Operation::Gate { gate, .. } => format!("{gate:?}({})", names.join(", ")),
                    Operation::Measure { key, .. } => {
                        format!("measure[{key}]({})", names.join(", "))
                    }
                }
            })
            .collect();
        write!(f, "{}", parts.join(" and "))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Circuit {
    moments: Vec<Moment>,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_operations<I>(operations: I) -> Result<Self, CircuitError>
    where
        I: IntoIterator<Item = Operation>,
    {
        let mut circuit = Self::new();
        circuit.extend(operations)?;
        Ok(circuit)
    }

    pub fn append(&mut self, operation: Operation) -> Result<(), CircuitError> {
        operation.validate()?;
        if let Operation::Measure { key, .. } = &operation {
            if self.measurement_keys().contains(&key.as_str()) {
                return Err(CircuitError::DuplicateMeasurementKey(key.clone()));
            }
        }

        let slot = self
            .moments
            .iter()
            .rposition(|m| m.touches(operation.qubits()))
            .map_or(0, |last| last + 1);
        if slot == self.moments.len() {
            self.moments.push(Moment::default());
        }
        self.moments[slot].operations.push(operation);
        Ok(())
    }

    pub fn extend<I>(&mut self, operations: I) -> Result<(), CircuitError>
    where
        I: IntoIterator<Item = Operation>,
    {
        for op in operations {
            self.append(op)?;
        }
        Ok(())
    }

    pub fn moments(&self) -> &[Moment] {
        &self.moments
    }

    pub fn len(&self) -> usize {
        self.moments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }

    /// Every qubit in the circuit, in natural order.
    pub fn all_qubits(&self) -> Vec<Qubit> {
        self.operations()
            .flat_map(|op| op.qubits().iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn measurement_keys(&self) -> Vec<&str> {
        self.operations()
            .filter_map(|op| match op {
                Operation::Measure { key, .. } => Some(key.as_str()),
                Operation::Gate { .. } => None,
            })
            .collect()
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.moments.iter().flat_map(|m| m.operations.iter())
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let qubits = self.all_qubits();
        let label_width = qubits.iter().map(|q| q.name().chars().count()).max().unwrap_or(0);
        let mut lines: Vec<String> = qubits
            .iter()
            .map(|q| format!("{:>label_width$}: ───", q.name()))
            .collect();

        for moment in &self.moments {
            let cells: Vec<Option<String>> = qubits
                .iter()
                .map(|q| moment.operations.iter().find_map(|op| op.symbol_for(q)))
                .collect();
            let width = cells
                .iter()
                .flatten()
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(1);
            for (line, cell) in lines.iter_mut().zip(cells) {
                let symbol = cell.unwrap_or_default();
                let pad = width - symbol.chars().count();
                line.push_str(&symbol);
                line.push_str(&"─".repeat(pad));
                line.push_str("───");
            }
        }

        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
                writeln!(f)?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}
