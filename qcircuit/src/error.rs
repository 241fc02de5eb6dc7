use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CircuitError {
    #[error("{requested} qubits requested, the simulator holds at most {max}")]
    TooManyQubits { requested: usize, max: usize },

    #[error("Gate {gate} acts on {expected} qubit(s), got {got}")]
    ArityMismatch {
        gate: String,
        expected: usize,
        got: usize,
    },

    #[error("Duplicate qubit in operation: {0}")]
    DuplicateQubit(String),

    #[error("Vector is not normalized. Norm squared: {0}")]
    NotNormalized(f64),

    #[error("State dimension {0} is not a power of two")]
    InvalidDimension(usize),

    #[error("Measurement key '{0}' is used more than once")]
    DuplicateMeasurementKey(String),

    #[error("No measurement recorded under key '{0}'")]
    UnknownMeasurementKey(String),

    #[error("Measurement must target at least one qubit")]
    EmptyMeasurement,

    #[error("Qubit {0} is not part of the simulated register")]
    UnknownQubit(String),
}
