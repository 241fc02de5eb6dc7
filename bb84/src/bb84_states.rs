use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

use num_complex::Complex64;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The four BB84 states.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BB84State {
    QubitZero,
    QubitOne,
    QubitPlus,  // Represents the |+> state
    QubitMinus, // Represents the |-> state
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementBasis {
    /// |0>, |1>. Basis bit 0.
    Rectilinear,
    /// |+>, |->. Basis bit 1.
    Diagonal,
}

impl MeasurementBasis {
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::from_bit(u8::from(rng.gen::<bool>()))
    }

    pub fn from_bit(bit: u8) -> Self {
        if bit == 0 {
            MeasurementBasis::Rectilinear
        } else {
            MeasurementBasis::Diagonal
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            MeasurementBasis::Rectilinear => 0,
            MeasurementBasis::Diagonal => 1,
        }
    }
}

impl fmt::Display for MeasurementBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementBasis::Rectilinear => f.write_str("+"),
            MeasurementBasis::Diagonal => f.write_str("x"),
        }
    }
}

impl BB84State {
    /// State Alice sends for data bit `bit` in `basis`.
    pub fn prepare(bit: u8, basis: MeasurementBasis) -> Self {
        match (basis, bit) {
            (MeasurementBasis::Rectilinear, 0) => BB84State::QubitZero,
            (MeasurementBasis::Rectilinear, _) => BB84State::QubitOne,
            (MeasurementBasis::Diagonal, 0) => BB84State::QubitPlus,
            (MeasurementBasis::Diagonal, _) => BB84State::QubitMinus,
        }
    }

    pub fn basis(self) -> MeasurementBasis {
        match self {
            BB84State::QubitZero | BB84State::QubitOne => MeasurementBasis::Rectilinear,
            BB84State::QubitPlus | BB84State::QubitMinus => MeasurementBasis::Diagonal,
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            BB84State::QubitZero | BB84State::QubitPlus => 0,
            BB84State::QubitOne | BB84State::QubitMinus => 1,
        }
    }

    /// Amplitudes on |0> and |1>.
    pub fn amplitudes(self) -> [Complex64; 2] {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        match self {
            BB84State::QubitZero => [one, zero],
            BB84State::QubitOne => [zero, one],
            BB84State::QubitPlus => [h, h],
            BB84State::QubitMinus => [h, -h],
        }
    }

    /// Bit flip within the same basis, the effect of channel noise.
    pub fn flip(self) -> Self {
        match self {
            BB84State::QubitZero => BB84State::QubitOne,
            BB84State::QubitOne => BB84State::QubitZero,
            BB84State::QubitPlus => BB84State::QubitMinus,
            BB84State::QubitMinus => BB84State::QubitPlus,
        }
    }

    /// Ideal measurement: exact in the preparation basis, a fair coin otherwise.
    pub fn measure<R: Rng>(self, basis: MeasurementBasis, rng: &mut R) -> u8 {
        if self.basis() == basis {
            self.bit()
        } else {
            u8::from(rng.gen::<bool>())
        }
    }
}

impl fmt::Display for BB84State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BB84State::QubitZero => "|0>",
            BB84State::QubitOne => "|1>",
            BB84State::QubitPlus => "|+>",
            BB84State::QubitMinus => "|->",
        };
        f.write_str(label)
    }
}
