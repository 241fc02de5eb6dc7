//! One module per walkthrough. Each prints its narrative to stdout.

pub mod amplify;
pub mod bb84;
pub mod otp;
pub mod qrng;
pub mod reconcile;
pub mod tour;

use qcircuit::{ClassicalRng, QuantumRng, Simulator};

/// One independent stream per component drawn from the `--seed` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stream {
    Simulator = 1,
    Classical = 2,
    Quantum = 3,
}

/// SplitMix64 finaliser over the seed and stream tag.
pub(crate) fn sub_seed(seed: u64, stream: Stream) -> u64 {
    let mut z = seed.wrapping_add((stream as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub(crate) fn simulator(seed: Option<u64>) -> Simulator {
    seed.map_or_else(Simulator::new, |s| {
        Simulator::seeded(sub_seed(s, Stream::Simulator))
    })
}

pub(crate) fn classical_rng(seed: Option<u64>) -> ClassicalRng {
    seed.map_or_else(ClassicalRng::new, |s| {
        ClassicalRng::seeded(sub_seed(s, Stream::Classical))
    })
}

pub(crate) fn quantum_rng(seed: Option<u64>) -> QuantumRng {
    seed.map_or_else(QuantumRng::new, |s| {
        QuantumRng::seeded(sub_seed(s, Stream::Quantum))
    })
}

pub(crate) fn heading(title: &str) {
    println!("\n== {title} ==\n");
}
