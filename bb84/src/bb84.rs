//! The BB84 protocol over the simulated quantum channel.
//!
//! A round follows the textbook flow: Alice prepares `(4+δ)n` qubits, Bob
//! measures them in random bases, both keep the positions where the bases
//! matched, sacrifice half of those to estimate the error rate, reconcile the
//! rest and compress it with a universal hash. A round that sifts too few bits
//! or sees too many errors aborts; [`Bb84Session::run_with_restarts`] retries.

use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};
use qcircuit::{Circuit, Gate, Operation, Qubit, RandomBitSource, Simulator};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::bb84_states::{BB84State, MeasurementBasis};
use crate::bits::{bits_to_string, hamming_distance};
use crate::error::Bb84Error;
use crate::error_correction::{cascade_correction, reconcile, ParityCheckMatrix, Reconciled};
use crate::privacy_amplification::{apply_privacy_amplification, keys_match};

pub const ALICE_QUBIT_PREFIX: &str = "alice_";
pub const BOB_MEASUREMENT_KEY: &str = "bob_measurement";
/// Channel qubits are independent, so each circuit carries at most this many.
pub const CHANNEL_BATCH: usize = 16;

/// Upper bound on qubits sent per round.
pub const MAX_STRING_LENGTH: usize = 1 << 20;
/// Block sizes stop growing long before this many passes.
pub const MAX_CASCADE_PASSES: usize = 32;

/// Keep the session's classical and quantum streams apart from each other and
/// from a source seeded with the same value.
const RNG_SALT: u64 = 0x5EED_B884;
const SIMULATOR_SALT: u64 = 0xC4A7_7E1D_0B84_5A17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reconciliation {
    /// Blocks of three with the `[[1,1,0],[0,1,1]]` check matrix.
    Parity3,
    Hamming74,
    Cascade,
}

impl FromStr for Reconciliation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parity3" => Ok(Reconciliation::Parity3),
            "hamming74" | "hamming" => Ok(Reconciliation::Hamming74),
            "cascade" => Ok(Reconciliation::Cascade),
            other => Err(format!(
                "unknown reconciliation '{other}', expected parity3, hamming74 or cascade"
            )),
        }
    }
}

impl fmt::Display for Reconciliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reconciliation::Parity3 => "parity3",
            Reconciliation::Hamming74 => "hamming74",
            Reconciliation::Cascade => "cascade",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bb84Params {
    /// Target raw key length; `2n` sifted bits are needed per round.
    pub n: usize,
    /// Slack on the number of qubits sent, `(4+δ)n`.
    pub delta: f64,
    /// Share of the sifted bits revealed for error estimation.
    pub check_fraction: f64,
    /// Abort threshold on the estimated error rate.
    pub max_error_rate: f64,
    /// Probability that the channel applies a random Pauli to a qubit.
    pub noise: f64,
    /// Probability that Eve intercepts and resends a qubit.
    pub eavesdropper: f64,
    pub reconciliation: Reconciliation,
    pub cascade_passes: usize,
    /// Defaults to the raw key length minus the bits leaked in reconciliation.
    pub final_key_len: Option<usize>,
    pub max_attempts: usize,
}

impl Default for Bb84Params {
    fn default() -> Self {
        Self {
            n: 16,
            delta: 0.23,
            check_fraction: 0.5,
            max_error_rate: 0.11,
            noise: 0.0,
            eavesdropper: 0.0,
            reconciliation: Reconciliation::Hamming74,
            cascade_passes: 3,
            final_key_len: None,
            max_attempts: 5,
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), Bb84Error> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Bb84Error::InvalidParameter(format!(
            "{name} = {value} is not a probability"
        )));
    }
    Ok(())
}

impl Bb84Params {
    /// Qubits Alice sends per round.
    pub fn string_length(&self) -> usize {
        ((4.0 + self.delta) * self.n as f64).ceil() as usize
    }

    pub fn validate(&self) -> Result<(), Bb84Error> {
        if self.n == 0 {
            return Err(Bb84Error::InvalidParameter("n must be positive".into()));
        }
        if !(self.delta >= 0.0 && self.delta.is_finite()) {
            return Err(Bb84Error::InvalidParameter(format!(
                "delta = {} must be a non-negative number",
                self.delta
            )));
        }
        let qubits = (4.0 + self.delta) * self.n as f64;
        if qubits > MAX_STRING_LENGTH as f64 {
            return Err(Bb84Error::InvalidParameter(format!(
                "n = {} with delta = {} needs {:.0} qubits per round, at most {} allowed",
                self.n, self.delta, qubits, MAX_STRING_LENGTH
            )));
        }
        if !(0.0..1.0).contains(&self.check_fraction) {
            return Err(Bb84Error::InvalidParameter(format!(
                "check_fraction = {} must lie in [0, 1)",
                self.check_fraction
            )));
        }
        check_probability("max_error_rate", self.max_error_rate)?;
        check_probability("noise", self.noise)?;
        check_probability("eavesdropper", self.eavesdropper)?;
        if self.reconciliation == Reconciliation::Cascade
            && !(1..=MAX_CASCADE_PASSES).contains(&self.cascade_passes)
        {
            return Err(Bb84Error::InvalidParameter(format!(
                "cascade_passes = {} must lie in 1..={}",
                self.cascade_passes, MAX_CASCADE_PASSES
            )));
        }
        if self.final_key_len == Some(0) {
            return Err(Bb84Error::InvalidParameter(
                "final_key_len must be positive".into(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(Bb84Error::InvalidParameter(
                "max_attempts must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Everything both parties saw or published in one successful round.
#[derive(Debug, Clone, PartialEq)]
pub struct Bb84Transcript {
    /// Alice's data string `a`.
    pub alice_bits: Vec<u8>,
    /// Alice's basis string `b`.
    pub alice_bases: Vec<u8>,
    /// Bob's basis string `b'`.
    pub bob_bases: Vec<u8>,
    /// Bob's decoded string `a'`.
    pub bob_bits: Vec<u8>,
    pub noisy_positions: Vec<usize>,
    pub intercepted_positions: Vec<usize>,
    /// Positions where `b == b'`, truncated to `2n`.
    pub sifted_positions: Vec<usize>,
    pub alice_sifted: Vec<u8>,
    pub bob_sifted: Vec<u8>,
    /// Indices into the sifted strings revealed for error estimation.
    pub check_positions: Vec<usize>,
    pub alice_check_bits: Vec<u8>,
    pub bob_check_bits: Vec<u8>,
    pub mismatches: usize,
    pub error_rate: f64,
    pub alice_raw_key: Vec<u8>,
    pub bob_raw_key: Vec<u8>,
    pub reconciliation: Reconciled,
    pub hash_seed: u64,
    pub alice_key: Vec<u8>,
    pub bob_key: Vec<u8>,
    pub keys_confirmed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bb84Outcome {
    pub transcript: Bb84Transcript,
    /// Rounds run, including the successful one.
    pub attempts: usize,
}

struct ChannelRecord {
    bob_bits: Vec<u8>,
    noisy_positions: Vec<usize>,
    intercepted_positions: Vec<usize>,
}

pub struct Bb84Session<S> {
    params: Bb84Params,
    source: S,
    simulator: Simulator,
    rng: StdRng,
}

impl<S: RandomBitSource> Bb84Session<S> {
    pub fn new(params: Bb84Params, source: S) -> Result<Self, Bb84Error> {
        params.validate()?;
        Ok(Self {
            params,
            source,
            simulator: Simulator::new(),
            rng: StdRng::from_entropy(),
        })
    }

    /// Reproducible session, provided `source` is seeded as well.
    pub fn seeded(params: Bb84Params, source: S, seed: u64) -> Result<Self, Bb84Error> {
        params.validate()?;
        Ok(Self {
            params,
            source,
            simulator: Simulator::seeded(seed ^ SIMULATOR_SALT),
            rng: StdRng::seed_from_u64(seed ^ RNG_SALT),
        })
    }

    pub fn params(&self) -> &Bb84Params {
        &self.params
    }

    /// Random Pauli for the noisy channel. X flips rectilinear states, Z flips
    /// diagonal ones, Y flips both.
    fn random_pauli(&mut self) -> Gate {
        match self.rng.gen_range(0..3) {
            0 => Gate::X,
            1 => Gate::Y,
            _ => Gate::Z,
        }
    }

    fn transmit(
        &mut self,
        alice_bits: &[u8],
        alice_bases: &[u8],
        bob_bases: &[u8],
    ) -> Result<ChannelRecord, Bb84Error> {
        let len = alice_bits.len();
        let mut record = ChannelRecord {
            bob_bits: Vec::with_capacity(len),
            noisy_positions: Vec::new(),
            intercepted_positions: Vec::new(),
        };

        for start in (0..len).step_by(CHANNEL_BATCH) {
            let end = (start + CHANNEL_BATCH).min(len);
            let qubits = Qubit::range_from(start, end - start, ALICE_QUBIT_PREFIX);
            let mut circuit = Circuit::new();

            for (i, q) in (start..end).zip(&qubits) {
                let state =
                    BB84State::prepare(alice_bits[i], MeasurementBasis::from_bit(alice_bases[i]));
                circuit.append(Gate::prepare(state.amplitudes())?.on(q))?;

                if self.params.noise > 0.0 && self.rng.gen_bool(self.params.noise) {
                    let pauli = self.random_pauli();
                    circuit.append(pauli.on(q))?;
                    record.noisy_positions.push(i);
                }

                if self.params.eavesdropper > 0.0 && self.rng.gen_bool(self.params.eavesdropper) {
                    // Intercept-resend: measure in a random basis, forward what was seen.
                    let diagonal =
                        MeasurementBasis::random(&mut self.rng) == MeasurementBasis::Diagonal;
                    if diagonal {
                        circuit.append(Gate::H.on(q))?;
                    }
                    circuit.append(Operation::measure(std::slice::from_ref(q), format!("eve_{i}")))?;
                    if diagonal {
                        circuit.append(Gate::H.on(q))?;
                    }
                    record.intercepted_positions.push(i);
                }

                if bob_bases[i] == 1 {
                    circuit.append(Gate::H.on(q))?;
                }
            }
            circuit.append(Operation::measure(&qubits, BOB_MEASUREMENT_KEY))?;

            let result = self.simulator.simulate(&circuit)?;
            record
                .bob_bits
                .extend_from_slice(result.measurement(BOB_MEASUREMENT_KEY)?);
        }
        Ok(record)
    }

    /// One round. Sifting and error-rate aborts come back as errors for which
    /// [`Bb84Error::is_restartable`] holds.
    pub fn run(&mut self) -> Result<Bb84Transcript, Bb84Error> {
        let params = self.params.clone();
        let len = params.string_length();

        // Step 1: Alice's strings, Bob's bases.
        let alice_bits = self.source.generate_bits(len)?;
        let alice_bases = self.source.generate_bits(len)?;
        let bob_bases = self.source.generate_bits(len)?;

        // Steps 2-3: quantum channel and Bob's measurement.
        let channel = self.transmit(&alice_bits, &alice_bases, &bob_bases)?;
        let bob_bits = channel.bob_bits;
        debug!("alice a : {}", bits_to_string(&alice_bits));
        debug!("bob   a': {}", bits_to_string(&bob_bits));
        debug!("alice b : {}", bits_to_string(&alice_bases));
        debug!("bob   b': {}", bits_to_string(&bob_bases));

        // Step 4: basis announcement and sifting.
        let needed = params.n.checked_mul(2).ok_or_else(|| {
            Bb84Error::InvalidParameter(format!("n = {} is too large", params.n))
        })?;
        let mut sifted_positions: Vec<usize> =
            (0..len).filter(|&i| alice_bases[i] == bob_bases[i]).collect();
        if sifted_positions.len() < needed {
            warn!(
                "only {} of {} bases matched, {} needed",
                sifted_positions.len(),
                len,
                needed
            );
            return Err(Bb84Error::InsufficientSiftedBits {
                got: sifted_positions.len(),
                needed,
            });
        }
        sifted_positions.truncate(needed);
        let alice_sifted: Vec<u8> = sifted_positions.iter().map(|&i| alice_bits[i]).collect();
        let bob_sifted: Vec<u8> = sifted_positions.iter().map(|&i| bob_bits[i]).collect();

        // Step 5: parameter estimation on a random subset.
        let checks = (needed as f64 * params.check_fraction).floor() as usize;
        let mut check_positions = index::sample(&mut self.rng, needed, checks).into_vec();
        check_positions.sort_unstable();
        let alice_check_bits: Vec<u8> = check_positions.iter().map(|&i| alice_sifted[i]).collect();
        let bob_check_bits: Vec<u8> = check_positions.iter().map(|&i| bob_sifted[i]).collect();
        let mismatches = hamming_distance(&alice_check_bits, &bob_check_bits);
        let error_rate = if checks == 0 {
            0.0
        } else {
            mismatches as f64 / checks as f64
        };
        if error_rate > params.max_error_rate {
            warn!(
                "{} of {} check bits disagree (rate {:.3} > {:.3})",
                mismatches, checks, error_rate, params.max_error_rate
            );
            return Err(Bb84Error::ErrorRateExceeded {
                rate: error_rate,
                threshold: params.max_error_rate,
                mismatches,
                checks,
            });
        }

        // Step 6: the unrevealed bits are the raw key.
        let mut revealed = vec![false; needed];
        for &i in &check_positions {
            revealed[i] = true;
        }
        let keep = |bits: &[u8]| -> Vec<u8> {
            bits.iter()
                .zip(&revealed)
                .filter(|&(_, &r)| !r)
                .map(|(&b, _)| b)
                .collect()
        };
        let alice_raw_key = keep(&alice_sifted);
        let bob_raw_key = keep(&bob_sifted);

        // Step 7: information reconciliation.
        let reconciliation = match params.reconciliation {
            Reconciliation::Parity3 => {
                reconcile(&alice_raw_key, &bob_raw_key, &ParityCheckMatrix::three_bit())?
            }
            Reconciliation::Hamming74 => {
                reconcile(&alice_raw_key, &bob_raw_key, &ParityCheckMatrix::hamming74())?
            }
            Reconciliation::Cascade => cascade_correction(
                &alice_raw_key,
                &bob_raw_key,
                params.cascade_passes,
                self.rng.gen(),
            )?,
        };

        // Step 8: privacy amplification.
        let raw = alice_raw_key.len();
        let final_len = match params.final_key_len {
            Some(l) if l > raw => {
                return Err(Bb84Error::InvalidParameter(format!(
                    "final_key_len {l} exceeds the {raw}-bit raw key"
                )))
            }
            Some(l) => l,
            None => raw.saturating_sub(reconciliation.leaked_bits),
        };
        if final_len == 0 {
            return Err(Bb84Error::NoKeyMaterial {
                raw,
                leaked: reconciliation.leaked_bits,
            });
        }
        let hash_seed: u64 = self.rng.gen();
        let alice_key = apply_privacy_amplification(&alice_raw_key, final_len, hash_seed)?;
        let bob_key = apply_privacy_amplification(&reconciliation.corrected, final_len, hash_seed)?;

        // Step 9: key confirmation.
        let keys_confirmed = keys_match(&alice_key, &bob_key);
        info!(
            "bb84 round: {} sent, {} sifted, error rate {:.3}, {} leaked, {}-bit key, confirmed: {}",
            len,
            needed,
            error_rate,
            reconciliation.leaked_bits,
            final_len,
            keys_confirmed
        );

        Ok(Bb84Transcript {
            alice_bits,
            alice_bases,
            bob_bases,
            bob_bits,
            noisy_positions: channel.noisy_positions,
            intercepted_positions: channel.intercepted_positions,
            sifted_positions,
            alice_sifted,
            bob_sifted,
            check_positions,
            alice_check_bits,
            bob_check_bits,
            mismatches,
            error_rate,
            alice_raw_key,
            bob_raw_key,
            reconciliation,
            hash_seed,
            alice_key,
            bob_key,
            keys_confirmed,
        })
    }

    /// Runs rounds until one succeeds or `max_attempts` restartable aborts pile up.
    pub fn run_with_restarts(&mut self) -> Result<Bb84Outcome, Bb84Error> {
        let max_attempts = self.params.max_attempts;
        let mut last = None;
        for attempt in 1..=max_attempts {
            match self.run() {
                Ok(transcript) => {
                    return Ok(Bb84Outcome {
                        transcript,
                        attempts: attempt,
                    })
                }
                Err(e) if e.is_restartable() => {
                    warn!("round {attempt} aborted: {e}; restarting");
                    last = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        match last {
            Some(e) => Err(Bb84Error::AttemptsExhausted {
                attempts: max_attempts,
                last: Box::new(e),
            }),
            None => Err(Bb84Error::InvalidParameter(
                "max_attempts must be positive".into(),
            )),
        }
    }
}
