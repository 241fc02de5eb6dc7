use crate::bb84::{
    Bb84Params, Bb84Session, Reconciliation, CHANNEL_BATCH, MAX_CASCADE_PASSES, MAX_STRING_LENGTH,
};
use crate::bb84_states::{BB84State, MeasurementBasis};
use crate::bits::hamming_distance;
use crate::error::Bb84Error;
use qcircuit::{ClassicalRng, QuantumRng};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn relaxed_params() -> Bb84Params {
    // Extra slack so sifting rarely aborts.
    Bb84Params {
        delta: 1.0,
        max_attempts: 10,
        ..Bb84Params::default()
    }
}

fn session(params: Bb84Params, seed: u64) -> Bb84Session<ClassicalRng> {
    Bb84Session::seeded(params, ClassicalRng::seeded(seed), seed).unwrap()
}

#[test]
fn test_generate_bb84_state() {
    let states = [
        BB84State::prepare(0, MeasurementBasis::Rectilinear),
        BB84State::prepare(1, MeasurementBasis::Rectilinear),
        BB84State::prepare(0, MeasurementBasis::Diagonal),
        BB84State::prepare(1, MeasurementBasis::Diagonal),
    ];
    assert_eq!(
        states,
        [
            BB84State::QubitZero,
            BB84State::QubitOne,
            BB84State::QubitPlus,
            BB84State::QubitMinus
        ]
    );
    for state in states {
        assert_eq!(BB84State::prepare(state.bit(), state.basis()), state);
    }
}

#[test]
fn test_measurement_in_matching_basis_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(5);
    for state in [
        BB84State::QubitZero,
        BB84State::QubitOne,
        BB84State::QubitPlus,
        BB84State::QubitMinus,
    ] {
        for _ in 0..20 {
            assert_eq!(state.measure(state.basis(), &mut rng), state.bit());
        }
    }
}

#[test]
fn test_measurement_in_wrong_basis_is_a_coin_flip() {
    let mut rng = StdRng::seed_from_u64(6);
    let trials = 2000;
    let ones: usize = (0..trials)
        .map(|_| BB84State::QubitPlus.measure(MeasurementBasis::Rectilinear, &mut rng) as usize)
        .sum();
    assert!((800..1200).contains(&ones), "ones: {}", ones);
}

#[test]
fn test_flip_state_stays_in_basis() {
    for state in [BB84State::QubitZero, BB84State::QubitPlus] {
        let flipped = state.flip();
        assert_eq!(flipped.basis(), state.basis());
        assert_ne!(flipped.bit(), state.bit());
        assert_eq!(flipped.flip(), state);
    }
}

#[test]
fn test_string_length() {
    let params = Bb84Params {
        n: 10,
        delta: 0.0,
        ..Bb84Params::default()
    };
    assert_eq!(params.string_length(), 40);

    let params = Bb84Params {
        n: 16,
        delta: 0.23,
        ..Bb84Params::default()
    };
    assert_eq!(params.string_length(), 68);
}

#[test]
fn test_invalid_parameters_are_rejected() {
    let cases = [
        Bb84Params {
            n: 0,
            ..Bb84Params::default()
        },
        Bb84Params {
            noise: 1.5,
            ..Bb84Params::default()
        },
        Bb84Params {
            check_fraction: 1.0,
            ..Bb84Params::default()
        },
        Bb84Params {
            delta: -0.5,
            ..Bb84Params::default()
        },
        Bb84Params {
            max_attempts: 0,
            ..Bb84Params::default()
        },
        Bb84Params {
            reconciliation: Reconciliation::Cascade,
            cascade_passes: 0,
            ..Bb84Params::default()
        },
        Bb84Params {
            reconciliation: Reconciliation::Cascade,
            cascade_passes: 70,
            ..Bb84Params::default()
        },
        Bb84Params {
            n: usize::MAX / 2 + 1,
            ..Bb84Params::default()
        },
        Bb84Params {
            n: MAX_STRING_LENGTH / 4 + 1,
            ..Bb84Params::default()
        },
        Bb84Params {
            delta: 1e300,
            ..Bb84Params::default()
        },
    ];
    for params in cases {
        let result = Bb84Session::new(params.clone(), ClassicalRng::seeded(0));
        assert!(
            matches!(result, Err(Bb84Error::InvalidParameter(_))),
            "accepted {:?}",
            params
        );
    }
}

#[test]
fn test_parameter_caps_are_inclusive() {
    let params = Bb84Params {
        n: MAX_STRING_LENGTH / 4,
        delta: 0.0,
        reconciliation: Reconciliation::Cascade,
        cascade_passes: MAX_CASCADE_PASSES,
        ..Bb84Params::default()
    };
    assert!(params.validate().is_ok());
    assert_eq!(params.string_length(), MAX_STRING_LENGTH);
}

#[test]
fn test_wrong_basis_outcomes_do_not_track_source_stream() {
    // A quantum source and a session seeded with the same value must not share
    // a stream. Bob's wrong-basis outcome at i would otherwise equal the data
    // bit drawn alongside it by the source.
    let params = Bb84Params {
        n: 32,
        ..relaxed_params()
    };
    let mut agree = 0;
    let mut total = 0;
    for seed in 0..10 {
        let mut session =
            Bb84Session::seeded(params.clone(), QuantumRng::seeded(seed), seed).unwrap();
        let t = session.run_with_restarts().unwrap().transcript;
        let len = t.alice_bits.len();
        for i in (0..len).filter(|&i| t.alice_bases[i] != t.bob_bases[i]) {
            let j = 2 * CHANNEL_BATCH * (i / CHANNEL_BATCH) + CHANNEL_BATCH + i % CHANNEL_BATCH;
            if j < len {
                total += 1;
                if t.bob_bits[i] == t.alice_bits[j] {
                    agree += 1;
                }
            }
        }
    }
    assert!(total > 200, "only {} wrong-basis positions", total);
    let share = agree as f64 / total as f64;
    assert!((0.35..0.65).contains(&share), "agreement {}/{}", agree, total);
}

#[test]
fn test_complete_protocol_simulation() {
    let params = relaxed_params();
    let mut session = session(params.clone(), 42);
    let outcome = session.run_with_restarts().unwrap();
    let t = &outcome.transcript;
    let len = params.string_length();
    let needed = 2 * params.n;

    assert!(outcome.attempts >= 1 && outcome.attempts <= params.max_attempts);
    assert_eq!(t.alice_bits.len(), len);
    assert_eq!(t.bob_bits.len(), len);
    assert_eq!(t.sifted_positions.len(), needed);
    for &i in &t.sifted_positions {
        assert_eq!(t.alice_bases[i], t.bob_bases[i]);
    }
    assert!(t.sifted_positions.windows(2).all(|w| w[0] < w[1]));

    // Noiseless channel: matching bases give matching bits.
    assert_eq!(t.alice_sifted, t.bob_sifted);
    assert_eq!(t.mismatches, 0);
    assert_eq!(t.error_rate, 0.0);

    assert_eq!(t.check_positions.len(), params.n);
    assert!(t.check_positions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(t.alice_raw_key.len(), needed - params.n);
    assert_eq!(t.alice_raw_key, t.bob_raw_key);
    assert!(t.reconciliation.flipped.is_empty());

    assert_eq!(
        t.alice_key.len(),
        t.alice_raw_key.len() - t.reconciliation.leaked_bits
    );
    assert_eq!(t.alice_key, t.bob_key);
    assert!(t.keys_confirmed);
}

#[test]
fn test_bob_measures_alice_bit_when_bases_match() {
    let mut session = session(relaxed_params(), 7);
    let t = session.run_with_restarts().unwrap().transcript;
    for i in 0..t.alice_bits.len() {
        if t.alice_bases[i] == t.bob_bases[i] {
            assert_eq!(t.alice_bits[i], t.bob_bits[i], "position {}", i);
        }
    }
}

#[test]
fn test_wrong_basis_measurements_are_random() {
    let params = Bb84Params {
        n: 64,
        delta: 1.0,
        max_attempts: 10,
        ..Bb84Params::default()
    };
    let mut session = session(params, 8);
    let t = session.run_with_restarts().unwrap().transcript;
    let wrong: Vec<usize> = (0..t.alice_bits.len())
        .filter(|&i| t.alice_bases[i] != t.bob_bases[i])
        .collect();
    let agree = wrong
        .iter()
        .filter(|&&i| t.alice_bits[i] == t.bob_bits[i])
        .count();
    let share = agree as f64 / wrong.len() as f64;
    assert!((0.3..0.7).contains(&share), "agreement {}", share);
}

#[test]
fn test_same_seed_same_transcript() {
    let first = session(relaxed_params(), 11).run_with_restarts().unwrap();
    let second = session(relaxed_params(), 11).run_with_restarts().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_quantum_random_source() {
    let params = Bb84Params {
        n: 8,
        ..relaxed_params()
    };
    let mut session = Bb84Session::seeded(params, QuantumRng::seeded(21), 21).unwrap();
    let outcome = session.run_with_restarts().unwrap();
    assert!(outcome.transcript.keys_confirmed);
}

#[test]
fn test_protocol_with_noise() {
    let params = Bb84Params {
        n: 32,
        noise: 0.05,
        max_error_rate: 1.0,
        ..relaxed_params()
    };
    let mut session = session(params, 13);
    let t = session.run_with_restarts().unwrap().transcript;
    assert!(!t.noisy_positions.is_empty());
    assert!(t.intercepted_positions.is_empty());

    // Every disagreement after sifting comes from a noisy qubit.
    for (k, &i) in t.sifted_positions.iter().enumerate() {
        if t.alice_sifted[k] != t.bob_sifted[k] {
            assert!(t.noisy_positions.contains(&i), "clean qubit {} flipped", i);
        }
    }
    assert_eq!(
        t.mismatches,
        hamming_distance(&t.alice_check_bits, &t.bob_check_bits)
    );
}

#[test]
fn test_protocol_robustness_against_eavesdropping() {
    // Intercept-resend on every qubit gives an error rate near 25%.
    let params = Bb84Params {
        n: 128,
        eavesdropper: 1.0,
        max_attempts: 1,
        ..relaxed_params()
    };
    let mut session = session(params, 17);
    match session.run() {
        Err(e) => assert!(e.is_restartable(), "unexpected error {}", e),
        Ok(t) => panic!("eavesdropper went unnoticed, error rate {}", t.error_rate),
    }
}

#[test]
fn test_eavesdropper_is_visible_in_error_rate() {
    let params = Bb84Params {
        n: 64,
        eavesdropper: 1.0,
        max_error_rate: 1.0,
        ..relaxed_params()
    };
    let mut session = session(params, 19);
    let t = session.run_with_restarts().unwrap().transcript;
    assert_eq!(t.intercepted_positions.len(), t.alice_bits.len());
    assert!(
        (0.1..0.45).contains(&t.error_rate),
        "error rate {}",
        t.error_rate
    );
}

#[test]
fn test_restart_budget_is_reported() {
    let params = Bb84Params {
        n: 128,
        eavesdropper: 1.0,
        max_attempts: 2,
        ..relaxed_params()
    };
    let mut session = session(params, 23);
    match session.run_with_restarts() {
        Err(Bb84Error::AttemptsExhausted { attempts, last }) => {
            assert_eq!(attempts, 2);
            assert!(last.is_restartable());
        }
        other => panic!("expected exhausted attempts, got {:?}", other),
    }
}

#[test]
fn test_key_reconciliation_and_privacy_amplification() {
    for reconciliation in [
        Reconciliation::Parity3,
        Reconciliation::Hamming74,
        Reconciliation::Cascade,
    ] {
        let params = Bb84Params {
            n: 64,
            reconciliation,
            ..relaxed_params()
        };
        let mut session = session(params, 29);
        let t = session.run_with_restarts().unwrap().transcript;
        assert_eq!(t.reconciliation.corrected, t.alice_raw_key, "{}", reconciliation);
        assert!(t.reconciliation.leaked_bits > 0);
        assert!(t.keys_confirmed, "{}", reconciliation);
    }
}

#[test]
fn test_fixed_final_key_length() {
    let params = Bb84Params {
        final_key_len: Some(4),
        ..relaxed_params()
    };
    let t = session(params, 31).run_with_restarts().unwrap().transcript;
    assert_eq!(t.alice_key.len(), 4);
    assert_eq!(t.alice_key, t.bob_key);

    let params = Bb84Params {
        final_key_len: Some(1000),
        ..relaxed_params()
    };
    assert!(matches!(
        session(params, 31).run_with_restarts(),
        Err(Bb84Error::InvalidParameter(_))
    ));
}

#[test]
fn test_channel_spans_several_batches() {
    let params = relaxed_params();
    assert!(params.string_length() > CHANNEL_BATCH);
    let t = session(params.clone(), 37).run_with_restarts().unwrap().transcript;
    assert_eq!(t.bob_bits.len(), params.string_length());
}

#[test]
fn test_reconciliation_names() {
    assert_eq!("parity3".parse::<Reconciliation>(), Ok(Reconciliation::Parity3));
    assert_eq!("Hamming".parse::<Reconciliation>(), Ok(Reconciliation::Hamming74));
    assert_eq!("cascade".parse::<Reconciliation>(), Ok(Reconciliation::Cascade));
    assert!("ldpc".parse::<Reconciliation>().is_err());
    assert_eq!(Reconciliation::Hamming74.to_string(), "hamming74");
}
