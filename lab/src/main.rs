//! # quantum-lab
//!
//! Walkthroughs of the quantum circuit simulator, BB84 key distribution and
//! the one-time pads. Each subcommand prints the intermediate values step by
//! step.
//!
//! ```bash
//! quantum-lab tour
//! quantum-lab qrng --length 32
//! quantum-lab bb84 --n 16 --noise 0.02 --reconciliation cascade
//! quantum-lab --seed 7 -vv bb84 --eve 1.0
//! quantum-lab otp --message "hello"
//! quantum-lab --config quantum-lab.toml show-config
//! ```

mod config;
mod notebooks;

use std::path::PathBuf;

use anyhow::Result;
use bb84::Reconciliation;
use clap::{ArgAction, Parser, Subcommand};
use log::{debug, error};

use crate::config::LabConfig;

#[derive(Parser, Debug)]
#[command(name = "quantum-lab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for every simulator and random source
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Superposition, moment steps and a sampled Bell pair
    Tour {
        /// Samples drawn from the Bell pair circuit
        #[arg(long, default_value_t = 1000)]
        repetitions: usize,
    },

    /// Random bit strings from Hadamard measurements
    Qrng {
        #[arg(short, long, default_value_t = 16)]
        length: usize,

        /// Number of strings to draw
        #[arg(long, default_value_t = 1)]
        count: usize,

        /// Use the classical generator instead
        #[arg(long)]
        classical: bool,
    },

    /// A full BB84 run, restarting aborted rounds
    Bb84 {
        #[arg(long)]
        n: Option<usize>,

        #[arg(long)]
        delta: Option<f64>,

        /// Probability of a random Pauli error per qubit
        #[arg(long)]
        noise: Option<f64>,

        /// Probability that Eve intercepts a qubit
        #[arg(long)]
        eve: Option<f64>,

        /// parity3, hamming74 or cascade
        #[arg(long)]
        reconciliation: Option<Reconciliation>,

        /// Final key length in bits
        #[arg(long)]
        key_len: Option<usize>,

        /// Draw Alice's and Bob's strings classically
        #[arg(long)]
        classical: bool,
    },

    /// Syndrome decoding with the 3-bit parity check and Hamming(7,4)
    Reconcile {
        /// Alice's three bits
        #[arg(long, default_value = "001")]
        bits: String,

        /// Noise vector added on Bob's side
        #[arg(long, default_value = "010")]
        noise: String,
    },

    /// Two-universal hashing of a weak shared secret
    Amplify {
        #[arg(long, default_value = "010")]
        secret: String,

        #[arg(long, default_value_t = 2)]
        output_len: usize,

        #[arg(long, default_value_t = 0.75)]
        load_factor: f64,

        #[arg(long, default_value_t = 11)]
        hash_seed: u64,
    },

    /// Classical one-time pad with a BB84 key, then the quantum one-time pad
    Otp {
        #[arg(short, long, default_value = "hi")]
        message: String,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn log_level(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_ascii_lowercase(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn run(cli: Cli, mut config: LabConfig) -> Result<()> {
    if cli.seed.is_some() {
        config.simulator.seed = cli.seed;
    }
    let seed = config.simulator.seed;

    match cli.command {
        Commands::Tour { repetitions } => notebooks::tour::run(seed, repetitions),
        Commands::Qrng {
            length,
            count,
            classical,
        } => notebooks::qrng::run(seed, length, count, classical),
        Commands::Bb84 {
            n,
            delta,
            noise,
            eve,
            reconciliation,
            key_len,
            classical,
        } => {
            let mut params = config.bb84;
            if let Some(n) = n {
                params.n = n;
            }
            if let Some(delta) = delta {
                params.delta = delta;
            }
            if let Some(noise) = noise {
                params.noise = noise;
            }
            if let Some(eve) = eve {
                params.eavesdropper = eve;
            }
            if let Some(reconciliation) = reconciliation {
                params.reconciliation = reconciliation;
            }
            if key_len.is_some() {
                params.final_key_len = key_len;
            }
            notebooks::bb84::run(params, seed, classical)
        }
        Commands::Reconcile { bits, noise } => notebooks::reconcile::run(&bits, &noise),
        Commands::Amplify {
            secret,
            output_len,
            load_factor,
            hash_seed,
        } => notebooks::amplify::run(&secret, output_len, load_factor, hash_seed),
        Commands::Otp { message } => notebooks::otp::run(&message, config.bb84, seed),
        Commands::ShowConfig => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LabConfig::load(path),
        None => Ok(LabConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            init_logging("error");
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&log_level(cli.verbose, &config.logging.level));
    debug!("configuration: {:?}", config);

    if let Err(e) = run(cli, config) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb84::Bb84Params;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bb84_flags_parse() {
        let cli = Cli::parse_from([
            "quantum-lab",
            "--seed",
            "5",
            "bb84",
            "--n",
            "8",
            "--reconciliation",
            "cascade",
        ]);
        assert_eq!(cli.seed, Some(5));
        match cli.command {
            Commands::Bb84 {
                n, reconciliation, ..
            } => {
                assert_eq!(n, Some(8));
                assert_eq!(reconciliation, Some(Reconciliation::Cascade));
            }
            other => panic!("parsed {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_overrides_config_level() {
        assert_eq!(log_level(0, "WARN"), "warn");
        assert_eq!(log_level(1, "warn"), "info");
        assert_eq!(log_level(2, "warn"), "debug");
        assert_eq!(log_level(5, "warn"), "trace");
    }

    #[test]
    fn test_walkthroughs_run_with_a_seed() {
        let seed = Some(1);
        notebooks::tour::run(seed, 50).unwrap();
        notebooks::qrng::run(seed, 20, 2, false).unwrap();
        notebooks::reconcile::run("001", "010").unwrap();
        notebooks::amplify::run("010", 2, 0.75, 11).unwrap();

        let params = Bb84Params {
            n: 16,
            delta: 1.0,
            max_attempts: 10,
            ..Bb84Params::default()
        };
        notebooks::bb84::run(params.clone(), seed, false).unwrap();
        notebooks::bb84::run(params.clone(), seed, true).unwrap();
        notebooks::otp::run("hi", params, seed).unwrap();
    }
}
