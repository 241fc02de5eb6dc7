//! TOML configuration for the walkthroughs.
//!
//! ```toml
//! [simulator]
//! seed = 42
//!
//! [bb84]
//! n = 32
//! noise = 0.02
//! reconciliation = "cascade"
//!
//! [logging]
//! level = "info"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use bb84::Bb84Params;
use serde::{Deserialize, Serialize};

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabConfig {
    #[serde(default)]
    pub simulator: SimulatorConfig,

    #[serde(default)]
    pub bb84: Bb84Params,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LabConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.bb84.validate()?;
        self.logging.validate()
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Seed for every simulator and random source. Unset means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            bail!(
                "unknown log level '{}', expected one of {}",
                self.level,
                LOG_LEVELS.join(", ")
            );
        }
        Ok(())
    }
}
