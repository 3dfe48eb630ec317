//! Sampling configuration: target bad fraction, granularity mode, optional seed.
//!
//! Parameter sets are JSON objects using the host's key names:
//!
//! ```json
//! { "BadChanFrac": 0.05, "Mode": "chips", "Seed": 12345 }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Granularity at which channels are knocked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    /// Individual channels drawn uniformly from the universe.
    Channels,
    /// Every channel of a randomly drawn TPC (one APA face).
    Groups,
    /// The 16 channels of one randomly drawn readout chip in a random TPC.
    Chips,
}

impl Mode {
    /// Name used in parameter sets.
    pub fn config_name(self) -> &'static str {
        match self {
            Mode::Channels => "channels",
            Mode::Groups => "APAs",
            Mode::Chips => "chips",
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "channels" => Ok(Mode::Channels),
            "APAs" => Ok(Mode::Groups),
            "chips" => Ok(Mode::Chips),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config_name())
    }
}

/// Errors raised while building a `SamplingConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown Mode '{0}' (expected \"channels\", \"APAs\" or \"chips\")")]
    UnknownMode(String),

    #[error("BadChanFrac must be within [0, 1], got {0}")]
    FractionOutOfRange(f64),

    #[error("missing required parameter {0}")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid parameter set: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parameter set as written by the host, before validation.
#[derive(Debug, Clone, Deserialize)]
struct RawParams {
    #[serde(rename = "BadChanFrac")]
    bad_chan_frac: f64,
    #[serde(rename = "Mode")]
    mode: String,
    #[serde(rename = "Seed", default)]
    seed: Option<u64>,
}

/// Validated sampling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingConfig {
    pub bad_fraction: f64,
    pub mode: Mode,
    /// Seed for hosts that build their own generator. The sampler itself
    /// only ever sees the generator it is handed.
    pub seed: Option<u64>,
}

impl SamplingConfig {
    pub fn new(bad_fraction: f64, mode: Mode) -> Result<Self, ConfigError> {
        if !bad_fraction.is_finite() || !(0.0..=1.0).contains(&bad_fraction) {
            return Err(ConfigError::FractionOutOfRange(bad_fraction));
        }
        Ok(SamplingConfig {
            bad_fraction,
            mode,
            seed: None,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse a JSON parameter set.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawParams = serde_json::from_str(json)?;
        let mode: Mode = raw.mode.parse()?;
        let config = SamplingConfig::new(raw.bad_chan_frac, mode)?;
        Ok(match raw.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }
}
