//! Roster constraints and their file-backed configuration.
//!
//! Constraints load from TOML or YAML so a season's cap and quotas can change
//! without code changes:
//!
//! ```
//! use rinkroster::config::RosterConfig;
//!
//! let config = RosterConfig::from_toml_str(r#"
//!     salary_cap = 88000000
//!     goalies_needed = 3
//! "#).unwrap();
//!
//! assert_eq!(config.constraints.salary_cap, 88_000_000.0);
//! assert_eq!(config.constraints.goalies_needed, 3);
//! assert_eq!(config.constraints.forwards_needed, 12);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::candidate::PositionCategory;

pub const DEFAULT_CONFIG_PATH: &str = "rinkroster.toml";
pub const DEFAULT_OUTPUT_PATH: &str = "result/optimized_team.csv";
pub const DEFAULT_SALARY_CAP: f64 = 83_500_000.0;
pub const DEFAULT_FORWARDS_NEEDED: u32 = 12;
pub const DEFAULT_DEFENSEMEN_NEEDED: u32 = 6;
pub const DEFAULT_GOALIES_NEEDED: u32 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Budget and exact per-category counts for one roster solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConstraints {
    /// Ceiling on the summed cap hit of the selected roster.
    pub salary_cap: f64,
    pub forwards_needed: u32,
    pub defensemen_needed: u32,
    pub goalies_needed: u32,
    /// Wall-clock limit for one solve. None waits for the solver to finish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_seconds: Option<f64>,
}

impl Default for RosterConstraints {
    fn default() -> Self {
        Self {
            salary_cap: DEFAULT_SALARY_CAP,
            forwards_needed: DEFAULT_FORWARDS_NEEDED,
            defensemen_needed: DEFAULT_DEFENSEMEN_NEEDED,
            goalies_needed: DEFAULT_GOALIES_NEEDED,
            time_limit_seconds: None,
        }
    }
}

impl RosterConstraints {
    /// Exact number of selections required from `category`.
    pub fn quota(&self, category: PositionCategory) -> u32 {
        match category {
            PositionCategory::Forward => self.forwards_needed,
            PositionCategory::Defenseman => self.defensemen_needed,
            PositionCategory::Goalie => self.goalies_needed,
        }
    }

    pub fn roster_size(&self) -> u32 {
        self.forwards_needed + self.defensemen_needed + self.goalies_needed
    }

    pub fn with_salary_cap(mut self, salary_cap: f64) -> Self {
        self.salary_cap = salary_cap;
        self
    }

    pub fn with_quotas(mut self, forwards: u32, defensemen: u32, goalies: u32) -> Self {
        self.forwards_needed = forwards;
        self.defensemen_needed = defensemen;
        self.goalies_needed = goalies;
        self
    }

    pub fn with_time_limit_seconds(mut self, seconds: f64) -> Self {
        self.time_limit_seconds = Some(seconds);
        self
    }

    /// Returns the solve time limit, ignoring non-positive or non-finite values.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_seconds
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
    }
}

/// Top-level configuration file. Constraint keys live at the top level of the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(flatten)]
    pub constraints: RosterConstraints,
    /// Where `optimize` writes the selected roster when no `--out` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

impl RosterConfig {
    /// Loads a configuration file, choosing the format from its extension
    /// (`.yaml`/`.yml` for YAML, anything else TOML).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        if is_yaml {
            Self::from_yaml_file(path)
        } else {
            Self::from_toml_file(path)
        }
    }

    /// Loads the default config file when present, otherwise returns defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load(DEFAULT_CONFIG_PATH)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.check()
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.check()
    }

    pub fn output_path(&self) -> &str {
        self.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    /// Rejects a negative salary cap or a non-positive time limit.
    pub fn check(self) -> Result<Self, ConfigError> {
        let cap = self.constraints.salary_cap;
        if !cap.is_finite() || cap < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "salary_cap must be a non-negative number, got {cap}"
            )));
        }
        if let Some(secs) = self.constraints.time_limit_seconds {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "time_limit_seconds must be positive, got {secs}"
                )));
            }
        }
        Ok(self)
    }
}
