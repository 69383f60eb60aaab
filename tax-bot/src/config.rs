//! Bot configuration, read from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.
//!
//! ```toml
//! command_prefix = "."
//!
//! [sessions]
//! idle_timeout_secs = 1800   # 0 keeps sessions until they finish
//! sweep_interval_secs = 60
//!
//! [tax]
//! brackets_file = "brackets.csv"
//! dependent_deduction_annual = "2275.08"
//! dependent_deduction_monthly = "189.59"
//!
//! [logging]
//! level = "info"
//! file = "tax-bot.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::BracketTable;
use tax_core::calculations::{DependentDeductions, IncomeTaxCalculator};
use tax_data::{BracketLoaderError, BracketTableLoader};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotConfig {
    /// Marker that turns a message into a command, e.g. `.` in `.calc 900`.
    pub command_prefix: String,
    pub sessions: SessionConfig,
    pub tax: TaxConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Drop questionnaires left untouched this long. 0 disables eviction.
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxConfig {
    /// CSV with `annual` and `monthly` schedules; built-in tables when unset.
    pub brackets_file: Option<PathBuf>,
    pub dependent_deduction_annual: Decimal,
    pub dependent_deduction_monthly: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Any `EnvFilter` directive. `RUST_LOG` takes precedence.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefix: ".".to_string(),
            sessions: SessionConfig::default(),
            tax: TaxConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 30 * 60,
            sweep_interval_secs: 60,
        }
    }
}

impl Default for TaxConfig {
    fn default() -> Self {
        let deductions = DependentDeductions::default();
        Self {
            brackets_file: None,
            dependent_deduction_annual: deductions.annual,
            dependent_deduction_monthly: deductions.monthly,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl BotConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_prefix.is_empty() || self.command_prefix.chars().any(char::is_whitespace)
        {
            return Err(ConfigError::Invalid(format!(
                "command_prefix must be non-empty and contain no whitespace, got {:?}",
                self.command_prefix
            )));
        }
        if self.sessions.idle_timeout_secs > 0 && self.sessions.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sessions.sweep_interval_secs must be positive when eviction is enabled".into(),
            ));
        }
        if self.tax.dependent_deduction_annual < Decimal::ZERO
            || self.tax.dependent_deduction_monthly < Decimal::ZERO
        {
            return Err(ConfigError::Invalid(
                "dependent deductions must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// How long a questionnaire may sit idle, or `None` to keep it forever.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.sessions.idle_timeout_secs > 0)
            .then(|| Duration::from_secs(self.sessions.idle_timeout_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sessions.sweep_interval_secs)
    }

    /// Builds the calculator from the configured schedules and allowances.
    pub fn build_calculator(&self) -> Result<IncomeTaxCalculator, BracketLoaderError> {
        let (annual, monthly) = match &self.tax.brackets_file {
            Some(path) => {
                let tables = BracketTableLoader::load_file(path)?;
                info!(path = %path.display(), "loaded bracket schedules");
                (tables.annual, tables.monthly)
            }
            None => (BracketTable::annual(), BracketTable::monthly()),
        };

        Ok(IncomeTaxCalculator::new(
            annual,
            monthly,
            DependentDeductions {
                annual: self.tax.dependent_deduction_annual,
                monthly: self.tax.dependent_deduction_monthly,
            },
        ))
    }
}
