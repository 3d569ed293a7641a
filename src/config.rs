//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::domain::Currency;
use crate::reconciliation::RetryPolicy;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Workload of the simulation binary
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of credit lines to create
    pub cards: usize,

    /// Number of concurrent withdrawal workers
    pub workers: usize,

    /// Withdrawals issued by each worker
    pub withdrawals_per_worker: usize,

    /// Limit assigned to every card
    pub card_limit: Decimal,

    /// Currency of every card
    pub currency: Currency,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment (development, production)
    pub environment: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Delay between reconciliation retries (zero = busy retry)
    pub reconciliation_backoff: Duration,

    /// Simulation workload
    pub simulation: SimulationConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let log_format = parse_var("LOG_FORMAT", "pretty")?;

        let backoff_ms: u64 = parse_var("RECONCILIATION_RETRY_BACKOFF_MS", "0")?;

        let simulation = SimulationConfig {
            cards: parse_var("SIMULATION_CARDS", "4")?,
            workers: parse_var("SIMULATION_WORKERS", "8")?,
            withdrawals_per_worker: parse_var("SIMULATION_WITHDRAWALS", "20")?,
            card_limit: parse_var("SIMULATION_CARD_LIMIT", "100")?,
            currency: parse_var("SIMULATION_CURRENCY", "USD")?,
        };

        if simulation.cards == 0 {
            return Err(ConfigError::InvalidValue("SIMULATION_CARDS"));
        }

        Ok(Self {
            environment,
            log_format,
            reconciliation_backoff: Duration::from_millis(backoff_ms),
            simulation,
        })
    }

    /// Retry policy for the reconciliation process
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_backoff(self.reconciliation_backoff)
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name))
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_parse_var_default_and_invalid() {
        let value: u64 = parse_var("CARD_CONSISTENCY_TEST_UNSET_VAR", "7").unwrap();
        assert_eq!(value, 7);

        let invalid = parse_var::<u64>("CARD_CONSISTENCY_TEST_UNSET_VAR", "seven");
        assert!(matches!(invalid, Err(ConfigError::InvalidValue(_))));
    }
}
