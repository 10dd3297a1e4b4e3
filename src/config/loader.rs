// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_CHALLENGE_RETRY_DELAY_MS, DEFAULT_CHALLENGE_TIMEOUT_SECONDS, DEFAULT_FUEL_LEVEL,
    DEFAULT_MAX_MODULE_SIZE_BYTES, DEFAULT_RATE_LIMIT, DEFAULT_RATE_LIMIT_PERIOD_SECONDS,
    DEFAULT_REQUEST_TIMEOUT_SECONDS, DEFAULT_USER_AGENT, MAX_FUEL_LEVEL, MIN_FUEL_LEVEL,
};
use crate::config::validation::validate_config;
use crate::errors::ConfigError;
use crate::net::RateLimiter;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Host configuration for running guest sources.
///
/// Every section is optional; an empty file yields the built-in defaults.
///
/// # Example
/// ```yaml
/// wasm:
///   fuel:
///     default: 100000000
///   max_module_size_bytes: 16777216
/// network:
///   user_agent: "sourcebridge/0.1"
///   request_timeout_seconds: 30
///   rate_limit:
///     limit: 10
///     period_seconds: 60
///   challenge:
///     enabled: true
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wasm: WasmConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Guest execution limits.
#[derive(Debug, Deserialize)]
pub struct WasmConfig {
    #[serde(default)]
    pub fuel: FuelConfig,
    #[serde(default = "default_max_module_size")]
    pub max_module_size_bytes: usize,
}

impl Default for WasmConfig {
    fn default() -> Self {
        Self {
            fuel: FuelConfig::default(),
            max_module_size_bytes: DEFAULT_MAX_MODULE_SIZE_BYTES,
        }
    }
}

fn default_max_module_size() -> usize {
    DEFAULT_MAX_MODULE_SIZE_BYTES
}

/// Fuel budget granted to each entry point call.
///
/// Fuel bounds how long a single call may run. It is an execution budget,
/// not an isolation guarantee.
///
/// # Fields
/// * `default` - Fuel per call (defaults to 100M)
/// * `minimum` - Lower clamp (defaults to 1M)
/// * `maximum` - Upper clamp (defaults to 500M)
#[derive(Debug, Default, Deserialize)]
pub struct FuelConfig {
    pub default: Option<u64>,
    pub minimum: Option<u64>,
    pub maximum: Option<u64>,
}

impl FuelConfig {
    pub fn get_default(&self) -> u64 {
        self.default.unwrap_or(DEFAULT_FUEL_LEVEL)
    }

    pub fn get_minimum(&self) -> u64 {
        self.minimum.unwrap_or(MIN_FUEL_LEVEL)
    }

    pub fn get_maximum(&self) -> u64 {
        self.maximum.unwrap_or(MAX_FUEL_LEVEL)
    }

    /// Clamps a requested fuel level to the configured bounds.
    ///
    /// # Example
    /// ```
    /// use sourcebridge::config::FuelConfig;
    ///
    /// let config = FuelConfig::default();
    /// let fuel = config.validate_and_clamp(1_000_000_000); // Too high
    /// assert_eq!(fuel, 500_000_000); // Clamped to maximum
    /// ```
    pub fn validate_and_clamp(&self, requested: u64) -> u64 {
        let min = self.get_minimum();
        let max = self.get_maximum().max(min);
        requested.clamp(min, max)
    }

    /// The clamped per-call budget.
    pub fn budget(&self) -> u64 {
        self.validate_and_clamp(self.get_default())
    }
}

/// Outbound HTTP behavior shared by every request a guest sends.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub user_agent: String,
    pub request_timeout_seconds: u64,
    pub challenge_timeout_seconds: u64,
    pub rate_limit: RateLimitConfig,
    pub challenge: ChallengeConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            challenge_timeout_seconds: DEFAULT_CHALLENGE_TIMEOUT_SECONDS,
            rate_limit: RateLimitConfig::default(),
            challenge: ChallengeConfig::default(),
        }
    }
}

/// Initial limiter state; guests may override it with `net.set_rate_limit`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub limit: i32,
    pub period_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RATE_LIMIT,
            period_seconds: DEFAULT_RATE_LIMIT_PERIOD_SECONDS,
        }
    }
}

impl RateLimitConfig {
    pub fn limiter(&self) -> RateLimiter {
        RateLimiter::new(self.limit, Duration::from_secs(self.period_seconds))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    pub enabled: bool,
    /// Pause before replaying a request with clearance cookies.
    pub retry_delay_ms: u64,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retry_delay_ms: DEFAULT_CHALLENGE_RETRY_DELAY_MS,
        }
    }
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse a config from YAML text. Empty documents yield the defaults.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Load and validate a config from a YAML file
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_empty_config_uses_defaults() {
        let cfg = parse_config("").unwrap();

        assert_eq!(cfg.wasm.fuel.budget(), DEFAULT_FUEL_LEVEL);
        assert_eq!(cfg.wasm.max_module_size_bytes, DEFAULT_MAX_MODULE_SIZE_BYTES);
        assert_eq!(cfg.network.user_agent, DEFAULT_USER_AGENT);
        assert!(cfg.network.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(cfg.network.rate_limit.limit, -1);
        assert!(cfg.network.challenge.enabled);
    }

    #[test]
    fn parse_partial_network_section() {
        let yaml = r#"
network:
  request_timeout_seconds: 5
  rate_limit:
    limit: 3
"#;

        let cfg = parse_config(yaml).unwrap();

        assert_eq!(cfg.network.request_timeout_seconds, 5);
        assert_eq!(cfg.network.challenge_timeout_seconds, DEFAULT_CHALLENGE_TIMEOUT_SECONDS);
        assert_eq!(cfg.network.rate_limit.limit, 3);
        assert_eq!(cfg.network.rate_limit.period_seconds, 60);
        assert_eq!(cfg.network.rate_limit.limiter().limit(), 3);
    }

    #[test]
    fn test_fuel_clamping() {
        let fuel = FuelConfig {
            default: Some(10),
            minimum: Some(1_000),
            maximum: Some(5_000),
        };

        assert_eq!(fuel.budget(), 1_000);
        assert_eq!(fuel.validate_and_clamp(9_000), 5_000);
    }

    #[test]
    fn test_load_and_validate_rejects_bad_bounds() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wasm:\n  fuel:\n    minimum: 10\n    maximum: 5").unwrap();

        let error = load_and_validate_config(file.path()).unwrap_err();

        assert!(matches!(error, ConfigError::Invalid(_)));
        assert!(error.to_string().contains("Fuel bounds"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("does/not/exist.yaml");

        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let result = parse_config("wasm: [1, 2");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
