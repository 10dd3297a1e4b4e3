// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sanity checks on a loaded configuration.
//!
//! Every check runs and contributes its errors, so a single pass reports
//! everything that is wrong with a file.

use crate::config::Config;
use crate::errors::ValidationError;

/// Validates every section of `config`.
///
/// # Example
/// ```rust
/// use sourcebridge::config::{validate_config, Config};
///
/// let config = Config::default();
/// assert!(validate_config(&config).is_ok());
/// ```
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(mut fuel_errors) = validate_fuel_bounds(config) {
        errors.append(&mut fuel_errors);
    }
    if let Err(mut limit_errors) = validate_limits(config) {
        errors.append(&mut limit_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_fuel_bounds(config: &Config) -> Result<(), Vec<ValidationError>> {
    let fuel = &config.wasm.fuel;
    let (minimum, default, maximum) = (fuel.get_minimum(), fuel.get_default(), fuel.get_maximum());

    if minimum <= default && default <= maximum {
        Ok(())
    } else {
        Err(vec![ValidationError::InvalidFuelBounds {
            minimum,
            default,
            maximum,
        }])
    }
}

fn validate_limits(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.network.request_timeout_seconds == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "request_timeout_seconds",
        });
    }
    if config.network.challenge_timeout_seconds == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "challenge_timeout_seconds",
        });
    }
    if config.wasm.max_module_size_bytes == 0 {
        errors.push(ValidationError::ZeroModuleSize);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FuelConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_default_outside_bounds() {
        let mut config = Config::default();
        config.wasm.fuel = FuelConfig {
            default: Some(2_000_000_000),
            minimum: None,
            maximum: None,
        };

        let errors = validate_config(&config).unwrap_err();

        assert_eq!(
            errors,
            vec![ValidationError::InvalidFuelBounds {
                minimum: 1_000_000,
                default: 2_000_000_000,
                maximum: 500_000_000,
            }]
        );
    }

    #[test]
    fn test_all_errors_reported_together() {
        let mut config = Config::default();
        config.network.request_timeout_seconds = 0;
        config.network.challenge_timeout_seconds = 0;
        config.wasm.max_module_size_bytes = 0;

        let errors = validate_config(&config).unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroModuleSize));
        assert!(errors.contains(&ValidationError::ZeroTimeout {
            field: "challenge_timeout_seconds"
        }));
    }
}
