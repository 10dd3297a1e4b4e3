// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use thiserror::Error;

/// A single problem found while validating a loaded configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Fuel bounds are inverted or the default falls outside them.
    InvalidFuelBounds {
        minimum: u64,
        default: u64,
        maximum: u64,
    },
    /// A timeout was configured as zero seconds.
    ZeroTimeout {
        field: &'static str,
    },
    /// The module size limit is zero.
    ZeroModuleSize,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidFuelBounds {
                minimum,
                default,
                maximum,
            } => {
                write!(
                    f,
                    "Fuel bounds must satisfy minimum <= default <= maximum (got {} <= {} <= {})",
                    minimum, default, maximum
                )
            }
            ValidationError::ZeroTimeout { field } => {
                write!(f, "Timeout '{}' must be greater than zero", field)
            }
            ValidationError::ZeroModuleSize => {
                write!(f, "max_module_size_bytes must be greater than zero")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading configuration from disk.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Configuration validation failed:\n{}", format_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
