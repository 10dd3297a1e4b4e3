// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for source lifecycle and entry point events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A bundle was loaded and its guest instantiated.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use sourcebridge::observability::messages::source::SourceLoaded;
///
/// let msg = SourceLoaded {
///     source_id: "en.example",
///     name: "Example",
///     version: 3,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct SourceLoaded<'a> {
    pub source_id: &'a str,
    pub name: &'a str,
    pub version: i32,
}

impl Display for SourceLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded source '{}' ({} v{})",
            self.source_id, self.name, self.version
        )
    }
}

/// # Log Level
/// `error!` - Failure requiring attention
pub struct SourceLoadFailed<'a> {
    pub bundle: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for SourceLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to load source bundle '{}': {}", self.bundle, self.error)
    }
}

/// Neither the current nor the legacy export name exists.
///
/// # Log Level
/// `debug!` - Optional entry points are commonly absent
pub struct EntryPointMissing<'a> {
    pub source_id: &'a str,
    pub exports: &'a [&'a str],
}

impl Display for EntryPointMissing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Source '{}' exports none of: {}",
            self.source_id,
            self.exports.join(", ")
        )
    }
}

/// An entry point call is about to start.
///
/// # Log Level
/// `debug!` - Per-call detail
pub struct EntryPointStarted<'a> {
    pub source_id: &'a str,
    pub export: &'a str,
    pub fuel: u64,
}

impl Display for EntryPointStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Calling '{}' on source '{}' with fuel={}",
            self.export, self.source_id, self.fuel
        )
    }
}

impl StructuredLog for EntryPointStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            source_id = self.source_id,
            export = self.export,
            fuel = self.fuel,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "entry_point",
            span_name = name,
            source_id = self.source_id,
            export = self.export,
        )
    }
}

/// # Log Level
/// `debug!` - Per-call detail
pub struct EntryPointCompleted<'a> {
    pub source_id: &'a str,
    pub export: &'a str,
    pub fuel_consumed: u64,
    pub duration: Duration,
}

impl Display for EntryPointCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' on source '{}' finished in {:?} using {} fuel",
            self.export, self.source_id, self.duration, self.fuel_consumed
        )
    }
}

impl StructuredLog for EntryPointCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            source_id = self.source_id,
            export = self.export,
            fuel_consumed = self.fuel_consumed,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "entry_point_completed",
            span_name = name,
            source_id = self.source_id,
            export = self.export,
            duration = ?self.duration,
        )
    }
}

/// The guest returned a handle that did not hold the expected kind of value.
///
/// # Log Level
/// `warn!` - The caller receives an empty result
pub struct UnexpectedResult<'a> {
    pub source_id: &'a str,
    pub export: &'a str,
    pub expected: &'a str,
}

impl Display for UnexpectedResult<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' on source '{}' did not return {}",
            self.export, self.source_id, self.expected
        )
    }
}

/// # Log Level
/// `info!` - Actor thread exit
pub struct ActorStopped<'a> {
    pub source_id: &'a str,
}

impl Display for ActorStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Actor for source '{}' stopped", self.source_id)
    }
}
