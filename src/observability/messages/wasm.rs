// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for guest module loading and execution events.
//!
//! This module contains message types for logging events related to:
//! * WASM module loading and validation
//! * Guest export invocation
//! * Guest diagnostics written through the `env` namespace

use std::fmt::{Display, Formatter};

/// WASM module loaded successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use sourcebridge::observability::messages::wasm::ModuleLoaded;
///
/// let msg = ModuleLoaded {
///     module_path: "sources/en.example/main.wasm",
///     size_bytes: 4096,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ModuleLoaded<'a> {
    pub module_path: &'a str,
    pub size_bytes: usize,
}

impl Display for ModuleLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded WASM module: {} ({} bytes)",
            self.module_path, self.size_bytes
        )
    }
}

/// WASM module loading failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use sourcebridge::observability::messages::wasm::ModuleLoadFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
/// let msg = ModuleLoadFailed {
///     module_path: "sources/missing/main.wasm",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ModuleLoadFailed<'a> {
    pub module_path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ModuleLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to load WASM module '{}': {}",
            self.module_path, self.error
        )
    }
}

/// A guest export trapped, ran out of fuel, or returned the wrong shape.
///
/// # Log Level
/// `warn!` - The caller receives an empty result
pub struct ExportCallFailed<'a> {
    pub source_id: &'a str,
    pub export: &'a str,
    pub error: &'a dyn Display,
}

impl Display for ExportCallFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Export '{}' of source '{}' failed: {}",
            self.export, self.source_id, self.error
        )
    }
}

/// Text written by a guest through `env.print`.
///
/// # Log Level
/// `info!` - Guest-directed output
///
/// # Example
/// ```
/// use sourcebridge::observability::messages::wasm::GuestPrint;
///
/// let msg = GuestPrint {
///     source_id: "en.example",
///     message: "parsed 20 entries",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct GuestPrint<'a> {
    pub source_id: &'a str,
    pub message: &'a str,
}

impl Display for GuestPrint<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] {}", self.source_id, self.message)
    }
}

/// A guest reported a fatal condition through `env.abort`.
///
/// # Log Level
/// `error!` - Guest logic failure
pub struct GuestAbort<'a> {
    pub source_id: &'a str,
    pub message: &'a str,
    pub file: &'a str,
    pub line: i32,
    pub column: i32,
}

impl Display for GuestAbort<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] Abort: {} {}:{}:{}",
            self.source_id, self.message, self.file, self.line, self.column
        )
    }
}
