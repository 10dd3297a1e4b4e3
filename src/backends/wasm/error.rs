// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for guest module loading and execution.
//!
//! All errors implement `std::error::Error` via the `thiserror` crate. None of
//! them reach a guest; they surface to the host through `SourceError`.

use thiserror::Error;

/// Error message for Component Model binaries, which the import ABI cannot drive.
pub const WASM_UNSUPPORTED_ENCODING: &str = "Unsupported WASM binary: Component Model detected. \
Sources must be classic core WASM modules.";

#[derive(Error, Debug)]
pub enum WasmError {
    /// Invalid or malformed WASM binary format.
    #[error("Invalid WASM binary: {0}")]
    InvalidWasmBinary(String),

    /// Binary is valid WASM but not something a source can be built from.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// WASM binary parsing error from wasmparser.
    #[error("WASM parser error: {0}")]
    ParserError(#[from] wasmparser::BinaryReaderError),

    /// File I/O error during module loading.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Input validation error (size limits).
    #[error("Invalid input: {0}")]
    ValidationError(String),

    /// Wasmtime engine creation or configuration error.
    #[error("Engine creation error: {0}")]
    EngineError(String),

    /// Module compilation, linking, or instantiation error.
    #[error("WASM module error: {0}")]
    ModuleError(String),

    /// Wasmtime runtime execution error: traps and fuel exhaustion.
    #[error("WASM execution error: {0}")]
    ExecutionError(#[from] wasmtime::Error),

    /// The guest does not export a required function.
    #[error("Missing export: {0}")]
    MissingExport(String),
}

/// Result type alias for WASM operations.
pub type WasmResult<T> = Result<T, WasmError>;
