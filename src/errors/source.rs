// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use thiserror::Error;

use crate::backends::wasm::WasmError;
use crate::errors::NetError;

/// Errors raised while loading or driving a guest source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Bundle directory or one of its files could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `source.json` (or `filters.json`) is not valid.
    #[error("Invalid manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Guest binary failed to load, compile, link, or instantiate.
    #[error(transparent)]
    Wasm(#[from] WasmError),

    /// HTTP client for the source could not be built.
    #[error(transparent)]
    Net(#[from] NetError),

    /// The guest produced no value of the expected kind.
    #[error("Entry point '{export}' returned no {expected}")]
    MissingValue {
        export: &'static str,
        expected: &'static str,
    },

    /// The thread that owns the guest could not be started.
    #[error("Failed to start source thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The actor thread owning the guest has stopped.
    #[error("Source '{0}' is no longer running")]
    ActorUnavailable(String),
}

pub type SourceResult<T> = Result<T, SourceError>;
