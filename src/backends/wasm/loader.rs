// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM file loading and validation
//!
//! This module reads guest binaries from disk and enforces the configured size
//! limit. It does not parse the binary format; that is the detector's job.

use crate::backends::wasm::error::{WasmError, WasmResult};
use crate::observability::messages::wasm::{ModuleLoadFailed, ModuleLoaded};
use std::path::Path;

/// Loads WASM bytes from a file and validates the size
///
/// # Arguments
/// * `path` - Path to the WASM file to load
/// * `max_size` - Largest accepted binary, in bytes
///
/// # Returns
/// * `Ok(Vec<u8>)` - The WASM binary bytes
/// * `Err(WasmError)` - If file cannot be read or size exceeds limit
pub fn load_wasm_bytes<P: AsRef<Path>>(path: P, max_size: usize) -> WasmResult<Vec<u8>> {
    let path = path.as_ref();
    let module_path = path.display().to_string();

    let bytes = std::fs::read(path).map_err(|e| {
        let error = WasmError::IoError(e);
        tracing::error!(
            "{}",
            ModuleLoadFailed {
                module_path: &module_path,
                error: &error,
            }
        );
        error
    })?;

    if bytes.len() > max_size {
        let error = WasmError::ValidationError(format!(
            "WASM file too large: {} bytes (max: {} bytes)",
            bytes.len(),
            max_size
        ));
        tracing::error!(
            "{}",
            ModuleLoadFailed {
                module_path: &module_path,
                error: &error,
            }
        );
        return Err(error);
    }

    tracing::info!(
        "{}",
        ModuleLoaded {
            module_path: &module_path,
            size_bytes: bytes.len(),
        }
    );

    Ok(bytes)
}
