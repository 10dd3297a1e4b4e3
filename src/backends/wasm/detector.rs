// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM binary encoding detection
//!
//! Uses wasmparser to tell Component Model binaries apart from classic core
//! modules. Only core modules can be linked against the host imports.

use crate::backends::wasm::error::{WasmError, WasmResult, WASM_UNSUPPORTED_ENCODING};

use wasmparser::{Encoding, Parser, Payload};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ModuleEncoding {
    /// Classic core WASM module (binary version 1)
    Core,
    /// Component Model binary, including legacy components carrying a
    /// `component` custom section
    Component,
}

impl ModuleEncoding {
    #[inline]
    pub fn is_core(self) -> bool {
        matches!(self, Self::Core)
    }
}

/// Detects the encoding of a WebAssembly binary from its version header and,
/// for version 1 binaries, its custom sections.
///
/// # Errors
/// Returns an error if the input is empty, truncated, or otherwise invalid.
pub fn detect_encoding(bytes: &[u8]) -> WasmResult<ModuleEncoding> {
    let parser = Parser::new(0);
    let mut encoding = None;
    let mut has_component_section = false;

    for payload in parser.parse_all(bytes) {
        match payload? {
            Payload::Version { encoding: enc, .. } => {
                encoding = Some(enc);
            }
            Payload::CustomSection(reader) if reader.name() == "component" => {
                has_component_section = true;
            }
            _ => {}
        }
    }

    let encoding =
        encoding.ok_or_else(|| WasmError::InvalidWasmBinary("Invalid WASM binary".to_string()))?;

    Ok(match encoding {
        Encoding::Component => ModuleEncoding::Component,
        Encoding::Module if has_component_section => ModuleEncoding::Component,
        Encoding::Module => ModuleEncoding::Core,
    })
}

/// Accepts only classic core modules.
pub fn require_core_module(bytes: &[u8]) -> WasmResult<()> {
    if detect_encoding(bytes)?.is_core() {
        Ok(())
    } else {
        Err(WasmError::UnsupportedEncoding(
            WASM_UNSUPPORTED_ENCODING.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(detect_encoding(&[]).is_err());
    }

    #[test]
    fn test_invalid_input() {
        let bad = b"\x00\x00\x00\x00\x00\x00\x00\x00";
        assert!(detect_encoding(bad).is_err());
    }

    #[test]
    fn test_core_module_accepted() {
        let bytes = wat::parse_str("(module (func (export \"initialize\")))").unwrap();

        assert_eq!(detect_encoding(&bytes).unwrap(), ModuleEncoding::Core);
        assert!(require_core_module(&bytes).is_ok());
    }

    #[test]
    fn test_component_rejected() {
        let bytes = wat::parse_str("(component)").unwrap();

        assert_eq!(detect_encoding(&bytes).unwrap(), ModuleEncoding::Component);
        assert!(matches!(
            require_core_module(&bytes),
            Err(WasmError::UnsupportedEncoding(_))
        ));
    }
}
