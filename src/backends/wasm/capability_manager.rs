// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM engine configuration
//!
//! Guests get a deliberately small feature set: one 32-bit memory, no threads,
//! no SIMD. Fuel is always on so every entry point call runs on a budget.

use crate::backends::wasm::error::{WasmError, WasmResult};
use wasmtime::{Config, Engine};

/// Creates a Wasmtime engine for classic core modules with fuel metering.
pub fn create_engine() -> WasmResult<Engine> {
    let mut config = Config::new();

    config.wasm_component_model(false);
    config.wasm_threads(false);
    config.wasm_simd(false);
    config.wasm_relaxed_simd(false);
    config.wasm_multi_memory(false);
    config.wasm_memory64(false);
    config.consume_fuel(true);
    config.epoch_interruption(false);

    Engine::new(&config).map_err(|e| WasmError::EngineError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmtime::{Module, Store};

    #[test]
    fn test_create_engine() {
        assert!(create_engine().is_ok(), "Should create classic module engine");
    }

    #[test]
    fn test_fuel_is_metered() {
        let engine = create_engine().unwrap();
        let mut store = Store::new(&engine, ());

        store.set_fuel(10).unwrap();

        assert_eq!(store.get_fuel().unwrap(), 10);
    }

    #[test]
    fn test_simd_modules_rejected() {
        let engine = create_engine().unwrap();
        let simd = wat::parse_str("(module (func (result v128) (v128.const i64x2 0 0)))").unwrap();

        assert!(Module::new(&engine, &simd).is_err());
    }
}
