// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod capability_manager;
pub mod detector;
pub mod error;
pub mod loader;

pub use capability_manager::create_engine;
pub use detector::{detect_encoding, require_core_module, ModuleEncoding};
pub use error::{WasmError, WasmResult};
pub use loader::load_wasm_bytes;
