// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Message types follow a struct-based pattern with `Display` implementations
//! so that log text lives in one place instead of scattered format strings.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::net` - Network bridge events
//! * `messages::source` - Source lifecycle and entry points
//! * `messages::store` - Descriptor table events
//! * `messages::wasm` - Module loading and guest output
//!
//! # Usage
//!
//! ```rust
//! use sourcebridge::observability::messages::wasm::ModuleLoadFailed;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::NotFound, "main.wasm");
//! let msg = ModuleLoadFailed {
//!     module_path: "sources/en.example/main.wasm",
//!     error: &error,
//! };
//!
//! tracing::error!("{}", msg);
//! ```

pub mod messages;
