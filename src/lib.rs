// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // wasm engine plumbing
pub mod config;     // yaml config + defaults
pub mod dom;        // shared html documents
pub mod errors;     // error handling
pub mod imports;    // host functions exposed to guests
pub mod models;     // catalog entities
pub mod net;        // request lifecycle + blocking bridge
pub mod observability;
pub mod source;     // bundle loading + per-source actor
pub mod store;      // descriptor arena + guest memory
pub mod traits;     // transport and challenge seams
