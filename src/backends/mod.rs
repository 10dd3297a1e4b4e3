// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution backends for guest sources. Only core WASM modules are supported.

pub mod wasm;
