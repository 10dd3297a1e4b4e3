// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` so log lines read the same wherever
//! they are emitted. Messages that carry useful fields also implement
//! [`StructuredLog`] to log those fields and open spans around them.
//!
//! # Organization
//!
//! * `net` - Request dispatch, rate limiting and challenge handling
//! * `source` - Bundle loading and entry point calls
//! * `store` - Descriptor table events
//! * `wasm` - Module loading and guest diagnostics
//!
//! # Usage Pattern
//!
//! ```rust
//! use sourcebridge::observability::messages::source::SourceLoaded;
//!
//! let msg = SourceLoaded {
//!     source_id: "en.example",
//!     name: "Example",
//!     version: 1,
//! };
//!
//! tracing::info!("{}", msg);
//! ```

use tracing::Span;

pub mod net;
pub mod source;
pub mod store;
pub mod wasm;

/// A message that knows how to log itself with structured fields.
pub trait StructuredLog {
    fn log(&self);

    fn span(&self, name: &str) -> Span;
}
