// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod net;
mod source;

pub use config::{ConfigError, ValidationError};
pub use net::{NetError, NetResult};
pub use source::{SourceError, SourceResult};
