// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Source bundles and the per-source actor that drives a guest.

pub mod actor;
pub mod manifest;
pub mod runtime;

#[cfg(test)]
mod integration_tests;

pub use actor::Source;
pub use manifest::{default_filters, FilterInfo, LanguageInfo, SourceInfo, SourceManifest};
pub use runtime::SourceRuntime;
