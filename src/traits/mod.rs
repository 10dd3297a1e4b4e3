// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod challenge;
pub mod transport;

pub use challenge::ChallengeSolver;
pub use transport::HttpTransport;
