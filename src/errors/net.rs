// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failures inside the host's networking layer.
///
/// None of these cross the guest boundary. They are logged and the guest
/// sees a response without data or status instead.
#[derive(Error, Debug)]
pub enum NetError {
    /// The HTTP client could not complete the transfer.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// An anti-bot challenge could not be cleared.
    #[error("Challenge not resolved for {url}: {reason}")]
    ChallengeUnresolved { url: String, reason: String },
}

pub type NetResult<T> = Result<T, NetError>;
