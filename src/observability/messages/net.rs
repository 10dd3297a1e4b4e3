// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for guest-initiated network activity.
//!
//! This module contains message types for logging events related to:
//! * Request dispatch and completion
//! * Rate limiting decisions
//! * Anti-bot challenge handling

use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Request handed to the transport.
///
/// # Log Level
/// `debug!` - Per-request detail
///
/// # Example
/// ```
/// use sourcebridge::observability::messages::net::RequestDispatched;
///
/// let msg = RequestDispatched {
///     method: "GET",
///     url: "https://example.com/manga/1",
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct RequestDispatched<'a> {
    pub method: &'a str,
    pub url: &'a str,
}

impl Display for RequestDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Dispatching {} {}", self.method, self.url)
    }
}

/// Transfer finished with an HTTP status.
///
/// # Log Level
/// `debug!` - Per-request detail
pub struct RequestCompleted<'a> {
    pub url: &'a str,
    pub status_code: i32,
    pub body_bytes: usize,
}

impl Display for RequestCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Request to {} completed with status {} ({} bytes)",
            self.url, self.status_code, self.body_bytes
        )
    }
}

/// Transfer failed below HTTP. The guest sees a response without data.
///
/// # Log Level
/// `warn!` - Recoverable failure
pub struct TransportFailed<'a> {
    pub url: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for TransportFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Transport failed for {}: {}", self.url, self.error)
    }
}

/// Transfer exceeded the configured timeout.
///
/// # Log Level
/// `warn!` - Recoverable failure
pub struct RequestTimedOut<'a> {
    pub url: &'a str,
    pub timeout: Duration,
}

impl Display for RequestTimedOut<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Request to {} timed out after {:?}", self.url, self.timeout)
    }
}

/// Transfer task went away without delivering a response.
///
/// # Log Level
/// `error!` - Unexpected condition
pub struct ResponseChannelClosed<'a> {
    pub url: &'a str,
}

impl Display for ResponseChannelClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Transfer for {} ended without a response", self.url)
    }
}

/// Request url could not be normalized; `send` does nothing.
///
/// # Log Level
/// `debug!` - Guest-side mistake
pub struct InvalidRequestUrl<'a> {
    pub url: &'a str,
}

impl Display for InvalidRequestUrl<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Ignoring send for invalid url '{}'", self.url)
    }
}

/// Request rejected locally with a synthetic 429.
///
/// # Log Level
/// `info!` - Expected throttling
///
/// # Example
/// ```
/// use std::time::Duration;
/// use sourcebridge::observability::messages::net::RateLimited;
///
/// let msg = RateLimited {
///     url: "https://example.com/api",
///     limit: 10,
///     period: Duration::from_secs(60),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RateLimited<'a> {
    pub url: &'a str,
    pub limit: i32,
    pub period: Duration,
}

impl Display for RateLimited<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Rate limit of {} requests per {:?} reached, rejecting {}",
            self.limit, self.period, self.url
        )
    }
}

/// Response carries an anti-bot challenge signature.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ChallengeDetected<'a> {
    pub url: &'a str,
    pub status_code: i32,
    pub solver: &'a str,
}

impl Display for ChallengeDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Challenge detected on {} (status {}), handing off to {}",
            self.url, self.status_code, self.solver
        )
    }
}

/// Challenge cleared and the request re-sent.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ChallengeResolved<'a> {
    pub url: &'a str,
    pub status_code: Option<i32>,
}

impl Display for ChallengeResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "Challenge cleared for {} (status {})", self.url, code),
            None => write!(f, "Challenge cleared for {} (no status)", self.url),
        }
    }
}

/// Challenge could not be cleared; the challenge page is delivered as-is.
///
/// # Log Level
/// `warn!` - Recoverable failure
pub struct ChallengeFailed<'a> {
    pub url: &'a str,
    pub reason: &'a str,
}

impl Display for ChallengeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Challenge not cleared for {}: {}", self.url, self.reason)
    }
}
