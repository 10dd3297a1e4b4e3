// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod bridge;
pub mod challenge;
mod rate_limit;
mod request;
pub mod transport;

use std::sync::Arc;

use tracing::{debug, info};

pub use bridge::{NetBridge, NetSettings};
pub use rate_limit::RateLimiter;
pub use request::{normalize_url, HttpMethod, PreparedRequest, Request, Response};

use crate::observability::messages::net::{InvalidRequestUrl, RateLimited};

/// Per-source network state: the shared bridge plus this source's limiter.
pub struct NetModule {
    bridge: Arc<NetBridge>,
    limiter: RateLimiter,
}

impl NetModule {
    pub fn new(bridge: Arc<NetBridge>, limiter: RateLimiter) -> Self {
        Self { bridge, limiter }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn limiter_mut(&mut self) -> &mut RateLimiter {
        &mut self.limiter
    }

    pub fn bridge(&self) -> &NetBridge {
        &self.bridge
    }

    /// Performs the request synchronously.
    ///
    /// `None` means the request was not sendable and nothing happened. When
    /// the limiter is tripped a synthetic 429 is returned without a transfer.
    pub fn send(&mut self, request: &Request) -> Option<Response> {
        let Some(prepared) = self.bridge.prepare(request) else {
            debug!(
                "{}",
                InvalidRequestUrl {
                    url: request.url.as_deref().unwrap_or_default(),
                }
            );
            return None;
        };

        if self.limiter.is_limited() {
            info!(
                "{}",
                RateLimited {
                    url: prepared.url.as_str(),
                    limit: self.limiter.limit(),
                    period: self.limiter.period(),
                }
            );
            return Some(Response::synthetic(429, Some(prepared.url.to_string())));
        }

        let response = self.bridge.dispatch(prepared);
        self.limiter.record();
        Some(response)
    }
}
