// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::NetResult;
use crate::net::{PreparedRequest, Response};

/// Performs one HTTP transfer.
///
/// Implementations return `Err` only for transport-level failures. Any HTTP
/// status, including 4xx and 5xx, is an `Ok` response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &PreparedRequest) -> NetResult<Response>;

    fn name(&self) -> &'static str;
}
