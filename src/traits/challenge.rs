// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::NetResult;
use crate::net::{PreparedRequest, Response};

/// Clears an anti-bot challenge page.
///
/// Returns the headers (typically `Cookie` and `User-Agent`) that must be sent
/// with the original request for it to pass.
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    async fn solve(
        &self,
        request: &PreparedRequest,
        challenge: &Response,
    ) -> NetResult<Vec<(String, String)>>;

    fn name(&self) -> &'static str;
}
