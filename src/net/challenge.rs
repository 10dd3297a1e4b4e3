// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Anti-bot challenge detection and the built-in cookie replay solver.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::{NetError, NetResult};
use crate::net::{PreparedRequest, Response};
use crate::traits::ChallengeSolver;

/// Cloudflare interstitials answer 403 or 503 with `Server: cloudflare`.
pub fn is_challenge(response: &Response) -> bool {
    matches!(response.status_code, Some(403) | Some(503))
        && response
            .header("server")
            .is_some_and(|server| server.trim().eq_ignore_ascii_case("cloudflare"))
}

/// Extracts `name=value` pairs from newline-joined `Set-Cookie` headers.
pub fn clearance_cookies(response: &Response) -> Vec<String> {
    response
        .header("set-cookie")
        .map(|raw| {
            raw.lines()
                .filter_map(|line| line.split(';').next())
                .map(str::trim)
                .filter(|pair| pair.contains('='))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Waits out the interstitial, then replays the cookies it handed out
/// alongside any cookies the request already carried.
pub struct CookieReplaySolver {
    delay: Duration,
}

impl CookieReplaySolver {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ChallengeSolver for CookieReplaySolver {
    async fn solve(
        &self,
        request: &PreparedRequest,
        challenge: &Response,
    ) -> NetResult<Vec<(String, String)>> {
        let issued = clearance_cookies(challenge);
        if issued.is_empty() {
            return Err(NetError::ChallengeUnresolved {
                url: request.url.to_string(),
                reason: "challenge issued no cookies".to_string(),
            });
        }

        tokio::time::sleep(self.delay).await;

        let mut cookies: Vec<String> = request
            .headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("cookie"))
            .map(|(_, value)| value.clone())
            .collect();
        cookies.extend(issued);

        Ok(vec![("Cookie".to_string(), cookies.join("; "))])
    }

    fn name(&self) -> &'static str {
        "cookie-replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::HttpMethod;

    fn challenge(status: i32, server: &str) -> Response {
        let mut response = Response::synthetic(status, None);
        response
            .headers
            .insert("Server".to_string(), server.to_string());
        response
    }

    #[test]
    fn test_challenge_signature() {
        assert!(is_challenge(&challenge(503, "cloudflare")));
        assert!(is_challenge(&challenge(403, "Cloudflare")));
        assert!(!is_challenge(&challenge(200, "cloudflare")));
        assert!(!is_challenge(&challenge(503, "nginx")));
        assert!(!is_challenge(&Response::failed(None)));
    }

    #[test]
    fn test_clearance_cookies_strip_attributes() {
        let mut response = challenge(503, "cloudflare");
        response.headers.insert(
            "set-cookie".to_string(),
            "cf_clearance=abc; Path=/; HttpOnly\n__cf_bm=xyz; Secure".to_string(),
        );

        assert_eq!(
            clearance_cookies(&response),
            vec!["cf_clearance=abc".to_string(), "__cf_bm=xyz".to_string()]
        );
    }

    #[tokio::test]
    async fn test_solver_merges_existing_cookies() {
        let mut response = challenge(503, "cloudflare");
        response
            .headers
            .insert("set-cookie".to_string(), "cf_clearance=abc; Path=/".to_string());
        let request = PreparedRequest {
            method: HttpMethod::Get,
            url: url::Url::parse("https://example.com").unwrap(),
            headers: vec![("Cookie".to_string(), "session=1".to_string())],
            body: None,
        };

        let headers = CookieReplaySolver::new(Duration::ZERO)
            .solve(&request, &response)
            .await
            .unwrap();

        assert_eq!(
            headers,
            vec![("Cookie".to_string(), "session=1; cf_clearance=abc".to_string())]
        );
    }

    #[tokio::test]
    async fn test_solver_without_cookies_fails() {
        let request = PreparedRequest {
            method: HttpMethod::Get,
            url: url::Url::parse("https://example.com").unwrap(),
            headers: vec![],
            body: None,
        };

        let result = CookieReplaySolver::new(Duration::ZERO)
            .solve(&request, &challenge(503, "cloudflare"))
            .await;

        assert!(matches!(result, Err(NetError::ChallengeUnresolved { .. })));
    }
}
