// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Synchronous bridge from guest imports onto the async transport.
//!
//! Guest code runs on a dedicated thread and expects `send` to return only
//! once the response is available. The bridge spawns the transfer on a
//! multi-threaded tokio runtime and parks the calling thread on a oneshot
//! channel until a task delivers the final response. When a challenge is
//! detected, delivery moves to the resolution task so the response handed to
//! the guest is the one after the challenge was cleared.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::config::NetworkConfig;
use crate::errors::{NetError, NetResult};
use crate::net::challenge::{is_challenge, CookieReplaySolver};
use crate::net::transport::ReqwestTransport;
use crate::net::{normalize_url, PreparedRequest, Request, Response};
use crate::observability::messages::net::{
    ChallengeDetected, ChallengeFailed, ChallengeResolved, RequestCompleted, RequestDispatched,
    RequestTimedOut, ResponseChannelClosed, TransportFailed,
};
use crate::traits::{ChallengeSolver, HttpTransport};

#[derive(Debug, Clone, PartialEq)]
pub struct NetSettings {
    pub user_agent: String,
    pub request_timeout: Duration,
    pub challenge_timeout: Duration,
}

impl Default for NetSettings {
    fn default() -> Self {
        Self {
            user_agent: crate::config::consts::DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(crate::config::consts::DEFAULT_REQUEST_TIMEOUT_SECONDS),
            challenge_timeout: Duration::from_secs(
                crate::config::consts::DEFAULT_CHALLENGE_TIMEOUT_SECONDS,
            ),
        }
    }
}

impl From<&NetworkConfig> for NetSettings {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
            challenge_timeout: Duration::from_secs(config.challenge_timeout_seconds),
        }
    }
}

pub struct NetBridge {
    runtime: Handle,
    transport: Arc<dyn HttpTransport>,
    solver: Option<Arc<dyn ChallengeSolver>>,
    settings: NetSettings,
}

impl NetBridge {
    pub fn new(
        runtime: Handle,
        transport: Arc<dyn HttpTransport>,
        solver: Option<Arc<dyn ChallengeSolver>>,
        settings: NetSettings,
    ) -> Self {
        Self {
            runtime,
            transport,
            solver,
            settings,
        }
    }

    /// Builds the production bridge: a cookie-keeping `reqwest` transport and,
    /// when enabled, the cookie replay solver.
    pub fn from_config(runtime: Handle, config: &NetworkConfig) -> NetResult<Self> {
        let settings = NetSettings::from(config);
        let transport = Arc::new(ReqwestTransport::new(&settings.user_agent)?);
        let solver: Option<Arc<dyn ChallengeSolver>> = config.challenge.enabled.then(|| {
            Arc::new(CookieReplaySolver::new(Duration::from_millis(
                config.challenge.retry_delay_ms,
            ))) as Arc<dyn ChallengeSolver>
        });
        Ok(Self::new(runtime, transport, solver, settings))
    }

    pub fn settings(&self) -> &NetSettings {
        &self.settings
    }

    /// Resolves the guest request into something a transport can run.
    /// `None` when the url is missing or not http(s).
    pub fn prepare(&self, request: &Request) -> Option<PreparedRequest> {
        let url = normalize_url(request.url.as_deref()?)?;
        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| (name.clone(), v.clone())))
            .collect();
        if !request.has_header("user-agent") {
            headers.push(("User-Agent".to_string(), self.settings.user_agent.clone()));
        }
        Some(PreparedRequest {
            method: request.method,
            url,
            headers,
            body: request.body.clone(),
        })
    }

    /// Runs the transfer and blocks the calling thread until it finishes.
    ///
    /// Must not be called from inside the runtime's own worker threads.
    pub fn dispatch(&self, request: PreparedRequest) -> Response {
        let url = request.url.to_string();
        let (tx, rx) = oneshot::channel::<Response>();

        let transport = Arc::clone(&self.transport);
        let solver = self.solver.clone();
        let timeout = self.settings.request_timeout;
        let challenge_timeout = self.settings.challenge_timeout;

        debug!(
            "{}",
            RequestDispatched {
                method: request.method.as_str(),
                url: &url,
            }
        );

        self.runtime.spawn(async move {
            let response = transfer(transport.as_ref(), &request, timeout).await;
            match solver {
                Some(solver) if is_challenge(&response) => {
                    info!(
                        "{}",
                        ChallengeDetected {
                            url: request.url.as_str(),
                            status_code: response.status_code.unwrap_or_default(),
                            solver: solver.name(),
                        }
                    );
                    tokio::spawn(resolve_challenge(
                        transport,
                        solver,
                        request,
                        response,
                        challenge_timeout,
                        tx,
                    ));
                }
                _ => {
                    let _ = tx.send(response);
                }
            }
        });

        match rx.blocking_recv() {
            Ok(response) => response,
            Err(_) => {
                error!("{}", ResponseChannelClosed { url: &url });
                Response::failed(Some(url))
            }
        }
    }
}

async fn transfer(
    transport: &dyn HttpTransport,
    request: &PreparedRequest,
    timeout: Duration,
) -> Response {
    let url = request.url.as_str();
    match tokio::time::timeout(timeout, transport.execute(request)).await {
        Ok(Ok(response)) => {
            debug!(
                "{}",
                RequestCompleted {
                    url,
                    status_code: response.status_code.unwrap_or(-1),
                    body_bytes: response.data.as_ref().map_or(0, Vec::len),
                }
            );
            response
        }
        Ok(Err(e)) => {
            warn!("{}", TransportFailed { url, error: &e });
            Response::failed(Some(url.to_string()))
        }
        Err(_) => {
            warn!("{}", RequestTimedOut { url, timeout });
            Response::failed(Some(url.to_string()))
        }
    }
}

async fn resolve_challenge(
    transport: Arc<dyn HttpTransport>,
    solver: Arc<dyn ChallengeSolver>,
    mut request: PreparedRequest,
    challenge: Response,
    timeout: Duration,
    tx: oneshot::Sender<Response>,
) {
    let solved = tokio::time::timeout(timeout, solver.solve(&request, &challenge))
        .await
        .unwrap_or_else(|_| {
            Err(NetError::ChallengeUnresolved {
                url: request.url.to_string(),
                reason: format!("{} did not finish within {:?}", solver.name(), timeout),
            })
        });
    let response = match solved {
        Ok(headers) => {
            for (name, value) in headers {
                request.set_header(&name, value);
            }
            let retried = transfer(transport.as_ref(), &request, timeout).await;
            info!(
                "{}",
                ChallengeResolved {
                    url: request.url.as_str(),
                    status_code: retried.status_code,
                }
            );
            retried
        }
        Err(e) => {
            warn!(
                "{}",
                ChallengeFailed {
                    url: request.url.as_str(),
                    reason: &e.to_string(),
                }
            );
            challenge
        }
    };
    let _ = tx.send(response);
}
