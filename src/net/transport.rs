// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Method;

use crate::errors::{NetError, NetResult};
use crate::net::{HttpMethod, PreparedRequest, Response};
use crate::traits::HttpTransport;

/// `reqwest`-backed transport with a persistent cookie jar, so clearance
/// cookies picked up during a challenge are replayed on later requests.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> NetResult<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .build()
            .map_err(|e| NetError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Folds repeated headers into one entry. `Set-Cookie` values are joined by
/// newlines since cookie attributes may themselves contain commas.
fn collect_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    let mut collected: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        let separator = if name == reqwest::header::SET_COOKIE {
            "\n"
        } else {
            ", "
        };
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(separator);
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    collected
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &PreparedRequest) -> NetResult<Response> {
        let mut builder = self
            .client
            .request(method(request.method), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status_code = i32::from(response.status().as_u16());
        let url = response.url().to_string();
        let headers = collect_headers(response.headers());
        let data = response.bytes().await?.to_vec();

        Ok(Response {
            data: Some(data),
            status_code: Some(status_code),
            headers,
            read_cursor: 0,
            url: Some(url),
        })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}
