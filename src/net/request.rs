// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use url::Url;

use crate::store::{AsPropertyMap, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Head,
    Put,
    Delete,
}

impl HttpMethod {
    /// Unknown method codes fall back to GET.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Post,
            2 => Self::Head,
            3 => Self::Put,
            4 => Self::Delete,
            _ => Self::Get,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Self::Get => 0,
            Self::Post => 1,
            Self::Head => 2,
            Self::Put => 3,
            Self::Delete => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Head => "HEAD",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// A guest-configured request. A header set to `None` is removed before sending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub url: Option<String>,
    pub method: HttpMethod,
    pub headers: HashMap<String, Option<String>>,
    pub body: Option<Vec<u8>>,
    pub response: Option<Response>,
}

impl Request {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(key, value)| value.is_some() && key.eq_ignore_ascii_case(name))
    }
}

/// Outcome of a transfer. `read_cursor` never exceeds the body length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub data: Option<Vec<u8>>,
    pub status_code: Option<i32>,
    pub headers: HashMap<String, String>,
    pub read_cursor: usize,
    pub url: Option<String>,
}

impl Response {
    /// Transport-level failure: no body and no status.
    pub fn failed(url: Option<String>) -> Self {
        Self {
            url,
            ..Self::default()
        }
    }

    pub fn synthetic(status_code: i32, url: Option<String>) -> Self {
        Self {
            data: Some(Vec::new()),
            status_code: Some(status_code),
            url,
            ..Self::default()
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn remaining(&self) -> Option<usize> {
        self.data
            .as_ref()
            .map(|data| data.len().saturating_sub(self.read_cursor))
    }

    /// Hands out the next `size` bytes and advances the cursor.
    /// A read that would pass the end yields nothing and moves nothing.
    pub fn take_chunk(&mut self, size: usize) -> Option<Vec<u8>> {
        let data = self.data.as_ref()?;
        let end = self.read_cursor.checked_add(size)?;
        if size == 0 || end > data.len() {
            return None;
        }
        let chunk = data[self.read_cursor..end].to_vec();
        self.read_cursor = end;
        Some(chunk)
    }
}

/// A request after url normalization and header defaults, ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    /// Replaces any existing header with the same name.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value));
    }
}

/// Trims, upgrades scheme-relative urls to https, and only accepts http(s).
pub fn normalize_url(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = match trimmed.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => trimmed.to_string(),
    };
    let url = Url::parse(&candidate).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn bytes_value(bytes: &[u8]) -> Value {
    Value::Array(bytes.iter().map(|b| Value::Int((*b).into())).collect())
}

impl AsPropertyMap for Request {
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "url" => self.url.as_deref().map(Value::from),
            "method" => Some(Value::Int(self.method.as_raw().into())),
            "headers" => Some(Value::Object(
                self.headers
                    .iter()
                    .map(|(key, value)| {
                        let value = value.as_deref().map(Value::from).unwrap_or(Value::Null);
                        (key.clone(), value)
                    })
                    .collect(),
            )),
            "body" => self.body.as_deref().map(bytes_value),
            "response" => self.response.clone().map(Value::Response),
            _ => None,
        }
    }
}

impl AsPropertyMap for Response {
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "data" => Some(bytes_value(self.data.as_deref().unwrap_or_default())),
            "headers" => Some(Value::Object(
                self.headers
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::from(value.as_str())))
                    .collect(),
            )),
            "status_code" => self.status_code.map(|code| Value::Int(code.into())),
            "url" => self.url.as_deref().map(Value::from),
            _ => None,
        }
    }
}
