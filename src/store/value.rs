// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::dom::{DomNode, DomNodeList};
use crate::models::{Chapter, DeepLink, Filter, Listing, Manga, MangaPageResult, Page};
use crate::net::{Request, Response};

/// Read-only named access to a typed entity's fields.
pub trait AsPropertyMap {
    fn property(&self, key: &str) -> Option<Value>;
}

/// Everything a descriptor can refer to.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Array(Vec<Value>),
    Object(HashMap<String, Value>),
    Date(DateTime<Utc>),
    Node(DomNode),
    NodeList(DomNodeList),
    Request(Request),
    Response(Response),
    Manga(Manga),
    Chapter(Chapter),
    Page(Page),
    MangaPageResult(MangaPageResult),
    DeepLink(DeepLink),
    Listing(Listing),
    Filter(Filter),
}

/// Type tags reported to guests by `typeof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null = 0,
    Int = 1,
    Float = 2,
    String = 3,
    Bool = 4,
    Array = 5,
    Object = 6,
    Date = 7,
    Node = 8,
    Unknown = 9,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::Bool(_) => ValueKind::Bool,
            Self::Array(_) => ValueKind::Array,
            Self::Date(_) => ValueKind::Date,
            Self::Node(_) | Self::NodeList(_) => ValueKind::Node,
            Self::Object(_)
            | Self::Request(_)
            | Self::Response(_)
            | Self::Manga(_)
            | Self::Chapter(_)
            | Self::Page(_)
            | Self::MangaPageResult(_)
            | Self::DeepLink(_)
            | Self::Listing(_)
            | Self::Filter(_) => ValueKind::Object,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Named field lookup shared by plain maps and typed entities.
    pub fn property(&self, key: &str) -> Option<Value> {
        match self {
            Self::Object(map) => map.get(key).cloned(),
            Self::Request(request) => request.property(key),
            Self::Response(response) => response.property(key),
            Self::Manga(manga) => manga.property(key),
            Self::Chapter(chapter) => chapter.property(key),
            Self::Page(page) => page.property(key),
            Self::MangaPageResult(result) => result.property(key),
            Self::DeepLink(link) => link.property(key),
            Self::Listing(listing) => listing.property(key),
            Self::Filter(filter) => filter.property(key),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Integers that fit in `i64` stay integral, every other number becomes a float.
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_numbers_keep_integers() {
        let value = Value::from(serde_json::json!({"a": 1, "b": 1.5, "c": [true, null]}));

        assert_eq!(value.property("a"), Some(Value::Int(1)));
        assert_eq!(value.property("b"), Some(Value::Float(1.5)));
        assert_eq!(
            value.property("c"),
            Some(Value::Array(vec![Value::Bool(true), Value::Null]))
        );
    }

    #[test]
    fn test_entities_report_object_kind() {
        let manga = Value::Manga(Manga::new("src", "m1"));

        assert_eq!(manga.kind(), ValueKind::Object);
        assert_eq!(manga.property("id"), Some(Value::from("m1")));
        assert_eq!(Value::Null.kind() as i32, 0);
        assert_eq!(Value::Date(Utc::now()).kind() as i32, 7);
    }
}
