// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{AsPropertyMap, Value};

/// Language assigned when a guest does not name one.
pub const DEFAULT_CHAPTER_LANG: &str = "en";

/// A content unit belonging to a manga.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub source_id: String,
    pub id: String,
    pub manga_id: Option<String>,
    pub title: Option<String>,
    pub scanlator: Option<String>,
    pub url: Option<String>,
    pub lang: String,
    pub chapter_num: Option<f32>,
    pub volume_num: Option<f32>,
    pub date_uploaded: Option<DateTime<Utc>>,
    pub source_order: i32,
}

impl Chapter {
    pub fn new(source_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            id: id.into(),
            manga_id: None,
            title: None,
            scanlator: None,
            url: None,
            lang: DEFAULT_CHAPTER_LANG.to_string(),
            chapter_num: None,
            volume_num: None,
            date_uploaded: None,
            source_order: 0,
        }
    }
}

impl AsPropertyMap for Chapter {
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id.as_str())),
            "mangaId" => self.manga_id.as_deref().map(Value::from),
            "title" => self.title.as_deref().map(Value::from),
            "scanlator" => self.scanlator.as_deref().map(Value::from),
            "url" => self.url.as_deref().map(Value::from),
            "lang" => Some(Value::from(self.lang.as_str())),
            "chapterNum" => self.chapter_num.map(|n| Value::Float(n.into())),
            "volumeNum" => self.volume_num.map(|n| Value::Float(n.into())),
            "dateUploaded" => self.date_uploaded.map(Value::Date),
            "sourceOrder" => Some(Value::Int(self.source_order.into())),
            _ => None,
        }
    }
}
