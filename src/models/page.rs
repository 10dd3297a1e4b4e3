// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::store::{AsPropertyMap, Value};

/// A single readable page. Exactly one of the payload fields is usually set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub source_id: String,
    pub chapter_id: String,
    pub index: i32,
    pub image_url: Option<String>,
    pub base64: Option<String>,
    pub text: Option<String>,
}

impl AsPropertyMap for Page {
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "index" => Some(Value::Int(self.index.into())),
            "chapterId" => Some(Value::from(self.chapter_id.as_str())),
            "imageUrl" => self.image_url.as_deref().map(Value::from),
            "base64" => self.base64.as_deref().map(Value::from),
            "text" => self.text.as_deref().map(Value::from),
            _ => None,
        }
    }
}
