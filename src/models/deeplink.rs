// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::models::{Chapter, Manga};
use crate::store::{AsPropertyMap, Value};

/// Result of resolving an external url back into catalog entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepLink {
    pub manga: Option<Manga>,
    pub chapter: Option<Chapter>,
}

impl AsPropertyMap for DeepLink {
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "manga" => self.manga.clone().map(Value::Manga),
            "chapter" => self.chapter.clone().map(Value::Chapter),
            _ => None,
        }
    }
}
