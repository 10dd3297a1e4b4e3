// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::store::{AsPropertyMap, Value};

/// Publication state reported by a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishingStatus {
    #[default]
    Unknown,
    Ongoing,
    Completed,
    Cancelled,
    Hiatus,
    NotPublished,
}

impl PublishingStatus {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Ongoing,
            2 => Self::Completed,
            3 => Self::Cancelled,
            4 => Self::Hiatus,
            5 => Self::NotPublished,
            _ => Self::Unknown,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Ongoing => 1,
            Self::Completed => 2,
            Self::Cancelled => 3,
            Self::Hiatus => 4,
            Self::NotPublished => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentRating {
    #[default]
    Safe,
    Suggestive,
    Nsfw,
}

impl ContentRating {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Suggestive,
            2 => Self::Nsfw,
            _ => Self::Safe,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Self::Safe => 0,
            Self::Suggestive => 1,
            Self::Nsfw => 2,
        }
    }
}

/// Reading direction hint for the reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viewer {
    #[default]
    Default,
    Rtl,
    Ltr,
    Vertical,
    Scroll,
}

impl Viewer {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Rtl,
            2 => Self::Ltr,
            3 => Self::Vertical,
            4 => Self::Scroll,
            _ => Self::Default,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Self::Default => 0,
            Self::Rtl => 1,
            Self::Ltr => 2,
            Self::Vertical => 3,
            Self::Scroll => 4,
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub source_id: String,
    pub id: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub artist: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cover: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub status: PublishingStatus,
    #[serde(default)]
    pub nsfw: ContentRating,
    #[serde(default)]
    pub viewer: Viewer,
}

impl Manga {
    pub fn new(source_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            id: id.into(),
            ..Self::default()
        }
    }
}

impl AsPropertyMap for Manga {
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id.as_str())),
            "title" => self.title.as_deref().map(Value::from),
            "author" => self.author.as_deref().map(Value::from),
            "artist" => self.artist.as_deref().map(Value::from),
            "description" => self.description.as_deref().map(Value::from),
            "tags" => Some(Value::Array(
                self.tags.iter().map(|tag| Value::from(tag.as_str())).collect(),
            )),
            "cover" => self.cover.as_deref().map(Value::from),
            "url" => self.url.as_deref().map(Value::from),
            "status" => Some(Value::Int(self.status.as_raw().into())),
            "nsfw" => Some(Value::Int(self.nsfw.as_raw().into())),
            "viewer" => Some(Value::Int(self.viewer.as_raw().into())),
            _ => None,
        }
    }
}

/// One page of catalog entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaPageResult {
    pub manga: Vec<Manga>,
    pub has_next_page: bool,
}

impl AsPropertyMap for MangaPageResult {
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "manga" => Some(Value::Array(
                self.manga.iter().cloned().map(Value::Manga).collect(),
            )),
            "hasNextPage" => Some(Value::Bool(self.has_next_page)),
            _ => None,
        }
    }
}
