// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `source.json` and the filter descriptions it carries.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{SourceError, SourceResult};
use crate::models::{Filter, Listing, SortSelection};

pub const MANIFEST_FILE: &str = "source.json";
pub const FILTERS_FILE: &str = "filters.json";
pub const MODULE_FILE: &str = "main.wasm";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub id: String,
    pub lang: String,
    pub name: String,
    pub version: i32,
    pub url: Option<String>,
    pub urls: Option<Vec<String>>,
    pub nsfw: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub code: String,
    pub value: Option<String>,
    #[serde(rename = "default")]
    pub is_default: Option<bool>,
}

/// Untyped filter description as written by source authors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: Option<String>,
    #[serde(rename = "default")]
    pub default_value: Option<serde_json::Value>,
    pub filters: Option<Vec<FilterInfo>>,
    pub options: Option<Vec<String>>,
    pub can_exclude: Option<bool>,
    pub can_ascend: Option<bool>,
}

impl FilterInfo {
    /// Builds the typed filter. Unknown kinds yield `None`.
    pub fn parse(&self) -> Option<Filter> {
        let name = self.name.clone().unwrap_or_default();
        let options = self.options.clone().unwrap_or_default();
        let can_exclude = self.can_exclude.unwrap_or(false);
        let default = self.default_value.as_ref();

        let filter = match self.kind.as_str() {
            "title" => Filter::Title {
                value: String::new(),
            },
            "author" => Filter::Author {
                value: String::new(),
            },
            "select" => {
                let index = default
                    .and_then(serde_json::Value::as_i64)
                    .and_then(|i| i32::try_from(i).ok())
                    .unwrap_or(0);
                Filter::Select {
                    name,
                    options,
                    value: index,
                    default: index,
                }
            }
            "sort" => {
                let selection = sort_selection(default);
                Filter::Sort {
                    name,
                    options,
                    can_ascend: self.can_ascend.unwrap_or(false),
                    value: Some(selection),
                    default: Some(selection),
                }
            }
            "check" | "genre" => {
                let value = default.and_then(serde_json::Value::as_bool);
                if self.kind == "check" {
                    Filter::Check {
                        name,
                        can_exclude,
                        value,
                        default: value,
                    }
                } else {
                    Filter::Genre {
                        name,
                        can_exclude,
                        value,
                        default: value,
                    }
                }
            }
            "group" => Filter::Group {
                name,
                filters: self
                    .filters
                    .iter()
                    .flatten()
                    .filter_map(FilterInfo::parse)
                    .collect(),
            },
            _ => return None,
        };
        Some(filter)
    }
}

fn sort_selection(default: Option<&serde_json::Value>) -> SortSelection {
    let Some(object) = default.and_then(serde_json::Value::as_object) else {
        return SortSelection::default();
    };
    if !object.contains_key("index") {
        return SortSelection::default();
    }
    SortSelection {
        index: object
            .get("index")
            .and_then(serde_json::Value::as_i64)
            .and_then(|i| i32::try_from(i).ok())
            .unwrap_or(0),
        ascending: object
            .get("ascending")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false),
    }
}

/// Filters applied when the caller picks none: every top-level filter except
/// free-text ones, plus checks inside groups that carry a default.
pub fn default_filters(filters: &[Filter]) -> Vec<Filter> {
    let mut defaults = Vec::new();
    for filter in filters {
        match filter {
            Filter::Group { filters, .. } => defaults.extend(
                filters
                    .iter()
                    .filter(|f| matches!(f, Filter::Check { default: Some(_), .. }))
                    .cloned(),
            ),
            Filter::Title { .. } | Filter::Author { .. } => {}
            other => defaults.push(other.clone()),
        }
    }
    defaults
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceManifest {
    pub info: SourceInfo,
    pub languages: Option<Vec<LanguageInfo>>,
    pub listings: Option<Vec<Listing>>,
    pub filters: Option<Vec<FilterInfo>>,
}

fn read(path: PathBuf) -> SourceResult<Vec<u8>> {
    fs::read(&path).map_err(|source| SourceError::Io { path, source })
}

impl SourceManifest {
    /// Reads `source.json` from a bundle. Filters missing from the manifest
    /// are taken from a sibling `filters.json` when one exists.
    pub fn load(bundle: &Path) -> SourceResult<Self> {
        let path = bundle.join(MANIFEST_FILE);
        let bytes = read(path.clone())?;
        let mut manifest: SourceManifest = serde_json::from_slice(&bytes)
            .map_err(|source| SourceError::Manifest { path, source })?;

        if manifest.filters.is_none() {
            let path = bundle.join(FILTERS_FILE);
            if path.is_file() {
                let bytes = read(path.clone())?;
                manifest.filters = Some(
                    serde_json::from_slice(&bytes)
                        .map_err(|source| SourceError::Manifest { path, source })?,
                );
            }
        }

        Ok(manifest)
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn parsed_filters(&self) -> Vec<Filter> {
        self.filters
            .iter()
            .flatten()
            .filter_map(FilterInfo::parse)
            .collect()
    }

    pub fn listings(&self) -> Vec<Listing> {
        self.listings.clone().unwrap_or_default()
    }

    pub fn languages(&self) -> &[LanguageInfo] {
        self.languages.as_deref().unwrap_or_default()
    }
}
