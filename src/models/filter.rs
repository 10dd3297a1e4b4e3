// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::store::{AsPropertyMap, Value};

/// Selected option of a sort filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSelection {
    pub index: i32,
    pub ascending: bool,
}

impl SortSelection {
    fn to_value(self) -> Value {
        Value::Object(HashMap::from([
            ("index".to_string(), Value::Int(self.index.into())),
            ("ascending".to_string(), Value::Bool(self.ascending)),
        ]))
    }
}

/// Search filters a source advertises and later receives back with values set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Filter {
    Text {
        name: String,
        value: String,
    },
    Title {
        value: String,
    },
    Author {
        value: String,
    },
    #[serde(rename_all = "camelCase")]
    Check {
        name: String,
        can_exclude: bool,
        value: Option<bool>,
        default: Option<bool>,
    },
    #[serde(rename_all = "camelCase")]
    Genre {
        name: String,
        can_exclude: bool,
        value: Option<bool>,
        default: Option<bool>,
    },
    Select {
        name: String,
        options: Vec<String>,
        value: i32,
        default: i32,
    },
    #[serde(rename_all = "camelCase")]
    Sort {
        name: String,
        options: Vec<String>,
        can_ascend: bool,
        value: Option<SortSelection>,
        default: Option<SortSelection>,
    },
    Group {
        name: String,
        filters: Vec<Filter>,
    },
}

impl Filter {
    pub fn title(query: impl Into<String>) -> Self {
        Self::Title {
            value: query.into(),
        }
    }

    /// Type name guests compare against when walking a filter list.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "TextFilter",
            Self::Title { .. } => "TitleFilter",
            Self::Author { .. } => "AuthorFilter",
            Self::Check { .. } => "CheckFilter",
            Self::Genre { .. } => "GenreFilter",
            Self::Select { .. } => "SelectFilter",
            Self::Sort { .. } => "SortFilter",
            Self::Group { .. } => "GroupFilter",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Title { .. } => "Title",
            Self::Author { .. } => "Author",
            Self::Text { name, .. }
            | Self::Check { name, .. }
            | Self::Genre { name, .. }
            | Self::Select { name, .. }
            | Self::Sort { name, .. }
            | Self::Group { name, .. } => name,
        }
    }
}

fn strings(values: &[String]) -> Value {
    Value::Array(values.iter().map(|s| Value::from(s.as_str())).collect())
}

impl AsPropertyMap for Filter {
    fn property(&self, key: &str) -> Option<Value> {
        match (key, self) {
            ("type", _) => Some(Value::from(self.type_name())),
            ("name", _) => Some(Value::from(self.name())),

            ("value", Self::Text { value, .. })
            | ("value", Self::Title { value })
            | ("value", Self::Author { value }) => Some(Value::from(value.as_str())),
            ("value", Self::Check { value, .. }) | ("value", Self::Genre { value, .. }) => {
                value.map(Value::Bool)
            }
            ("value", Self::Select { value, .. }) => Some(Value::Int((*value).into())),
            ("value", Self::Sort { value, .. }) => value.map(SortSelection::to_value),

            ("default", Self::Check { default, .. }) | ("default", Self::Genre { default, .. }) => {
                default.map(Value::Bool)
            }
            ("default", Self::Select { default, .. }) => Some(Value::Int((*default).into())),
            ("default", Self::Sort { default, .. }) => default.map(SortSelection::to_value),

            ("canExclude", Self::Check { can_exclude, .. })
            | ("canExclude", Self::Genre { can_exclude, .. }) => Some(Value::Bool(*can_exclude)),
            ("options", Self::Select { options, .. }) | ("options", Self::Sort { options, .. }) => {
                Some(strings(options))
            }
            ("canAscend", Self::Sort { can_ascend, .. }) => Some(Value::Bool(*can_ascend)),
            ("filters", Self::Group { filters, .. }) => Some(Value::Array(
                filters.iter().cloned().map(Value::Filter).collect(),
            )),
            _ => None,
        }
    }
}
