// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Synchronous driver for one instantiated guest.
//!
//! Every entry point follows the same session: allocate the arguments, call
//! the export with a fresh fuel budget, copy the result out of the descriptor
//! store into owned models, then reset the store. Guests that trap, run out
//! of fuel, or return the wrong kind of value produce an empty list or a
//! [`SourceError::MissingValue`].

use std::time::Instant;

use tracing::{debug, warn};
use wasmtime::{Engine, Instance, Linker, Module, Store, Val};

use crate::backends::wasm::{WasmError, WasmResult};
use crate::errors::{SourceError, SourceResult};
use crate::imports::{allocate, link_imports, HostState};
use crate::models::{Chapter, DeepLink, Filter, Listing, Manga, MangaPageResult, Page};
use crate::net::{HttpMethod, Request};
use crate::observability::messages::source::{
    EntryPointCompleted, EntryPointMissing, EntryPointStarted, UnexpectedResult,
};
use crate::observability::messages::store::SessionReset;
use crate::observability::messages::wasm::ExportCallFailed;
use crate::observability::messages::StructuredLog;
use crate::source::manifest::FilterInfo;
use crate::store::{Descriptor, Value};

pub const INITIALIZE: &[&str] = &["initialize"];
pub const INITIALIZE_FILTERS: &[&str] = &["initialize_filters"];
pub const INITIALIZE_LISTINGS: &[&str] = &["initialize_listings"];
pub const MANGA_LIST: &[&str] = &["manga_list_request", "get_manga_list"];
pub const MANGA_LISTING: &[&str] = &["manga_listing_request", "get_manga_listing"];
pub const MANGA_DETAILS: &[&str] = &["manga_details_request", "get_manga_details"];
pub const CHAPTER_LIST: &[&str] = &["chapter_list_request", "get_chapter_list"];
pub const PAGE_LIST: &[&str] = &["page_list_request", "get_page_list"];
pub const HANDLE_URL: &[&str] = &["handle_url"];
pub const MODIFY_IMAGE_REQUEST: &[&str] = &["modify_image_request"];
pub const HANDLE_NOTIFICATION: &[&str] = &["handle_notification"];

pub struct SourceRuntime {
    store: Store<HostState>,
    instance: Instance,
    fuel: u64,
}

impl SourceRuntime {
    /// Links every host namespace and instantiates `module`. Imports the host
    /// does not provide trap when called rather than failing here.
    pub fn instantiate(engine: &Engine, module: &Module, host: HostState, fuel: u64) -> WasmResult<Self> {
        let mut linker = Linker::new(engine);
        link_imports(&mut linker).map_err(|e| WasmError::ModuleError(e.to_string()))?;
        linker
            .define_unknown_imports_as_traps(module)
            .map_err(|e| WasmError::ModuleError(e.to_string()))?;

        let mut store = Store::new(engine, host);
        store.set_fuel(fuel)?;
        let instance = linker
            .instantiate(&mut store, module)
            .map_err(|e| WasmError::ModuleError(e.to_string()))?;

        Ok(Self {
            store,
            instance,
            fuel,
        })
    }

    pub fn source_id(&self) -> &str {
        &self.store.data().session.source_id
    }

    pub fn host(&self) -> &HostState {
        self.store.data()
    }

    pub fn host_mut(&mut self) -> &mut HostState {
        self.store.data_mut()
    }

    pub fn has_export(&mut self, name: &str) -> bool {
        self.instance.get_func(&mut self.store, name).is_some()
    }

    /// Calls the first export in `names` that exists. `Ok(None)` for exports
    /// without results.
    pub fn invoke(&mut self, names: &[&str], params: &[Val]) -> WasmResult<Option<i32>> {
        let found = names
            .iter()
            .find_map(|name| Some((*name, self.instance.get_func(&mut self.store, name)?)));
        let Some((export, func)) = found else {
            return Err(WasmError::MissingExport(names.join(" / ")));
        };

        let source_id = self.source_id().to_string();
        let started = EntryPointStarted {
            source_id: &source_id,
            export,
            fuel: self.fuel,
        };
        let span = started.span("entry_point");
        let _guard = span.enter();
        started.log();

        self.store.set_fuel(self.fuel)?;
        let start_time = Instant::now();
        let mut results = vec![Val::I32(0); func.ty(&self.store).results().len()];
        func.call(&mut self.store, params, &mut results)?;

        EntryPointCompleted {
            source_id: &source_id,
            export,
            fuel_consumed: self.fuel.saturating_sub(self.store.get_fuel().unwrap_or(0)),
            duration: start_time.elapsed(),
        }
        .log();

        Ok(results.first().and_then(Val::i32))
    }

    /// [`Self::invoke`] with failures logged and flattened to `None`.
    fn call(&mut self, names: &[&str], params: &[Val]) -> Option<Descriptor> {
        match self.invoke(names, params) {
            Ok(result) => result,
            Err(WasmError::MissingExport(_)) => {
                debug!(
                    "{}",
                    EntryPointMissing {
                        source_id: self.source_id(),
                        exports: names,
                    }
                );
                None
            }
            Err(error) => {
                warn!(
                    "{}",
                    ExportCallFailed {
                        source_id: self.source_id(),
                        export: names[0],
                        error: &error,
                    }
                );
                None
            }
        }
    }

    fn store_value(&mut self, value: Value) -> Descriptor {
        allocate(&mut self.store.data_mut().store, value)
    }

    fn read(&self, descriptor: Option<Descriptor>) -> Option<&Value> {
        self.store.data().store.read(descriptor?)
    }

    fn unexpected(&self, export: &str, expected: &str) {
        warn!(
            "{}",
            UnexpectedResult {
                source_id: self.source_id(),
                export,
                expected,
            }
        );
    }

    /// Invalidates every descriptor and clears per-call session state.
    pub fn reset_session(&mut self) {
        let host = self.store.data_mut();
        let released = host.store.reset_all();
        host.session.end_chapter_list();
        debug!(
            "{}",
            SessionReset {
                source_id: &host.session.source_id,
                released,
            }
        );
    }

    fn session<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let result = f(self);
        self.reset_session();
        result
    }

    /// Runs the optional `initialize` export once after instantiation.
    pub fn initialize(&mut self) {
        self.session(|rt| {
            rt.call(INITIALIZE, &[]);
        });
    }

    /// Filters the guest appends to an array handed to `initialize_filters`.
    pub fn initialize_filters(&mut self) -> Vec<Filter> {
        self.session(|rt| {
            if !rt.has_export(INITIALIZE_FILTERS[0]) {
                return Vec::new();
            }
            let array = rt.store_value(Value::Array(Vec::new()));
            rt.call(INITIALIZE_FILTERS, &[Val::I32(array)]);
            match rt.read(Some(array)) {
                Some(Value::Array(items)) => items.iter().filter_map(filter_from_value).collect(),
                _ => Vec::new(),
            }
        })
    }

    pub fn initialize_listings(&mut self) -> Vec<Listing> {
        self.session(|rt| {
            if !rt.has_export(INITIALIZE_LISTINGS[0]) {
                return Vec::new();
            }
            let array = rt.store_value(Value::Array(Vec::new()));
            rt.call(INITIALIZE_LISTINGS, &[Val::I32(array)]);
            match rt.read(Some(array)) {
                Some(Value::Array(items)) => items.iter().filter_map(listing_from_value).collect(),
                _ => Vec::new(),
            }
        })
    }

    fn page_result(&mut self, export: &[&str], argument: Value, page: i32) -> MangaPageResult {
        self.session(|rt| {
            let descriptor = rt.store_value(argument);
            let result = rt.call(export, &[Val::I32(descriptor), Val::I32(page)]);
            match rt.read(result) {
                Some(Value::MangaPageResult(result)) => result.clone(),
                _ => {
                    rt.unexpected(export[0], "a manga page result");
                    MangaPageResult::default()
                }
            }
        })
    }

    pub fn manga_list(&mut self, filters: &[Filter], page: i32) -> MangaPageResult {
        let filters = Value::Array(filters.iter().cloned().map(Value::Filter).collect());
        self.page_result(MANGA_LIST, filters, page)
    }

    pub fn manga_listing(&mut self, listing: &Listing, page: i32) -> MangaPageResult {
        self.page_result(MANGA_LISTING, Value::Listing(listing.clone()), page)
    }

    pub fn manga_details(&mut self, manga: &Manga) -> SourceResult<Manga> {
        self.session(|rt| {
            let descriptor = rt.store_value(Value::Manga(manga.clone()));
            let result = rt.call(MANGA_DETAILS, &[Val::I32(descriptor)]);
            match rt.read(result) {
                Some(Value::Manga(details)) => Ok(details.clone()),
                _ => Err(SourceError::MissingValue {
                    export: MANGA_DETAILS[0],
                    expected: "manga",
                }),
            }
        })
    }

    /// Chapters are stamped with the manga id and numbered in guest order.
    pub fn chapter_list(&mut self, manga: &Manga) -> Vec<Chapter> {
        self.session(|rt| {
            rt.host_mut().session.begin_chapter_list(manga.id.as_str());
            let descriptor = rt.store_value(Value::Manga(manga.clone()));
            let result = rt.call(CHAPTER_LIST, &[Val::I32(descriptor)]);
            let chapters = collect(rt.read(result), |value| match value {
                Value::Chapter(chapter) => Some(chapter.clone()),
                _ => None,
            });
            match chapters {
                Some(chapters) => chapters
                    .into_iter()
                    .map(|chapter| Chapter {
                        manga_id: Some(manga.id.clone()),
                        ..chapter
                    })
                    .collect(),
                None => {
                    rt.unexpected(CHAPTER_LIST[0], "an array of chapters");
                    Vec::new()
                }
            }
        })
    }

    pub fn page_list(&mut self, chapter: &Chapter) -> Vec<Page> {
        self.session(|rt| {
            let descriptor = rt.store_value(Value::Chapter(chapter.clone()));
            let result = rt.call(PAGE_LIST, &[Val::I32(descriptor)]);
            let pages = collect(rt.read(result), |value| match value {
                Value::Page(page) => Some(page.clone()),
                _ => None,
            });
            match pages {
                Some(pages) => pages
                    .into_iter()
                    .map(|page| Page {
                        chapter_id: chapter.id.clone(),
                        ..page
                    })
                    .collect(),
                None => {
                    rt.unexpected(PAGE_LIST[0], "an array of pages");
                    Vec::new()
                }
            }
        })
    }

    pub fn handle_url(&mut self, url: &str) -> SourceResult<DeepLink> {
        self.session(|rt| {
            let descriptor = rt.store_value(Value::from(url));
            let result = rt.call(HANDLE_URL, &[Val::I32(descriptor)]);
            match rt.read(result) {
                Some(Value::DeepLink(link)) => {
                    let mut link = link.clone();
                    if let (Some(manga), Some(chapter)) = (&link.manga, link.chapter.as_mut()) {
                        chapter.manga_id = Some(manga.id.clone());
                    }
                    Ok(link)
                }
                _ => Err(SourceError::MissingValue {
                    export: HANDLE_URL[0],
                    expected: "deep link",
                }),
            }
        })
    }

    /// Builds the request used to fetch an image, letting the guest add
    /// headers. Guests without the export get the default request.
    pub fn modify_image_request(&mut self, url: &str) -> SourceResult<Request> {
        let mut request = Request::new(HttpMethod::Get);
        if url.is_empty() {
            return Ok(request);
        }
        request.url = Some(url.to_string());
        let user_agent = self.host().net.bridge().settings().user_agent.clone();
        request
            .headers
            .insert("User-Agent".to_string(), Some(user_agent));

        self.session(|rt| {
            let descriptor = rt.store_value(Value::Request(request));
            rt.call(MODIFY_IMAGE_REQUEST, &[Val::I32(descriptor)]);
            match rt.read(Some(descriptor)) {
                Some(Value::Request(request)) => Ok(request.clone()),
                _ => Err(SourceError::MissingValue {
                    export: MODIFY_IMAGE_REQUEST[0],
                    expected: "request",
                }),
            }
        })
    }

    pub fn handle_notification(&mut self, key: &str) {
        self.session(|rt| {
            let descriptor = rt.store_value(Value::from(key));
            rt.call(HANDLE_NOTIFICATION, &[Val::I32(descriptor)]);
        });
    }
}

/// All-or-nothing conversion of an array value.
fn collect<T>(value: Option<&Value>, pick: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    match value? {
        Value::Array(items) => items.iter().map(pick).collect(),
        _ => None,
    }
}

fn to_json(value: &Value) -> Option<serde_json::Value> {
    Some(match value {
        Value::Null => serde_json::Value::Null,
        Value::Int(i) => (*i).into(),
        Value::Float(f) => serde_json::Number::from_f64(*f)?.into(),
        Value::String(s) => s.clone().into(),
        Value::Bool(b) => (*b).into(),
        Value::Array(items) => items.iter().map(to_json).collect::<Option<Vec<_>>>()?.into(),
        Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| Some((k.clone(), to_json(v)?)))
                .collect::<Option<_>>()?,
        ),
        _ => return None,
    })
}

/// Accepts filter values and plain objects shaped like manifest filters.
fn filter_from_value(value: &Value) -> Option<Filter> {
    match value {
        Value::Filter(filter) => Some(filter.clone()),
        Value::Object(_) => serde_json::from_value::<FilterInfo>(to_json(value)?)
            .ok()?
            .parse(),
        _ => None,
    }
}

fn listing_from_value(value: &Value) -> Option<Listing> {
    match value {
        Value::Listing(listing) => Some(listing.clone()),
        Value::String(name) => Some(Listing::new(name.as_str())),
        Value::Object(map) => map.get("name")?.as_str().map(Listing::new),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_filter_objects_convert() {
        let object = Value::Object(HashMap::from([
            ("type".to_string(), Value::from("check")),
            ("name".to_string(), Value::from("Completed")),
            ("default".to_string(), Value::Bool(true)),
        ]));

        assert_eq!(
            filter_from_value(&object),
            Some(Filter::Check {
                name: "Completed".into(),
                can_exclude: false,
                value: Some(true),
                default: Some(true),
            })
        );
        assert_eq!(filter_from_value(&Value::Int(1)), None);
    }

    #[test]
    fn test_listing_values_convert() {
        let object = Value::Object(HashMap::from([("name".to_string(), Value::from("Popular"))]));

        assert_eq!(listing_from_value(&object), Some(Listing::new("Popular")));
        assert_eq!(listing_from_value(&Value::from("Latest")), Some(Listing::new("Latest")));
        assert_eq!(listing_from_value(&Value::Null), None);
    }

    #[test]
    fn test_collect_is_all_or_nothing() {
        let mixed = Value::Array(vec![Value::Int(1), Value::from("x")]);
        let ints = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        let pick = |v: &Value| match v {
            Value::Int(i) => Some(*i),
            _ => None,
        };

        assert_eq!(collect(Some(&mixed), pick), None);
        assert_eq!(collect(Some(&ints), pick), Some(vec![1, 2]));
        assert_eq!(collect(None, pick), None);
    }
}
