// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end tests driving small WAT guests through the actor.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use wasmtime::Module;

use crate::backends::wasm::create_engine;
use crate::config::Config;
use crate::errors::SourceError;
use crate::imports::HostState;
use crate::models::{Chapter, Filter, Listing, Manga};
use crate::net::testing::{multi_thread_runtime, net_module, StubTransport};
use crate::net::RateLimiter;
use crate::source::manifest::{SourceManifest, MANIFEST_FILE, MODULE_FILE};
use crate::source::{Source, SourceRuntime};
use crate::store::Value;

const MANIFEST: &str = r#"{
    "info": { "id": "en.fixture", "lang": "en", "name": "Fixture", "version": 2 },
    "listings": [{ "name": "Latest" }],
    "filters": [{ "type": "title" }]
}"#;

/// Exercises every entry point against static data at fixed offsets.
const CATALOG_GUEST: &str = r#"
(module
  (import "std" "create_string" (func $create_string (param i32 i32) (result i32)))
  (import "std" "create_array" (func $create_array (result i32)))
  (import "std" "create_object" (func $create_object (result i32)))
  (import "std" "array_append" (func $array_append (param i32 i32)))
  (import "std" "object_set" (func $object_set (param i32 i32 i32 i32)))
  (import "aidoku" "create_manga" (func $create_manga
    (param i32 i32 i32 i32 i32 i32 i32 i32 i32 i32 i32 i32 i32 i32 i32 i32 i32 i32 i32 i32)
    (result i32)))
  (import "aidoku" "create_manga_result" (func $create_manga_result (param i32 i32) (result i32)))
  (import "aidoku" "create_chapter" (func $create_chapter
    (param i32 i32 i32 i32 f32 f32 f64 i32 i32 i32 i32 i32 i32) (result i32)))
  (import "aidoku" "create_page" (func $create_page
    (param i32 i32 i32 i32 i32 i32 i32) (result i32)))
  (import "aidoku" "create_deeplink" (func $create_deeplink (param i32 i32) (result i32)))
  (import "net" "set_header" (func $set_header (param i32 i32 i32 i32 i32)))

  (memory (export "memory") 1)
  (data (i32.const 0) "m1")
  (data (i32.const 8) "Title")
  (data (i32.const 16) "c1")
  (data (i32.const 24) "c2")
  (data (i32.const 32) "https://img/1.png")
  (data (i32.const 64) "Popular")
  (data (i32.const 80) "type")
  (data (i32.const 88) "check")
  (data (i32.const 96) "name")
  (data (i32.const 104) "Done")
  (data (i32.const 112) "Referer")
  (data (i32.const 120) "https://example.org/")

  (func $manga (result i32)
    (call $create_manga
      (i32.const 0) (i32.const 2)
      (i32.const 0) (i32.const 0)
      (i32.const 8) (i32.const 5)
      (i32.const 0) (i32.const 0)
      (i32.const 0) (i32.const 0)
      (i32.const 0) (i32.const 0)
      (i32.const 0) (i32.const 0)
      (i32.const 0) (i32.const 0) (i32.const 0)
      (i32.const 1) (i32.const 0) (i32.const 0)))

  (func $chapter (param $id i32) (param $number f32) (result i32)
    (call $create_chapter
      (local.get $id) (i32.const 2)
      (i32.const 0) (i32.const 0)
      (f32.const -1) (local.get $number) (f64.const 0)
      (i32.const 0) (i32.const 0)
      (i32.const 0) (i32.const 0)
      (i32.const 0) (i32.const 0)))

  (func (export "initialize_filters") (param $filters i32)
    (local $object i32)
    (local.set $object (call $create_object))
    (call $object_set (local.get $object) (i32.const 80) (i32.const 4)
      (call $create_string (i32.const 88) (i32.const 5)))
    (call $object_set (local.get $object) (i32.const 96) (i32.const 4)
      (call $create_string (i32.const 104) (i32.const 4)))
    (call $array_append (local.get $filters) (local.get $object)))

  (func (export "initialize_listings") (param $listings i32)
    (call $array_append (local.get $listings)
      (call $create_string (i32.const 64) (i32.const 7))))

  (func (export "get_manga_list") (param $filters i32) (param $page i32) (result i32)
    (local $array i32)
    (local.set $array (call $create_array))
    (call $array_append (local.get $array) (call $manga))
    (call $create_manga_result (local.get $array) (i32.const 1)))

  (func (export "get_manga_details") (param $manga i32) (result i32)
    (call $manga))

  (func (export "get_chapter_list") (param $manga i32) (result i32)
    (local $array i32)
    (local.set $array (call $create_array))
    (call $array_append (local.get $array) (call $chapter (i32.const 16) (f32.const 1)))
    (call $array_append (local.get $array) (call $chapter (i32.const 24) (f32.const 2)))
    (local.get $array))

  (func (export "get_page_list") (param $chapter i32) (result i32)
    (local $array i32)
    (local.set $array (call $create_array))
    (call $array_append (local.get $array)
      (call $create_page (i32.const 0) (i32.const 32) (i32.const 17)
        (i32.const 0) (i32.const 0) (i32.const 0) (i32.const 0)))
    (local.get $array))

  (func (export "handle_url") (param $url i32) (result i32)
    (call $create_deeplink (call $manga) (call $chapter (i32.const 16) (f32.const 1))))

  (func (export "modify_image_request") (param $request i32)
    (call $set_header (local.get $request)
      (i32.const 112) (i32.const 7) (i32.const 120) (i32.const 20)))
)
"#;

const EMPTY_GUEST: &str = r#"(module (memory (export "memory") 1))"#;

const SPINNING_GUEST: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "get_manga_list") (param i32 i32) (result i32)
    (loop $spin (br $spin))
    (i32.const 0))
)
"#;

/// Keeps the handle it was given in a global so a later call can report it.
const REMEMBERING_GUEST: &str = r#"
(module
  (import "std" "typeof" (func $typeof (param i32) (result i32)))
  (memory (export "memory") 1)
  (global $kept (mut i32) (i32.const 0))
  (func (export "handle_notification") (param $key i32)
    (global.set $kept (local.get $key)))
  (func (export "kept") (result i32)
    (global.get $kept))
  (func (export "kept_type") (result i32)
    (call $typeof (global.get $kept)))
)
"#;

fn manifest() -> SourceManifest {
    serde_json::from_str(MANIFEST).unwrap()
}

fn start(runtime: &tokio::runtime::Runtime, guest: &str, fuel: u64) -> Result<Source, SourceError> {
    let bytes = wat::parse_str(guest).unwrap();
    let net = net_module(
        runtime,
        Arc::new(StubTransport::ok(b"{}")),
        RateLimiter::new(-1, Duration::from_secs(60)),
    );
    runtime.block_on(Source::start(manifest(), bytes, net, fuel))
}

fn instantiate(runtime: &tokio::runtime::Runtime, guest: &str, fuel: u64) -> SourceRuntime {
    let engine = create_engine().unwrap();
    let module = Module::new(&engine, wat::parse_str(guest).unwrap()).unwrap();
    let net = net_module(
        runtime,
        Arc::new(StubTransport::ok(b"{}")),
        RateLimiter::new(-1, Duration::from_secs(60)),
    );
    let host = HostState::new("en.fixture", net);
    SourceRuntime::instantiate(&engine, &module, host, fuel).unwrap()
}

fn manga(id: &str) -> Manga {
    Manga::new("en.fixture", id)
}

#[test]
fn test_startup_merges_manifest_and_guest_registrations() {
    let runtime = multi_thread_runtime();
    let source = start(&runtime, CATALOG_GUEST, 10_000_000).unwrap();

    assert_eq!(source.id(), "en.fixture");
    assert_eq!(
        source.filters(),
        &[
            Filter::Title {
                value: String::new()
            },
            Filter::Check {
                name: "Done".into(),
                can_exclude: false,
                value: None,
                default: None,
            },
        ]
    );
    assert_eq!(source.listings(), &[Listing::new("Latest"), Listing::new("Popular")]);
}

#[test]
fn test_manga_list_and_search() {
    let runtime = multi_thread_runtime();
    let source = start(&runtime, CATALOG_GUEST, 10_000_000).unwrap();

    let result = runtime
        .block_on(source.search_manga("query", Vec::new(), 1))
        .unwrap();

    assert!(result.has_next_page);
    assert_eq!(result.manga.len(), 1);
    assert_eq!(result.manga[0].id, "m1");
    assert_eq!(result.manga[0].source_id, "en.fixture");
    assert_eq!(result.manga[0].title.as_deref(), Some("Title"));
}

#[test]
fn test_details_and_chapters_are_stamped() {
    let runtime = multi_thread_runtime();
    let source = start(&runtime, CATALOG_GUEST, 10_000_000).unwrap();

    let details = runtime.block_on(source.get_manga_details(manga("m1"))).unwrap();
    assert_eq!(details.title.as_deref(), Some("Title"));

    let chapters = runtime.block_on(source.get_chapter_list(manga("m1"))).unwrap();
    let ids: Vec<&str> = chapters.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
    assert_eq!(chapters[0].source_order, 0);
    assert_eq!(chapters[1].source_order, 1);
    assert_eq!(chapters[1].chapter_num, Some(2.0));
    assert_eq!(chapters[0].volume_num, None);
    assert!(chapters.iter().all(|c| c.manga_id.as_deref() == Some("m1")));

    // counter restarts on the next call
    let again = runtime.block_on(source.get_chapter_list(manga("m1"))).unwrap();
    assert_eq!(again[0].source_order, 0);
}

#[test]
fn test_pages_deeplinks_and_image_requests() {
    let runtime = multi_thread_runtime();
    let source = start(&runtime, CATALOG_GUEST, 10_000_000).unwrap();

    let pages = runtime
        .block_on(source.get_page_list(Chapter::new("en.fixture", "c9")))
        .unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].chapter_id, "c9");
    assert_eq!(pages[0].image_url.as_deref(), Some("https://img/1.png"));

    let link = runtime
        .block_on(source.handle_url("https://example.org/m1".into()))
        .unwrap();
    assert_eq!(link.manga.as_ref().map(|m| m.id.as_str()), Some("m1"));
    assert_eq!(link.chapter.and_then(|c| c.manga_id).as_deref(), Some("m1"));

    let request = runtime
        .block_on(source.get_image_request("https://img/1.png".into()))
        .unwrap();
    assert_eq!(request.url.as_deref(), Some("https://img/1.png"));
    assert_eq!(
        request.headers.get("User-Agent"),
        Some(&Some("stub-agent".to_string()))
    );
    assert_eq!(
        request.headers.get("Referer"),
        Some(&Some("https://example.org/".to_string()))
    );
}

#[test]
fn test_missing_exports_degrade() {
    let runtime = multi_thread_runtime();
    let source = start(&runtime, EMPTY_GUEST, 10_000_000).unwrap();

    assert_eq!(source.listings(), &[Listing::new("Latest")]);

    let details = runtime.block_on(source.get_manga_details(manga("m1")));
    assert!(matches!(details, Err(SourceError::MissingValue { .. })));

    let chapters = runtime.block_on(source.get_chapter_list(manga("m1"))).unwrap();
    assert!(chapters.is_empty());

    let link = runtime.block_on(source.handle_url("https://example.org".into()));
    assert!(matches!(link, Err(SourceError::MissingValue { .. })));

    let request = runtime
        .block_on(source.get_image_request("https://img/2.png".into()))
        .unwrap();
    assert!(!request.headers.contains_key("Referer"));

    runtime.block_on(source.handle_notification("system.refresh".into())).unwrap();
}

#[test]
fn test_fuel_exhaustion_leaves_actor_usable() {
    let runtime = multi_thread_runtime();
    let source = start(&runtime, SPINNING_GUEST, 100_000).unwrap();

    let first = runtime.block_on(source.get_manga_list(Vec::new(), 1)).unwrap();
    let second = runtime.block_on(source.get_manga_list(Vec::new(), 2)).unwrap();

    assert!(first.manga.is_empty());
    assert!(!first.has_next_page);
    assert!(second.manga.is_empty());
}

#[test]
fn test_component_binaries_are_rejected() {
    let runtime = multi_thread_runtime();

    let result = start(&runtime, "(component)", 10_000_000);

    assert!(matches!(result, Err(SourceError::Wasm(_))));
}

#[test]
fn test_load_bundle_directory() {
    let runtime = multi_thread_runtime();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(MANIFEST_FILE), MANIFEST).unwrap();
    fs::write(dir.path().join(MODULE_FILE), wat::parse_str(CATALOG_GUEST).unwrap()).unwrap();

    let source = runtime
        .block_on(Source::load(dir.path(), &Config::default()))
        .unwrap();

    assert_eq!(source.manifest().info.name, "Fixture");
    assert_eq!(source.default_filters().len(), 1);
}

#[test]
fn test_load_missing_module() {
    let runtime = multi_thread_runtime();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(MANIFEST_FILE), MANIFEST).unwrap();

    let result = runtime.block_on(Source::load(dir.path(), &Config::default()));

    assert!(matches!(result, Err(SourceError::Wasm(_))));
}

#[test]
fn test_descriptor_table_is_empty_after_each_entry_point() {
    let runtime = multi_thread_runtime();
    let mut source = instantiate(&runtime, CATALOG_GUEST, 10_000_000);

    let result = source.manga_list(&[], 1);
    assert_eq!(result.manga.len(), 1);
    assert!(source.host().store.is_empty());

    let chapters = source.chapter_list(&manga("m1"));
    assert_eq!(chapters.len(), 2);
    assert!(source.host().store.is_empty());
    assert_eq!(source.host().session.current_manga, None);
}

#[test]
fn test_descriptor_table_is_empty_after_fuel_exhaustion() {
    let runtime = multi_thread_runtime();
    let mut source = instantiate(&runtime, SPINNING_GUEST, 100_000);

    let result = source.manga_list(&[Filter::title("x")], 1);

    assert!(result.manga.is_empty());
    assert!(source.host().store.is_empty());
}

#[test]
fn test_handle_kept_by_guest_is_stale_in_next_entry_point() {
    let runtime = multi_thread_runtime();
    let mut source = instantiate(&runtime, REMEMBERING_GUEST, 10_000_000);

    source.handle_notification("system.refresh");
    assert!(source.host().store.is_empty());

    let kept = source.invoke(&["kept"], &[]).unwrap().unwrap();
    assert!(kept > 0);
    assert!(source.host().store.read(kept).is_none());
    assert_eq!(source.invoke(&["kept_type"], &[]).unwrap(), Some(-1));

    let fresh = source.host_mut().store.allocate(Value::from("new")).unwrap();
    assert_ne!(fresh, kept);
    assert!(source.host().store.read(kept).is_none());
}
