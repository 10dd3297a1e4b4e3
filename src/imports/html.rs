// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! DOM queries and edits over parsed documents.
//!
//! Text accessors also accept plain string descriptors, since guests often
//! keep extracted strings in the same handle space as nodes.

use scraper::Selector;
use wasmtime::{Caller, Linker};

use crate::dom::{entities, Document, DomNode, DomNodeList};
use crate::imports::{allocate, with_memory, HostState};
use crate::store::{Descriptor, DescriptorStore, GuestMemory, Value};

type Unary = fn(&mut DescriptorStore, Descriptor) -> Descriptor;
type WithString = fn(&mut DescriptorStore, &GuestMemory, Descriptor, i32, i32) -> i32;

enum Target {
    Node(DomNode),
    List(DomNodeList),
    Text(String),
}

fn target(store: &DescriptorStore, descriptor: Descriptor) -> Option<Target> {
    match store.read(descriptor)? {
        Value::Node(node) => Some(Target::Node(node.clone())),
        Value::NodeList(list) => Some(Target::List(list.clone())),
        Value::String(s) => Some(Target::Text(s.clone())),
        _ => None,
    }
}

fn node(store: &DescriptorStore, descriptor: Descriptor) -> Option<DomNode> {
    match store.read(descriptor)? {
        Value::Node(node) => Some(node.clone()),
        _ => None,
    }
}

fn element(store: &DescriptorStore, descriptor: Descriptor) -> Option<DomNode> {
    node(store, descriptor).filter(DomNode::is_element)
}

fn store_string(store: &mut DescriptorStore, value: Option<String>) -> Descriptor {
    match value {
        Some(s) => allocate(store, Value::String(s)),
        None => -1,
    }
}

fn store_node(store: &mut DescriptorStore, value: Option<DomNode>) -> Descriptor {
    match value {
        Some(node) => allocate(store, Value::Node(node)),
        None => -1,
    }
}

/// Allows an empty argument, unlike most string reads.
fn read_text_arg(memory: &GuestMemory, offset: i32, length: i32) -> Option<String> {
    if length == 0 && offset >= 0 {
        return Some(String::new());
    }
    memory.read_string(offset, length)
}

fn parse_with(
    store: &mut DescriptorStore,
    memory: &GuestMemory,
    offset: i32,
    length: i32,
    base_uri: Option<String>,
    parser: fn(&str, Option<&str>) -> DomNode,
) -> Descriptor {
    match memory.read_string(offset, length) {
        Some(source) => allocate(store, Value::Node(parser(&source, base_uri.as_deref()))),
        None => -1,
    }
}

fn base_arg(memory: &GuestMemory, offset: i32, length: i32) -> Option<String> {
    (length > 0)
        .then(|| memory.read_string(offset, length))
        .flatten()
}

pub fn parse(store: &mut DescriptorStore, memory: &GuestMemory, offset: i32, length: i32) -> Descriptor {
    parse_with(store, memory, offset, length, None, Document::parse)
}

pub fn parse_fragment(
    store: &mut DescriptorStore,
    memory: &GuestMemory,
    offset: i32,
    length: i32,
) -> Descriptor {
    parse_with(store, memory, offset, length, None, Document::parse_fragment)
}

pub fn parse_with_uri(
    store: &mut DescriptorStore,
    memory: &GuestMemory,
    offset: i32,
    length: i32,
    uri: i32,
    uri_len: i32,
) -> Descriptor {
    let base = base_arg(memory, uri, uri_len);
    parse_with(store, memory, offset, length, base, Document::parse)
}

pub fn parse_fragment_with_uri(
    store: &mut DescriptorStore,
    memory: &GuestMemory,
    offset: i32,
    length: i32,
    uri: i32,
    uri_len: i32,
) -> Descriptor {
    let base = base_arg(memory, uri, uri_len);
    parse_with(store, memory, offset, length, base, Document::parse_fragment)
}

pub fn select(
    store: &mut DescriptorStore,
    memory: &GuestMemory,
    descriptor: Descriptor,
    offset: i32,
    length: i32,
) -> Descriptor {
    let Some(css) = memory.read_string(offset, length) else {
        return -1;
    };
    let Ok(selector) = Selector::parse(&css) else {
        return -1;
    };
    let selected = match target(store, descriptor) {
        Some(Target::Node(node)) => node.select(&selector),
        Some(Target::List(list)) => list.select(&selector),
        _ => return -1,
    };
    allocate(store, Value::NodeList(selected))
}

pub fn attr(
    store: &mut DescriptorStore,
    memory: &GuestMemory,
    descriptor: Descriptor,
    offset: i32,
    length: i32,
) -> Descriptor {
    let Some(key) = memory.read_string(offset, length) else {
        return -1;
    };
    let value = match target(store, descriptor) {
        Some(Target::Node(node)) => node.attr(&key),
        Some(Target::List(list)) => Some(list.attr(&key)),
        _ => None,
    };
    store_string(store, value)
}

fn mutate(
    store: &DescriptorStore,
    memory: &GuestMemory,
    descriptor: Descriptor,
    offset: i32,
    length: i32,
    edit: fn(&DomNode, &str) -> bool,
) -> i32 {
    let Some(node) = node(store, descriptor) else {
        return -1;
    };
    match read_text_arg(memory, offset, length) {
        Some(arg) if edit(&node, &arg) => 0,
        _ => -1,
    }
}

pub fn set_text(store: &mut DescriptorStore, memory: &GuestMemory, d: Descriptor, offset: i32, length: i32) -> i32 {
    mutate(store, memory, d, offset, length, DomNode::set_text)
}

pub fn set_html(store: &mut DescriptorStore, memory: &GuestMemory, d: Descriptor, offset: i32, length: i32) -> i32 {
    mutate(store, memory, d, offset, length, DomNode::set_html)
}

pub fn prepend(store: &mut DescriptorStore, memory: &GuestMemory, d: Descriptor, offset: i32, length: i32) -> i32 {
    mutate(store, memory, d, offset, length, DomNode::prepend_html)
}

pub fn append(store: &mut DescriptorStore, memory: &GuestMemory, d: Descriptor, offset: i32, length: i32) -> i32 {
    mutate(store, memory, d, offset, length, DomNode::append_html)
}

pub fn first(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let found = match store.read(descriptor) {
        Some(Value::NodeList(list)) => list.first(),
        _ => None,
    };
    store_node(store, found)
}

pub fn last(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let found = match store.read(descriptor) {
        Some(Value::NodeList(list)) => list.last(),
        _ => None,
    };
    store_node(store, found)
}

pub fn next(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let found = node(store, descriptor).and_then(|n| n.next_element());
    store_node(store, found)
}

pub fn previous(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let found = node(store, descriptor).and_then(|n| n.previous_element());
    store_node(store, found)
}

pub fn base_uri(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let uri = match target(store, descriptor) {
        Some(Target::Node(node)) => Some(node.base_uri()),
        Some(Target::List(list)) => list.first().map(|n| n.base_uri()),
        _ => None,
    };
    store_string(store, uri)
}

pub fn body(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let found = node(store, descriptor).and_then(|n| n.body());
    store_node(store, found)
}

pub fn text(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let value = match target(store, descriptor) {
        Some(Target::Node(node)) => Some(node.text()),
        Some(Target::List(list)) => Some(list.text()),
        Some(Target::Text(s)) => Some(s.trim().to_string()),
        None => None,
    };
    store_string(store, value)
}

pub fn untrimmed_text(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let value = match target(store, descriptor) {
        Some(Target::Node(node)) => Some(node.untrimmed_text()),
        Some(Target::List(list)) => Some(list.untrimmed_text()),
        Some(Target::Text(s)) => Some(s),
        None => None,
    };
    store_string(store, value)
}

pub fn own_text(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let value = match target(store, descriptor) {
        Some(Target::Node(node)) => Some(node.own_text()),
        Some(Target::Text(s)) => Some(s),
        _ => None,
    };
    store_string(store, value)
}

pub fn data(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let value = match target(store, descriptor) {
        Some(Target::Node(node)) => Some(node.data()),
        Some(Target::Text(s)) => Some(s),
        _ => None,
    };
    store_string(store, value)
}

/// Spreads a node list into an array of node values.
pub fn array(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let items = match store.read(descriptor) {
        Some(Value::NodeList(list)) => list.nodes().into_iter().map(Value::Node).collect(),
        _ => return -1,
    };
    allocate(store, Value::Array(items))
}

pub fn html(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let value = match target(store, descriptor) {
        Some(Target::Node(node)) => Some(node.inner_html()),
        Some(Target::List(list)) => Some(list.inner_html()),
        _ => None,
    };
    store_string(store, value)
}

pub fn outer_html(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let value = match target(store, descriptor) {
        Some(Target::Node(node)) => Some(node.outer_html()),
        Some(Target::List(list)) => Some(list.outer_html()),
        _ => None,
    };
    store_string(store, value)
}

fn plain_text(store: &DescriptorStore, descriptor: Descriptor) -> Option<String> {
    match target(store, descriptor)? {
        Target::Node(node) => Some(node.text()),
        Target::List(list) => Some(list.text()),
        Target::Text(s) => Some(s),
    }
}

pub fn escape(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let value = plain_text(store, descriptor).map(|s| entities::escape(&s));
    store_string(store, value)
}

pub fn unescape(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let value = plain_text(store, descriptor).map(|s| entities::unescape(&s));
    store_string(store, value)
}

pub fn id(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let value = element(store, descriptor).and_then(|n| n.element_id());
    store_string(store, value)
}

pub fn tag_name(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let value = element(store, descriptor).and_then(|n| n.tag_name());
    store_string(store, value)
}

pub fn class_name(store: &mut DescriptorStore, descriptor: Descriptor) -> Descriptor {
    let value = element(store, descriptor).and_then(|n| n.class_name());
    store_string(store, value)
}

pub fn has_class(store: &mut DescriptorStore, memory: &GuestMemory, d: Descriptor, offset: i32, length: i32) -> i32 {
    match (element(store, d), memory.read_string(offset, length)) {
        (Some(node), Some(class)) => i32::from(node.has_class(&class)),
        _ => 0,
    }
}

pub fn has_attr(store: &mut DescriptorStore, memory: &GuestMemory, d: Descriptor, offset: i32, length: i32) -> i32 {
    match (element(store, d), memory.read_string(offset, length)) {
        (Some(node), Some(key)) => i32::from(node.has_attr(&key)),
        _ => 0,
    }
}

fn link_unary(
    linker: &mut Linker<HostState>,
    namespace: &str,
    name: &str,
    f: Unary,
) -> wasmtime::Result<()> {
    linker.func_wrap(namespace, name, move |mut caller: Caller<'_, HostState>, d: i32| {
        f(&mut caller.data_mut().store, d)
    })?;
    Ok(())
}

fn link_with_string(
    linker: &mut Linker<HostState>,
    namespace: &str,
    name: &str,
    f: WithString,
) -> wasmtime::Result<()> {
    linker.func_wrap(
        namespace,
        name,
        move |mut caller: Caller<'_, HostState>, d: i32, offset: i32, length: i32| {
            with_memory(&mut caller, |mem, state| f(&mut state.store, mem, d, offset, length))
        },
    )?;
    Ok(())
}

pub fn link(linker: &mut Linker<HostState>, namespace: &str) -> wasmtime::Result<()> {
    linker.func_wrap(
        namespace,
        "parse",
        |mut caller: Caller<'_, HostState>, offset: i32, length: i32| {
            with_memory(&mut caller, |mem, state| parse(&mut state.store, mem, offset, length))
        },
    )?;
    linker.func_wrap(
        namespace,
        "parse_fragment",
        |mut caller: Caller<'_, HostState>, offset: i32, length: i32| {
            with_memory(&mut caller, |mem, state| {
                parse_fragment(&mut state.store, mem, offset, length)
            })
        },
    )?;
    linker.func_wrap(
        namespace,
        "parse_with_uri",
        |mut caller: Caller<'_, HostState>, offset: i32, length: i32, uri: i32, uri_len: i32| {
            with_memory(&mut caller, |mem, state| {
                parse_with_uri(&mut state.store, mem, offset, length, uri, uri_len)
            })
        },
    )?;
    linker.func_wrap(
        namespace,
        "parse_fragment_with_uri",
        |mut caller: Caller<'_, HostState>, offset: i32, length: i32, uri: i32, uri_len: i32| {
            with_memory(&mut caller, |mem, state| {
                parse_fragment_with_uri(&mut state.store, mem, offset, length, uri, uri_len)
            })
        },
    )?;

    let with_string: [(&str, WithString); 8] = [
        ("select", select),
        ("attr", attr),
        ("set_text", set_text),
        ("set_html", set_html),
        ("prepend", prepend),
        ("append", append),
        ("has_class", has_class),
        ("has_attr", has_attr),
    ];
    for (name, f) in with_string {
        link_with_string(linker, namespace, name, f)?;
    }

    let unary: [(&str, Unary); 18] = [
        ("first", first),
        ("last", last),
        ("next", next),
        ("previous", previous),
        ("base_uri", base_uri),
        ("body", body),
        ("text", text),
        ("untrimmed_text", untrimmed_text),
        ("own_text", own_text),
        ("data", data),
        ("array", array),
        ("html", html),
        ("outer_html", outer_html),
        ("escape", escape),
        ("unescape", unescape),
        ("id", id),
        ("tag_name", tag_name),
        ("class_name", class_name),
    ];
    for (name, f) in unary {
        link_unary(linker, namespace, name, f)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::testing::{string, TestMemory};
    use crate::imports::value::{array_len, type_of};

    fn read(store: &DescriptorStore, d: Descriptor) -> Option<String> {
        store.read(d).and_then(Value::as_str).map(str::to_string)
    }

    fn parse_doc(store: &mut DescriptorStore, tm: &mut TestMemory, html: &str) -> Descriptor {
        let (offset, length) = tm.put(html.as_bytes());
        parse(store, &tm.view(), offset, length)
    }

    fn select_css(store: &mut DescriptorStore, tm: &mut TestMemory, d: Descriptor, css: &str) -> Descriptor {
        let (offset, length) = tm.put(css.as_bytes());
        select(store, &tm.view(), d, offset, length)
    }

    #[test]
    fn test_parse_select_text() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let doc = parse_doc(&mut store, &mut tm, "<div class=\"x\">Hi</div>");

        let list = select_css(&mut store, &mut tm, doc, ".x");
        let value = text(&mut store, list);

        assert_eq!(type_of(&store, doc), 8);
        assert_eq!(type_of(&store, list), 8);
        assert_eq!(read(&store, value).as_deref(), Some("Hi"));
    }

    #[test]
    fn test_invalid_inputs() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let doc = parse_doc(&mut store, &mut tm, "<p>x</p>");
        let number = store.allocate(Value::Int(3)).unwrap();

        assert_eq!(parse(&mut store, &tm.view(), 0, 0), -1);
        assert_eq!(select_css(&mut store, &mut tm, doc, "p[["), -1);
        assert_eq!(select_css(&mut store, &mut tm, number, "p"), -1);
        assert_eq!(text(&mut store, number), -1);
        assert_eq!(first(&mut store, doc), -1);
        assert_eq!(id(&mut store, doc), -1);
    }

    #[test]
    fn test_text_variants_on_strings() {
        let mut store = DescriptorStore::new();
        let padded = string(&mut store, "  padded \n");

        let trimmed = text(&mut store, padded);
        let untrimmed = untrimmed_text(&mut store, padded);
        let own = own_text(&mut store, padded);

        assert_eq!(read(&store, trimmed).as_deref(), Some("padded"));
        assert_eq!(read(&store, untrimmed).as_deref(), Some("  padded \n"));
        assert_eq!(read(&store, own).as_deref(), Some("  padded \n"));
    }

    #[test]
    fn test_navigation_and_array() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let doc = parse_doc(&mut store, &mut tm, "<ul><li id=\"a\">1</li><li id=\"b\">2</li></ul>");
        let items = select_css(&mut store, &mut tm, doc, "li");

        let head = first(&mut store, items);
        let tail = last(&mut store, items);
        let after = next(&mut store, head);
        let spread = array(&mut store, items);

        let after_id = id(&mut store, after);
        let tail_id = id(&mut store, tail);

        assert_eq!(read(&store, after_id).as_deref(), Some("b"));
        assert_eq!(read(&store, tail_id).as_deref(), Some("b"));
        assert_eq!(previous(&mut store, head), -1);
        assert_eq!(next(&mut store, tail), -1);
        assert_eq!(array_len(&store, spread), 2);
    }

    #[test]
    fn test_attr_and_base_uri() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let (offset, length) = tm.put(b"<a class=\"link\" href=\"/c/1\">go</a>");
        let (uri, uri_len) = tm.put(b"https://example.com/m/");
        let doc = parse_with_uri(&mut store, &tm.view(), offset, length, uri, uri_len);
        let links = select_css(&mut store, &mut tm, doc, "a");
        let (key, key_len) = tm.put(b"abs:href");
        let (class, class_len) = tm.put(b"link");
        let anchor = first(&mut store, links);

        let href = attr(&mut store, &tm.view(), links, key, key_len);
        let base = base_uri(&mut store, doc);

        assert_eq!(read(&store, href).as_deref(), Some("https://example.com/c/1"));
        assert_eq!(read(&store, base).as_deref(), Some("https://example.com/m/"));
        assert_eq!(has_class(&mut store, &tm.view(), anchor, class, class_len), 1);
        assert_eq!(has_attr(&mut store, &tm.view(), anchor, key, key_len), 1);
        assert_eq!(has_attr(&mut store, &tm.view(), doc, key, key_len), 0);
    }

    #[test]
    fn test_has_class_matches_only_present_classes() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let doc = parse_doc(&mut store, &mut tm, "<div class=\"x\">Hi</div>");
        let div = {
            let list = select_css(&mut store, &mut tm, doc, "div");
            first(&mut store, list)
        };
        let (x, x_len) = tm.put(b"x");
        let (y, y_len) = tm.put(b"y");

        let text = text(&mut store, div);

        assert_eq!(read(&store, text).as_deref(), Some("Hi"));
        assert_eq!(has_class(&mut store, &tm.view(), div, x, x_len), 1);
        assert_eq!(has_class(&mut store, &tm.view(), div, y, y_len), 0);
    }

    #[test]
    fn test_mutations_report_status() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let doc = parse_doc(&mut store, &mut tm, "<div id=\"t\">x</div>");
        let div = {
            let list = select_css(&mut store, &mut tm, doc, "#t");
            first(&mut store, list)
        };
        let (markup, markup_len) = tm.put(b"<b>bold</b>");
        let (tail, tail_len) = tm.put(b"<i>end</i>");
        let number = store.allocate(Value::Int(1)).unwrap();

        assert_eq!(set_html(&mut store, &tm.view(), div, markup, markup_len), 0);
        assert_eq!(append(&mut store, &tm.view(), div, tail, tail_len), 0);
        assert_eq!(set_html(&mut store, &tm.view(), number, markup, markup_len), -1);

        let inner = html(&mut store, div);
        assert_eq!(read(&store, inner).as_deref(), Some("<b>bold</b><i>end</i>"));
        let outer = outer_html(&mut store, div);
        assert_eq!(
            read(&store, outer).as_deref(),
            Some("<div id=\"t\"><b>bold</b><i>end</i></div>")
        );
    }

    #[test]
    fn test_fragment_body_and_escape() {
        let mut store = DescriptorStore::new();
        let mut tm = TestMemory::new();
        let (offset, length) = tm.put(b"<p>Tom &amp; Jerry</p>");
        let fragment = parse_fragment(&mut store, &tm.view(), offset, length);

        let body_node = body(&mut store, fragment);
        let escaped = escape(&mut store, body_node);
        let unescaped = unescape(&mut store, escaped);

        assert_eq!(read(&store, escaped).as_deref(), Some("Tom &amp; Jerry"));
        assert_eq!(read(&store, unescaped).as_deref(), Some("Tom & Jerry"));
        assert_eq!(tag_name(&mut store, fragment), -1);
        let tag = tag_name(&mut store, body_node);
        assert_eq!(read(&store, tag).as_deref(), Some("body"));
    }
}
