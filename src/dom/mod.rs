// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shared, mutable HTML documents and the node handles guests hold into them.
//!
//! A [`Document`] owns one parsed tree behind a mutex. [`DomNode`] and
//! [`DomNodeList`] are cheap handles (document plus node ids), so every value
//! derived from a document observes mutations made through any other.

pub mod entities;
mod mutation;
pub mod text;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use mutation::Position;

pub struct Document {
    html: Mutex<Html>,
    base_uri: Option<Url>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("base_uri", &self.base_uri)
            .finish_non_exhaustive()
    }
}

impl Document {
    fn new(html: Html, base_uri: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            html: Mutex::new(html),
            base_uri: base_uri.and_then(|uri| Url::parse(uri.trim()).ok()),
        })
    }

    /// Parses a complete document and returns its root node.
    pub fn parse(source: &str, base_uri: Option<&str>) -> DomNode {
        let doc = Self::new(Html::parse_document(source), base_uri);
        let id = doc.lock().tree.root().id();
        DomNode { doc, id }
    }

    /// Parses `source` as the body of an otherwise empty document.
    pub fn parse_fragment(source: &str, base_uri: Option<&str>) -> DomNode {
        let mut html = Html::parse_document("");
        let root = html.tree.root().id();
        if let Some(body) = find_element(&html, root, "body") {
            mutation::insert_html(&mut html, body, source, Position::Append);
        }
        let doc = Self::new(html, base_uri);
        DomNode { doc, id: root }
    }

    pub fn base_uri(&self) -> Option<&Url> {
        self.base_uri.as_ref()
    }

    fn lock(&self) -> MutexGuard<'_, Html> {
        self.html.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<R>(&self, id: NodeId, f: impl FnOnce(NodeRef<'_, Node>) -> R) -> Option<R> {
        let html = self.lock();
        html.tree.get(id).map(f)
    }

    /// Resolves `value` against the base URI. Empty when no absolute url results.
    pub fn absolute_url(&self, value: &str) -> String {
        let resolved = match &self.base_uri {
            Some(base) => base.join(value.trim()),
            None => Url::parse(value.trim()),
        };
        resolved.map(String::from).unwrap_or_default()
    }
}

fn find_element(html: &Html, from: NodeId, name: &str) -> Option<NodeId> {
    html.tree.get(from)?.descendants().find_map(|node| match node.value() {
        Node::Element(el) if el.name() == name => Some(node.id()),
        _ => None,
    })
}

fn is_element(node: &NodeRef<'_, Node>) -> bool {
    matches!(node.value(), Node::Element(_))
}

/// Looks up an attribute, honoring the `abs:` prefix for url resolution.
fn attribute(doc: &Document, el: ElementRef<'_>, key: &str) -> Option<String> {
    match key.strip_prefix("abs:") {
        Some(name) => el.value().attr(name).map(|value| doc.absolute_url(value)),
        None => el.value().attr(key).map(str::to_string),
    }
}

/// One node inside a shared document. The document itself is its root node.
#[derive(Clone)]
pub struct DomNode {
    doc: Arc<Document>,
    id: NodeId,
}

impl fmt::Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomNode").field("id", &self.id).finish()
    }
}

impl PartialEq for DomNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.doc, &other.doc) && self.id == other.id
    }
}

impl DomNode {
    pub fn document(&self) -> &Arc<Document> {
        &self.doc
    }

    fn sibling(&self, id: NodeId) -> Self {
        Self {
            doc: Arc::clone(&self.doc),
            id,
        }
    }

    fn with<R>(&self, f: impl FnOnce(NodeRef<'_, Node>) -> R) -> Option<R> {
        self.doc.read(self.id, f)
    }

    fn with_element<R>(&self, f: impl FnOnce(ElementRef<'_>) -> R) -> Option<R> {
        self.doc.read(self.id, |node| ElementRef::wrap(node).map(f)).flatten()
    }

    pub fn is_document(&self) -> bool {
        self.with(|node| matches!(node.value(), Node::Document | Node::Fragment))
            .unwrap_or(false)
    }

    pub fn is_element(&self) -> bool {
        self.with(|node| is_element(&node)).unwrap_or(false)
    }

    pub fn select(&self, selector: &Selector) -> DomNodeList {
        select_from(&self.doc, &[self.id], selector)
    }

    pub fn next_element(&self) -> Option<Self> {
        self.with(|node| {
            node.next_siblings()
                .find(is_element)
                .map(|sibling| sibling.id())
        })
        .flatten()
        .map(|id| self.sibling(id))
    }

    pub fn previous_element(&self) -> Option<Self> {
        self.with(|node| {
            node.prev_siblings()
                .find(is_element)
                .map(|sibling| sibling.id())
        })
        .flatten()
        .map(|id| self.sibling(id))
    }

    /// The `body` element of a document root.
    pub fn body(&self) -> Option<Self> {
        if !self.is_document() {
            return None;
        }
        let id = find_element(&self.doc.lock(), self.id, "body")?;
        Some(self.sibling(id))
    }

    pub fn base_uri(&self) -> String {
        self.doc
            .base_uri()
            .map(|url| url.to_string())
            .unwrap_or_default()
    }

    /// Empty string when the attribute is absent, `None` for non-elements.
    pub fn attr(&self, key: &str) -> Option<String> {
        self.with_element(|el| attribute(&self.doc, el, key).unwrap_or_default())
    }

    pub fn has_attr(&self, key: &str) -> bool {
        // abs: keys only count when the value resolves to a url
        self.with_element(|el| match attribute(&self.doc, el, key) {
            Some(value) => !key.starts_with("abs:") || !value.is_empty(),
            None => false,
        })
        .unwrap_or(false)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.with_element(|el| el.value().classes().any(|c| c.eq_ignore_ascii_case(class)))
            .unwrap_or(false)
    }

    pub fn element_id(&self) -> Option<String> {
        self.with_element(|el| el.value().id().unwrap_or_default().to_string())
    }

    pub fn tag_name(&self) -> Option<String> {
        self.with_element(|el| el.value().name().to_string())
    }

    pub fn class_name(&self) -> Option<String> {
        self.with_element(|el| el.value().attr("class").unwrap_or_default().trim().to_string())
    }

    pub fn text(&self) -> String {
        self.with(text::text).unwrap_or_default()
    }

    pub fn untrimmed_text(&self) -> String {
        self.with(text::untrimmed_text).unwrap_or_default()
    }

    pub fn own_text(&self) -> String {
        self.with(text::own_text).unwrap_or_default()
    }

    pub fn data(&self) -> String {
        self.with(text::data).unwrap_or_default()
    }

    pub fn inner_html(&self) -> String {
        self.with(text::inner_html).unwrap_or_default()
    }

    pub fn outer_html(&self) -> String {
        self.with(text::outer_html).unwrap_or_default()
    }

    pub fn set_html(&self, markup: &str) -> bool {
        mutation::replace_html(&mut self.doc.lock(), self.id, markup)
    }

    pub fn set_text(&self, text: &str) -> bool {
        self.set_html(&entities::escape_text(text))
    }

    pub fn append_html(&self, markup: &str) -> bool {
        mutation::insert_html(&mut self.doc.lock(), self.id, markup, Position::Append)
    }

    pub fn prepend_html(&self, markup: &str) -> bool {
        mutation::insert_html(&mut self.doc.lock(), self.id, markup, Position::Prepend)
    }
}

/// Ordered, duplicate-free selection of element nodes from one document.
#[derive(Clone)]
pub struct DomNodeList {
    doc: Arc<Document>,
    ids: Vec<NodeId>,
}

impl fmt::Debug for DomNodeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomNodeList").field("ids", &self.ids).finish()
    }
}

impl PartialEq for DomNodeList {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.doc, &other.doc) && self.ids == other.ids
    }
}

impl DomNodeList {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn node(&self, id: NodeId) -> DomNode {
        DomNode {
            doc: Arc::clone(&self.doc),
            id,
        }
    }

    pub fn nodes(&self) -> Vec<DomNode> {
        self.ids.iter().map(|id| self.node(*id)).collect()
    }

    pub fn first(&self) -> Option<DomNode> {
        self.ids.first().map(|id| self.node(*id))
    }

    pub fn last(&self) -> Option<DomNode> {
        self.ids.last().map(|id| self.node(*id))
    }

    pub fn select(&self, selector: &Selector) -> DomNodeList {
        select_from(&self.doc, &self.ids, selector)
    }

    /// Value from the first node carrying the attribute, else empty.
    pub fn attr(&self, key: &str) -> String {
        let html = self.doc.lock();
        self.ids
            .iter()
            .filter_map(|id| html.tree.get(*id).and_then(ElementRef::wrap))
            .find_map(|el| attribute(&self.doc, el, key))
            .unwrap_or_default()
    }

    fn join(&self, separator: &str, render: impl Fn(NodeRef<'_, Node>) -> String) -> String {
        let html = self.doc.lock();
        self.ids
            .iter()
            .filter_map(|id| html.tree.get(*id))
            .map(render)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn text(&self) -> String {
        self.join(" ", text::text)
    }

    pub fn untrimmed_text(&self) -> String {
        self.join(" ", text::untrimmed_text)
    }

    pub fn inner_html(&self) -> String {
        self.join("\n", text::inner_html)
    }

    pub fn outer_html(&self) -> String {
        self.join("\n", text::outer_html)
    }
}

fn select_from(doc: &Arc<Document>, roots: &[NodeId], selector: &Selector) -> DomNodeList {
    let html = doc.lock();
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for root in roots {
        let Some(node) = html.tree.get(*root) else {
            continue;
        };
        for candidate in node.descendants() {
            let Some(el) = ElementRef::wrap(candidate) else {
                continue;
            };
            if selector.matches(&el) && seen.insert(candidate.id()) {
                ids.push(candidate.id());
            }
        }
    }

    if roots.len() > 1 {
        let order: HashMap<NodeId, usize> = html
            .tree
            .root()
            .descendants()
            .enumerate()
            .map(|(position, node)| (node.id(), position))
            .collect();
        ids.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
    }

    DomNodeList {
        doc: Arc::clone(doc),
        ids,
    }
}
