// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Text extraction and markup serialization over a parsed tree.

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};

use crate::dom::entities::escape_text;

/// Elements whose boundaries separate words in extracted text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th",
    "thead", "tr", "ul",
];

/// Raw-text elements: their content is data, not text.
const DATA_TAGS: &[&str] = &["script", "style"];

fn element_name<'a>(node: &NodeRef<'a, Node>) -> Option<&'a str> {
    match node.value() {
        Node::Element(el) => Some(el.name()),
        _ => None,
    }
}

/// Collapses runs of ASCII whitespace into single spaces and trims the ends.
/// Non-breaking spaces survive.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split(|c: char| c.is_ascii_whitespace())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String, block_spacing: bool) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(el) => {
            if DATA_TAGS.contains(&el.name()) {
                return;
            }
            let block = block_spacing && BLOCK_TAGS.contains(&el.name());
            if block {
                out.push(' ');
            }
            for child in node.children() {
                collect_text(child, out, block_spacing);
            }
            if block {
                out.push(' ');
            }
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                collect_text(child, out, block_spacing);
            }
        }
        _ => {}
    }
}

pub fn text(node: NodeRef<'_, Node>) -> String {
    let mut raw = String::new();
    collect_text(node, &mut raw, true);
    normalize_whitespace(&raw)
}

pub fn untrimmed_text(node: NodeRef<'_, Node>) -> String {
    let mut raw = String::new();
    collect_text(node, &mut raw, false);
    raw
}

/// Text of direct children only, normalized.
pub fn own_text(node: NodeRef<'_, Node>) -> String {
    let mut raw = String::new();
    for child in node.children() {
        match child.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(el) if el.name() == "br" => raw.push(' '),
            _ => {}
        }
    }
    normalize_whitespace(&raw)
}

/// Script and style contents plus comments, in document order.
pub fn data(node: NodeRef<'_, Node>) -> String {
    let mut out = String::new();
    collect_data(node, &mut out);
    out
}

fn collect_data(node: NodeRef<'_, Node>, out: &mut String) {
    let in_data_tag = element_name(&node).is_some_and(|name| DATA_TAGS.contains(&name));
    for child in node.children() {
        match child.value() {
            Node::Text(text) if in_data_tag => out.push_str(text),
            Node::Comment(comment) => out.push_str(comment),
            Node::Element(_) => collect_data(child, out),
            _ => {}
        }
    }
}

pub fn outer_html(node: NodeRef<'_, Node>) -> String {
    match node.value() {
        Node::Element(_) => ElementRef::wrap(node)
            .map(|el| el.html())
            .unwrap_or_default(),
        Node::Text(text) => escape_text(text),
        Node::Comment(comment) => format!("<!--{}-->", &**comment),
        Node::Doctype(doctype) => format!("<!DOCTYPE {}>", doctype.name()),
        Node::Document | Node::Fragment => inner_html(node),
        _ => String::new(),
    }
}

pub fn inner_html(node: NodeRef<'_, Node>) -> String {
    match ElementRef::wrap(node) {
        Some(el) => el.inner_html(),
        None => node.children().map(outer_html).collect(),
    }
}
