// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use scraper::{Html, Node};

/// Escapes markup-significant characters and non-breaking spaces.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escaping used for text nodes when serializing markup.
pub(crate) fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decodes named and numeric character references.
///
/// The input is run through the HTML tokenizer inside a `textarea`, whose
/// content model decodes references but keeps tags as literal text.
pub fn unescape(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let fragment = Html::parse_fragment(&format!("<textarea>{}</textarea>", input));
    let decoded = fragment
        .tree
        .root()
        .descendants()
        .find(|node| matches!(node.value(), Node::Element(el) if el.name() == "textarea"))
        .map(|textarea| {
            textarea
                .children()
                .filter_map(|child| match child.value() {
                    Node::Text(text) => Some(text.to_string()),
                    _ => None,
                })
                .collect::<String>()
        });

    decoded.unwrap_or_else(|| input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("a < b & \"c\"\u{a0}"),
            "a &lt; b &amp; &quot;c&quot;&nbsp;"
        );
    }

    #[test]
    fn test_unescape_named_and_numeric() {
        assert_eq!(unescape("Tom &amp; Jerry &#39;s &lt;b&gt;"), "Tom & Jerry 's <b>");
        assert_eq!(unescape("no references"), "no references");
    }
}
