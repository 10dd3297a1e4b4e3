// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-place tree edits. New markup is parsed as a body fragment and its
//! nodes are copied into the target tree.

use ego_tree::{NodeId, NodeRef, Tree};
use scraper::{Html, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Append,
    Prepend,
}

/// A fragment parse wraps its content in a synthetic `html` element.
fn fragment_content(fragment: &Html) -> NodeRef<'_, Node> {
    let root = fragment.tree.root();
    root.children()
        .find(|child| matches!(child.value(), Node::Element(el) if el.name() == "html"))
        .unwrap_or(root)
}

fn copy_subtree(dst: &mut Tree<Node>, src: NodeRef<'_, Node>) -> NodeId {
    let id = dst.orphan(src.value().clone()).id();
    for child in src.children() {
        let child_id = copy_subtree(dst, child);
        if let Some(mut parent) = dst.get_mut(id) {
            parent.append_id(child_id);
        }
    }
    id
}

/// Parses `markup` and inserts its nodes under `target`. Returns `false` when
/// `target` cannot hold children.
pub fn insert_html(html: &mut Html, target: NodeId, markup: &str, position: Position) -> bool {
    if !can_hold_children(html, target) {
        return false;
    }

    let fragment = Html::parse_fragment(markup);
    let copies: Vec<NodeId> = fragment_content(&fragment)
        .children()
        .map(|child| copy_subtree(&mut html.tree, child))
        .collect();

    let Some(mut target) = html.tree.get_mut(target) else {
        return false;
    };
    match position {
        Position::Append => {
            for id in copies {
                target.append_id(id);
            }
        }
        Position::Prepend => {
            for id in copies.into_iter().rev() {
                target.prepend_id(id);
            }
        }
    }
    true
}

pub fn clear_children(html: &mut Html, target: NodeId) -> bool {
    if !can_hold_children(html, target) {
        return false;
    }
    let children: Vec<NodeId> = match html.tree.get(target) {
        Some(node) => node.children().map(|child| child.id()).collect(),
        None => return false,
    };
    for id in children {
        if let Some(mut child) = html.tree.get_mut(id) {
            child.detach();
        }
    }
    true
}

/// Replaces the children of `target` with the parsed `markup`.
pub fn replace_html(html: &mut Html, target: NodeId, markup: &str) -> bool {
    clear_children(html, target) && insert_html(html, target, markup, Position::Append)
}

fn can_hold_children(html: &Html, target: NodeId) -> bool {
    html.tree.get(target).is_some_and(|node| {
        matches!(
            node.value(),
            Node::Element(_) | Node::Document | Node::Fragment
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::text::{inner_html, text};

    fn first_element(html: &Html, name: &str) -> NodeId {
        html.tree
            .root()
            .descendants()
            .find(|n| matches!(n.value(), Node::Element(el) if el.name() == name))
            .unwrap()
            .id()
    }

    #[test]
    fn test_append_and_prepend_keep_order() {
        let mut html = Html::parse_document("<div id=\"t\"><i>mid</i></div>");
        let div = first_element(&html, "div");

        assert!(insert_html(&mut html, div, "<b>1</b><b>2</b>", Position::Prepend));
        assert!(insert_html(&mut html, div, "<u>end</u>", Position::Append));

        assert_eq!(
            inner_html(html.tree.get(div).unwrap()),
            "<b>1</b><b>2</b><i>mid</i><u>end</u>"
        );
    }

    #[test]
    fn test_replace_html_drops_old_children() {
        let mut html = Html::parse_document("<div><p>old</p></div>");
        let div = first_element(&html, "div");

        assert!(replace_html(&mut html, div, "<span>new</span> text"));

        assert_eq!(text(html.tree.get(div).unwrap()), "new text");
    }

    #[test]
    fn test_text_nodes_cannot_hold_children() {
        let mut html = Html::parse_document("<p>hi</p>");
        let p = first_element(&html, "p");
        let text_node = html.tree.get(p).unwrap().first_child().unwrap().id();

        assert!(!insert_html(&mut html, text_node, "<b>x</b>", Position::Append));
    }
}
