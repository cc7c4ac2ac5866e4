//! Snapshot rendering helpers.
//!
//! Functions for serializing a [`Dom`] subtree to an HTML-like string suitable
//! for snapshot testing and assertions. Event handler props are omitted.

use std::fmt::Write;

use crate::dom::{Dom, NodeId, NodeKind};
use crate::renderer::is_on;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Serialize the children of `container`.
///
/// # Examples
///
/// ```ignore
/// use sprig::testing::snapshot::to_html;
///
/// renderer.render(Some(h("p").text("hi").build()), root);
/// assert_eq!(renderer.with_host(|dom| to_html(dom, root)), "<p>hi</p>");
/// ```
pub fn to_html(dom: &Dom, container: NodeId) -> String {
    let mut out = String::new();
    for &child in dom.children(container) {
        write_node(dom, child, &mut out);
    }
    out
}

/// Serialize `node` itself, including its own tag.
pub fn outer_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, node, &mut out);
    out
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
    let Some(data) = dom.get(id) else {
        return;
    };
    match &data.kind {
        NodeKind::Text => out.push_str(&data.text),
        NodeKind::Comment => {
            let _ = write!(out, "<!--{}-->", data.text);
        }
        NodeKind::Element(tag) => {
            out.push('<');
            out.push_str(tag);
            for (key, value) in data.props.iter().filter(|(key, _)| !is_on(key)) {
                let _ = write!(out, " {key}=\"{value}\"");
            }
            out.push('>');
            let children = dom.children(id);
            if children.is_empty() {
                out.push_str(&data.text);
            } else {
                for &child in children {
                    write_node(dom, child, out);
                }
            }
            let _ = write!(out, "</{tag}>");
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
