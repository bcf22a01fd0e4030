//! HTML serialization of live subtrees.

use crate::document::{Document, NodeType};
use core_types::NodeId;

pub fn outer_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

pub fn inner_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for child in doc.child_nodes(node).unwrap_or_default() {
        write_node(doc, *child, &mut out);
    }
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.node_type(node) {
        Some(NodeType::Element) => {
            let tag = doc.tag(node).unwrap_or_default();
            out.push('<');
            out.push_str(tag);
            for (name, value) in doc.attributes(node) {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(out, value, true);
                out.push('"');
            }
            out.push('>');
            for child in doc.child_nodes(node).unwrap_or_default() {
                write_node(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        Some(NodeType::Text) => escape_into(out, doc.text(node).unwrap_or_default(), false),
        Some(NodeType::Document) => {
            for child in doc.child_nodes(node).unwrap_or_default() {
                write_node(doc, *child, out);
            }
        }
        None => {}
    }
}

fn escape_into(out: &mut String, value: &str, attribute: bool) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
