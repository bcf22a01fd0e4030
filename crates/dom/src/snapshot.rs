use crate::document::{Document, NodeType};
use core_types::NodeId;
use std::fmt::{self, Write};

/// Deterministic live-tree serialization and equality rules for tests and the
/// headless host. Not a stable format.
///
/// Equivalence rules:
/// - Node kinds must match.
/// - Element tags must match.
/// - Attribute list order is significant; names and values must match.
/// - Text nodes must match exactly.
/// - Node ids are ignored unless `include_node_ids` is set.
#[derive(Clone, Copy, Debug, Default)]
pub struct DomSnapshotOptions {
    pub include_node_ids: bool,
}

/// A node addressed inside a specific document.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    pub doc: &'a Document,
    pub id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn new(doc: &'a Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    fn node_type(&self) -> Option<NodeType> {
        self.doc.node_type(self.id)
    }

    fn children(&self) -> Vec<NodeRef<'a>> {
        self.doc
            .child_nodes(self.id)
            .map(|ids| ids.iter().map(|id| NodeRef::new(self.doc, *id)).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct DomSnapshot {
    lines: Vec<String>,
}

impl DomSnapshot {
    pub fn new(node: NodeRef<'_>, options: DomSnapshotOptions) -> Self {
        let mut lines = Vec::new();
        walk_snapshot(node, &options, 0, &mut lines);
        Self { lines }
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for DomSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct DomMismatch {
    path: String,
    detail: String,
    expected: String,
    actual: String,
    expected_subtree: String,
    actual_subtree: String,
}

impl fmt::Display for DomMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DOM mismatch at {}: {}", self.path, self.detail)?;
        writeln!(f, "expected: {}", self.expected)?;
        writeln!(f, "actual:   {}", self.actual)?;
        writeln!(f, "expected subtree:\n{}", self.expected_subtree)?;
        writeln!(f, "actual subtree:\n{}", self.actual_subtree)?;
        Ok(())
    }
}

impl std::error::Error for DomMismatch {}

pub fn assert_dom_eq(expected: NodeRef<'_>, actual: NodeRef<'_>, options: DomSnapshotOptions) {
    if let Err(mismatch) = compare_dom(expected, actual, options) {
        panic!("{mismatch}");
    }
}

pub fn compare_dom(
    expected: NodeRef<'_>,
    actual: NodeRef<'_>,
    options: DomSnapshotOptions,
) -> Result<(), Box<DomMismatch>> {
    let mut path = vec![node_label(expected)];
    compare_nodes(expected, actual, &options, &mut path)
}

fn compare_nodes(
    expected: NodeRef<'_>,
    actual: NodeRef<'_>,
    options: &DomSnapshotOptions,
    path: &mut Vec<String>,
) -> Result<(), Box<DomMismatch>> {
    if expected.node_type() != actual.node_type() {
        return Err(mismatch(path, "node kind", expected, actual, options));
    }
    if options.include_node_ids && expected.id != actual.id {
        return Err(mismatch(path, "node id", expected, actual, options));
    }
    match expected.node_type() {
        Some(NodeType::Text) => {
            if expected.doc.text(expected.id) != actual.doc.text(actual.id) {
                return Err(mismatch(path, "text", expected, actual, options));
            }
            Ok(())
        }
        Some(NodeType::Element) => {
            if expected.doc.tag(expected.id) != actual.doc.tag(actual.id) {
                return Err(mismatch(path, "element tag", expected, actual, options));
            }
            let expected_attrs = expected.doc.attributes(expected.id);
            let actual_attrs = actual.doc.attributes(actual.id);
            if expected_attrs.len() != actual_attrs.len() {
                return Err(mismatch(path, "attribute count", expected, actual, options));
            }
            for (i, (exp, act)) in expected_attrs.iter().zip(actual_attrs).enumerate() {
                if exp.0 != act.0 {
                    let detail = format!("attribute name at index {i}");
                    return Err(mismatch(path, &detail, expected, actual, options));
                }
                if exp.1 != act.1 {
                    let detail = format!("attribute value at index {i}");
                    return Err(mismatch(path, &detail, expected, actual, options));
                }
            }
            compare_children(expected, actual, options, path)
        }
        Some(NodeType::Document) => compare_children(expected, actual, options, path),
        None => Err(mismatch(path, "unknown node", expected, actual, options)),
    }
}

fn compare_children(
    expected: NodeRef<'_>,
    actual: NodeRef<'_>,
    options: &DomSnapshotOptions,
    path: &mut Vec<String>,
) -> Result<(), Box<DomMismatch>> {
    let expected_children = expected.children();
    let actual_children = actual.children();
    if expected_children.len() != actual_children.len() {
        let detail = format!(
            "child count (expected {}, actual {})",
            expected_children.len(),
            actual_children.len()
        );
        return Err(mismatch(path, &detail, expected, actual, options));
    }
    for (idx, (exp, act)) in expected_children.into_iter().zip(actual_children).enumerate() {
        path.push(format!("{}[{}]", node_label(exp), idx));
        let result = compare_nodes(exp, act, options, path);
        path.pop();
        result?;
    }
    Ok(())
}

fn mismatch(
    path: &[String],
    detail: &str,
    expected: NodeRef<'_>,
    actual: NodeRef<'_>,
    options: &DomSnapshotOptions,
) -> Box<DomMismatch> {
    Box::new(DomMismatch {
        path: format!("/{}", path.join("/")),
        detail: detail.to_string(),
        expected: truncate_line(format_node_line(expected, options), 160),
        actual: truncate_line(format_node_line(actual, options), 160),
        expected_subtree: DomSnapshot::new(expected, *options).render(),
        actual_subtree: DomSnapshot::new(actual, *options).render(),
    })
}

fn node_label(node: NodeRef<'_>) -> String {
    match node.node_type() {
        Some(NodeType::Document) => "#document".to_string(),
        Some(NodeType::Element) => {
            let mut label = String::from(node.doc.tag(node.id).unwrap_or_default());
            let id_attr = node.doc.attribute(node.id, "id").filter(|v| !v.is_empty());
            let class_attr = node
                .doc
                .attribute(node.id, "class")
                .filter(|v| !v.is_empty());
            if let Some(id_value) = id_attr {
                label.push('#');
                write_escaped(&mut label, id_value);
            } else if let Some(class_value) = class_attr {
                label.push_str(".class=");
                write_escaped(&mut label, class_value);
            }
            label
        }
        Some(NodeType::Text) => "#text".to_string(),
        None => "#unknown".to_string(),
    }
}

fn truncate_line(mut line: String, max_len: usize) -> String {
    if line.len() > max_len {
        let mut cut = max_len.saturating_sub(3);
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        line.truncate(cut);
        line.push_str("...");
    }
    line
}

fn walk_snapshot(
    node: NodeRef<'_>,
    options: &DomSnapshotOptions,
    indent_level: usize,
    out: &mut Vec<String>,
) {
    const INDENT_STEP: usize = 2;
    let mut line = " ".repeat(indent_level.saturating_mul(INDENT_STEP));
    write_node_line(&mut line, node, options);
    out.push(line);
    for child in node.children() {
        walk_snapshot(child, options, indent_level + 1, out);
    }
}

fn format_node_line(node: NodeRef<'_>, options: &DomSnapshotOptions) -> String {
    let mut line = String::new();
    write_node_line(&mut line, node, options);
    line
}

fn write_node_line(out: &mut String, node: NodeRef<'_>, options: &DomSnapshotOptions) {
    match node.node_type() {
        Some(NodeType::Document) => out.push_str("#document"),
        Some(NodeType::Element) => {
            out.push('<');
            out.push_str(node.doc.tag(node.id).unwrap_or_default());
            for (attr, value) in node.doc.attributes(node.id) {
                out.push(' ');
                out.push_str(attr);
                out.push_str("=\"");
                write_escaped(out, value);
                out.push('"');
            }
            if options.include_node_ids {
                let _ = write!(out, " data-node-id=\"{}\"", node.id.0);
            }
            out.push('>');
        }
        Some(NodeType::Text) => {
            out.push('"');
            write_escaped(out, node.doc.text(node.id).unwrap_or_default());
            out.push('"');
        }
        None => {
            let _ = write!(out, "#unknown({})", node.id.0);
        }
    }
}

fn write_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ if ch.is_ascii() => out.push(ch),
            _ => {
                let _ = write!(out, "\\u{{{:X}}}", ch as u32);
            }
        }
    }
}
