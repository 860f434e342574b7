//! Markup output for nodes
//!
//! Used for the node snapshots carried by lookup errors. Text is written
//! before child elements, since a node keeps its text concatenated.

use super::node::Node;
use crate::core::entities::{encode_attribute, encode_text};
use std::fmt;

impl Node {
    /// Serialize this node and its subtree as markup
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(64);
        write_node(self, &mut out);
        out
    }
}

fn write_node(node: &Node, out: &mut String) {
    out.push('<');
    out.push_str(node.name());

    for ns in node.declarations() {
        out.push_str(" xmlns");
        if let Some(prefix) = &ns.prefix {
            out.push(':');
            out.push_str(prefix);
        }
        out.push_str("=\"");
        out.push_str(&encode_attribute(&ns.uri));
        out.push('"');
    }

    for attr in node.attributes() {
        out.push(' ');
        out.push_str(attr.name());
        out.push_str("=\"");
        out.push_str(&encode_attribute(attr.value()));
        out.push('"');
    }

    if node.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    if let Some(text) = node.text() {
        out.push_str(&encode_text(text));
    }
    for child in node.children() {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(node.name());
    out.push('>');
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}
