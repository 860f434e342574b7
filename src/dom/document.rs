//! XML Document - loading markup into an owned Node tree
//!
//! Builds a [`Node`] tree from pull events:
//! - Namespace scopes shared between elements that declare nothing new
//! - Direct text and CDATA concatenated per element
//! - Well-formedness checks on tag nesting, roots and attributes

use super::namespace::NamespaceResolver;
use super::node::{Namespace, Node, XmlAttribute};
use crate::core::scanner::is_whitespace;
use crate::error::{Error, Result};
use crate::path::resolver::PathResolver;
use crate::reader::buffered::read_all;
use crate::reader::events::{StartElement, XmlEvent};
use crate::reader::slice::SliceReader;
use crate::reader::Source;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// A parsed XML document
#[derive(Debug, Clone)]
pub struct Document {
    source_name: String,
    root: Node,
}

impl Document {
    /// Parse inline markup
    pub fn parse_str(markup: &str) -> Result<Self> {
        Self::parse_named(markup, String::new())
    }

    /// Read and parse a file
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let bytes = fs::read(path).map_err(|e| Error::io(source_name.as_str(), e))?;
        Self::parse_bytes(bytes, source_name)
    }

    /// Read and parse everything from `reader`
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        let bytes = read_all(reader).map_err(|e| Error::io(source_name, e))?;
        Self::parse_bytes(bytes, source_name.to_string())
    }

    /// Load from a file or inline source
    pub fn load(source: Source<'_>) -> Result<Self> {
        match source {
            Source::Path(path) => Self::parse_file(path),
            Source::Str(markup) => Self::parse_str(markup),
        }
    }

    fn parse_bytes(bytes: Vec<u8>, source_name: String) -> Result<Self> {
        let markup = String::from_utf8(bytes).map_err(|e| {
            let content = String::from_utf8_lossy(e.as_bytes()).into_owned();
            Error::parse(source_name.as_str(), content, "Input is not valid UTF-8")
        })?;
        Self::parse_named(&markup, source_name)
    }

    fn parse_named(markup: &str, source_name: String) -> Result<Self> {
        let root = build_tree(markup, &source_name, &[])?;
        log::debug!("parsed document {:?} with root <{}>", source_name, root.name());
        Ok(Document { source_name, root })
    }

    /// The root element
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// File name the document was read from, empty for inline markup
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// A resolver with the root element as context
    pub fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(&self.root)
    }
}

/// Parse a standalone fragment whose ancestors declared `inherited`
pub(crate) fn parse_fragment(
    markup: &str,
    source_name: &str,
    inherited: &[Namespace],
) -> Result<Node> {
    build_tree(markup, source_name, inherited)
}

fn build_tree(markup: &str, source_name: &str, inherited: &[Namespace]) -> Result<Node> {
    let input = markup.strip_prefix('\u{feff}').unwrap_or(markup);
    let fail = |message: String| Error::parse(source_name, markup, message);

    let mut builder = TreeBuilder::new(inherited);
    for event in SliceReader::new(input) {
        let event = event.map_err(|e| fail(e.to_string()))?;
        builder.handle(event).map_err(fail)?;
    }
    builder.finish().map_err(fail)
}

/// Assembles nodes from events
struct TreeBuilder {
    /// Open elements, innermost last
    stack: Vec<Node>,
    resolver: NamespaceResolver,
    base_scope: Arc<[Namespace]>,
    root: Option<Node>,
}

impl TreeBuilder {
    fn new(inherited: &[Namespace]) -> Self {
        TreeBuilder {
            stack: Vec::with_capacity(16),
            resolver: NamespaceResolver::with_inherited(inherited),
            base_scope: Arc::from(inherited.to_vec()),
            root: None,
        }
    }

    fn handle(&mut self, event: XmlEvent<'_>) -> std::result::Result<(), String> {
        match event {
            XmlEvent::StartElement(start) => self.open(start),
            XmlEvent::EmptyElement(start) => {
                self.open(start)?;
                self.close(None)
            }
            XmlEvent::EndElement(end) => self.close(Some(end.name)),
            XmlEvent::Text(text) => self.append_text(&text),
            XmlEvent::CData(text) => self.append_text(text),
            // Comments, PIs, declarations and DOCTYPE don't shape the tree
            _ => Ok(()),
        }
    }

    fn open(&mut self, start: StartElement<'_>) -> std::result::Result<(), String> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(format!("Extra content at the end of the document: <{}>", start.name));
        }

        self.resolver.push_scope();
        let declarations: Vec<Namespace> = start
            .namespace_declarations()
            .map(|(prefix, uri)| Namespace::new(prefix, uri))
            .collect();
        for ns in &declarations {
            self.resolver.declare(ns.prefix.as_deref(), &ns.uri);
        }

        let scope = if declarations.is_empty() {
            self.stack
                .last()
                .map_or_else(|| Arc::clone(&self.base_scope), |parent| Arc::clone(&parent.scope))
        } else {
            Arc::from(self.resolver.in_scope())
        };

        let mut node = Node::new(start.name);
        node.namespace = self.resolver.resolve(start.prefix()).map(str::to_string);
        node.declarations = declarations;
        node.scope = scope;
        node.attributes = start
            .attributes
            .into_iter()
            .filter(|a| a.declared_prefix().is_none())
            .map(|a| XmlAttribute::new(a.name, a.value.into_owned()))
            .collect();

        self.stack.push(node);
        Ok(())
    }

    fn close(&mut self, name: Option<&str>) -> std::result::Result<(), String> {
        let Some(node) = self.stack.pop() else {
            return Err(format!("Unexpected end tag </{}>", name.unwrap_or_default()));
        };
        if let Some(name) = name {
            if name != node.name() {
                return Err(format!(
                    "Mismatched end tag </{}>, expected </{}>",
                    name,
                    node.name()
                ));
            }
        }
        self.resolver.pop_scope();

        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root = Some(node),
        }
        Ok(())
    }

    fn append_text(&mut self, text: &str) -> std::result::Result<(), String> {
        match self.stack.last_mut() {
            Some(node) => {
                node.text.get_or_insert_with(String::new).push_str(text);
                Ok(())
            }
            None if text.bytes().all(is_whitespace) => Ok(()),
            None => Err("Text content outside of the root element".to_string()),
        }
    }

    fn finish(mut self) -> std::result::Result<Node, String> {
        if let Some(open) = self.stack.pop() {
            return Err(format!("Premature end of data, unclosed tag <{}>", open.name()));
        }
        self.root
            .ok_or_else(|| "Document has no root element".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tree() {
        let doc = Document::parse_str("<root><a>1</a><b x=\"y\"/></root>").unwrap();
        let root = doc.root();
        assert_eq!(root.name(), "root");
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0].text(), Some("1"));
        assert_eq!(root.children()[1].attribute("x"), Some("y"));
        assert!(root.children()[1].is_empty());
        assert_eq!(doc.source_name(), "");
    }

    #[test]
    fn test_text_and_cdata_concatenated() {
        let doc = Document::parse_str("<a>x &amp; <![CDATA[<y>]]><!-- c -->z</a>").unwrap();
        assert_eq!(doc.root().text(), Some("x & <y>z"));
    }

    #[test]
    fn test_prolog_and_bom_skipped() {
        let doc = Document::parse_str(
            "\u{feff}<?xml version=\"1.0\"?>\n<!DOCTYPE r>\n<!-- top -->\n<r/>\n",
        )
        .unwrap();
        assert_eq!(doc.root().name(), "r");
    }

    #[test]
    fn test_namespaces_resolved() {
        let doc = Document::parse_str(
            "<root xmlns:x=\"urn:x\" xmlns=\"urn:d\"><x:item id=\"1\"/><plain/></root>",
        )
        .unwrap();
        let root = doc.root();
        assert_eq!(root.namespace(), Some("urn:d"));
        assert_eq!(root.declarations().len(), 2);
        assert!(root.attributes().is_empty());

        let item = &root.children()[0];
        assert_eq!(item.namespace(), Some("urn:x"));
        assert_eq!(item.attribute("id"), Some("1"));
        assert!(Arc::ptr_eq(&item.scope, &root.scope));
        assert_eq!(root.children()[1].namespace(), Some("urn:d"));
    }

    #[test]
    fn test_fragment_inherits_namespaces() {
        let node = parse_fragment("<x:item/>", "", &[Namespace::new(Some("x"), "urn:x")]).unwrap();
        assert_eq!(node.namespace(), Some("urn:x"));
        assert_eq!(node.lookup_namespace(Some("x")), Some("urn:x"));
    }

    #[test]
    fn test_malformed_documents() {
        for markup in [
            "<a><b></a>",
            "<a>",
            "<a/><b/>",
            "",
            "text<a/>",
            "<a x=\"1\" x=\"2\"/>",
            "</a>",
        ] {
            let err = Document::parse_str(markup).unwrap_err();
            assert!(err.is_parse_failure(), "{:?} should fail to parse", markup);
            assert_eq!(err.content(), Some(markup));
        }
    }

    #[test]
    fn test_mismatch_message() {
        let err = Document::parse_str("<a><b></a>").unwrap_err();
        assert!(err.to_string().contains("Mismatched end tag </a>, expected </b>"));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.xml");
        std::fs::write(&path, "<root><a>1</a></root>").unwrap();

        let doc = Document::load(Source::Path(&path)).unwrap();
        assert_eq!(doc.root().children()[0].value(), "1");
        assert_eq!(doc.source_name(), path.display().to_string());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Document::parse_file("/nonexistent/dir/doc.xml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.source_name(), Some("/nonexistent/dir/doc.xml"));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = Document::from_reader(&b"<a>\xff</a>"[..], "bytes").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(err.source_name(), Some("bytes"));
    }
}
