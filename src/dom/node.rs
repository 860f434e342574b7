//! XML Node representation
//!
//! An owned element tree. Each node exclusively owns its children and
//! carries the namespace bindings visible at it, so namespace-qualified
//! lookups never need a parent link.

use std::sync::Arc;

/// A namespace binding (prefix -> URI); `prefix` is `None` for the
/// default namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: Option<String>,
    pub uri: String,
}

impl Namespace {
    pub fn new(prefix: Option<&str>, uri: &str) -> Self {
        Namespace {
            prefix: prefix.map(str::to_string),
            uri: uri.to_string(),
        }
    }
}

/// An element attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub(crate) name: String,
    pub(crate) value: String,
}

impl XmlAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        XmlAttribute {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Local name (after colon, if namespaced)
    pub fn local_name(&self) -> &str {
        self.name.split_once(':').map_or(self.name.as_str(), |(_, local)| local)
    }
}

/// An XML element node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Qualified name as written, e.g. `x:item`
    pub(crate) name: String,
    /// Resolved namespace URI of the element name
    pub(crate) namespace: Option<String>,
    /// Namespace declarations made on this element
    pub(crate) declarations: Vec<Namespace>,
    /// All bindings visible at this element, shared with descendants
    /// that declare nothing new
    pub(crate) scope: Arc<[Namespace]>,
    /// Attributes in document order (namespace declarations excluded)
    pub(crate) attributes: Vec<XmlAttribute>,
    /// Child elements in document order
    pub(crate) children: Vec<Node>,
    /// Concatenated direct text and CDATA content
    pub(crate) text: Option<String>,
}

impl Node {
    /// Create an element with no attributes, children or text
    pub fn new(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            namespace: None,
            declarations: Vec::new(),
            scope: Arc::from(Vec::new()),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Set the text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set an attribute, replacing any existing value of the same name
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let attr = XmlAttribute::new(name, value);
        match self.attributes.iter().position(|a| a.name == attr.name) {
            Some(i) => self.attributes[i] = attr,
            None => self.attributes.push(attr),
        }
        self
    }

    /// Append a child element. The child and its subtree see this node's
    /// namespace bindings.
    pub fn with_child(mut self, mut child: Node) -> Self {
        child.rescope(&self.scope);
        self.children.push(child);
        self
    }

    /// Declare a namespace on this element
    pub fn with_namespace(mut self, prefix: Option<&str>, uri: &str) -> Self {
        self.declarations.retain(|ns| ns.prefix.as_deref() != prefix);
        self.declarations.push(Namespace::new(prefix, uri));
        self.rescope(&[]);
        self
    }

    /// Recompute namespace scope for this subtree below `inherited`
    fn rescope(&mut self, inherited: &[Namespace]) {
        let mut scope: Vec<Namespace> = inherited
            .iter()
            .filter(|ns| !self.declarations.iter().any(|d| d.prefix == ns.prefix))
            .cloned()
            .collect();
        scope.extend(self.declarations.iter().filter(|d| !d.uri.is_empty()).cloned());

        let namespace = {
            let prefix = self.prefix();
            scope
                .iter()
                .find(|ns| ns.prefix.as_deref() == prefix)
                .map(|ns| ns.uri.clone())
        };
        self.namespace = namespace;

        for child in &mut self.children {
            child.rescope(&scope);
        }
        self.scope = Arc::from(scope);
    }

    /// Qualified element name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace prefix of the element name, if any
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Element name without its prefix
    pub fn local_name(&self) -> &str {
        self.name.split_once(':').map_or(self.name.as_str(), |(_, local)| local)
    }

    /// Namespace URI of the element name
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Namespace declarations made on this element
    pub fn declarations(&self) -> &[Namespace] {
        &self.declarations
    }

    /// Namespace bindings visible at this element
    pub fn namespaces_in_scope(&self) -> &[Namespace] {
        &self.scope
    }

    /// Resolve a prefix (`None` for the default namespace) against the
    /// bindings visible at this element
    pub fn lookup_namespace(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(super::namespace::ns::XML);
        }
        self.scope
            .iter()
            .rev()
            .find(|ns| ns.prefix.as_deref() == prefix)
            .map(|ns| ns.uri.as_str())
    }

    /// Text content, if the element has any text or CDATA
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text content, empty for elements without text
    pub fn value(&self) -> &str {
        self.text().unwrap_or("")
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// First child with the given qualified name
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given qualified name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Attribute value by qualified name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// True if the element has no children and no text
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.is_none()
    }
}
