//! XML Event Types
//!
//! Event types for pull-parser style XML processing.

use crate::core::attributes::Attribute;
use std::borrow::Cow;

/// XML parsing event
#[derive(Debug, Clone)]
pub enum XmlEvent<'a> {
    /// Start of an element: <name attrs...>
    StartElement(StartElement<'a>),
    /// End of an element: </name>
    EndElement(EndElement<'a>),
    /// Empty element: <name attrs.../>
    EmptyElement(StartElement<'a>),
    /// Text content between tags, entities decoded
    Text(Cow<'a, str>),
    /// CDATA section content
    CData(&'a str),
    /// Comment content
    Comment(&'a str),
    /// Processing instruction: <?target data?>
    ProcessingInstruction { target: &'a str, data: &'a str },
    /// XML declaration: <?xml version="1.0"?>
    XmlDeclaration {
        version: Cow<'a, str>,
        encoding: Option<Cow<'a, str>>,
        standalone: Option<bool>,
    },
    /// DOCTYPE declaration (raw, without the `<!DOCTYPE` prefix)
    DocType(&'a str),
}

/// Start element event data
#[derive(Debug, Clone)]
pub struct StartElement<'a> {
    /// Full element name (may include prefix)
    pub name: &'a str,
    /// Element attributes in document order
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    pub fn new(name: &'a str, attributes: Vec<Attribute<'a>>) -> Self {
        StartElement { name, attributes }
    }

    /// Namespace prefix (before colon), if any
    pub fn prefix(&self) -> Option<&'a str> {
        split_name(self.name).0
    }

    /// Local name (after colon)
    pub fn local_name(&self) -> &'a str {
        split_name(self.name).1
    }

    /// Get an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute<'a>> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Get an attribute value by name
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(|a| a.value.as_ref())
    }

    /// Namespace declarations made on this element as (prefix, uri)
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (Option<&'a str>, &str)> + '_ {
        self.attributes
            .iter()
            .filter_map(|a| a.declared_prefix().map(|prefix| (prefix, a.value.as_ref())))
    }
}

/// End element event data
#[derive(Debug, Clone, Copy)]
pub struct EndElement<'a> {
    /// Full element name
    pub name: &'a str,
}

impl<'a> EndElement<'a> {
    pub fn new(name: &'a str) -> Self {
        EndElement { name }
    }

    /// Local name (after colon)
    pub fn local_name(&self) -> &'a str {
        split_name(self.name).1
    }
}

/// Split a name into prefix and local name at the colon
fn split_name(name: &str) -> (Option<&str>, &str) {
    match memchr::memchr(b':', name.as_bytes()) {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

impl<'a> XmlEvent<'a> {
    /// Get as start element if applicable
    pub fn as_start_element(&self) -> Option<&StartElement<'a>> {
        match self {
            XmlEvent::StartElement(e) | XmlEvent::EmptyElement(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if applicable (text or CDATA)
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlEvent::Text(t) => Some(t.as_ref()),
            XmlEvent::CData(t) => Some(t),
            _ => None,
        }
    }
}
