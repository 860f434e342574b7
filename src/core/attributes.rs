//! XML Attribute Parsing
//!
//! Parses XML attributes from tag content.

use super::entities::decode_text;
use super::scanner::{is_name_char, is_name_start_char, is_whitespace};
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: &'a str,
    /// Attribute value (entities decoded)
    pub value: Cow<'a, str>,
}

impl<'a> Attribute<'a> {
    /// Create a new attribute
    pub fn new(name: &'a str, value: Cow<'a, str>) -> Self {
        Attribute { name, value }
    }

    /// Namespace prefix (before colon), if any
    pub fn prefix(&self) -> Option<&'a str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Local name (after colon, if namespaced)
    pub fn local_name(&self) -> &'a str {
        self.name.split_once(':').map_or(self.name, |(_, local)| local)
    }

    /// The prefix this attribute declares, if it is a namespace declaration.
    /// `Some(None)` is a default namespace declaration (`xmlns="..."`).
    pub fn declared_prefix(&self) -> Option<Option<&'a str>> {
        if self.name == "xmlns" {
            Some(None)
        } else {
            self.name.strip_prefix("xmlns:").map(Some)
        }
    }
}

/// Parse attributes from raw tag content (after the element name)
///
/// Input should be the content between element name and '>' or '/>'
pub fn parse_attributes(input: &str) -> Result<Vec<Attribute<'_>>, &'static str> {
    let bytes = input.as_bytes();
    let mut attrs = Vec::new();
    let mut pos = 0;

    loop {
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        // Attribute name
        let name_start = pos;
        if !is_name_start_char(bytes[pos]) {
            return Err("Attribute name must start with letter, underscore, or colon");
        }
        while pos < bytes.len() && is_name_char(bytes[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        // Skip whitespace around '='
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            return Err("Attribute value required");
        }
        pos += 1;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        // Quoted value
        let quote = match bytes.get(pos) {
            Some(&q) if q == b'"' || q == b'\'' => q,
            _ => return Err("Attribute value must be quoted"),
        };
        pos += 1;
        let value_start = pos;
        while pos < bytes.len() && bytes[pos] != quote {
            if bytes[pos] == b'<' {
                return Err("Attribute value cannot contain '<'");
            }
            pos += 1;
        }
        if pos >= bytes.len() {
            return Err("Attribute value has mismatched quotes");
        }

        attrs.push(Attribute::new(name, decode_text(&input[value_start..pos])));
        pos += 1; // Skip closing quote

        if pos < bytes.len() && !is_whitespace(bytes[pos]) {
            return Err("Attributes must be separated by whitespace");
        }
    }

    Ok(attrs)
}

/// Find the first attribute name that occurs twice
pub fn find_duplicate<'a>(attrs: &[Attribute<'a>]) -> Option<&'a str> {
    attrs
        .iter()
        .enumerate()
        .find(|(i, a)| attrs[i + 1..].iter().any(|b| b.name == a.name))
        .map(|(_, a)| a.name)
}
