//! Zero-Copy Slice Parser
//!
//! Parses XML from a complete string slice. Names, comments and CDATA
//! borrow from the input; text and attribute values are only copied when
//! entities need decoding.

use super::events::{EndElement, StartElement, XmlEvent};
use crate::core::attributes::{find_duplicate, parse_attributes};
use crate::core::entities::decode_text;
use crate::core::tokenizer::{ParseError, Token, TokenKind, Tokenizer};

/// Zero-copy XML reader over a string slice
pub struct SliceReader<'a> {
    tokenizer: Tokenizer<'a>,
    done: bool,
}

impl<'a> SliceReader<'a> {
    pub fn new(input: &'a str) -> Self {
        SliceReader {
            tokenizer: Tokenizer::new(input.as_bytes()),
            done: false,
        }
    }

    /// Byte offset of the next unread token
    pub fn position(&self) -> usize {
        self.tokenizer.position()
    }

    /// Get the next XML event, `Ok(None)` at end of input
    pub fn next_event(&mut self) -> Result<Option<XmlEvent<'a>>, ParseError> {
        let Some(token) = self.tokenizer.next_token()? else {
            return Ok(None);
        };

        let event = match token.kind {
            TokenKind::StartTag => XmlEvent::StartElement(start_element(&token)?),
            TokenKind::EmptyTag => XmlEvent::EmptyElement(start_element(&token)?),
            TokenKind::EndTag => XmlEvent::EndElement(EndElement::new(token_name(&token)?)),
            TokenKind::Text => XmlEvent::Text(decode_text(token_content(&token)?)),
            TokenKind::CData => XmlEvent::CData(token_content(&token)?),
            TokenKind::Comment => XmlEvent::Comment(token_content(&token)?),
            TokenKind::ProcessingInstruction => XmlEvent::ProcessingInstruction {
                target: token_name(&token)?,
                data: token_content(&token)?,
            },
            TokenKind::XmlDeclaration => {
                let attrs = parse_attributes(token_content(&token)?)
                    .map_err(|msg| ParseError::new(msg, token.span.0))?;
                let find = |name: &str| attrs.iter().find(|a| a.name == name).map(|a| a.value.clone());
                XmlEvent::XmlDeclaration {
                    version: find("version").unwrap_or(std::borrow::Cow::Borrowed("1.0")),
                    encoding: find("encoding"),
                    standalone: find("standalone").map(|v| v == "yes"),
                }
            }
            TokenKind::DocType => XmlEvent::DocType(token_content(&token)?),
        };

        Ok(Some(event))
    }
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = Result<XmlEvent<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn start_element<'a>(token: &Token<'a>) -> Result<StartElement<'a>, ParseError> {
    let name = token_name(token)?;
    let attributes = parse_attributes(token_content(token)?)
        .map_err(|msg| ParseError::new(msg, token.span.0))?;
    if let Some(dup) = find_duplicate(&attributes) {
        return Err(ParseError::new(
            format!("Duplicate attribute '{}'", dup),
            token.span.0,
        ));
    }
    Ok(StartElement::new(name, attributes))
}

// Token boundaries always fall on ASCII delimiters, so slices of valid
// UTF-8 input stay valid UTF-8.
fn as_str<'a>(bytes: &'a [u8], position: usize) -> Result<&'a str, ParseError> {
    std::str::from_utf8(bytes).map_err(|_| ParseError::new("Invalid UTF-8", position))
}

fn token_name<'a>(token: &Token<'a>) -> Result<&'a str, ParseError> {
    as_str(token.name.unwrap_or_default(), token.span.0)
}

fn token_content<'a>(token: &Token<'a>) -> Result<&'a str, ParseError> {
    as_str(token.content.unwrap_or_default(), token.span.0)
}

/// Parse XML from a string and return all events
pub fn parse_events(input: &str) -> Result<Vec<XmlEvent<'_>>, ParseError> {
    SliceReader::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_element() {
        let events = parse_events("<root>hello</root>").unwrap();
        assert_eq!(events.len(), 3);

        assert!(matches!(&events[0], XmlEvent::StartElement(e) if e.name == "root"));
        assert!(matches!(&events[1], XmlEvent::Text(t) if t == "hello"));
        assert!(matches!(&events[2], XmlEvent::EndElement(e) if e.name == "root"));
    }

    #[test]
    fn test_empty_element() {
        let events = parse_events("<br/>").unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], XmlEvent::EmptyElement(e) if e.name == "br"));
    }

    #[test]
    fn test_attributes() {
        let events = parse_events("<div id=\"main\" class=\"a &amp; b\"/>").unwrap();
        let e = events[0].as_start_element().unwrap();
        assert_eq!(e.attribute_value("id"), Some("main"));
        assert_eq!(e.attribute_value("class"), Some("a & b"));
    }

    #[test]
    fn test_text_entities_decoded() {
        let events = parse_events("<a>1 &lt; 2</a>").unwrap();
        assert_eq!(events[1].as_text(), Some("1 < 2"));
    }

    #[test]
    fn test_cdata() {
        let events = parse_events("<script><![CDATA[alert('<hi>')]]></script>").unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[1], XmlEvent::CData(c) if *c == "alert('<hi>')"));
    }

    #[test]
    fn test_declaration() {
        let events = parse_events("<?xml version=\"1.0\" encoding=\"UTF-8\"?><r/>").unwrap();
        match &events[0] {
            XmlEvent::XmlDeclaration { version, encoding, standalone } => {
                assert_eq!(version, "1.0");
                assert_eq!(encoding.as_deref(), Some("UTF-8"));
                assert_eq!(*standalone, None);
            }
            other => panic!("Expected XmlDeclaration, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let err = parse_events("<a x=\"1\" x=\"2\"/>").unwrap_err();
        assert!(err.message.contains("Duplicate attribute"));
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let mut reader = SliceReader::new("<a><!bogus></a>");
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_unicode_names_and_text() {
        let events = parse_events("<grüße>straße</grüße>").unwrap();
        assert!(matches!(&events[0], XmlEvent::StartElement(e) if e.name == "grüße"));
        assert_eq!(events[1].as_text(), Some("straße"));
    }
}
