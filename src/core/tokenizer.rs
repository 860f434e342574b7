//! XML Tokenizer - State machine for XML token extraction
//!
//! Implements a pull-parser style tokenizer that extracts XML tokens:
//! - Element start/end tags
//! - Text content
//! - CDATA sections
//! - Comments
//! - Processing instructions
//! - DOCTYPE declarations
//!
//! The tokenizer works over complete input or over a partial buffer. In
//! partial mode a construct cut off by the end of the buffer is reported as
//! [`Step::Incomplete`] and the position stays at its start, so the caller
//! can append more bytes and resume from there.

use super::scanner::{is_whitespace, Scanner};

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
}

/// A parsed XML token
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// For tags and PIs: the name or target
    pub name: Option<&'a [u8]>,
    /// Raw, undecoded content: text, CDATA body, comment body, PI data,
    /// or the attribute section of a start/empty tag
    pub content: Option<&'a [u8]>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
        }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: &'a [u8]) -> Self {
        self.content = Some(content);
        self
    }
}

/// Result of one tokenizer step
#[derive(Debug)]
pub enum Step<'a> {
    Token(Token<'a>),
    /// More input is needed to complete the construct at `position()`
    Incomplete,
    Eof,
}

/// Error for malformed markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

/// XML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    /// True if the input is complete; false for a streaming buffer
    is_final: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer over complete input
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
            is_final: true,
        }
    }

    /// Create a tokenizer over a buffer that may end mid-construct
    pub fn partial(input: &'a [u8]) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
            is_final: false,
        }
    }

    /// Get the current position in the input. After `Step::Incomplete`
    /// this is the start of the unfinished construct.
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Get the next token from complete input
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        match self.next_step()? {
            Step::Token(token) => Ok(Some(token)),
            Step::Incomplete | Step::Eof => Ok(None),
        }
    }

    /// Advance by one token
    pub fn next_step(&mut self) -> Result<Step<'a>, ParseError> {
        if self.scanner.is_eof() {
            return Ok(Step::Eof);
        }

        let start = self.scanner.position();
        if self.scanner.peek_at(0) != Some(b'<') {
            return Ok(Step::Token(self.read_text(start)));
        }

        match self.scanner.peek_at(1) {
            None => self.incomplete(start, "Unexpected end of input after '<'"),
            Some(b'/') => self.read_end_tag(start),
            Some(b'?') => self.read_processing_instruction(start),
            Some(b'!') => self.read_declaration(start),
            Some(_) => self.read_start_tag(start),
        }
    }

    /// Report an unfinished construct: more input in partial mode,
    /// an error once the input is complete
    fn incomplete(&mut self, start: usize, message: &str) -> Result<Step<'a>, ParseError> {
        if self.is_final {
            Err(ParseError::new(message, start))
        } else {
            self.scanner.set_position(start);
            Ok(Step::Incomplete)
        }
    }

    fn read_text(&mut self, start: usize) -> Token<'a> {
        // Text cut off by a partial buffer is still emitted; the rest
        // arrives as another text token
        let end = self
            .scanner
            .find_tag_start()
            .unwrap_or(start + self.scanner.remaining().len());
        self.scanner.set_position(end);
        Token::new(TokenKind::Text, (start, end)).with_content(self.scanner.slice(start, end))
    }

    fn read_end_tag(&mut self, start: usize) -> Result<Step<'a>, ParseError> {
        let Some(gt) = self.scanner.find_byte(b'>') else {
            return self.incomplete(start, "Unclosed end tag");
        };

        let inner = self.scanner.slice(start + 2, gt);
        let name = trim_ascii_end(inner);
        if name.is_empty() || !name.iter().all(|&b| !is_whitespace(b)) {
            return Err(ParseError::new("Invalid end tag name", start));
        }

        self.scanner.set_position(gt + 1);
        Ok(Step::Token(
            Token::new(TokenKind::EndTag, (start, gt + 1)).with_name(name),
        ))
    }

    fn read_start_tag(&mut self, start: usize) -> Result<Step<'a>, ParseError> {
        self.scanner.set_position(start + 1);
        let Some(name) = self.scanner.read_name() else {
            // A partial buffer may end right after '<'
            if self.scanner.is_eof() {
                return self.incomplete(start, "Unclosed start tag");
            }
            return Err(ParseError::new("Invalid element name", start));
        };
        let attr_start = self.scanner.position();

        self.scanner.set_position(start);
        let Some(gt) = self.scanner.find_tag_end_quoted() else {
            return self.incomplete(start, "Unclosed start tag");
        };

        let (kind, attr_end) = if gt > attr_start && self.scanner.slice(gt - 1, gt) == b"/" {
            (TokenKind::EmptyTag, gt - 1)
        } else {
            (TokenKind::StartTag, gt)
        };

        let attrs = self.scanner.slice(attr_start, attr_end.max(attr_start));
        if let Some(&first) = attrs.first() {
            if !is_whitespace(first) {
                return Err(ParseError::new("Invalid character in element name", attr_start));
            }
        }

        self.scanner.set_position(gt + 1);
        Ok(Step::Token(
            Token::new(kind, (start, gt + 1))
                .with_name(name)
                .with_content(attrs),
        ))
    }

    fn read_processing_instruction(&mut self, start: usize) -> Result<Step<'a>, ParseError> {
        let Some(end) = self.scanner.find_sequence(b"?>", 2) else {
            return self.incomplete(start, "Unterminated processing instruction");
        };

        self.scanner.set_position(start + 2);
        let target = self.scanner.read_name().filter(|_| self.scanner.position() <= end);
        let Some(target) = target else {
            return Err(ParseError::new("Invalid processing instruction target", start));
        };
        let data = trim_ascii_start(self.scanner.slice(self.scanner.position(), end));

        let kind = if target.eq_ignore_ascii_case(b"xml") {
            TokenKind::XmlDeclaration
        } else {
            TokenKind::ProcessingInstruction
        };

        self.scanner.set_position(end + 2);
        Ok(Step::Token(
            Token::new(kind, (start, end + 2))
                .with_name(target)
                .with_content(data),
        ))
    }

    fn read_declaration(&mut self, start: usize) -> Result<Step<'a>, ParseError> {
        if self.scanner.starts_with(b"<!--") {
            let Some(end) = self.scanner.find_sequence(b"-->", 4) else {
                return self.incomplete(start, "Unterminated comment");
            };
            self.scanner.set_position(end + 3);
            return Ok(Step::Token(
                Token::new(TokenKind::Comment, (start, end + 3))
                    .with_content(self.scanner.slice(start + 4, end)),
            ));
        }

        if self.scanner.starts_with(b"<![CDATA[") {
            let Some(end) = self.scanner.find_sequence(b"]]>", 9) else {
                return self.incomplete(start, "Unterminated CDATA section");
            };
            self.scanner.set_position(end + 3);
            return Ok(Step::Token(
                Token::new(TokenKind::CData, (start, end + 3))
                    .with_content(self.scanner.slice(start + 9, end)),
            ));
        }

        if self.scanner.starts_with(b"<!DOCTYPE") {
            let Some(end) = self.scanner.find_doctype_end() else {
                return self.incomplete(start, "Unterminated DOCTYPE");
            };
            self.scanner.set_position(end + 1);
            return Ok(Step::Token(
                Token::new(TokenKind::DocType, (start, end + 1))
                    .with_content(self.scanner.slice(start + 9, end)),
            ));
        }

        let partial = [b"<!--" as &[u8], b"<![CDATA[", b"<!DOCTYPE"]
            .iter()
            .any(|needle| self.scanner.is_partial_of(needle));
        if partial {
            return self.incomplete(start, "Unterminated markup declaration");
        }

        Err(ParseError::new("Invalid markup declaration", start))
    }
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let skip = bytes.iter().take_while(|&&b| is_whitespace(b)).count();
    &bytes[skip..]
}

fn trim_ascii_end(bytes: &[u8]) -> &[u8] {
    let keep = bytes.len() - bytes.iter().rev().take_while(|&&b| is_whitespace(b)).count();
    &bytes[..keep]
}
