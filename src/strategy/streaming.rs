//! Streaming path dispatch
//!
//! Processes XML in chunks with bounded memory. A [`PathStack`] mirrors the
//! element nesting at the current token; whenever the dot-joined stack
//! equals the target path, the element's outer markup is captured (across
//! chunk boundaries if needed), parsed into a standalone [`Node`] tree and
//! handed to the caller wrapped in a [`PathResolver`].
//!
//! Tokenizing pauses at the end of every captured element, so a callback
//! runs before any later markup is examined.

use crate::core::attributes::parse_attributes;
use crate::core::tokenizer::{Step, Token, TokenKind, Tokenizer};
use crate::dom::document::parse_fragment;
use crate::dom::namespace::NamespaceResolver;
use crate::dom::node::{Namespace, Node};
use crate::error::{Error, Result};
use crate::path::cache::PathCache;
use crate::path::expression::PathExpression;
use crate::path::resolver::{PathResolver, ResolverSettings};
use crate::reader::buffered::{BufferedReader, DEFAULT_CHUNK_SIZE};
use crate::reader::Source;
use memchr::memmem;
use std::fs::File;
use std::io::Read;
use std::sync::Arc;

/// Ancestor chain of element names from the document root to the
/// current element
#[derive(Debug, Default, Clone)]
pub struct PathStack {
    joined: String,
    /// Length of `joined` before each push
    marks: Vec<usize>,
}

impl PathStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str) {
        self.marks.push(self.joined.len());
        if !self.joined.is_empty() {
            self.joined.push('.');
        }
        self.joined.push_str(name);
    }

    /// Remove the innermost name; false if the stack was empty
    pub fn pop(&mut self) -> bool {
        match self.marks.pop() {
            Some(mark) => {
                self.joined.truncate(mark);
                true
            }
            None => false,
        }
    }

    pub fn depth(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Dot-joined names, e.g. `root.item`
    pub fn as_str(&self) -> &str {
        &self.joined
    }

    /// The innermost name
    pub fn last(&self) -> Option<&str> {
        let mark = *self.marks.last()?;
        let start = if mark == 0 { 0 } else { mark + 1 };
        Some(&self.joined[start..])
    }
}

/// Outer markup of one matched element
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    xml: String,
    /// Bindings declared on the element's ancestors
    namespaces: Vec<Namespace>,
}

impl Fragment {
    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn inherited_namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Parse into a standalone tree that sees the ancestors' bindings
    pub fn parse(&self, source_name: &str) -> Result<Node> {
        parse_fragment(&self.xml, source_name, &self.namespaces)
    }
}

/// Builder for capturing complete elements
struct ElementBuilder {
    /// Accumulated bytes from previous chunks
    accumulated: Vec<u8>,
    /// Start position in current buffer (where element begins)
    start_in_buffer: usize,
    /// Stack depth of the captured element
    start_depth: usize,
    namespaces: Vec<Namespace>,
}

/// Incremental matcher: feed chunks, pull matched fragments one at a time
pub struct PathStreamer {
    /// Input not yet tokenized
    buffer: Vec<u8>,
    /// Fragment completed by the last processing step
    ready: Option<Fragment>,
    /// No more input will be fed
    finished: bool,
    capture: Option<ElementBuilder>,
    stack: PathStack,
    namespaces: NamespaceResolver,
    target: String,
    source_name: String,
}

impl PathStreamer {
    /// Match elements at `target_path` (dot or arrow separated)
    pub fn new(target_path: &str, source_name: &str) -> Self {
        PathStreamer {
            buffer: Vec::with_capacity(DEFAULT_CHUNK_SIZE),
            ready: None,
            finished: false,
            capture: None,
            stack: PathStack::new(),
            namespaces: NamespaceResolver::new(),
            target: PathExpression::parse(target_path).normalized(),
            source_name: source_name.to_string(),
        }
    }

    /// Append a chunk of data. Nothing is tokenized until
    /// [`next_fragment`](Self::next_fragment) is called.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Signal end of input
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Tokenize up to the end of the next matched element and return it.
    /// `None` means more input is needed, or after [`finish`](Self::finish)
    /// that the document is complete. Malformed markup before the next
    /// match fails here, as do truncated input and open elements at the
    /// end.
    pub fn next_fragment(&mut self) -> Result<Option<Fragment>> {
        self.process(self.finished)?;
        if let Some(fragment) = self.ready.take() {
            return Ok(Some(fragment));
        }

        if self.finished {
            if let Some(open) = self.stack.last() {
                let message = format!("Premature end of data, unclosed tag <{}>", open);
                return Err(Error::parse(self.source_name.as_str(), self.stack.as_str(), message));
            }
        }
        Ok(None)
    }

    /// Current path stack
    pub fn stack(&self) -> &PathStack {
        &self.stack
    }

    /// Bytes fed but not yet tokenized
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn process(&mut self, is_final: bool) -> Result<()> {
        // Tokens borrow the buffer while handlers update the parser state
        let mut buffer = std::mem::take(&mut self.buffer);
        let result = self.process_buffer(&buffer, is_final);

        if let Ok(consumed) = result {
            if let Some(ref mut builder) = self.capture {
                builder
                    .accumulated
                    .extend_from_slice(&buffer[builder.start_in_buffer..consumed]);
                builder.start_in_buffer = 0;
            }
            buffer.drain(..consumed);
        }

        self.buffer = buffer;
        result.map(|_| ())
    }

    /// Handle complete tokens until a capture completes or the buffer runs
    /// out; returns the number of bytes consumed
    fn process_buffer(&mut self, buffer: &[u8], is_final: bool) -> Result<usize> {
        let mut tokenizer = if is_final {
            Tokenizer::new(buffer)
        } else {
            Tokenizer::partial(buffer)
        };

        loop {
            let step = tokenizer
                .next_step()
                .map_err(|e| self.parse_error(buffer, e.to_string()))?;
            match step {
                Step::Token(token) => {
                    self.handle_token(buffer, &token)?;
                    if self.ready.is_some() {
                        break;
                    }
                }
                Step::Incomplete | Step::Eof => break,
            }
        }

        Ok(tokenizer.position())
    }

    fn handle_token(&mut self, buffer: &[u8], token: &Token<'_>) -> Result<()> {
        match token.kind {
            TokenKind::StartTag | TokenKind::EmptyTag => {
                let name = self.utf8(buffer, token.name.unwrap_or_default())?;
                self.stack.push(name);

                let matched = self.capture.is_none() && self.stack.as_str() == self.target;
                let inherited = if matched {
                    self.namespaces.in_scope()
                } else {
                    Vec::new()
                };

                self.namespaces.push_scope();
                // Declarations inside a capture travel with the fragment markup
                if self.capture.is_none() && !matched {
                    self.declare_namespaces(buffer, token.content.unwrap_or_default())?;
                }

                if matched {
                    log::trace!("match for {} at byte {}", self.target, token.span.0);
                    self.capture = Some(ElementBuilder {
                        accumulated: Vec::new(),
                        start_in_buffer: token.span.0,
                        start_depth: self.stack.depth(),
                        namespaces: inherited,
                    });
                }

                if token.kind == TokenKind::EmptyTag {
                    self.end_element(buffer, token.span.1)?;
                }
                Ok(())
            }

            TokenKind::EndTag => {
                let name = self.utf8(buffer, token.name.unwrap_or_default())?;
                match self.stack.last() {
                    Some(open) if open == name => {}
                    Some(open) => {
                        let message = format!("Mismatched end tag </{}>, expected </{}>", name, open);
                        return Err(self.parse_error(buffer, message));
                    }
                    None => {
                        let message = format!("Unexpected end tag </{}>", name);
                        return Err(self.parse_error(buffer, message));
                    }
                }
                self.end_element(buffer, token.span.1)
            }

            // Text, comments, CDATA, PIs and the prolog don't move the stack
            _ => Ok(()),
        }
    }

    /// Close the innermost element, completing the capture if it ends here
    fn end_element(&mut self, buffer: &[u8], end_pos: usize) -> Result<()> {
        let completes = self
            .capture
            .as_ref()
            .is_some_and(|builder| builder.start_depth == self.stack.depth());

        if completes {
            if let Some(builder) = self.capture.take() {
                let mut element = builder.accumulated;
                element.extend_from_slice(&buffer[builder.start_in_buffer..end_pos]);
                let xml = String::from_utf8(element).map_err(|e| {
                    let content = String::from_utf8_lossy(e.as_bytes()).into_owned();
                    Error::parse(self.source_name.as_str(), content, "Fragment is not valid UTF-8")
                })?;
                self.ready = Some(Fragment {
                    xml,
                    namespaces: builder.namespaces,
                });
            }
        }

        self.stack.pop();
        self.namespaces.pop_scope();
        Ok(())
    }

    fn declare_namespaces(&mut self, buffer: &[u8], raw_attrs: &[u8]) -> Result<()> {
        if memmem::find(raw_attrs, b"xmlns").is_none() {
            return Ok(());
        }
        let raw = self.utf8(buffer, raw_attrs)?;
        let attrs = parse_attributes(raw).map_err(|msg| self.parse_error(buffer, msg.to_string()))?;
        for attr in &attrs {
            if let Some(prefix) = attr.declared_prefix() {
                self.namespaces.declare(prefix, &attr.value);
            }
        }
        Ok(())
    }

    fn utf8<'b>(&self, buffer: &[u8], bytes: &'b [u8]) -> Result<&'b str> {
        std::str::from_utf8(bytes).map_err(|_| self.parse_error(buffer, "Invalid UTF-8".to_string()))
    }

    fn parse_error(&self, buffer: &[u8], message: String) -> Error {
        Error::parse(
            self.source_name.as_str(),
            String::from_utf8_lossy(buffer).into_owned(),
            message,
        )
    }
}

/// Streams a source and calls back once per element at the target path
#[derive(Debug, Clone)]
pub struct StreamingDispatcher {
    target: String,
    settings: ResolverSettings,
    cache: Option<Arc<PathCache>>,
    chunk_size: usize,
}

impl StreamingDispatcher {
    /// Dispatch elements at `target_path` with default resolver settings
    pub fn new(target_path: &str) -> Self {
        Self::with_settings(target_path, ResolverSettings::default())
    }

    /// Dispatch with `settings` applied to every fragment resolver
    pub fn with_settings(target_path: &str, settings: ResolverSettings) -> Self {
        StreamingDispatcher {
            target: PathExpression::parse(target_path).normalized(),
            cache: settings.build_cache(),
            settings,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Read the source in chunks of `chunk_size` bytes
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// The normalized (dot-joined) target path
    pub fn target_path(&self) -> &str {
        &self.target
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Stream a file or inline markup. Returns the number of matches
    /// delivered; an error from `on_match` stops the stream and is
    /// returned unchanged.
    pub fn stream<F, E>(&self, source: Source<'_>, on_match: F) -> std::result::Result<usize, E>
    where
        F: FnMut(&PathResolver<'_>) -> std::result::Result<(), E>,
        E: From<Error>,
    {
        let source_name = source.name();
        match source {
            Source::Path(path) => {
                let file = File::open(path).map_err(|e| Error::io(source_name.as_str(), e))?;
                self.stream_reader(file, &source_name, on_match)
            }
            Source::Str(markup) => self.stream_reader(markup.as_bytes(), &source_name, on_match),
        }
    }

    /// Stream any reader; `source_name` identifies it in errors
    pub fn stream_reader<R, F, E>(
        &self,
        reader: R,
        source_name: &str,
        mut on_match: F,
    ) -> std::result::Result<usize, E>
    where
        R: Read,
        F: FnMut(&PathResolver<'_>) -> std::result::Result<(), E>,
        E: From<Error>,
    {
        log::debug!("streaming {:?} for path {}", source_name, self.target);

        let mut reader = BufferedReader::with_capacity(reader, self.chunk_size);
        let mut streamer = PathStreamer::new(&self.target, source_name);
        let mut delivered = 0;

        while let Some(chunk) = reader
            .next_chunk()
            .map_err(|e| Error::io(source_name, e))?
        {
            streamer.feed(chunk);
            delivered += self.deliver(&mut streamer, source_name, &mut on_match)?;
        }
        streamer.finish();
        delivered += self.deliver(&mut streamer, source_name, &mut on_match)?;

        log::debug!(
            "finished {:?}: {} matches in {} bytes",
            source_name,
            delivered,
            reader.bytes_read()
        );
        Ok(delivered)
    }

    /// Run `on_match` for each fragment the buffered input completes, one
    /// at a time
    fn deliver<F, E>(
        &self,
        streamer: &mut PathStreamer,
        source_name: &str,
        on_match: &mut F,
    ) -> std::result::Result<usize, E>
    where
        F: FnMut(&PathResolver<'_>) -> std::result::Result<(), E>,
        E: From<Error>,
    {
        let mut count = 0;
        while let Some(fragment) = streamer
            .next_fragment()
            .inspect_err(|e| log::warn!("{}", e))?
        {
            let node = fragment
                .parse(source_name)
                .inspect_err(|e| log::warn!("{}", e))?;
            let resolver =
                PathResolver::with_cache(&node, self.settings.clone(), self.cache.clone());
            on_match(&resolver)?;
            count += 1;
        }
        Ok(count)
    }
}

/// Stream `source`, calling `on_match` for each element at `target_path`
pub fn stream<F, E>(source: Source<'_>, target_path: &str, on_match: F) -> std::result::Result<usize, E>
where
    F: FnMut(&PathResolver<'_>) -> std::result::Result<(), E>,
    E: From<Error>,
{
    StreamingDispatcher::new(target_path).stream(source, on_match)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(target: &str, chunks: &[&[u8]]) -> Vec<String> {
        let mut streamer = PathStreamer::new(target, "");
        let mut out = Vec::new();
        for chunk in chunks {
            streamer.feed(chunk);
            while let Some(f) = streamer.next_fragment().unwrap() {
                out.push(f.xml().to_string());
            }
        }
        streamer.finish();
        while let Some(f) = streamer.next_fragment().unwrap() {
            out.push(f.xml().to_string());
        }
        out
    }

    #[test]
    fn test_path_stack() {
        let mut stack = PathStack::new();
        assert_eq!(stack.last(), None);
        stack.push("root");
        stack.push("item");
        assert_eq!(stack.as_str(), "root.item");
        assert_eq!(stack.last(), Some("item"));
        assert_eq!(stack.depth(), 2);
        assert!(stack.pop());
        assert_eq!(stack.as_str(), "root");
        assert_eq!(stack.last(), Some("root"));
        assert!(stack.pop());
        assert!(!stack.pop());
        assert!(stack.is_empty());
    }

    #[test]
    fn test_streaming_simple() {
        let found = fragments(
            "root.item",
            &[b"<root><item><a>1</a></item><other><item/></other><item><a>2</a></item></root>"],
        );
        assert_eq!(found, vec!["<item><a>1</a></item>", "<item><a>2</a></item>"]);
    }

    #[test]
    fn test_streaming_chunks() {
        let found = fragments(
            "root->item",
            &[b"<ro", b"ot><i", b"tem id=\"a>b\"><a>", b"1</a></it", b"em><item/></root>"],
        );
        assert_eq!(found, vec!["<item id=\"a>b\"><a>1</a></item>", "<item/>"]);
    }

    #[test]
    fn test_nested_same_name_not_rematched() {
        let found = fragments("a.b", &[b"<a><b><b/></b></a>"]);
        assert_eq!(found, vec!["<b><b/></b>"]);
    }

    #[test]
    fn test_stack_balanced_after_empty_element() {
        let mut streamer = PathStreamer::new("root.item", "");
        streamer.feed(b"<root><item/>");
        assert!(streamer.next_fragment().unwrap().is_some());
        assert_eq!(streamer.stack().as_str(), "root");
        streamer.feed(b"</root>");
        assert!(streamer.next_fragment().unwrap().is_none());
        assert!(streamer.stack().is_empty());
        assert_eq!(streamer.pending(), 0);
    }

    #[test]
    fn test_namespaces_inherited_by_fragment() {
        let mut streamer = PathStreamer::new("r.x:item", "");
        streamer.feed(b"<r xmlns:x=\"urn:x\"><x:item><x:v>1</x:v></x:item></r>");
        let fragment = streamer.next_fragment().unwrap().unwrap();
        assert_eq!(fragment.inherited_namespaces(), &[Namespace::new(Some("x"), "urn:x")]);
        let node = fragment.parse("").unwrap();
        assert_eq!(node.namespace(), Some("urn:x"));
    }

    #[test]
    fn test_mismatched_end_tag() {
        let mut streamer = PathStreamer::new("a", "feed.xml");
        streamer.feed(b"<a><b></a>");
        let err = streamer.next_fragment().unwrap_err();
        assert!(err.is_parse_failure());
        assert_eq!(err.source_name(), Some("feed.xml"));
        assert!(err.to_string().contains("Mismatched end tag </a>"));
    }

    #[test]
    fn test_truncated_document() {
        let mut streamer = PathStreamer::new("a.b", "");
        streamer.feed(b"<a><b>");
        assert!(streamer.next_fragment().unwrap().is_none());
        streamer.finish();
        assert!(streamer.next_fragment().is_err());

        let mut streamer = PathStreamer::new("a.b", "");
        streamer.feed(b"<a><b");
        assert!(streamer.next_fragment().unwrap().is_none());
        assert_eq!(streamer.pending(), 2);
        streamer.finish();
        assert!(streamer.next_fragment().is_err());
    }

    #[test]
    fn test_tokenizing_pauses_after_each_match() {
        let mut streamer = PathStreamer::new("root.item", "");
        streamer.feed(b"<root><item>1</item><item>2</item></oops>");

        let first = streamer.next_fragment().unwrap().unwrap();
        assert_eq!(first.xml(), "<item>1</item>");
        assert_eq!(streamer.stack().as_str(), "root");
        assert_eq!(streamer.pending(), "<item>2</item></oops>".len());

        let second = streamer.next_fragment().unwrap().unwrap();
        assert_eq!(second.xml(), "<item>2</item>");
        assert!(streamer.next_fragment().is_err());
    }

    #[test]
    fn test_deeply_nested_input() {
        let depth = 70_000;
        let xml = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let mut streamer = PathStreamer::new("a.b", "");
        for chunk in xml.as_bytes().chunks(DEFAULT_CHUNK_SIZE) {
            streamer.feed(chunk);
            assert!(streamer.next_fragment().unwrap().is_none());
        }
        streamer.finish();
        assert!(streamer.next_fragment().unwrap().is_none());
        assert!(streamer.stack().is_empty());
    }

    #[test]
    fn test_dispatcher_counts_matches() {
        let dispatcher = StreamingDispatcher::new("root.item").with_chunk_size(3);
        let mut names = Vec::new();
        let count = dispatcher
            .stream(Source::Str("<root><item><n>a</n></item><item><n>b</n></item></root>"), |r| {
                names.push(r.value("n")?.to_string());
                Ok::<(), Error>(())
            })
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(names, vec!["a", "b"]);
    }
}
