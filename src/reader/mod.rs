//! XML Reader Module
//!
//! Provides the input side of parsing:
//! - SliceReader: Zero-copy pull parser over a complete string
//! - BufferedReader: Chunked reading of any `io::Read`
//! - Events: XML event types for pull parsing
//! - Source: Where a document comes from

pub mod buffered;
pub mod events;
pub mod slice;

use std::path::Path;

/// A document source
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// A file on disk
    Path(&'a Path),
    /// Inline markup
    Str(&'a str),
}

impl<'a> Source<'a> {
    /// Identifier used in error reports: the file path, or empty for
    /// inline markup
    pub fn name(&self) -> String {
        match self {
            Source::Path(path) => path.display().to_string(),
            Source::Str(_) => String::new(),
        }
    }
}

impl<'a> From<&'a Path> for Source<'a> {
    fn from(path: &'a Path) -> Self {
        Source::Path(path)
    }
}
