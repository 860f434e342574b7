//! pathxml - Path-addressed XML access with a streaming dispatcher
//!
//! Strategies:
//! - In-memory: load a document into a [`Node`] tree and query it through a
//!   [`PathResolver`] (`a.b.c`, `a->b->c`, `ns:tag` segments)
//! - Streaming: walk a large document chunk by chunk and hand every element
//!   at a target path to a callback as its own small tree
//! - Parallel: evaluate many paths against one tree with rayon
//!
//! ```
//! use pathxml::{Error, Source, StreamingDispatcher};
//!
//! let xml = "<root><item><a>1</a></item><item><a>2</a></item></root>";
//! let mut sum = 0;
//! let count = StreamingDispatcher::new("root.item")
//!     .stream(Source::Str(xml), |item| {
//!         sum += item.int("a")?;
//!         Ok::<(), Error>(())
//!     })
//!     .unwrap();
//! assert_eq!((count, sum), (2, 3));
//! ```

pub mod core;
pub mod dom;
pub mod error;
pub mod path;
pub mod reader;
pub mod strategy;

pub use dom::{Document, Namespace, Node, XmlAttribute};
pub use error::{Error, Result};
pub use path::{Base, Lookup, OnMissing, PathExpression, PathResolver, ResolverSettings, Segment};
pub use reader::Source;
pub use strategy::{PathStack, PathStreamer, StreamingDispatcher};

use std::path::Path;

/// Parse inline markup into a document
pub fn parse_str(markup: &str) -> Result<Document> {
    Document::parse_str(markup)
}

/// Read and parse a file into a document
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    Document::parse_file(path)
}

/// Stream `source`, calling `on_match` for each element at `target_path`.
/// Returns the number of matches delivered.
pub fn stream<F, E>(source: Source<'_>, target_path: &str, on_match: F) -> std::result::Result<usize, E>
where
    F: FnMut(&PathResolver<'_>) -> std::result::Result<(), E>,
    E: From<Error>,
{
    strategy::stream(source, target_path, on_match)
}
