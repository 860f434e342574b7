//! Error types
//!
//! Every failure is a structured value: callers can branch on the kind and
//! inspect the offending path, attribute or source together with a markup
//! snapshot of the node involved.

use std::io;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by path resolution, loading and streaming
#[derive(Error, Debug)]
pub enum Error {
    /// A path segment had no matching child
    #[error("XML node {path} not found")]
    NodeNotFound {
        /// The full path as requested by the caller
        path: String,
        /// Markup of the node at which the walk failed
        node_xml: String,
    },

    /// A node has no attribute with the requested name
    #[error("XML attribute {name} not found")]
    AttributeNotFound {
        /// The requested attribute name
        name: String,
        /// Markup of the node that was inspected
        node_xml: String,
    },

    /// Markup (a full source or a streamed fragment) could not be parsed
    #[error("Could not parse \"{source_name}\": {message}")]
    Parse {
        /// File name, or empty for inline strings and fragments
        source_name: String,
        /// The raw content that failed to parse
        content: String,
        /// What went wrong
        message: String,
    },

    /// The underlying source could not be opened or read
    #[error("Could not read \"{source_name}\": {source}")]
    Io {
        source_name: String,
        #[source]
        source: io::Error,
    },

    /// A resolved value could not be coerced to the requested type
    #[error("Value {value:?} at {path} is not a valid {target}")]
    InvalidValue {
        path: String,
        value: String,
        target: &'static str,
    },

    /// A tag name pattern failed to compile
    #[error("Invalid tag name pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl Error {
    pub(crate) fn parse(
        source_name: impl Into<String>,
        content: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Parse {
            source_name: source_name.into(),
            content: content.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(source_name: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            source_name: source_name.into(),
            source,
        }
    }

    /// True for both parse failures and unreadable sources, which stem
    /// from unusable input alike
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Error::Parse { .. } | Error::Io { .. })
    }

    /// True if a node or attribute lookup missed
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NodeNotFound { .. } | Error::AttributeNotFound { .. })
    }

    /// The requested path, for errors that carry one
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::NodeNotFound { path, .. } | Error::InvalidValue { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Markup snapshot of the node involved in a failed lookup
    pub fn node_xml(&self) -> Option<&str> {
        match self {
            Error::NodeNotFound { node_xml, .. } | Error::AttributeNotFound { node_xml, .. } => {
                Some(node_xml)
            }
            _ => None,
        }
    }

    /// File name of the source involved, empty for inline content
    pub fn source_name(&self) -> Option<&str> {
        match self {
            Error::Parse { source_name, .. } | Error::Io { source_name, .. } => Some(source_name),
            _ => None,
        }
    }

    /// Raw content that failed to parse
    pub fn content(&self) -> Option<&str> {
        match self {
            Error::Parse { content, .. } => Some(content),
            _ => None,
        }
    }
}
