//! Path expressions
//!
//! `a.b.c`, `a->b->c` and mixtures address nested elements. A segment with
//! exactly one colon is namespace-qualified (`x:item`). An empty path or a
//! single `.` addresses the starting node itself.

use std::fmt;

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches a child by its qualified name as written
    Tag(String),
    /// Matches a child in the namespace bound to `prefix`
    Qualified { prefix: String, local: String },
}

impl Segment {
    pub fn parse(token: &str) -> Self {
        let mut parts = token.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(local), None) => Segment::Qualified {
                prefix: prefix.to_string(),
                local: local.to_string(),
            },
            _ => Segment::Tag(token.to_string()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Tag(name) => f.write_str(name),
            Segment::Qualified { prefix, local } => write!(f, "{}:{}", prefix, local),
        }
    }
}

/// A parsed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    raw: String,
    segments: Vec<Segment>,
}

impl PathExpression {
    pub fn parse(path: &str) -> Self {
        let normalized = normalize(path);
        let segments = if normalized.is_empty() || normalized == "." {
            Vec::new()
        } else {
            normalized.split('.').map(Segment::parse).collect()
        };

        PathExpression {
            raw: path.to_string(),
            segments,
        }
    }

    /// The path as the caller wrote it
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True if the path addresses the starting node itself
    pub fn is_self(&self) -> bool {
        self.segments.is_empty()
    }

    /// Dot-joined form, as compared against a streaming path stack
    pub fn normalized(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<&str> for PathExpression {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// Rewrite `->` separators as `.`
pub fn normalize(path: &str) -> String {
    path.replace("->", ".")
}
