//! DOM Module - owned XML element trees
//!
//! - Node: element with attributes, text and owned children
//! - Namespace resolution stack used while building trees
//! - Document loading from files, strings and readers
//! - Markup serialization for diagnostics

pub mod document;
pub mod namespace;
pub mod node;
pub mod serialize;

pub use document::Document;
pub use namespace::NamespaceResolver;
pub use node::{Namespace, Node, XmlAttribute};
