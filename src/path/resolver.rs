//! Path resolution over a Node tree
//!
//! A [`PathResolver`] walks a [`PathExpression`] one segment at a time from
//! a base node, descending into the first child (in document order) that
//! matches each segment. Every lookup chooses its miss policy through
//! [`OnMissing`]: fail with a [`Error::NodeNotFound`] that names the full
//! path, or return a caller-supplied default for the whole expression.
//!
//! ```
//! use pathxml::{Document, OnMissing};
//!
//! let doc = Document::parse_str("<feed><entry><count> 7 </count></entry></feed>").unwrap();
//! let resolver = doc.resolver();
//!
//! assert_eq!(resolver.int("entry.count").unwrap(), 7);
//! let missing = resolver
//!     .node_value_int("entry->missing", None, OnMissing::UseDefault(-1))
//!     .unwrap();
//! assert_eq!(missing.into_default(), Some(-1));
//! ```

use super::cache::PathCache;
use super::coerce;
use super::expression::{PathExpression, Segment};
use crate::dom::node::Node;
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::convert::Infallible;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Settings shared by a resolver and every resolver derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Decimal mark used by float coercion
    pub decimal_separator: char,
    /// Number of parsed paths kept; 0 disables the cache
    pub path_cache_capacity: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        ResolverSettings {
            decimal_separator: '.',
            path_cache_capacity: 128,
        }
    }
}

impl ResolverSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    pub fn path_cache_capacity(mut self, capacity: usize) -> Self {
        self.path_cache_capacity = capacity;
        self
    }

    pub(crate) fn build_cache(&self) -> Option<Arc<PathCache>> {
        NonZeroUsize::new(self.path_cache_capacity).map(|cap| Arc::new(PathCache::new(cap)))
    }
}

/// What a lookup does when the path or attribute is absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnMissing<D> {
    /// Raise a not-found error
    Fail,
    /// Return this value, uncoerced
    UseDefault(D),
}

/// Outcome of a lookup that may have fallen back to a default
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T, D> {
    Found(T),
    Default(D),
}

impl<T, D> Lookup<T, D> {
    pub fn is_default(&self) -> bool {
        matches!(self, Lookup::Default(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Default(_) => None,
        }
    }

    pub fn into_default(self) -> Option<D> {
        match self {
            Lookup::Found(_) => None,
            Lookup::Default(default) => Some(default),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U, D> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::Default(default) => Lookup::Default(default),
        }
    }

    /// Apply a fallible conversion to a found value; defaults pass through
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> std::result::Result<U, E>) -> std::result::Result<Lookup<U, D>, E> {
        match self {
            Lookup::Found(value) => f(value).map(Lookup::Found),
            Lookup::Default(default) => Ok(Lookup::Default(default)),
        }
    }
}

impl<T> Lookup<T, T> {
    pub fn into_inner(self) -> T {
        match self {
            Lookup::Found(value) | Lookup::Default(value) => value,
        }
    }
}

impl<T> Lookup<T, Infallible> {
    /// Unwrap a lookup made with [`OnMissing::Fail`]
    pub fn into_found(self) -> T {
        match self {
            Lookup::Found(value) => value,
            Lookup::Default(never) => match never {},
        }
    }
}

/// Base node of an operation: the resolver's context, a node, or a path
/// resolved from the context
#[derive(Debug, Clone, Copy)]
pub enum Base<'a, 'p> {
    Context,
    Node(&'a Node),
    Path(&'p str),
}

impl<'a, 'p> From<&'a Node> for Base<'a, 'p> {
    fn from(node: &'a Node) -> Self {
        Base::Node(node)
    }
}

impl<'a, 'p> From<&'p str> for Base<'a, 'p> {
    fn from(path: &'p str) -> Self {
        Base::Path(path)
    }
}

/// Path-addressed access to a node tree
#[derive(Debug, Clone)]
pub struct PathResolver<'a> {
    context: &'a Node,
    settings: ResolverSettings,
    cache: Option<Arc<PathCache>>,
}

impl<'a> PathResolver<'a> {
    pub fn new(context: &'a Node) -> Self {
        Self::with_settings(context, ResolverSettings::default())
    }

    pub fn with_settings(context: &'a Node, settings: ResolverSettings) -> Self {
        let cache = settings.build_cache();
        PathResolver {
            context,
            settings,
            cache,
        }
    }

    /// Resolver sharing an existing path cache
    pub(crate) fn with_cache(
        context: &'a Node,
        settings: ResolverSettings,
        cache: Option<Arc<PathCache>>,
    ) -> Self {
        PathResolver {
            context,
            settings,
            cache,
        }
    }

    /// The context node
    pub fn root(&self) -> &'a Node {
        self.context
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn decimal_separator(&self) -> char {
        self.settings.decimal_separator
    }

    pub fn set_decimal_separator(&mut self, separator: char) {
        self.settings.decimal_separator = separator;
    }

    /// A resolver scoped to another node, with the same settings and cache
    pub fn child_resolver<'p>(&self, base: impl Into<Base<'a, 'p>>) -> Result<PathResolver<'a>> {
        let context = self.base_node(base.into())?;
        Ok(PathResolver {
            context,
            settings: self.settings.clone(),
            cache: self.cache.clone(),
        })
    }

    fn expression(&self, path: &str) -> Arc<PathExpression> {
        match &self.cache {
            Some(cache) => cache.get_or_parse(path),
            None => Arc::new(PathExpression::parse(path)),
        }
    }

    fn base_node(&self, base: Base<'a, '_>) -> Result<&'a Node> {
        match base {
            Base::Context => Ok(self.context),
            Base::Node(node) => Ok(node),
            Base::Path(path) => self.resolve(path),
        }
    }

    /// Resolve `path` from `base` (or the context node), applying the
    /// miss policy
    pub fn lookup<D>(
        &self,
        path: &str,
        base: Option<&'a Node>,
        on_missing: OnMissing<D>,
    ) -> Result<Lookup<&'a Node, D>> {
        let start = base.unwrap_or(self.context);
        let expr = self.expression(path);

        match walk(start, &expr) {
            Ok(node) => Ok(Lookup::Found(node)),
            Err(failed_at) => {
                log::trace!("path {:?} not found below <{}>", path, failed_at.name());
                match on_missing {
                    OnMissing::UseDefault(default) => Ok(Lookup::Default(default)),
                    OnMissing::Fail => Err(Error::NodeNotFound {
                        path: path.to_string(),
                        node_xml: failed_at.to_xml(),
                    }),
                }
            }
        }
    }

    /// Resolve `path` from the context node
    pub fn resolve(&self, path: &str) -> Result<&'a Node> {
        self.lookup::<Infallible>(path, None, OnMissing::Fail)
            .map(Lookup::into_found)
    }

    /// Resolve `path` from `base`
    pub fn resolve_from(&self, base: &'a Node, path: &str) -> Result<&'a Node> {
        self.lookup::<Infallible>(path, Some(base), OnMissing::Fail)
            .map(Lookup::into_found)
    }

    /// Resolve `path` from the context node, `None` on a miss
    pub fn find(&self, path: &str) -> Option<&'a Node> {
        walk(self.context, &self.expression(path)).ok()
    }

    /// Direct children matching `tag` (plain or `prefix:local`), in
    /// document order
    pub fn children<'p>(&self, tag: &str, base: impl Into<Base<'a, 'p>>) -> Result<Vec<&'a Node>> {
        let parent = self.base_node(base.into())?;
        let segment = Segment::parse(tag);
        Ok(parent
            .children()
            .iter()
            .filter(|child| segment_matches(parent, child, &segment))
            .collect())
    }

    /// Direct children whose qualified name matches the regular
    /// expression `pattern`
    pub fn children_matching<'p>(
        &self,
        pattern: &str,
        base: impl Into<Base<'a, 'p>>,
    ) -> Result<Vec<&'a Node>> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let parent = self.base_node(base.into())?;
        Ok(parent
            .children()
            .iter()
            .filter(|child| regex.is_match(child.name()))
            .collect())
    }

    /// All attributes of a node as (name, value) pairs in document order
    pub fn attributes<'p>(&self, base: impl Into<Base<'a, 'p>>) -> Result<Vec<(&'a str, &'a str)>> {
        let node = self.base_node(base.into())?;
        Ok(node
            .attributes()
            .iter()
            .map(|a| (a.name(), a.value()))
            .collect())
    }

    /// Value of the attribute `name` on a node, applying the miss policy
    pub fn attribute_value<'p, D>(
        &self,
        name: &str,
        base: impl Into<Base<'a, 'p>>,
        on_missing: OnMissing<D>,
    ) -> Result<Lookup<&'a str, D>> {
        let node = self.base_node(base.into())?;
        match (node.attribute(name), on_missing) {
            (Some(value), _) => Ok(Lookup::Found(value)),
            (None, OnMissing::UseDefault(default)) => Ok(Lookup::Default(default)),
            (None, OnMissing::Fail) => {
                log::trace!("attribute {:?} not found on <{}>", name, node.name());
                Err(Error::AttributeNotFound {
                    name: name.to_string(),
                    node_xml: node.to_xml(),
                })
            }
        }
    }

    /// Value of the attribute `name` on the context node
    pub fn attribute(&self, name: &str) -> Result<&'a str> {
        self.attribute_value::<Infallible>(name, Base::Context, OnMissing::Fail)
            .map(Lookup::into_found)
    }

    /// Text of the node at `path`, empty if it has none
    pub fn node_value<D>(
        &self,
        path: &str,
        base: Option<&'a Node>,
        on_missing: OnMissing<D>,
    ) -> Result<Lookup<&'a str, D>> {
        Ok(self.lookup(path, base, on_missing)?.map(Node::value))
    }

    pub fn node_value_int<D>(
        &self,
        path: &str,
        base: Option<&'a Node>,
        on_missing: OnMissing<D>,
    ) -> Result<Lookup<i64, D>> {
        self.node_value(path, base, on_missing)?
            .try_map(|value| coerce::to_int(value).ok_or_else(|| invalid(path, value, "integer")))
    }

    /// Float value; `separator` overrides the resolver's decimal separator
    pub fn node_value_float<D>(
        &self,
        path: &str,
        base: Option<&'a Node>,
        on_missing: OnMissing<D>,
        separator: Option<char>,
    ) -> Result<Lookup<f64, D>> {
        let separator = separator.unwrap_or(self.settings.decimal_separator);
        self.node_value(path, base, on_missing)?.try_map(|value| {
            coerce::to_float(value, separator).ok_or_else(|| invalid(path, value, "float"))
        })
    }

    pub fn node_value_bool<D>(
        &self,
        path: &str,
        base: Option<&'a Node>,
        on_missing: OnMissing<D>,
    ) -> Result<Lookup<bool, D>> {
        Ok(self.node_value(path, base, on_missing)?.map(coerce::to_bool))
    }

    /// Unix timestamp parsed from the node text
    pub fn node_value_timestamp<D>(
        &self,
        path: &str,
        base: Option<&'a Node>,
        on_missing: OnMissing<D>,
    ) -> Result<Lookup<i64, D>> {
        self.node_value(path, base, on_missing)?.try_map(|value| {
            coerce::to_timestamp(value).ok_or_else(|| invalid(path, value, "timestamp"))
        })
    }

    pub fn node_value_date_time<D>(
        &self,
        path: &str,
        base: Option<&'a Node>,
        on_missing: OnMissing<D>,
    ) -> Result<Lookup<DateTime<FixedOffset>, D>> {
        self.node_value(path, base, on_missing)?.try_map(|value| {
            coerce::parse_date_time(value).ok_or_else(|| invalid(path, value, "date-time"))
        })
    }

    /// Text of the node at `path`
    pub fn value(&self, path: &str) -> Result<&'a str> {
        self.node_value::<Infallible>(path, None, OnMissing::Fail)
            .map(Lookup::into_found)
    }

    pub fn int(&self, path: &str) -> Result<i64> {
        self.node_value_int::<Infallible>(path, None, OnMissing::Fail)
            .map(Lookup::into_found)
    }

    pub fn float(&self, path: &str) -> Result<f64> {
        self.node_value_float::<Infallible>(path, None, OnMissing::Fail, None)
            .map(Lookup::into_found)
    }

    pub fn bool(&self, path: &str) -> Result<bool> {
        self.node_value_bool::<Infallible>(path, None, OnMissing::Fail)
            .map(Lookup::into_found)
    }

    pub fn timestamp(&self, path: &str) -> Result<i64> {
        self.node_value_timestamp::<Infallible>(path, None, OnMissing::Fail)
            .map(Lookup::into_found)
    }

    pub fn date_time(&self, path: &str) -> Result<DateTime<FixedOffset>> {
        self.node_value_date_time::<Infallible>(path, None, OnMissing::Fail)
            .map(Lookup::into_found)
    }
}

/// Walk `expr` from `start`; on a miss, the node whose children lacked
/// the next segment
fn walk<'a>(start: &'a Node, expr: &PathExpression) -> std::result::Result<&'a Node, &'a Node> {
    expr.segments().iter().try_fold(start, |current, segment| {
        current
            .children()
            .iter()
            .find(|child| segment_matches(current, child, segment))
            .ok_or(current)
    })
}

/// A plain segment matches the qualified name as written. A qualified
/// segment matches by namespace URI when `parent` has the prefix in scope,
/// otherwise by literal prefix.
fn segment_matches(parent: &Node, child: &Node, segment: &Segment) -> bool {
    match segment {
        Segment::Tag(name) => child.name() == name,
        Segment::Qualified { prefix, local } => {
            if child.local_name() != local {
                return false;
            }
            match parent.lookup_namespace(Some(prefix)) {
                Some(uri) => child.namespace() == Some(uri),
                None => child.prefix() == Some(prefix.as_str()),
            }
        }
    }
}

fn invalid(path: &str, value: &str, target: &'static str) -> Error {
    Error::InvalidValue {
        path: path.to_string(),
        value: value.to_string(),
        target,
    }
}
