//! Parallel path evaluation
//!
//! Uses Rayon to evaluate many lookups against one immutable tree.

use crate::dom::node::Node;
use crate::error::Result;
use crate::path::resolver::{Base, PathResolver};
use rayon::prelude::*;

/// Resolve multiple paths in parallel; results keep the input order
pub fn resolve_parallel<'a>(resolver: &PathResolver<'a>, paths: &[&str]) -> Vec<Result<&'a Node>> {
    paths.par_iter().map(|path| resolver.resolve(path)).collect()
}

/// Resolve each `(key, path)` to its text value, failing on the first miss
pub fn values_parallel(
    resolver: &PathResolver<'_>,
    queries: &[(&str, &str)],
) -> Result<Vec<(String, String)>> {
    queries
        .par_iter()
        .map(|(key, path)| resolver.value(path).map(|v| (key.to_string(), v.to_string())))
        .collect()
}

/// Find children named `tag` and map each one in parallel
pub fn children_map<'a, 'p, F, T>(
    resolver: &PathResolver<'a>,
    tag: &str,
    base: impl Into<Base<'a, 'p>>,
    mapper: F,
) -> Result<Vec<T>>
where
    F: Fn(&'a Node) -> T + Sync + Send,
    T: Send,
{
    let children = resolver.children(tag, base)?;
    Ok(children.into_par_iter().map(mapper).collect())
}
