//! LRU cache of parsed path expressions
//!
//! Resolvers derived from one another, and all fragment resolvers of one
//! stream, share a cache so each distinct path string is parsed once.

use super::expression::PathExpression;
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

pub struct PathCache {
    entries: Mutex<LruCache<String, Arc<PathExpression>>>,
}

impl PathCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        PathCache {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the parsed form of `path`, parsing and caching it on a miss
    pub fn get_or_parse(&self, path: &str) -> Arc<PathExpression> {
        let Ok(mut entries) = self.entries.lock() else {
            // A panic elsewhere poisoned the lock; parsing is still correct
            return Arc::new(PathExpression::parse(path));
        };

        if let Some(expr) = entries.get(path) {
            return Arc::clone(expr);
        }

        let expr = Arc::new(PathExpression::parse(path));
        entries.put(path.to_string(), Arc::clone(&expr));
        expr
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl fmt::Debug for PathCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathCache").field("len", &self.len()).finish()
    }
}
