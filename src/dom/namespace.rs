//! Namespace Resolution
//!
//! Stack-based namespace resolver for XML namespace handling.

use super::node::Namespace;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Namespace binding (prefix -> URI)
#[derive(Debug, Clone)]
struct NsBinding {
    prefix: Option<String>,
    uri: String,
    depth: usize,
}

/// Stack-based namespace resolver
#[derive(Debug, Default)]
pub struct NamespaceResolver {
    /// Stack of namespace bindings
    bindings: Vec<NsBinding>,
    /// Current element depth
    depth: usize,
}

impl NamespaceResolver {
    /// Create a resolver with only the built-in `xml` and `xmlns` prefixes
    pub fn new() -> Self {
        NamespaceResolver {
            bindings: Vec::with_capacity(16),
            depth: 0,
        }
    }

    /// Create a resolver seeded with bindings inherited from enclosing
    /// elements that are not part of the parsed markup
    pub fn with_inherited(inherited: &[Namespace]) -> Self {
        let mut resolver = Self::new();
        for ns in inherited {
            resolver.declare(ns.prefix.as_deref(), &ns.uri);
        }
        resolver
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a namespace binding for the current scope.
    /// `None` is the default namespace; an empty URI undeclares it.
    pub fn declare(&mut self, prefix: Option<&str>, uri: &str) {
        // Don't allow redeclaring xml or xmlns
        if matches!(prefix, Some("xml") | Some("xmlns")) {
            return;
        }

        self.bindings.push(NsBinding {
            prefix: prefix.map(str::to_string),
            uri: uri.to_string(),
            depth: self.depth,
        });
    }

    /// Resolve a prefix (`None` for the default namespace) to a URI
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some("xml") => return Some(ns::XML),
            Some("xmlns") => return Some(ns::XMLNS),
            _ => {}
        }

        // Search from most recent to oldest
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix.as_deref() == prefix)
            .map(|b| b.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    /// Get current depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// All bindings visible at the current scope, one per prefix, in
    /// declaration order. Undeclared default namespaces are left out.
    pub fn in_scope(&self) -> Vec<Namespace> {
        let mut active: Vec<Namespace> = Vec::new();
        for binding in &self.bindings {
            active.retain(|ns| ns.prefix != binding.prefix);
            if !binding.uri.is_empty() {
                active.push(Namespace::new(binding.prefix.as_deref(), &binding.uri));
            }
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_prefixes() {
        let resolver = NamespaceResolver::new();
        assert_eq!(resolver.resolve(Some("xml")), Some(ns::XML));
        assert!(resolver.resolve(Some("svg")).is_none());
    }

    #[test]
    fn test_declare_and_resolve() {
        let mut resolver = NamespaceResolver::new();

        resolver.push_scope();
        resolver.declare(Some("svg"), "http://www.w3.org/2000/svg");
        resolver.declare(None, "urn:default");

        assert_eq!(resolver.resolve(Some("svg")), Some("http://www.w3.org/2000/svg"));
        assert_eq!(resolver.resolve(None), Some("urn:default"));
    }

    #[test]
    fn test_scope_pop() {
        let mut resolver = NamespaceResolver::new();

        resolver.push_scope();
        resolver.declare(Some("foo"), "http://example.com/foo");
        assert_eq!(resolver.resolve(Some("foo")), Some("http://example.com/foo"));

        resolver.pop_scope();
        assert_eq!(resolver.resolve(Some("foo")), None);
        assert_eq!(resolver.depth(), 0);
    }

    #[test]
    fn test_shadow_binding() {
        let mut resolver = NamespaceResolver::new();

        resolver.push_scope();
        resolver.declare(Some("ns"), "http://example.com/ns1");

        resolver.push_scope();
        resolver.declare(Some("ns"), "http://example.com/ns2");
        assert_eq!(resolver.resolve(Some("ns")), Some("http://example.com/ns2"));
        assert_eq!(resolver.in_scope().len(), 1);

        resolver.pop_scope();
        assert_eq!(resolver.resolve(Some("ns")), Some("http://example.com/ns1"));
    }

    #[test]
    fn test_undeclare_default() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare(None, "urn:a");
        resolver.push_scope();
        resolver.declare(None, "");
        assert_eq!(resolver.resolve(None), None);
        assert!(resolver.in_scope().is_empty());
    }

    #[test]
    fn test_deep_nesting() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare(Some("outer"), "urn:outer");
        for _ in 0..70_000 {
            resolver.push_scope();
        }
        resolver.declare(Some("inner"), "urn:inner");
        assert_eq!(resolver.depth(), 70_001);

        resolver.pop_scope();
        assert_eq!(resolver.resolve(Some("inner")), None);
        assert_eq!(resolver.resolve(Some("outer")), Some("urn:outer"));
    }

    #[test]
    fn test_inherited_bindings() {
        let resolver = NamespaceResolver::with_inherited(&[Namespace::new(Some("x"), "urn:x")]);
        assert_eq!(resolver.resolve(Some("x")), Some("urn:x"));
    }
}
