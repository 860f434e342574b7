//! Path resolution against parsed documents and hand-built trees.

#![allow(clippy::unwrap_used)]

use pathxml::{Base, Document, Error, Lookup, Node, OnMissing, PathResolver, ResolverSettings};

const CATALOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns:p="urn:pricing" updated="2024-01-02 03:04:05">
    <book id="bk1">
        <title>First</title>
        <p:price currency="EUR">3,14</p:price>
        <stock>12</stock>
        <available>TRUE</available>
    </book>
    <book id="bk2">
        <title>Second</title>
        <stock>abc</stock>
    </book>
</catalog>"#;

fn catalog() -> Document {
    Document::parse_str(CATALOG).unwrap()
}

#[test]
fn resolving_a_path_equals_walking_each_segment() {
    let doc = catalog();
    let r = doc.resolver();

    let book = r.resolve("book").unwrap();
    let title = r.resolve_from(book, "title").unwrap();
    assert!(std::ptr::eq(r.resolve("book.title").unwrap(), title));
    assert_eq!(title.value(), "First");
}

#[test]
fn empty_and_dot_paths_return_the_base() {
    let doc = catalog();
    let r = doc.resolver();
    assert!(std::ptr::eq(r.resolve("").unwrap(), doc.root()));
    assert!(std::ptr::eq(r.resolve(".").unwrap(), doc.root()));
}

#[test]
fn namespaced_segments_work_with_dots_and_arrows() {
    let doc = catalog();
    let r = doc.resolver();
    let dotted = r.resolve("book.p:price").unwrap();
    let arrowed = r.resolve("book->p:price").unwrap();
    assert!(std::ptr::eq(dotted, arrowed));
    assert_eq!(dotted.attribute("currency"), Some("EUR"));
}

#[test]
fn strict_miss_names_the_full_path() {
    let tree = Node::new("root").with_child(Node::new("a").with_child(Node::new("x")));
    let r = PathResolver::new(&tree);

    let err = r.resolve("a.b.c").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.path(), Some("a.b.c"));
    assert_eq!(err.node_xml(), Some("<a><x/></a>"));
}

#[test]
fn default_miss_returns_the_default() {
    let doc = catalog();
    let r = doc.resolver();
    let value = r
        .node_value_int("book.missing", None, OnMissing::UseDefault(42))
        .unwrap();
    assert_eq!(value, Lookup::Default(42));
    assert_eq!(value.into_inner(), 42);
}

#[test]
#[allow(clippy::approx_constant)]
fn float_uses_the_decimal_separator() {
    let doc = catalog();
    let r = PathResolver::with_settings(doc.root(), ResolverSettings::new().decimal_separator(','));
    let price = r.float("book.p:price").unwrap();
    assert!((price - 3.14_f64).abs() < f64::EPSILON);

    let strict = doc.resolver();
    assert!(matches!(
        strict.float("book.p:price"),
        Err(Error::InvalidValue { target: "float", .. })
    ));
    let overridden = strict
        .node_value_float("book.p:price", None, OnMissing::<()>::Fail, Some(','))
        .unwrap();
    assert_eq!(overridden.found(), Some(price));
}

#[test]
fn sentinel_default_is_not_coerced() {
    let doc = catalog();
    let r = doc.resolver();

    let value = r
        .node_value_timestamp("book.published", None, OnMissing::UseDefault("never"))
        .unwrap();
    assert_eq!(value, Lookup::Default("never"));

    let flag = r
        .node_value_bool("book.gone", None, OnMissing::UseDefault("maybe"))
        .unwrap();
    assert_eq!(flag.into_default(), Some("maybe"));
}

#[test]
fn typed_getters() {
    let doc = catalog();
    let r = doc.resolver();
    assert_eq!(r.int("book.stock").unwrap(), 12);
    assert!(r.bool("book.available").unwrap());
    assert!(!r.bool("book.title").unwrap());

    let second = r.children("book", Base::Context).unwrap()[1];
    let stock = r.node_value_int("stock", Some(second), OnMissing::<()>::Fail);
    assert!(matches!(stock, Err(Error::InvalidValue { ref value, .. }) if value == "abc"));
}

#[test]
fn timestamps_from_attributes_and_text() {
    let doc = catalog();
    let r = doc.resolver();
    let updated = r.attribute("updated").unwrap();
    assert_eq!(pathxml::path::coerce::to_timestamp(updated), Some(1_704_164_645));

    let tree = Node::new("event").with_child(Node::new("at").with_text("2024-01-02T03:04:05Z"));
    let r = PathResolver::new(&tree);
    assert_eq!(r.timestamp("at").unwrap(), 1_704_164_645);
    assert_eq!(r.date_time("at").unwrap().timestamp(), 1_704_164_645);
}

#[test]
fn attributes_and_children() {
    let doc = catalog();
    let r = doc.resolver();

    let ids: Vec<_> = r
        .children("book", Base::Context)
        .unwrap()
        .into_iter()
        .filter_map(|b| b.attribute("id"))
        .collect();
    assert_eq!(ids, vec!["bk1", "bk2"]);

    assert_eq!(r.attributes("book.p:price").unwrap(), vec![("currency", "EUR")]);
    let err = r
        .attribute_value("isbn", "book", OnMissing::<()>::Fail)
        .unwrap_err();
    assert!(matches!(err, Error::AttributeNotFound { .. }));
    assert!(err.node_xml().unwrap().starts_with("<book id=\"bk1\">"));

    let matched = r.children_matching("^(title|stock)$", "book").unwrap();
    assert_eq!(matched.len(), 2);
}

#[test]
fn child_resolver_scopes_lookups() {
    let doc = catalog();
    let r = doc.resolver();
    let book = r.child_resolver("book").unwrap();
    assert_eq!(book.value("title").unwrap(), "First");
    assert_eq!(book.attribute("id").unwrap(), "bk1");
    assert!(book.child_resolver("nope").is_err());
}

#[test]
fn loading_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.xml");
    std::fs::write(&path, CATALOG).unwrap();

    let doc = pathxml::parse_file(&path).unwrap();
    assert_eq!(doc.resolver().value("book.title").unwrap(), "First");

    let missing = dir.path().join("missing.xml");
    let err = pathxml::parse_file(&missing).unwrap_err();
    assert!(err.is_parse_failure());
    assert_eq!(err.source_name(), Some(missing.display().to_string().as_str()));
}

#[test]
fn malformed_inline_markup() {
    let err = pathxml::parse_str("<a><b></a>").unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
    assert_eq!(err.source_name(), Some(""));
    assert_eq!(err.content(), Some("<a><b></a>"));
}
