#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pathxml::strategy::parallel::values_parallel;
use pathxml::{Base, Document, Error, OnMissing, Source, StreamingDispatcher};
use std::fmt::Write;

/// A catalog of `count` books with nested and namespaced children.
fn make_catalog(count: usize) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\"?>\n<catalog xmlns:p=\"urn:pricing\">\n",
    );
    for i in 0..count {
        let _ = writeln!(
            xml,
            "  <book id=\"bk{i}\"><title>Title {i}</title>\
             <meta><published>2024-01-{:02}</published><pages>{}</pages></meta>\
             <p:price>{}.99</p:price></book>",
            i % 28 + 1,
            100 + i,
            10 + i % 50
        );
    }
    xml.push_str("</catalog>\n");
    xml
}

fn bench_parse(c: &mut Criterion) {
    let xml = make_catalog(1000);
    c.bench_function("parse_catalog_1000", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)).expect("parse"))
    });
}

fn bench_resolve(c: &mut Criterion) {
    let xml = make_catalog(1000);
    let doc = Document::parse_str(&xml).expect("parse");
    let resolver = doc.resolver();

    c.bench_function("resolve_first_match", |b| {
        b.iter(|| resolver.int(black_box("book.meta.pages")).expect("pages"))
    });

    c.bench_function("resolve_every_book", |b| {
        b.iter(|| {
            let books = resolver.children("book", Base::Context).expect("books");
            books
                .into_iter()
                .map(|book| {
                    resolver
                        .node_value_float("p:price", Some(book), OnMissing::UseDefault(0.0), None)
                        .expect("price")
                        .into_inner()
                })
                .sum::<f64>()
        })
    });

    c.bench_function("resolve_miss_with_default", |b| {
        b.iter(|| {
            resolver
                .lookup(black_box("book.meta.missing"), None, OnMissing::UseDefault(()))
                .expect("lookup")
                .is_default()
        })
    });

    let queries = [
        ("title", "book.title"),
        ("published", "book.meta.published"),
        ("pages", "book.meta.pages"),
        ("price", "book.p:price"),
    ];
    c.bench_function("values_parallel", |b| {
        b.iter(|| values_parallel(&resolver, black_box(&queries)).expect("values"))
    });
}

fn bench_stream(c: &mut Criterion) {
    let xml = make_catalog(1000);
    let dispatcher = StreamingDispatcher::new("catalog.book");

    c.bench_function("stream_catalog_1000", |b| {
        b.iter(|| {
            let mut pages = 0;
            dispatcher
                .stream(Source::Str(black_box(&xml)), |book| {
                    pages += book.int("meta.pages")?;
                    Ok::<(), Error>(())
                })
                .expect("stream");
            pages
        })
    });

    let small_chunks = StreamingDispatcher::new("catalog.book").with_chunk_size(256);
    c.bench_function("stream_catalog_1000_small_chunks", |b| {
        b.iter(|| {
            small_chunks
                .stream(Source::Str(black_box(&xml)), |_| Ok::<(), Error>(()))
                .expect("stream")
        })
    });
}

criterion_group!(benches, bench_parse, bench_resolve, bench_stream);
criterion_main!(benches);
