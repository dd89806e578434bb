use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pdf_assembly::{Document, Object, Rect, WriterConfig};

fn document_with_pages(count: usize) -> Document {
    let mut doc = Document::new();
    {
        let mut tree = doc.page_tree().expect("page tree");
        for _ in 0..count {
            tree.create_page(&Rect::letter()).expect("create page");
        }
    }
    doc.set_info("Title", Object::String(b"Benchmark".to_vec()));
    doc
}

fn bench_page_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_lookup");
    for pages in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(pages), &pages, |b, &pages| {
            let mut doc = document_with_pages(pages);
            b.iter(|| {
                // a fresh tree each round so the cache does not hide the walk
                let mut tree = doc.page_tree().expect("page tree");
                black_box(tree.get_page(pages - 1));
            });
        });
    }
    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    for pages in [10usize, 100] {
        group.bench_with_input(BenchmarkId::new("plain", pages), &pages, |b, &pages| {
            let mut doc = document_with_pages(pages);
            b.iter(|| black_box(doc.write_to_vec(WriterConfig::default()).expect("write")));
        });
        group.bench_with_input(BenchmarkId::new("xref_stream", pages), &pages, |b, &pages| {
            let mut doc = document_with_pages(pages);
            let config = WriterConfig::default().with_xref_stream(true);
            b.iter(|| black_box(doc.write_to_vec(config.clone()).expect("write")));
        });
        group.bench_with_input(BenchmarkId::new("linearized", pages), &pages, |b, &pages| {
            let mut doc = document_with_pages(pages);
            let config = WriterConfig::default().with_linearize(true);
            b.iter(|| black_box(doc.write_to_vec(config.clone()).expect("write")));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_page_lookup, bench_write);
criterion_main!(benches);
