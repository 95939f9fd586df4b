use criterion::{criterion_group, criterion_main, Criterion};
use sitedex_core::extract::{extract_full_text_terms, term_counts};

fn sample() -> String {
    let para = "Partitions are sharded by the first two hex digits of a key's SHA-256. \
                全文索引按照二元到二十元的子串切分，中文没有词间分隔符。\n";
    para.repeat(64)
}

fn bench_extract(c: &mut Criterion) {
    let text = sample();
    c.bench_function("extract_full_text_terms", |b| b.iter(|| extract_full_text_terms(&text)));
    c.bench_function("term_counts", |b| b.iter(|| term_counts(&text)));
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
