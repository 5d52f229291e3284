use criterion::{criterion_group, criterion_main, Criterion};
use search_core::tokenizer::{AnalyzingTokenizer, Tokenizer, WhitespaceTokenizer};
use search_core::{RadixTree, RankingQueue};

const TEXT: &str = "Search engines build an inverted index from every document they ingest. \
    A radix tree compresses shared prefixes so suggestions stay cheap, and a binary heap \
    ranks candidate documents by score before the best few are returned to the caller.";

fn vocabulary() -> Vec<String> {
    (0..5_000).map(|i| format!("term{:05}{}", i, ["alpha", "beta", "gamma"][i % 3])).collect()
}

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_whitespace", |b| b.iter(|| WhitespaceTokenizer.tokenize(TEXT)));
    c.bench_function("tokenize_analyzed", |b| b.iter(|| AnalyzingTokenizer.tokenize(TEXT)));
}

fn bench_radix(c: &mut Criterion) {
    let words = vocabulary();
    c.bench_function("radix_build_5k", |b| b.iter(|| words.iter().collect::<RadixTree>()));
    let tree: RadixTree = words.iter().collect();
    c.bench_function("radix_autocomplete", |b| b.iter(|| tree.autocomplete("term01")));
}

fn bench_ranking(c: &mut Criterion) {
    c.bench_function("ranking_top10_of_10k", |b| {
        b.iter(|| {
            let mut q = RankingQueue::new();
            for i in 0..10_000u64 {
                q.insert(((i * 7919) % 10_007) as f64, i);
            }
            q.get_top(10)
        })
    });
}

criterion_group!(benches, bench_tokenize, bench_radix, bench_ranking);
criterion_main!(benches);
