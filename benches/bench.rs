// Criterion benchmarks for placerank

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use placerank::core::{bucket_of, rate_all, replay, MatchResolver, ResolverSettings, Submission};
use placerank::models::{Bucket, Category, Comparison, Outcome, Review};
use placerank::services::{LogNotifier, MemoryStore, RankingStore};
use std::sync::Arc;

fn create_list(n: usize) -> Vec<Review> {
    (0..n)
        .map(|i| {
            let category = match i * 3 / n.max(1) {
                0 => Category::Liked,
                1 => Category::Neutral,
                _ => Category::Disliked,
            };
            let mut review = Review::new("bench_user", format!("place_{}", i), category, None);
            review.rank_position = i;
            review
        })
        .collect()
}

/// Midpoint walk that always answers `win`, the longest path through a bucket
fn winning_comparisons(frame: &[Review], bucket: Bucket) -> Vec<Comparison> {
    let mut comparisons = Vec::new();
    let (mut low, high) = (bucket.low, bucket.high);
    while low <= high {
        let mid = (low + high).div_euclid(2);
        comparisons.push(Comparison::new("new_place", frame[mid as usize].place_id.clone(), Outcome::Win));
        low = mid + 1;
    }
    comparisons
}

fn bench_bucket_of(c: &mut Criterion) {
    let list = create_list(1000);
    c.bench_function("bucket_of_1000", |b| {
        b.iter(|| bucket_of(black_box(&list), black_box(Category::Neutral)));
    });
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");

    for size in [10, 100, 1000, 10000].iter() {
        let list = create_list(*size);
        let bucket = bucket_of(&list, Category::Liked);
        let comparisons = winning_comparisons(&list, bucket);

        group.bench_with_input(BenchmarkId::new("binary_insertion", size), size, |b, _| {
            b.iter(|| {
                replay(
                    black_box(&list),
                    black_box("new_place"),
                    black_box(bucket),
                    black_box(&comparisons),
                )
            });
        });
    }

    group.finish();
}

fn bench_rate_all(c: &mut Criterion) {
    let list = create_list(1000);
    c.bench_function("rate_all_1000", |b| {
        b.iter(|| rate_all(black_box(&list)));
    });
}

fn bench_resolve_memory(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let places: Vec<String> = (0..200).map(|i| format!("place_{}", i)).collect();

    c.bench_function("resolve_memory_store_200", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let store = Arc::new(MemoryStore::with_catalog(["bench_user"], places.clone()));
                let resolver = MatchResolver::new(
                    store.clone(),
                    store.clone(),
                    Arc::new(LogNotifier),
                    ResolverSettings::default(),
                );

                for place in &places {
                    let ordered = store.get_ordered_reviews("bench_user").await.expect("ordered");
                    let bucket = bucket_of(&ordered, Category::Liked);
                    let comparisons: Vec<Comparison> = winning_comparisons(&ordered, bucket)
                        .into_iter()
                        .map(|c| Comparison::new(place.clone(), c.opponent_place_id, c.outcome))
                        .collect();

                    let submission = Submission {
                        user_id: "bench_user".to_string(),
                        place_id: place.clone(),
                        category: Category::Liked,
                        comparisons,
                        note: None,
                    };
                    black_box(resolver.resolve(&submission).await.expect("resolve"));
                }
            })
        });
    });
}

criterion_group!(
    benches,
    bench_bucket_of,
    bench_replay,
    bench_rate_all,
    bench_resolve_memory
);

criterion_main!(benches);
