use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reelvault::payouts::{reference, Combination, PayoutClassifier, MAX_REELS, MIN_REELS};

fn bench_classify(c: &mut Criterion) {
    let classifier = match PayoutClassifier::shared() {
        Ok(classifier) => classifier,
        Err(e) => panic!("table generation failed: {}", e),
    };

    let mut group = c.benchmark_group("classify");
    for reel_count in MIN_REELS..=MAX_REELS {
        let combinations: Vec<Combination> = Combination::all(reel_count).collect();

        group.bench_with_input(
            BenchmarkId::new("fast_path_and_table", reel_count),
            &combinations,
            |b, combinations| {
                b.iter(|| {
                    for combination in combinations {
                        black_box(classifier.classify_combination(black_box(combination)));
                    }
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("reference", reel_count),
            &combinations,
            |b, combinations| {
                b.iter(|| {
                    for combination in combinations {
                        black_box(reference::classify(&black_box(combination).counts()));
                    }
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
