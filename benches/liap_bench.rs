//! Benchmarks for the Liapunov search.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use liap_solver::game::{GameTree, Support};
use liap_solver::games::kuhn::KuhnPoker;
use liap_solver::liap::{find_equilibria, value, BehaviorProfile, LiapParams, NullStatus};

fn kuhn_liap_value_benchmark(c: &mut Criterion) {
    let tree = GameTree::from_game(&KuhnPoker::new()).unwrap();
    let profile = BehaviorProfile::centroid(&Support::full(&tree));

    c.bench_function("kuhn_liap_value", |b| {
        b.iter(|| value::liap_value(black_box(&tree), black_box(&profile)))
    });
}

fn kuhn_tree_expansion_benchmark(c: &mut Criterion) {
    c.bench_function("kuhn_tree_expansion", |b| {
        b.iter(|| GameTree::from_game(black_box(&KuhnPoker::new())).unwrap())
    });
}

fn kuhn_single_try_benchmark(c: &mut Criterion) {
    let tree = GameTree::from_game(&KuhnPoker::new()).unwrap();
    let start = BehaviorProfile::centroid(&Support::full(&tree));
    let params = LiapParams::default().with_tries(1).with_seed(42);

    c.bench_function("kuhn_single_try", |b| {
        b.iter(|| find_equilibria(&tree, black_box(&params), &start, &mut NullStatus).unwrap())
    });
}

criterion_group!(
    benches,
    kuhn_liap_value_benchmark,
    kuhn_tree_expansion_benchmark,
    kuhn_single_try_benchmark
);
criterion_main!(benches);
