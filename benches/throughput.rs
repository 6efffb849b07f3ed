use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use fieldsync::{
    mutation::{Mutation, Operation},
    store::{QueueStore, memory::MemoryStore},
    types::{HttpMethod, MutationStatus},
};

fn mutation(id: u64, entity: u64) -> Mutation {
    Mutation {
        id,
        entity_id: format!("stop-{entity}"),
        operation: Operation::new(HttpMethod::Post, format!("/api/stops/{entity}/complete"), None),
        status: MutationStatus::Pending,
        attempts: 0,
        created_at_ms: id,
    }
}

fn bench_appends(c: &mut Criterion) {
    c.bench_function("store_append_50k", |b| {
        b.iter(|| {
            let mut store = MemoryStore::new();
            for i in 0..50_000u64 {
                store.append(&mutation(i + 1, i % 100)).expect("append");
            }
        });
    });
}

fn bench_entity_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity_listing");
    for size in [1_000u64, 10_000, 100_000] {
        let mut store = MemoryStore::new();
        for i in 0..size {
            store.append(&mutation(i + 1, i % 50)).expect("append");
        }
        group.bench_with_input(BenchmarkId::from_parameter(size), &store, |b, store| {
            b.iter(|| store.list_by_entity("stop-17").expect("list"));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_appends, bench_entity_listing);
criterion_main!(benches);
