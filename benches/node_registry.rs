//! Benchmark for the node registry
//!
//! Covers the decoder's hot path (partial upserts) and the lookups a UI
//! performs after each change notification.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mesh_node_registry::registry::{NodeRegistry, SharedNodeRegistry};
use mesh_node_registry::{NodeEvent, NodeIdentity, NodeNum, NodePosition, NodeRecord};

fn populated(count: u32) -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    for i in 0..count {
        registry.upsert_full(
            NodeRecord::new(i)
                .with_identity(NodeIdentity::with_id(format!("!{:08x}", i)))
                .with_position(NodePosition::from_degrees(45.0, 7.0)),
        );
    }
    registry
}

fn bench_upsert_full(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_registry");
    group.throughput(Throughput::Elements(1));

    group.bench_function("upsert_full_new_node", |b| {
        let mut registry = NodeRegistry::new();
        let mut counter = 0u32;

        b.iter(|| {
            counter = counter.wrapping_add(1);
            registry.upsert_full(black_box(NodeRecord::new(counter)));
        });
    });

    group.finish();
}

fn bench_partial_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_registry");
    group.throughput(Throughput::Elements(1));

    let mut registry = populated(1000);
    registry.subscribe(|event: &NodeEvent| {
        black_box(event);
    });

    group.bench_function("upsert_position_existing", |b| {
        let mut counter = 0u32;
        b.iter(|| {
            counter += 1;
            let number = NodeNum::new(counter % 1000);
            let _ = registry.upsert_position(
                black_box(number),
                NodePosition::from_degrees(45.0, 7.0).with_time(counter),
            );
        });
    });

    group.bench_function("upsert_identity_existing", |b| {
        let mut counter = 0u32;
        b.iter(|| {
            counter += 1;
            let number = NodeNum::new(counter % 1000);
            let _ = registry.upsert_identity(black_box(number), NodeIdentity::with_id("!bench"));
        });
    });

    group.finish();
}

fn bench_identity_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_registry");
    group.throughput(Throughput::Elements(1));

    let registry = populated(1000);

    group.bench_function("number_for_identity_id_scan", |b| {
        b.iter(|| registry.number_for_identity_id(black_box("!000003e7")));
    });

    group.bench_function("identity_id_for_number", |b| {
        b.iter(|| registry.identity_id_for_number(black_box(NodeNum::new(999))));
    });

    group.finish();
}

fn bench_concurrent_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_registry");
    group.throughput(Throughput::Elements(100));

    let shared = SharedNodeRegistry::new(populated(1000));
    let rt = tokio::runtime::Runtime::new().unwrap();

    group.bench_function("shared_100_updates", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut handles = Vec::new();
                for i in 0..100u32 {
                    let reg = shared.clone();
                    handles.push(tokio::spawn(async move {
                        let number = NodeNum::new(i % 1000);
                        let _ = reg
                            .write()
                            .upsert_position(number, NodePosition::from_degrees(45.0, 7.0));
                    }));
                }
                for handle in handles {
                    let _ = handle.await;
                }
            });
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_upsert_full,
    bench_partial_updates,
    bench_identity_lookup,
    bench_concurrent_updates,
);
criterion_main!(benches);
