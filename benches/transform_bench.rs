use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use otsync_core::model::{DataValue, IdGenerator, Model};
use otsync_core::ot::ops::{
    ArrayInsertOperation, ArrayMoveOperation, DiscreteOperation, StringInsertOperation,
    StringRemoveOperation,
};
use otsync_core::ot::{transform_discrete, Operation};
use otsync_core::sync::{LocalSyncController, Mutation, RemoteOperation};
use otsync_core::SyncSettings;

/// Benchmark a remote string insert carried through a chain of concurrent edits
fn bench_string_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_transform_chain");

    for size in [10, 100, 1000].iter() {
        let chain: Vec<DiscreteOperation> = (0..*size)
            .map(|i| match i % 2 {
                0 => StringInsertOperation::new("text", i, "ab").into(),
                _ => StringRemoveOperation::new("text", i, "x").into(),
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &chain, |b, chain| {
            b.iter(|| {
                let mut incoming: DiscreteOperation =
                    StringInsertOperation::new("text", 500, "hello").into();
                for op in chain {
                    incoming = transform_discrete(&incoming, op).unwrap().s;
                }
                black_box(incoming)
            });
        });
    }

    group.finish();
}

/// Benchmark array inserts and moves against each other
fn bench_array_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_transform_chain");

    for size in [10, 100, 1000].iter() {
        let chain: Vec<DiscreteOperation> = (0..*size)
            .map(|i| match i % 2 {
                0 => ArrayMoveOperation::new("list", i, (i * 7) % (size + 1)).into(),
                _ => ArrayInsertOperation::new("list", i, DataValue::null(format!("c:{}", i)))
                    .into(),
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &chain, |b, chain| {
            b.iter(|| {
                let mut incoming: DiscreteOperation =
                    ArrayMoveOperation::new("list", 3, size / 2).into();
                for op in chain {
                    incoming = transform_discrete(&incoming, op).unwrap().s;
                }
                black_box(incoming)
            });
        });
    }

    group.finish();
}

/// Benchmark rebasing one remote operation through a deep pending queue
fn bench_deep_queue_rebase(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_queue_rebase");
    group.sample_size(20);

    for depth in [10, 100, 500].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
            b.iter_batched(
                || {
                    let mut ids = IdGenerator::new("m");
                    let model = Model::from_json(
                        &serde_json::json!({ "text": "x".repeat(1000) }),
                        &mut ids,
                    )
                    .unwrap();
                    let mut controller =
                        LocalSyncController::new(model, 0, SyncSettings::with_session_id("bench"));
                    for i in 0..depth {
                        controller
                            .apply(
                                "m:2",
                                Mutation::StringInsert {
                                    index: (i * 13) % 1000,
                                    value: "y".to_string(),
                                },
                            )
                            .unwrap();
                    }
                    controller
                },
                |mut controller| {
                    let remote = RemoteOperation {
                        session_id: "other".to_string(),
                        version: 0,
                        operation: Operation::Discrete(
                            StringInsertOperation::new("m:2", 500, "remote").into(),
                        ),
                    };
                    black_box(controller.receive_remote(remote).unwrap());
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_string_chain,
    bench_array_chain,
    bench_deep_queue_rebase
);
criterion_main!(benches);
