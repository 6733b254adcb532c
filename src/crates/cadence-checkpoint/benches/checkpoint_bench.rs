use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cadence_checkpoint::{Checkpoint, CheckpointSource, CheckpointStore, InMemoryCheckpointStore};
use serde_json::json;

fn checkpoint_append_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("checkpoint append", |b| {
        b.to_async(&runtime).iter(|| async {
            let store = InMemoryCheckpointStore::new();
            let snapshot = Checkpoint::new(
                0,
                json!({"messages": [{"role": "user", "content": "hi"}]}),
                Some("chatbot".to_string()),
                CheckpointSource::Input,
            );

            store
                .put("bench-thread", black_box(snapshot), None)
                .await
                .unwrap();
        });
    });
}

fn checkpoint_latest_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("checkpoint latest", |b| {
        b.to_async(&runtime).iter(|| async {
            let store = InMemoryCheckpointStore::new();
            let snapshot = Checkpoint::new(
                0,
                json!({"messages": []}),
                Some("chatbot".to_string()),
                CheckpointSource::Input,
            );

            store.put("bench-thread", snapshot, None).await.unwrap();
            store.get_latest(black_box("bench-thread")).await.unwrap();
        });
    });
}

criterion_group!(benches, checkpoint_append_benchmark, checkpoint_latest_benchmark);
criterion_main!(benches);
