mod common;

use common::{keys, records, FakeBackend, Plan, ASSIGNED_OFFSET};
use dynobatch::{ChunkConfig, Chunker, MemoryBackend, Pairs, StoreError};

fn limits(size: usize) -> ChunkConfig {
    ChunkConfig {
        get: size,
        put: size,
        delete: size,
    }
}

#[tokio::test]
async fn test_async_delete_windows_in_order() {
    let chunker = Chunker::with_config(FakeBackend::new(), limits(4)).unwrap();
    chunker.async_delete_many(&keys(10)).await.unwrap();
    let firsts: Vec<u64> = chunker
        .backend()
        .calls()
        .iter()
        .map(|c| c.keys[0])
        .collect();
    assert_eq!(firsts, vec![0, 4, 8]);
}

#[tokio::test]
async fn test_async_get_partial_positions() {
    let backend = FakeBackend::new().with_plan(1, Plan::Partial(vec![0, 3]));
    let chunker = Chunker::with_config(backend, limits(4)).unwrap();

    let mut out = vec![String::new(); 9];
    let err = chunker.async_get_many(&keys(9), &mut out).await.unwrap_err();
    let multi = err.as_partial().unwrap();
    assert_eq!(multi.len(), 9);
    let failed: Vec<usize> = multi.failures().map(|(i, _)| i).collect();
    assert_eq!(failed, vec![4, 7]);
    assert_eq!(out[8], "value-8");
}

#[tokio::test]
async fn test_async_put_total_failure_stops() {
    let backend = FakeBackend::new().with_plan(1, Plan::Total("boom".into()));
    let chunker = Chunker::with_config(backend, limits(3)).unwrap();

    let mut ks = keys(9);
    let err = chunker
        .async_put_many(&mut ks, &records(9))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Backend(m) if m == "boom"));
    assert_eq!(chunker.backend().calls().len(), 2);
    assert_eq!(ks[2], 2 + ASSIGNED_OFFSET);
    assert_eq!(ks[3], 3);
}

#[tokio::test]
async fn test_async_mismatch() {
    let chunker = Chunker::new(FakeBackend::new());
    let mut ks = keys(2);
    let err = chunker
        .async_put_many(&mut ks, &records(1))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InputMismatch { keys: 2, records: 1 }));
    assert!(chunker.backend().calls().is_empty());
}

#[tokio::test]
async fn test_async_memory_roundtrip() {
    let backend: MemoryBackend<u64, u64> = MemoryBackend::with_limits(limits(3));
    let chunker = Chunker::with_config(backend, limits(3)).unwrap();

    let mut pairs = Pairs::new();
    for i in 0..7u64 {
        pairs.push(i, i * 10);
    }
    chunker.async_put_pairs(&mut pairs).await.unwrap();

    let mut out = vec![0u64; 7];
    chunker.async_get_many(pairs.keys(), &mut out).await.unwrap();
    assert_eq!(out, vec![0, 10, 20, 30, 40, 50, 60]);
}
