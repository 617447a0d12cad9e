//! Throughput of the loose object write and read paths

use cask_db::{ObjectKind, ObjectStore, StoreConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::tempdir;

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");
    for len in [1024usize, 64 * 1024, 1024 * 1024] {
        let dir = tempdir().unwrap();
        let config = StoreConfig::builder().fsync(false).build();
        let store = ObjectStore::open(dir.path().join("objects"), config).unwrap();
        let data = payload(len);
        let mut n = 0u64;

        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &data, |b, data| {
            b.iter(|| {
                // Counter prefix so every iteration writes a new object
                let mut data = data.clone();
                data[..8].copy_from_slice(&n.to_le_bytes());
                n += 1;
                black_box(store.put(&data, ObjectKind::Blob).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");
    for len in [1024usize, 64 * 1024, 1024 * 1024] {
        let dir = tempdir().unwrap();
        let store = ObjectStore::open(dir.path().join("objects"), StoreConfig::default()).unwrap();
        let hash = store.put(&payload(len), ObjectKind::Blob).unwrap();

        group.throughput(Throughput::Bytes(len as u64));
        group.bench_function(BenchmarkId::from_parameter(len), |b| {
            b.iter(|| black_box(store.get(&hash).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_put, bench_get);
criterion_main!(benches);
