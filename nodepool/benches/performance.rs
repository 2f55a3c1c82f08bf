use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nodepool::{FixedBucketStorage, FixedNodeAllocator, Global, HeapBuckets, NodePtr};

fn bench_allocate_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate_release");

    group.throughput(Throughput::Elements(256));
    group.bench_function(BenchmarkId::new("inline", 256), |b| {
        let mut pool: FixedNodeAllocator<[u64; 4], 256, false> = FixedNodeAllocator::new();
        let mut handles = Vec::with_capacity(256);
        b.iter(|| {
            for _ in 0..256 {
                handles.push(pool.allocate().unwrap());
            }
            for handle in handles.drain(..) {
                unsafe { pool.deallocate(black_box(handle)) };
            }
        });
    });

    group.bench_function(BenchmarkId::new("half_overflow", 256), |b| {
        let mut pool: FixedNodeAllocator<[u64; 4], 128, true> = FixedNodeAllocator::new();
        let mut handles = Vec::with_capacity(256);
        b.iter(|| {
            for _ in 0..256 {
                handles.push(pool.allocate().unwrap());
            }
            for handle in handles.drain(..) {
                unsafe { pool.deallocate(black_box(handle)) };
            }
        });
    });
    group.finish();
}

fn bench_free_list_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("free_list_churn");

    for live in [16, 256].iter() {
        group.throughput(Throughput::Elements(1000));
        group.bench_with_input(BenchmarkId::new("steady_state", live), live, |b, &live| {
            let mut pool: FixedNodeAllocator<u64, 512, false> = FixedNodeAllocator::new();
            let mut ring: Vec<NodePtr<u64>> = (0..live).map(|_| pool.allocate().unwrap()).collect();
            b.iter(|| {
                for i in 0..1000 {
                    let slot = i % live;
                    unsafe { pool.deallocate(ring[slot]) };
                    ring[slot] = black_box(pool.allocate().unwrap());
                }
            });
        });
    }
    group.finish();
}

fn bench_bucket_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucket_growth");
    let global = Global::new();

    for count in [97, 1031].iter() {
        group.bench_with_input(BenchmarkId::new("install", count), count, |b, &count| {
            let mut storage: FixedBucketStorage<NodePtr<u64>, 7> = FixedBucketStorage::new();
            b.iter(|| {
                let heap = HeapBuckets::allocate(count, &global).unwrap();
                if let Some(old) = storage.install(heap) {
                    unsafe { old.release(&global) };
                }
                black_box(storage.bucket_count())
            });
            if let Some(heap) = storage.reset_inline() {
                unsafe { heap.release(&global) };
            }
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_allocate_release,
    bench_free_list_churn,
    bench_bucket_growth
);
criterion_main!(benches);
