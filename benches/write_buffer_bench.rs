use std::sync::Arc;

use bytes::Bytes;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use prefix_hash_get::get_context::{GetContext, LazyValue};
use prefix_hash_get::memtable::PrefixHashBuffer;
use prefix_hash_get::options::HashSkipListOptions;
use prefix_hash_get::transform::FixedPrefixTransform;
use prefix_hash_get::types::{InternalKey, LookupKey, ValueType};

fn filled_buffer(n: u64) -> PrefixHashBuffer {
    let opts = HashSkipListOptions::default().with_bucket_count(10_000);
    let buf = PrefixHashBuffer::new(opts, Arc::new(FixedPrefixTransform::new(4))).unwrap();
    for i in 0..n {
        let key = InternalKey::new(format!("u{:03}-{i}", i % 500).into_bytes(), i + 1, ValueType::Value);
        buf.insert(key, Bytes::from(vec![b'x'; 100]));
    }
    buf
}

fn write_buffer_insert_benchmark(c: &mut Criterion) {
    c.bench_function("write_buffer_insert_10k", |b| {
        b.iter(|| filled_buffer(10_000));
    });
}

fn write_buffer_get_benchmark(c: &mut Criterion) {
    let buf = filled_buffer(10_000);
    let lookups: Vec<LookupKey> = (0..10_000u64)
        .step_by(7)
        .map(|i| LookupKey::new(format!("u{:03}-{i}", i % 500).into_bytes(), u64::MAX >> 8))
        .collect();

    c.bench_function("write_buffer_get", |b| {
        b.iter(|| {
            for lookup in &lookups {
                let mut ctx = GetContext::new(lookup.user_key());
                buf.get(lookup, |k, v| ctx.consider_version(k.as_parsed(), LazyValue::Plain(v.clone())));
                black_box(ctx.resolve().unwrap());
            }
        });
    });
}

fn write_buffer_iterator_benchmark(c: &mut Criterion) {
    use prefix_hash_get::iterator::MemTableIterator;

    let buf = filled_buffer(10_000);
    c.bench_function("write_buffer_full_scan", |b| {
        b.iter(|| {
            let mut iter = buf.get_iterator();
            iter.seek_to_first();
            let mut n = 0;
            while iter.is_valid() {
                n += 1;
                iter.next();
            }
            black_box(n)
        });
    });
}

fn write_buffer_snapshot_benchmark(c: &mut Criterion) {
    let buf = PrefixHashBuffer::new(
        HashSkipListOptions::default(),
        Arc::new(FixedPrefixTransform::new(4)),
    )
    .unwrap();
    for i in 0..100_000u64 {
        let scattered = i.wrapping_mul(2_654_435_761) % 65_536;
        let key = InternalKey::new(format!("{scattered:04x}-{i}").into_bytes(), i + 1, ValueType::Value);
        buf.insert(key, Bytes::from_static(b"v"));
    }

    let mut group = c.benchmark_group("write_buffer_snapshot");
    group.sample_size(10);
    group.bench_function("default_options_100k", |b| {
        b.iter(|| black_box(buf.get_iterator()));
    });
    group.finish();
}

criterion_group!(
    benches,
    write_buffer_insert_benchmark,
    write_buffer_get_benchmark,
    write_buffer_iterator_benchmark,
    write_buffer_snapshot_benchmark
);
criterion_main!(benches);
