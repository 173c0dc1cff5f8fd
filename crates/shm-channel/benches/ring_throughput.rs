use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use shm_channel::{AlignedSpan, Consumer, HEADER_SIZE, Producer, RingBuffer, Role, remove};
use std::thread;

const RING_CAPACITY: usize = 64 * 1024 * 1024;

fn bind_pair(span: &AlignedSpan) -> (RingBuffer, RingBuffer) {
    let producer = unsafe { RingBuffer::bind(span.as_mut_ptr(), span.len(), Role::Producer) }
        .expect("Failed to bind producer");
    let consumer = unsafe { RingBuffer::bind(span.as_mut_ptr(), span.len(), Role::Consumer) }
        .expect("Failed to bind consumer");
    (producer, consumer)
}

/// Write one message and drain it, on the same thread
fn benchmark_write_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_write_read");

    let sizes = [
        (64, "64B"),
        (1024, "1KB"),
        (64 * 1024, "64KB"),
        (1024 * 1024, "1MB"),
        (6 * 1024 * 1024, "6MB"), // Full HD raw frame (1920x1080x3)
    ];

    let span = AlignedSpan::new(HEADER_SIZE + RING_CAPACITY);
    let (mut producer, mut consumer) = bind_pair(&span);

    for (size, label) in sizes.iter() {
        let data = vec![0xABu8; *size];
        let mut out = vec![0u8; *size];

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("write_read", label), size, |b, _| {
            b.iter(|| {
                assert!(producer.write(black_box(&data)));
                black_box(consumer.read(&mut out));
            });
        });
    }

    group.finish();
}

/// Producer and consumer on separate threads over the same span
fn benchmark_cross_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_cross_thread");
    group.sample_size(10);

    let messages = 1_000usize;
    let sizes = [(1024, "1KB"), (64 * 1024, "64KB"), (1024 * 1024, "1MB")];

    for (size, label) in sizes.iter() {
        group.throughput(Throughput::Bytes((*size * messages) as u64));
        group.bench_with_input(BenchmarkId::new("spsc", label), size, |b, &size| {
            let span = AlignedSpan::new(HEADER_SIZE + RING_CAPACITY);
            let data = vec![0x5Au8; size];

            b.iter(|| {
                let (mut producer, mut consumer) = bind_pair(&span);
                thread::scope(|s| {
                    s.spawn(|| {
                        for _ in 0..messages {
                            while !producer.write(&data) {
                                std::hint::spin_loop();
                            }
                        }
                    });

                    let mut out = vec![0u8; size];
                    let mut received = 0;
                    while received < messages {
                        if consumer.read(&mut out) > 0 {
                            received += 1;
                        } else {
                            std::hint::spin_loop();
                        }
                    }
                });
            });
        });
    }

    group.finish();
}

/// Round trip through a named shared memory segment
fn benchmark_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_write_read");

    let name = format!("shmch_bench_{}", std::process::id());
    remove(&name);

    let mut producer = Producer::create(&name, 16 * 1024 * 1024).expect("Failed to create channel");
    let mut consumer = Consumer::open(&name, 0).expect("Failed to open channel");

    let sizes = [(1024, "1KB"), (100 * 1024, "100KB"), (1024 * 1024, "1MB")];

    for (size, label) in sizes.iter() {
        let data = vec![42u8; *size];
        let mut out = vec![0u8; *size];

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("shm", label), size, |b, _| {
            b.iter(|| {
                assert!(producer.write(black_box(&data)));
                black_box(consumer.read(&mut out));
            });
        });
    }

    group.finish();
    producer.destroy();
}

criterion_group!(
    benches,
    benchmark_write_read,
    benchmark_cross_thread,
    benchmark_channel
);
criterion_main!(benches);
