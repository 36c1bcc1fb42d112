// benches/spsc.rs

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use std::thread;

use weft::unbounded;

const ITEM_VALUE: u64 = 42;

/// Same-thread round trip: one send, one flush, one recv per iteration.
fn ping_pong(c: &mut Criterion) {
  let mut group = c.benchmark_group("SpscPingPong");
  group.throughput(Throughput::Elements(1));
  group.bench_function("send_flush_recv", |b| {
    let (mut tx, mut rx) = unbounded::<u64>();
    b.iter(|| {
      tx.send(ITEM_VALUE).unwrap();
      tx.flush().unwrap();
      rx.recv().unwrap()
    });
  });
  group.finish();
}

/// Batched publication: the flush cost is amortized over the run.
fn batched_flush(c: &mut Criterion) {
  const BATCH: u64 = 1_000;

  let mut group = c.benchmark_group("SpscBatchedFlush");
  group.throughput(Throughput::Elements(BATCH));
  group.bench_function("send_1000_flush_recv_1000", |b| {
    let (mut tx, mut rx) = unbounded::<u64>();
    b.iter(|| {
      for i in 0..BATCH {
        tx.send(i).unwrap();
      }
      tx.flush().unwrap();
      for _ in 0..BATCH {
        rx.recv().unwrap();
      }
    });
  });
  group.finish();
}

/// Two-thread throughput over a fresh channel per iteration.
fn threaded_throughput(c: &mut Criterion) {
  const ITEMS: u64 = 100_000;

  let mut group = c.benchmark_group("SpscThreaded");
  group.throughput(Throughput::Elements(ITEMS));
  group.sample_size(10);
  group.bench_function("100k_items_flush_every_64", |b| {
    b.iter_batched(
      unbounded::<u64>,
      |(mut tx, mut rx)| {
        let producer = thread::spawn(move || {
          for i in 0..ITEMS {
            tx.send(i).unwrap();
            if i % 64 == 0 {
              tx.flush().unwrap();
            }
          }
          tx.flush().unwrap();
        });
        for _ in 0..ITEMS {
          rx.recv().unwrap();
        }
        producer.join().unwrap();
      },
      BatchSize::PerIteration,
    );
  });
  group.finish();
}

criterion_group!(benches, ping_pong, batched_flush, threaded_throughput);
criterion_main!(benches);
