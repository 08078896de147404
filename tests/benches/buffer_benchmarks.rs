//! # Buffer Stage Benchmarks
//!
//! Hand-off cost of the pass-through stage against a bare channel.
//!
//! | Benchmark | Measures |
//! |-----------|----------|
//! | `direct_channel` | Producer → consumer over one mpsc channel |
//! | `pass_through` | Producer → stage → consumer, including the rendezvous |
//! | `lifecycle` | Construct, start, stop, and confirm close |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pipeline_buffer::{Buffer, PassThroughBuffer};
use pipeline_types::{Message, NoopMetrics, Transaction};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

const INBOUND_CAPACITY: usize = 64;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("benchmark runtime")
}

fn payloads(count: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let len = rng.gen_range(16..256);
            (0..len).map(|_| rng.gen()).collect()
        })
        .collect()
}

async fn through_channel(payloads: Vec<Vec<u8>>) -> usize {
    let (tx, mut rx) = mpsc::channel(INBOUND_CAPACITY);
    let producer = tokio::spawn(async move {
        for payload in payloads {
            let (transaction, _outcome) = Transaction::new(Message::from_bytes(payload));
            if tx.send(transaction).await.is_err() {
                break;
            }
        }
    });

    let mut received = 0;
    while let Some(transaction) = rx.recv().await {
        transaction.ack();
        received += 1;
    }
    let _ = producer.await;
    received
}

async fn through_stage(payloads: Vec<Vec<u8>>) -> usize {
    let stage = PassThroughBuffer::new(Arc::new(NoopMetrics));
    let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
    stage.start_receiving(rx).expect("fresh stage");

    let producer = tokio::spawn(async move {
        for payload in payloads {
            let (transaction, _outcome) = Transaction::new(Message::from_bytes(payload));
            if tx.send(transaction).await.is_err() {
                break;
            }
        }
    });

    let outbound = stage.transaction_chan();
    let mut received = 0;
    while let Some(transaction) = outbound.recv().await {
        transaction.ack();
        received += 1;
    }
    let _ = producer.await;
    received
}

fn bench_hand_off(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("buffer-hand-off");
    group.measurement_time(Duration::from_secs(10));

    for count in [100usize, 1_000, 10_000] {
        let batch = payloads(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("direct_channel", count), &batch, |b, batch| {
            b.to_async(&rt)
                .iter(|| async { black_box(through_channel(batch.clone()).await) })
        });

        group.bench_with_input(BenchmarkId::new("pass_through", count), &batch, |b, batch| {
            b.to_async(&rt)
                .iter(|| async { black_box(through_stage(batch.clone()).await) })
        });
    }

    group.finish();
}

fn bench_lifecycle(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("buffer-lifecycle");

    group.bench_function("start_stop_close", |b| {
        b.to_async(&rt).iter(|| async {
            let stage = PassThroughBuffer::new(Arc::new(NoopMetrics));
            let (_tx, rx) = mpsc::channel::<Transaction>(INBOUND_CAPACITY);
            stage.start_receiving(rx).expect("fresh stage");
            stage.stop_consuming();
            black_box(stage.wait_for_close(Duration::from_secs(1)).await)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_hand_off, bench_lifecycle);
criterion_main!(benches);
