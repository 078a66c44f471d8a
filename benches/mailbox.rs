//! Criterion benchmarks for the log bridge hot paths.
//!
//! Every `tracing` event in the application passes through `QueueLayer` and
//! the mailbox, and the GUI thread drains it every poll period.
//!
//! Key metrics:
//! - Enqueue cost of a single event through the layer
//! - Drain and format cost for a burst (a DAQ sample dump)
//! - Concurrent producers
//!
//! Run with: cargo bench --bench mailbox

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rigpanel::logging::{self, LineFormatter, LogRecord, Severity, mailbox};
use std::hint::black_box;
use std::thread;
use tracing_subscriber::prelude::*;

/// Cost of one `tracing` event captured by the queue layer.
fn layer_enqueue(c: &mut Criterion) {
    let (layer, mut feed) = logging::bridge(LineFormatter::default());
    let dispatch = tracing::Dispatch::new(tracing_subscriber::registry().with(layer));

    c.bench_function("layer_enqueue_event", |b| {
        tracing::dispatcher::with_default(&dispatch, || {
            b.iter(|| {
                tracing::debug!("data[{}] = {:#06x}\t{:.3} V", black_box(17), 0x4000, 5.0);
            });
        });
        feed.reader.drain();
    });
}

/// Drain and format a burst of records, as the poller does per tick.
fn drain_and_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain_and_format");
    let formatter = LineFormatter::default();

    // 2000 is one default scan over two channels
    for burst in [10usize, 100, 2000] {
        group.throughput(Throughput::Elements(burst as u64));
        group.bench_with_input(BenchmarkId::from_parameter(burst), &burst, |b, &burst| {
            b.iter_batched(
                || {
                    let (mailbox, reader) = mailbox::channel();
                    for i in 0..burst {
                        mailbox.put(LogRecord::new(
                            Severity::Debug,
                            "rigpanel::services::acquisition",
                            format!("data[{}] = 0x0000\t0.000 V", i),
                        ));
                    }
                    (mailbox, reader)
                },
                |(_mailbox, mut reader)| {
                    while let Some(record) = reader.try_get() {
                        black_box(formatter.format(&record));
                    }
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Several threads putting records while the reader drains afterwards.
fn concurrent_producers(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_producers");
    const PER_PRODUCER: usize = 500;

    for producers in [1usize, 4] {
        group.throughput(Throughput::Elements((producers * PER_PRODUCER) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(producers),
            &producers,
            |b, &producers| {
                b.iter(|| {
                    let (mailbox, mut reader) = mailbox::channel();
                    let handles: Vec<_> = (0..producers)
                        .map(|_| {
                            let mailbox = mailbox.clone();
                            thread::spawn(move || {
                                for _ in 0..PER_PRODUCER {
                                    mailbox.put(LogRecord::new(Severity::Info, "bench", "x"));
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                    black_box(reader.drain().len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, layer_enqueue, drain_and_format, concurrent_producers);
criterion_main!(benches);
