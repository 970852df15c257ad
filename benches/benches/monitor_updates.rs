// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Rect;
use understory_viewport::geometry::{Offsets, Span, Target};
use understory_viewport::host::MemoryHost;
use understory_viewport::monitor::Monitor;
use understory_viewport::types::EventKind;

const DOC_HEIGHT: f64 = 100_000.0;
const VIEW_HEIGHT: f64 = 800.0;

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_spans(n: usize, seed: u64) -> Vec<Span> {
    let mut rng = Rng::new(seed);
    (0..n)
        .map(|_| {
            let top = rng.next_f64() * DOC_HEIGHT;
            let height = 20.0 + rng.next_f64() * 600.0;
            Span::new(top, top + height)
        })
        .collect()
}

fn region_monitor(n: usize) -> Monitor<MemoryHost> {
    let mut m = Monitor::new(MemoryHost::new(VIEW_HEIGHT, DOC_HEIGHT)).unwrap();
    for span in gen_spans(n, 0x5eed) {
        let _ = m.watch(Target::Region(span), Offsets::ZERO).unwrap();
    }
    m
}

fn bench_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("scroll");
    for &n in &[100_usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("sweep_regions_n{}", n), |b| {
            let mut m = region_monitor(n);
            let mut y = 0.0;
            b.iter(|| {
                y = (y + 173.0) % (DOC_HEIGHT - VIEW_HEIGHT);
                m.host_mut().set_scroll_top(y);
                black_box(m.on_host_scroll().fired.len());
            });
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let n = 1_000;
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("jump_with_handlers_n1000", |b| {
        b.iter_batched(
            || {
                let mut m = region_monitor(n);
                let hits = Rc::new(Cell::new(0_u64));
                let ids: Vec<_> = m.watchers().map(|w| w.id()).collect();
                for id in ids {
                    for kind in [EventKind::EnterViewport, EventKind::ExitViewport] {
                        let hits = hits.clone();
                        m.on(id, kind, move |_| {
                            hits.set(hits.get() + 1);
                            Ok(())
                        })
                        .unwrap();
                    }
                }
                (m, hits)
            },
            |(mut m, hits)| {
                for y in [50_000.0, 10_000.0, 90_000.0, 0.0] {
                    m.host_mut().set_scroll_top(y);
                    let _ = m.on_host_scroll();
                }
                black_box(hits.get());
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_relocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("relocate");
    for &n in &[100_usize, 1_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("document_growth_elements_n{}", n), |b| {
            let mut host = MemoryHost::new(VIEW_HEIGHT, DOC_HEIGHT);
            let spans = gen_spans(n, 0xfeed);
            let elements: Vec<_> = spans
                .iter()
                .map(|s| host.add_element(Rect::new(0.0, s.top, 100.0, s.bottom)))
                .collect();
            let mut m = Monitor::new(host).unwrap();
            for el in elements {
                let _ = m.watch(Target::Element(el), Offsets::uniform(10.0)).unwrap();
            }
            let mut grow = 0.0;
            b.iter(|| {
                grow += 1.0;
                m.host_mut().set_document_height(DOC_HEIGHT + grow);
                black_box(m.update().fired.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scroll, bench_dispatch, bench_relocate);
criterion_main!(benches);
