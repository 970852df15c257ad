// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collapse a burst of resize notifications into a single update.
//!
//! The host drives the clock: it forwards every resize with a timestamp and polls
//! the monitor once the reported deadline passes.
//!
//! Run:
//! - `RUST_LOG=understory_viewport=trace cargo run -p understory_viewport_demos --example resize_debounce`

use std::time::Duration;

use understory_viewport::geometry::{Offsets, Span, Target};
use understory_viewport::host::MemoryHost;
use understory_viewport::monitor::{Monitor, MonitorConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = MonitorConfig {
        resize_settle: Duration::from_millis(150),
        ..MonitorConfig::default()
    };
    let mut monitor = Monitor::with_config(MemoryHost::new(900.0, 4000.0), config).unwrap();
    let footer_ad = monitor
        .watch(Target::Region(Span::new(700.0, 880.0)), Offsets::ZERO)
        .unwrap();

    // A window being dragged smaller: one notification every 16ms.
    let mut now = Duration::ZERO;
    for height in (600..=900).rev().step_by(50) {
        monitor.host_mut().set_viewport_height(f64::from(height));
        monitor.on_host_resize(now);
        if let Some(report) = monitor.poll(now) {
            println!("unexpected early update: {report:?}");
        }
        now += Duration::from_millis(16);
    }

    let deadline = monitor.next_deadline().unwrap();
    println!("last resize at {:?}, update due at {deadline:?}", now - Duration::from_millis(16));

    let report = monitor.poll(deadline).unwrap();
    println!(
        "settled: viewport bottom {}, {} rounds",
        monitor.viewport().bottom(),
        report.rounds
    );
    for kind in report.fired_for(footer_ad) {
        println!("  footer_ad {kind}");
    }
    assert!(monitor.poll(deadline + Duration::from_secs(1)).is_none());
}
