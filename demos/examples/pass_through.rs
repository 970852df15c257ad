// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single large scroll carries a short region from below the viewport to above it.
//!
//! The region is never observed in view, yet every enter and exit event still fires.
//!
//! Run:
//! - `cargo run -p understory_viewport_demos --example pass_through`

use understory_viewport::geometry::{Offsets, Span, Target};
use understory_viewport::host::MemoryHost;
use understory_viewport::monitor::Monitor;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut monitor = Monitor::new(MemoryHost::new(600.0, 20_000.0)).unwrap();
    let marker = monitor
        .watch(Target::Region(Span::new(3000.0, 3040.0)), Offsets::ZERO)
        .unwrap();
    println!(
        "before: {:?}",
        monitor.watcher(marker).unwrap().visibility()
    );

    monitor.host_mut().set_scroll_top(9000.0);
    let report = monitor.on_host_scroll();

    println!("after:  {:?}", monitor.watcher(marker).unwrap().visibility());
    for kind in report.fired_for(marker) {
        println!("  {kind}");
    }
}
