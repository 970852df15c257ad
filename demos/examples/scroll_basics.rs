// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll a document past a few watch targets and print the events.
//!
//! Run:
//! - `cargo run -p understory_viewport_demos --example scroll_basics`
//! - `RUST_LOG=understory_viewport=trace cargo run -p understory_viewport_demos --example scroll_basics`

use kurbo::Rect;
use understory_viewport::geometry::{Offsets, Span, Target};
use understory_viewport::host::MemoryHost;
use understory_viewport::monitor::Monitor;
use understory_viewport::types::EventKind;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut host = MemoryHost::new(800.0, 6000.0);
    let banner = host.add_element(Rect::new(0.0, 1200.0, 1024.0, 1500.0));

    let mut monitor = Monitor::new(host).unwrap();
    let header = monitor
        .watch(Target::Region(Span::new(0.0, 120.0)), Offsets::ZERO)
        .unwrap();
    let banner = monitor.watch(Target::Element(banner), 50.0).unwrap();
    let footer = monitor.watch(Target::Position(0.0), Offsets::ZERO).unwrap();

    for id in [header, banner, footer] {
        for kind in [
            EventKind::EnterViewport,
            EventKind::FullyEnterViewport,
            EventKind::ExitViewport,
        ] {
            monitor
                .on(id, kind, |ev| {
                    let w = ev.watcher();
                    println!(
                        "  watcher {} {:<20} span [{:.0}, {:.0}]",
                        w.id().get(),
                        ev.kind(),
                        w.top(),
                        w.bottom()
                    );
                    Ok(())
                })
                .unwrap();
        }
    }

    for y in [400.0, 1000.0, 2500.0, 5200.0, 0.0] {
        println!("scroll to {y}");
        monitor.host_mut().set_scroll_top(y);
        let report = monitor.on_host_scroll();
        println!("  {} events", report.fired.len());
    }
}
