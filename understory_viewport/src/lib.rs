// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Viewport: deterministic, `no_std` viewport observation.
//!
//! ## Overview
//!
//! This crate tracks where a set of watch targets sit relative to a scrolling viewport and emits
//! transition events as they enter, fill, leave, or skip across it.
//! It performs no layout. A [`Host`](crate::host::Host) supplies the scroll offset, the visible
//! height, the document extent and element rectangles; the host forwards its scroll and resize
//! notifications to the [`Monitor`](crate::monitor::Monitor).
//!
//! ## Targets
//!
//! A [`Target`](crate::geometry::Target) is a host element, a scalar position, or an explicit
//! region. [`Offsets`](crate::geometry::Offsets) grow (or, negative, shrink) the resolved span.
//! Geometry is re-resolved whenever the document extent changes, unless the watcher is locked.
//!
//! ## Flags and events
//!
//! Each watcher carries four [`Visibility`](crate::watcher::Visibility) flags. Comparing them
//! with the previous snapshot yields the [`EventKind`](crate::types::EventKind)s to fire; see
//! [`transitions`](crate::watcher::transitions) for the exact rules, including pass-through.
//!
//! ## Updates
//!
//! Every update recomputes all watchers before dispatching any event, so handlers always observe
//! a consistent state. Handlers get shared access; changes they queue through the
//! [`Event`](crate::dispatch::Event) (unsubscribe, destroy, lock, ...) apply right after the
//! event, and follow-up updates they request run after the pass. Resize bursts are debounced
//! without a clock: pass timestamps to [`on_host_resize`](crate::monitor::Monitor::on_host_resize) and
//! [`poll`](crate::monitor::Monitor::poll).
//!
//! ## Example
//!
//! ```
//! use understory_viewport::geometry::{Offsets, Span, Target};
//! use understory_viewport::host::MemoryHost;
//! use understory_viewport::monitor::Monitor;
//! use understory_viewport::types::EventKind;
//!
//! let mut monitor = Monitor::new(MemoryHost::new(800.0, 5000.0)).unwrap();
//! let hero = monitor
//!     .watch(Target::Region(Span::new(100.0, 200.0)), Offsets::ZERO)
//!     .unwrap();
//! assert!(monitor.watcher(hero).unwrap().is_fully_in_viewport());
//!
//! monitor
//!     .on(hero, EventKind::ExitViewport, |ev| {
//!         assert!(ev.watcher().is_above_viewport());
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! monitor.host_mut().set_scroll_top(1000.0);
//! let report = monitor.on_host_scroll();
//! assert_eq!(report.count(hero, EventKind::ExitViewport), 1);
//! assert_eq!(report.count(hero, EventKind::VisibilityChange), 1);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod debounce;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod host;
pub mod monitor;
pub mod types;
pub mod viewport;
pub mod watcher;

pub use error::{Error, HandlerError};
pub use monitor::{Monitor, MonitorConfig, UpdateReport};
