// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The monitor: watcher registry, update loop, and host signal entry points.
//!
//! ## Update discipline
//!
//! Every update runs in two passes. Pass 1 refreshes the viewport, re-resolves geometry when the
//! document extent changed, and recomputes the flags of every watcher. Pass 2 dispatches events,
//! watcher by watcher. No handler runs before pass 1 finished for all watchers, so a handler on
//! one watcher always reads the post-update state of every other watcher.
//!
//! Handlers only get shared access to the monitor. Follow-up work they request through
//! [`Event::request_update`] or [`Event::request_recalculate`] runs as additional rounds after the
//! current pass and before the entry point returns; rounds never interleave. This holds for every
//! place a handler can run: update entry points, [`Monitor::recalculate_location`], and the
//! immediate fire in [`Monitor::subscribe`].
//!
//! ## Signals
//!
//! - [`Monitor::on_host_scroll`]: synchronous update.
//! - [`Monitor::on_host_resize`]: schedules a debounced update; drive it with [`Monitor::poll`]
//!   at or after [`Monitor::next_deadline`].
//! - [`Monitor::update`] and [`Monitor::recalculate_locations`]: manual triggers.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::time::Duration;

use crate::debounce::Debouncer;
use crate::dispatch::{Command, Deferred, Event, Handler, Subscription};
use crate::error::{Error, HandlerError};
use crate::geometry::{self, Offsets, Target};
use crate::host::{Host, HostCapabilities};
use crate::types::{EventKind, HandlerId, Signal, WatcherId};
use crate::viewport::Viewport;
use crate::watcher::Watcher;

/// Tunables for a [`Monitor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Quiet period after the last resize notification before the monitor recomputes.
    pub resize_settle: Duration,
    /// Follow-up rounds handlers may request within one entry point call.
    pub max_nested_updates: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            resize_settle: Duration::from_millis(100),
            max_nested_updates: 16,
        }
    }
}

/// A handler that returned an error during dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct HandlerFailure {
    /// Watcher the event fired on.
    pub watcher: WatcherId,
    /// Event being dispatched.
    pub kind: EventKind,
    /// The failing subscription.
    pub handler: HandlerId,
    /// What the handler reported.
    pub error: HandlerError,
}

/// Outcome of one update entry point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateReport {
    /// Events fired, in dispatch order (whether or not anyone was subscribed).
    pub fired: Vec<(WatcherId, EventKind)>,
    /// Handlers that failed; dispatch continued past each of them.
    pub failures: Vec<HandlerFailure>,
    /// Watchers whose target could not be re-resolved; they kept their previous geometry.
    pub unresolved: Vec<WatcherId>,
    /// Update rounds run: one, plus any requested by handlers.
    pub rounds: usize,
}

impl UpdateReport {
    /// How many times `kind` fired on `watcher`.
    pub fn count(&self, watcher: WatcherId, kind: EventKind) -> usize {
        self.fired
            .iter()
            .filter(|&&(w, k)| w == watcher && k == kind)
            .count()
    }

    /// Events fired on `watcher`, in order.
    pub fn fired_for(&self, watcher: WatcherId) -> impl Iterator<Item = EventKind> + '_ {
        self.fired
            .iter()
            .filter(move |(w, _)| *w == watcher)
            .map(|&(_, k)| k)
    }
}

/// Viewport observation engine over a [`Host`].
///
/// ## Usage
///
/// - Construct with [`Monitor::new`] (or [`Monitor::with_config`]).
/// - Register targets with [`Monitor::watch`] and subscribe with [`Monitor::on`] /
///   [`Monitor::once`].
/// - Forward host signals to [`Monitor::on_host_scroll`] and [`Monitor::on_host_resize`], and
///   call [`Monitor::poll`] when [`Monitor::next_deadline`] passes.
pub struct Monitor<H: Host> {
    host: H,
    config: MonitorConfig,
    viewport: Viewport,
    pub(crate) watchers: BTreeMap<WatcherId, Watcher<H>>,
    next_watcher: u64,
    next_handler: Cell<u64>,
    pub(crate) latest_signal: Option<Signal>,
    resize: Debouncer,
    pub(crate) deferred: RefCell<Deferred<H>>,
    // Outcome of subscription-time handlers, carried into the next report.
    pending: UpdateReport,
}

impl<H: Host> core::fmt::Debug for Monitor<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .field("viewport", &self.viewport)
            .field("watchers", &self.watchers.len())
            .field("latest_signal", &self.latest_signal)
            .field("resize", &self.resize)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Monitor<H> {
    /// Create a monitor with the default configuration.
    ///
    /// Fails when the host cannot deliver scroll and resize signals.
    pub fn new(host: H) -> Result<Self, Error> {
        Self::with_config(host, MonitorConfig::default())
    }

    /// Create a monitor with an explicit configuration.
    pub fn with_config(host: H, config: MonitorConfig) -> Result<Self, Error> {
        let missing = HostCapabilities::REQUIRED.difference(host.capabilities());
        if !missing.is_empty() {
            return Err(Error::MissingCapabilities { missing });
        }
        let mut viewport = Viewport::default();
        let _ = viewport.recompute(&host);
        Ok(Self {
            host,
            resize: Debouncer::new(config.resize_settle),
            config,
            viewport,
            watchers: BTreeMap::new(),
            next_watcher: 0,
            next_handler: Cell::new(0),
            latest_signal: None,
            deferred: RefCell::new(Deferred::default()),
            pending: UpdateReport::default(),
        })
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host. Changes are picked up by the next update.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Active configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Viewport state as of the last update.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Signal behind the most recent update, if any.
    pub fn latest_signal(&self) -> Option<Signal> {
        self.latest_signal
    }

    /// Look up a watcher.
    pub fn watcher(&self, id: WatcherId) -> Option<&Watcher<H>> {
        self.watchers.get(&id)
    }

    /// All watchers, in registration order.
    pub fn watchers(&self) -> impl Iterator<Item = &Watcher<H>> + '_ {
        self.watchers.values()
    }

    /// Number of registered watchers.
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    /// No watchers are registered.
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Register a target.
    ///
    /// Geometry is resolved against the current viewport and the initial flags are
    /// computed; registration itself fires no events.
    pub fn watch(
        &mut self,
        target: Target<H::Element>,
        offsets: impl Into<Offsets>,
    ) -> Result<WatcherId, Error> {
        let offsets = offsets.into();
        let span = geometry::resolve(&mut self.host, &target, offsets, &self.viewport)
            .inspect_err(|_| tracing::warn!("watch target could not be resolved"))?;
        let id = WatcherId(self.next_watcher);
        self.next_watcher += 1;
        let watcher = Watcher::new(id, target, offsets, span, &self.viewport);
        tracing::debug!(
            watcher = id.get(),
            top = span.top,
            bottom = span.bottom,
            "watching"
        );
        self.watchers.insert(id, watcher);
        Ok(id)
    }

    /// Remove a watcher and drop all of its subscriptions.
    pub fn destroy(&mut self, id: WatcherId) -> Result<(), Error> {
        let mut watcher = self.watchers.remove(&id).ok_or(Error::UnknownWatcher(id))?;
        watcher.subscriptions.clear();
        tracing::debug!(watcher = id.get(), "destroyed");
        Ok(())
    }

    /// Freeze a watcher's geometry. Flags and events still follow the viewport.
    pub fn lock(&mut self, id: WatcherId) -> Result<(), Error> {
        self.watcher_mut(id)?.locked = true;
        Ok(())
    }

    /// Resume geometry resolution for a watcher.
    pub fn unlock(&mut self, id: WatcherId) -> Result<(), Error> {
        self.watcher_mut(id)?.locked = false;
        Ok(())
    }

    /// Subscribe `handler` to `kind` on watcher `id`.
    ///
    /// If the watcher's current state already satisfies `kind` (see
    /// [`Visibility::satisfies`](crate::watcher::Visibility::satisfies)), the handler runs
    /// immediately with the latest signal. When `once` is set, that immediate run consumes
    /// the subscription and nothing is stored; the returned id is then inert.
    ///
    /// Updates requested by that immediate run happen before this returns. Their events, and a
    /// failure of the immediate run itself, are included in the next [`UpdateReport`] returned
    /// by any entry point.
    pub fn subscribe<F>(
        &mut self,
        id: WatcherId,
        kind: EventKind,
        once: bool,
        handler: F,
    ) -> Result<HandlerId, Error>
    where
        F: FnMut(&Event<'_, H>) -> Result<(), HandlerError> + 'static,
    {
        if !self.watchers.contains_key(&id) {
            return Err(Error::UnknownWatcher(id));
        }
        let handler_id = self.next_handler_id();
        let mut report = core::mem::take(&mut self.pending);
        let attached = self.attach(id, kind, once, handler_id, Box::new(handler), &mut report);
        self.drain_deferred(&mut report);
        self.pending = report;
        attached.map(|()| handler_id)
    }

    /// Subscribe a persistent handler.
    pub fn on<F>(&mut self, id: WatcherId, kind: EventKind, handler: F) -> Result<HandlerId, Error>
    where
        F: FnMut(&Event<'_, H>) -> Result<(), HandlerError> + 'static,
    {
        self.subscribe(id, kind, false, handler)
    }

    /// Subscribe a one-shot handler.
    pub fn once<F>(&mut self, id: WatcherId, kind: EventKind, handler: F) -> Result<HandlerId, Error>
    where
        F: FnMut(&Event<'_, H>) -> Result<(), HandlerError> + 'static,
    {
        self.subscribe(id, kind, true, handler)
    }

    /// Subscribe by event name (`"enterViewport"`, ...).
    pub fn on_named<F>(
        &mut self,
        id: WatcherId,
        name: &str,
        once: bool,
        handler: F,
    ) -> Result<HandlerId, Error>
    where
        F: FnMut(&Event<'_, H>) -> Result<(), HandlerError> + 'static,
    {
        let kind = name.parse()?;
        self.subscribe(id, kind, once, handler)
    }

    /// Remove one subscription. Returns whether it was present.
    pub fn off(&mut self, id: WatcherId, kind: EventKind, handler: HandlerId) -> Result<bool, Error> {
        Ok(self.watcher_mut(id)?.subscriptions.remove(kind, handler))
    }

    /// Remove one subscription by event name.
    pub fn off_named(
        &mut self,
        id: WatcherId,
        name: &str,
        handler: HandlerId,
    ) -> Result<bool, Error> {
        let kind = name.parse()?;
        self.off(id, kind, handler)
    }

    /// Manual update: recompute the viewport and run both passes.
    pub fn update(&mut self) -> UpdateReport {
        self.run(None, false)
    }

    /// Re-resolve every watcher's geometry, even if the document extent looks unchanged,
    /// then update. Use after layout changes the host cannot report.
    pub fn recalculate_locations(&mut self) -> UpdateReport {
        tracing::debug!("recalculating all watcher locations");
        self.run(None, true)
    }

    /// Host scroll notification.
    pub fn on_host_scroll(&mut self) -> UpdateReport {
        self.run(Some(Signal::Scroll), false)
    }

    /// Host resize notification at `now` (monotonic, any epoch).
    ///
    /// Bursts collapse: the update runs once notifications stop for
    /// [`MonitorConfig::resize_settle`].
    pub fn on_host_resize(&mut self, now: Duration) {
        self.resize.schedule(now);
        tracing::trace!(deadline = ?self.resize.deadline(), "resize scheduled");
    }

    /// Run a settled resize update if one is due at `now`.
    pub fn poll(&mut self, now: Duration) -> Option<UpdateReport> {
        self.resize
            .poll(now)
            .then(|| self.run(Some(Signal::Resize), false))
    }

    /// When [`Monitor::poll`] next has work to do.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.resize.deadline()
    }

    /// Re-resolve one watcher now and dispatch its location change, if any.
    ///
    /// Updates requested by its handlers run before this returns. Locked watchers are left
    /// untouched.
    pub fn recalculate_location(&mut self, id: WatcherId) -> Result<UpdateReport, Error> {
        let watcher = self.watchers.get_mut(&id).ok_or(Error::UnknownWatcher(id))?;
        if watcher.locked {
            return Ok(core::mem::take(&mut self.pending));
        }
        let span = geometry::resolve(
            &mut self.host,
            &watcher.target,
            watcher.offsets,
            &self.viewport,
        )
        .map_err(|_| Error::UnresolvableTarget { watcher: Some(id) })?;
        watcher.relocate(span);
        let mut report = core::mem::take(&mut self.pending);
        let moved = watcher.take_location_change();
        if moved {
            self.fire(id, EventKind::LocationChange, &mut report);
            self.apply_commands(&mut report);
        }
        self.drain_deferred(&mut report);
        Ok(report)
    }

    /// Re-measure an element target's height, keeping its resolved top.
    ///
    /// A no-op for position and region targets and for locked watchers.
    pub fn recalculate_size(&mut self, id: WatcherId) -> Result<(), Error> {
        let watcher = self.watchers.get_mut(&id).ok_or(Error::UnknownWatcher(id))?;
        if watcher.locked {
            return Ok(());
        }
        if let Target::Element(element) = &watcher.target {
            let rect = geometry::measure(&mut self.host, element)
                .ok_or(Error::UnresolvableTarget { watcher: Some(id) })?;
            let height = rect.height() + watcher.offsets.top + watcher.offsets.bottom;
            watcher.span.bottom = watcher.span.top + height;
        }
        Ok(())
    }

    fn watcher_mut(&mut self, id: WatcherId) -> Result<&mut Watcher<H>, Error> {
        self.watchers.get_mut(&id).ok_or(Error::UnknownWatcher(id))
    }

    pub(crate) fn next_handler_id(&self) -> HandlerId {
        let id = self.next_handler.get();
        self.next_handler.set(id + 1);
        HandlerId(id)
    }

    /// Attach a subscription, running it first if the watcher already satisfies `kind`.
    fn attach(
        &mut self,
        id: WatcherId,
        kind: EventKind,
        once: bool,
        handler_id: HandlerId,
        mut handler: Handler<H>,
        report: &mut UpdateReport,
    ) -> Result<(), Error> {
        let watcher = self.watchers.get(&id).ok_or(Error::UnknownWatcher(id))?;
        if watcher.visibility.satisfies(kind) {
            let event = Event {
                monitor: &*self,
                watcher,
                kind,
                signal: self.latest_signal,
            };
            if let Err(error) = handler(&event) {
                tracing::warn!(
                    watcher = id.get(),
                    kind = kind.as_str(),
                    %error,
                    "viewport handler failed at subscription"
                );
                report.failures.push(HandlerFailure {
                    watcher: id,
                    kind,
                    handler: handler_id,
                    error,
                });
            }
            if once {
                return Ok(());
            }
        }
        self.watcher_mut(id)?.subscriptions.push(
            kind,
            Subscription {
                id: handler_id,
                once,
                handler,
            },
        );
        Ok(())
    }

    /// Apply changes handlers queued through [`Event`], including any queued while applying.
    fn apply_commands(&mut self, report: &mut UpdateReport) {
        loop {
            let commands = core::mem::take(&mut self.deferred.get_mut().commands);
            if commands.is_empty() {
                break;
            }
            for command in commands {
                let applied = match command {
                    Command::Subscribe {
                        watcher,
                        kind,
                        once,
                        id,
                        handler,
                    } => self.attach(watcher, kind, once, id, handler, report),
                    Command::Off {
                        watcher,
                        kind,
                        handler,
                    } => self.off(watcher, kind, handler).map(|_| ()),
                    Command::Lock(watcher) => self.lock(watcher),
                    Command::Unlock(watcher) => self.unlock(watcher),
                    Command::Destroy(watcher) => self.destroy(watcher),
                };
                if let Err(error) = applied {
                    tracing::debug!(%error, "handler command skipped");
                }
            }
        }
    }

    /// Run the update rounds handlers asked for, up to the configured limit.
    fn drain_deferred(&mut self, report: &mut UpdateReport) {
        let mut nested = 0;
        loop {
            self.apply_commands(report);
            let Some(force) = self.deferred.get_mut().take_request() else {
                break;
            };
            if nested >= self.config.max_nested_updates {
                tracing::warn!(
                    rounds = report.rounds,
                    "nested viewport updates exceeded the configured limit"
                );
                break;
            }
            nested += 1;
            self.round(force, report);
        }
    }

    fn run(&mut self, signal: Option<Signal>, force: bool) -> UpdateReport {
        self.latest_signal = signal;
        let mut report = core::mem::take(&mut self.pending);
        self.round(force, &mut report);
        self.drain_deferred(&mut report);
        report
    }

    fn round(&mut self, force: bool, report: &mut UpdateReport) {
        if force {
            self.viewport.invalidate_document_height();
        }
        if self.viewport.recompute(&self.host) {
            self.relocate_all(report);
        }
        self.update_all(report);
        report.rounds += 1;
    }

    /// Re-resolve every unlocked watcher, newest first.
    fn relocate_all(&mut self, report: &mut UpdateReport) {
        for watcher in self.watchers.values_mut().rev() {
            if watcher.locked {
                continue;
            }
            match geometry::resolve(
                &mut self.host,
                &watcher.target,
                watcher.offsets,
                &self.viewport,
            ) {
                Ok(span) => watcher.relocate(span),
                Err(_) => {
                    tracing::warn!(
                        watcher = watcher.id.get(),
                        "target became unresolvable; keeping previous geometry"
                    );
                    report.unresolved.push(watcher.id);
                }
            }
        }
    }

    fn update_all(&mut self, report: &mut UpdateReport) {
        for watcher in self.watchers.values_mut() {
            watcher.update(&self.viewport);
        }
        let pending: Vec<(WatcherId, Vec<EventKind>)> = self
            .watchers
            .values_mut()
            .map(|w| (w.id, w.take_transitions()))
            .filter(|(_, kinds)| !kinds.is_empty())
            .collect();
        for (id, kinds) in pending {
            for kind in kinds {
                self.fire(id, kind, report);
                self.apply_commands(report);
            }
        }
    }
}
