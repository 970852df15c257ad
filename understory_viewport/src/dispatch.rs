// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event dispatch: per-watcher subscriber lists and the handler context.
//!
//! ## Ordering
//!
//! Handlers for one event kind run in registration order. The list is detached from its
//! watcher while it runs. One-shot subscriptions are dropped once invoked, whether or not the
//! handler failed.
//!
//! ## Handler commands
//!
//! Handlers only hold a shared borrow of the monitor. Changes they ask for through [`Event`]
//! (subscribe, unsubscribe, lock, unlock, destroy) are queued and applied as soon as the
//! in-flight event's handler list has finished, so a handler subscribed mid-dispatch never
//! sees the event that registered it, and a destroyed watcher receives nothing further.
//! Update requests run as extra rounds once the whole pass is over.
//!
//! ## Failures
//!
//! A handler returning [`HandlerError`] is logged and recorded in the
//! [`UpdateReport`](crate::monitor::UpdateReport); the remaining handlers and watchers still run.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::HandlerError;
use crate::host::Host;
use crate::monitor::{HandlerFailure, Monitor, UpdateReport};
use crate::types::{EventKind, HandlerId, Signal, WatcherId};
use crate::watcher::Watcher;

/// Boxed subscription handler.
pub type Handler<H> = Box<dyn FnMut(&Event<'_, H>) -> Result<(), HandlerError>>;

pub(crate) struct Subscription<H: Host> {
    pub(crate) id: HandlerId,
    pub(crate) once: bool,
    pub(crate) handler: Handler<H>,
}

/// Ordered subscriber lists, one per [`EventKind`].
pub(crate) struct Subscriptions<H: Host> {
    lists: [Vec<Subscription<H>>; EventKind::COUNT],
}

impl<H: Host> core::fmt::Debug for Subscriptions<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for kind in EventKind::ALL {
            let n = self.len(kind);
            if n > 0 {
                map.entry(&kind, &n);
            }
        }
        map.finish()
    }
}

impl<H: Host> Subscriptions<H> {
    pub(crate) fn new() -> Self {
        Self {
            lists: core::array::from_fn(|_| Vec::new()),
        }
    }

    pub(crate) fn len(&self, kind: EventKind) -> usize {
        self.lists[kind.index()].len()
    }

    pub(crate) fn push(&mut self, kind: EventKind, subscription: Subscription<H>) {
        self.lists[kind.index()].push(subscription);
    }

    /// Remove the subscription with `id`; returns whether one was found.
    pub(crate) fn remove(&mut self, kind: EventKind, id: HandlerId) -> bool {
        let list = &mut self.lists[kind.index()];
        match list.iter().position(|s| s.id == id) {
            Some(i) => {
                list.remove(i);
                true
            }
            None => false,
        }
    }

    /// Detach the list for `kind` so it can run while the watcher is borrowed shared.
    fn take(&mut self, kind: EventKind) -> Vec<Subscription<H>> {
        core::mem::take(&mut self.lists[kind.index()])
    }

    /// Reattach a list detached by [`Self::take`].
    ///
    /// Nothing can be pushed in between: handler commands are applied after this.
    fn restore(&mut self, kind: EventKind, list: Vec<Subscription<H>>) {
        self.lists[kind.index()] = list;
    }

    pub(crate) fn clear(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
    }
}

/// A change a handler asked for, applied once the in-flight event is done.
pub(crate) enum Command<H: Host> {
    Subscribe {
        watcher: WatcherId,
        kind: EventKind,
        once: bool,
        id: HandlerId,
        handler: Handler<H>,
    },
    Off {
        watcher: WatcherId,
        kind: EventKind,
        handler: HandlerId,
    },
    Lock(WatcherId),
    Unlock(WatcherId),
    Destroy(WatcherId),
}

impl<H: Host> core::fmt::Debug for Command<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Subscribe {
                watcher, kind, id, ..
            } => f
                .debug_struct("Subscribe")
                .field("watcher", watcher)
                .field("kind", kind)
                .field("id", id)
                .finish_non_exhaustive(),
            Self::Off {
                watcher,
                kind,
                handler,
            } => f
                .debug_struct("Off")
                .field("watcher", watcher)
                .field("kind", kind)
                .field("handler", handler)
                .finish(),
            Self::Lock(w) => f.debug_tuple("Lock").field(w).finish(),
            Self::Unlock(w) => f.debug_tuple("Unlock").field(w).finish(),
            Self::Destroy(w) => f.debug_tuple("Destroy").field(w).finish(),
        }
    }
}

/// Work handlers queued while the monitor was borrowed shared.
#[derive(Debug)]
pub(crate) struct Deferred<H: Host> {
    pub(crate) update: bool,
    pub(crate) recalculate: bool,
    pub(crate) commands: Vec<Command<H>>,
}

impl<H: Host> Default for Deferred<H> {
    fn default() -> Self {
        Self {
            update: false,
            recalculate: false,
            commands: Vec::new(),
        }
    }
}

impl<H: Host> Deferred<H> {
    /// Consume a pending update request. `Some(true)` asks for forced re-resolution.
    pub(crate) fn take_request(&mut self) -> Option<bool> {
        let requested = (self.update || self.recalculate).then_some(self.recalculate);
        self.update = false;
        self.recalculate = false;
        requested
    }
}

/// Context handed to every handler invocation.
///
/// Gives read access to the firing watcher and the whole monitor. Every watcher has
/// finished its update pass before any handler runs, so cross-watcher reads are consistent.
/// Mutations go through the queueing methods below.
pub struct Event<'a, H: Host> {
    pub(crate) monitor: &'a Monitor<H>,
    pub(crate) watcher: &'a Watcher<H>,
    pub(crate) kind: EventKind,
    pub(crate) signal: Option<Signal>,
}

impl<H: Host> core::fmt::Debug for Event<'_, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("watcher", &self.watcher.id)
            .field("signal", &self.signal)
            .finish_non_exhaustive()
    }
}

impl<'a, H: Host> Event<'a, H> {
    /// Which event fired.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The watcher the event fired on.
    pub fn watcher(&self) -> &'a Watcher<H> {
        self.watcher
    }

    /// The host signal behind the current update, if any.
    ///
    /// `None` for manual updates and for handlers run at subscription time before any signal.
    pub fn signal(&self) -> Option<Signal> {
        self.signal
    }

    /// The monitor, for inspecting other watchers or the viewport.
    pub fn monitor(&self) -> &'a Monitor<H> {
        self.monitor
    }

    /// Ask for another update once the current pass completes.
    pub fn request_update(&self) {
        self.monitor.deferred.borrow_mut().update = true;
    }

    /// Ask for a full geometry recalculation once the current pass completes.
    pub fn request_recalculate(&self) {
        self.monitor.deferred.borrow_mut().recalculate = true;
    }

    /// Subscribe `handler` to `kind` on this watcher.
    ///
    /// The subscription is attached after the in-flight event; it then follows the same
    /// immediate-fire rule as [`Monitor::subscribe`].
    pub fn subscribe<F>(&self, kind: EventKind, once: bool, handler: F) -> HandlerId
    where
        F: FnMut(&Event<'_, H>) -> Result<(), HandlerError> + 'static,
    {
        let id = self.monitor.next_handler_id();
        self.queue(Command::Subscribe {
            watcher: self.watcher.id,
            kind,
            once,
            id,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a subscription from this watcher once the in-flight event is done.
    pub fn off(&self, kind: EventKind, handler: HandlerId) {
        self.queue(Command::Off {
            watcher: self.watcher.id,
            kind,
            handler,
        });
    }

    /// Freeze this watcher's geometry.
    pub fn lock(&self) {
        self.queue(Command::Lock(self.watcher.id));
    }

    /// Resume geometry resolution for this watcher.
    pub fn unlock(&self) {
        self.queue(Command::Unlock(self.watcher.id));
    }

    /// Destroy this watcher. It receives no further events, including the rest of this pass.
    pub fn destroy(&self) {
        self.queue(Command::Destroy(self.watcher.id));
    }

    fn queue(&self, command: Command<H>) {
        self.monitor.deferred.borrow_mut().commands.push(command);
    }
}

impl<H: Host> Monitor<H> {
    /// Run every handler subscribed to `kind` on watcher `id`.
    ///
    /// Does nothing (and records nothing) once the watcher is gone.
    pub(crate) fn fire(&mut self, id: WatcherId, kind: EventKind, report: &mut UpdateReport) {
        let Some(watcher) = self.watchers.get_mut(&id) else {
            return;
        };
        tracing::trace!(watcher = id.get(), kind = kind.as_str(), "fire");
        report.fired.push((id, kind));

        let mut list = watcher.subscriptions.take(kind);
        if list.is_empty() {
            return;
        }

        if let Some(watcher) = self.watchers.get(&id) {
            let event = Event {
                monitor: &*self,
                watcher,
                kind,
                signal: self.latest_signal,
            };
            for subscription in &mut list {
                if let Err(error) = (subscription.handler)(&event) {
                    tracing::warn!(
                        watcher = id.get(),
                        kind = kind.as_str(),
                        %error,
                        "viewport handler failed"
                    );
                    report.failures.push(HandlerFailure {
                        watcher: id,
                        kind,
                        handler: subscription.id,
                        error,
                    });
                }
            }
        }

        list.retain(|s| !s.once);
        if let Some(watcher) = self.watchers.get_mut(&id) {
            watcher.subscriptions.restore(kind, list);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    fn noop(id: u64, once: bool) -> Subscription<MemoryHost> {
        Subscription {
            id: HandlerId(id),
            once,
            handler: Box::new(|_| Ok(())),
        }
    }

    #[test]
    fn remove_only_matching_id() {
        let mut subs: Subscriptions<MemoryHost> = Subscriptions::new();
        subs.push(EventKind::EnterViewport, noop(1, false));
        subs.push(EventKind::EnterViewport, noop(2, false));
        subs.push(EventKind::ExitViewport, noop(3, false));

        assert!(subs.remove(EventKind::EnterViewport, HandlerId(1)));
        assert!(!subs.remove(EventKind::EnterViewport, HandlerId(1)));
        // Wrong kind is a no-op.
        assert!(!subs.remove(EventKind::EnterViewport, HandlerId(3)));
        assert_eq!(subs.len(EventKind::EnterViewport), 1);
        assert_eq!(subs.len(EventKind::ExitViewport), 1);
    }

    #[test]
    fn take_then_restore_keeps_order() {
        let mut subs: Subscriptions<MemoryHost> = Subscriptions::new();
        subs.push(EventKind::StateChange, noop(1, false));
        subs.push(EventKind::StateChange, noop(2, true));
        let detached = subs.take(EventKind::StateChange);
        assert_eq!(subs.len(EventKind::StateChange), 0);
        subs.restore(EventKind::StateChange, detached);
        let ids: Vec<_> = subs.lists[EventKind::StateChange.index()]
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, [HandlerId(1), HandlerId(2)]);
    }

    #[test]
    fn clear_empties_every_kind() {
        let mut subs: Subscriptions<MemoryHost> = Subscriptions::new();
        for (i, kind) in EventKind::ALL.into_iter().enumerate() {
            subs.push(kind, noop(i as u64, i % 2 == 0));
        }
        subs.clear();
        assert!(EventKind::ALL.into_iter().all(|k| subs.len(k) == 0));
    }

    #[test]
    fn update_requests_are_consumed_once() {
        let mut d: Deferred<MemoryHost> = Deferred::default();
        assert_eq!(d.take_request(), None);
        d.update = true;
        assert_eq!(d.take_request(), Some(false));
        assert_eq!(d.take_request(), None);
        d.update = true;
        d.recalculate = true;
        assert_eq!(d.take_request(), Some(true));
    }
}
