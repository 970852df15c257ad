// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Watcher state machine: visibility flags and the transitions between them.
//!
//! ## Flags
//!
//! Every update recomputes four flags from the resolved span and the viewport. There is no
//! stored transition table; the flags are pure functions of geometry:
//!
//! - `ABOVE`: `top < viewport.top`
//! - `BELOW`: `bottom > viewport.bottom`
//! - `IN`: `top <= viewport.bottom && bottom >= viewport.top`
//! - `FULLY_IN`: contained in the viewport, or `ABOVE && BELOW` (taller than and straddling it)
//!
//! ## Transitions
//!
//! [`transitions`] compares the previous snapshot with the current flags and lists the events to
//! fire, in order. A single update that carries a short region from one side of the viewport to
//! the other flips both `ABOVE` and `BELOW`; that pass-through reports the enter and exit events it
//! skipped, so `FullyEnterViewport` and `PartiallyExitViewport` can fire in the same update.
//!
//! ```
//! use understory_viewport::types::EventKind;
//! use understory_viewport::watcher::{Visibility, transitions};
//!
//! let before = Visibility::IN | Visibility::FULLY_IN;
//! let after = Visibility::ABOVE;
//! assert_eq!(
//!     transitions(before, after),
//!     vec![
//!         EventKind::PartiallyExitViewport,
//!         EventKind::ExitViewport,
//!         EventKind::VisibilityChange,
//!         EventKind::StateChange,
//!     ]
//! );
//! ```

use alloc::vec::Vec;

use crate::dispatch::Subscriptions;
use crate::geometry::{Offsets, Span, Target};
use crate::host::Host;
use crate::types::{EventKind, WatcherId};
use crate::viewport::Viewport;

bitflags::bitflags! {
    /// Visibility of a watched span relative to the viewport.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Visibility: u8 {
        /// The top edge lies above the viewport.
        const ABOVE    = 0b0000_0001;
        /// The bottom edge lies below the viewport.
        const BELOW    = 0b0000_0010;
        /// Some part of the span is visible.
        const IN       = 0b0000_0100;
        /// The whole span is visible, or it straddles the whole viewport.
        const FULLY_IN = 0b0000_1000;
    }
}

impl Visibility {
    /// Compute the flags for `span` against `viewport`.
    pub fn of(span: Span, viewport: &Viewport) -> Self {
        let above = span.top < viewport.top();
        let below = span.bottom > viewport.bottom();
        let inside = span.top <= viewport.bottom() && span.bottom >= viewport.top();
        let contained = span.top >= viewport.top() && span.bottom <= viewport.bottom();
        let fully = contained || (above && below);

        let mut flags = Self::empty();
        flags.set(Self::ABOVE, above);
        flags.set(Self::BELOW, below);
        flags.set(Self::IN, inside);
        flags.set(Self::FULLY_IN, fully);
        flags
    }

    /// Whether subscribing to `kind` in this state runs the handler right away.
    pub fn satisfies(self, kind: EventKind) -> bool {
        let above = self.contains(Self::ABOVE);
        let inside = self.contains(Self::IN);
        match kind {
            EventKind::VisibilityChange | EventKind::ExitViewport => above && !inside,
            EventKind::EnterViewport => inside,
            EventKind::FullyEnterViewport => self.contains(Self::FULLY_IN),
            EventKind::PartiallyExitViewport => above,
            EventKind::LocationChange | EventKind::StateChange => false,
        }
    }
}

/// Events produced by moving from `was` to `now`, in firing order.
pub fn transitions(was: Visibility, now: Visibility) -> Vec<EventKind> {
    let entered = |flag| now.contains(flag) && !was.contains(flag);
    let left = |flag| was.contains(flag) && !now.contains(flag);
    let changed = was ^ now;

    let mut out = Vec::new();
    if entered(Visibility::IN) {
        out.push(EventKind::EnterViewport);
    }
    if entered(Visibility::FULLY_IN) {
        out.push(EventKind::FullyEnterViewport);
    }
    if changed.contains(Visibility::ABOVE | Visibility::BELOW) {
        out.push(EventKind::VisibilityChange);
        if !was.contains(Visibility::FULLY_IN) && !now.contains(Visibility::FULLY_IN) {
            out.push(EventKind::FullyEnterViewport);
            out.push(EventKind::PartiallyExitViewport);
        }
        if !was.contains(Visibility::IN) && !now.contains(Visibility::IN) {
            out.push(EventKind::EnterViewport);
            out.push(EventKind::ExitViewport);
        }
    }
    if left(Visibility::FULLY_IN) {
        out.push(EventKind::PartiallyExitViewport);
    }
    if left(Visibility::IN) {
        out.push(EventKind::ExitViewport);
    }
    if changed.contains(Visibility::IN) {
        out.push(EventKind::VisibilityChange);
    }
    if !changed.is_empty() {
        out.push(EventKind::StateChange);
    }
    out
}

/// A registered watch target and its derived state.
///
/// Owned by the [`Monitor`](crate::monitor::Monitor); callers read it through
/// [`Monitor::watcher`](crate::monitor::Monitor::watcher) or from inside a handler.
pub struct Watcher<H: Host> {
    pub(crate) id: WatcherId,
    pub(crate) target: Target<H::Element>,
    pub(crate) offsets: Offsets,
    pub(crate) span: Span,
    pub(crate) resolved: bool,
    pub(crate) locked: bool,
    pub(crate) visibility: Visibility,
    previous: Visibility,
    location_changed: bool,
    pub(crate) subscriptions: Subscriptions<H>,
}

impl<H: Host> core::fmt::Debug for Watcher<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id)
            .field("offsets", &self.offsets)
            .field("span", &self.span)
            .field("locked", &self.locked)
            .field("visibility", &self.visibility)
            .field("subscriptions", &self.subscriptions)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Watcher<H> {
    /// Build a watcher whose geometry is already resolved; the snapshot starts equal
    /// to the initial flags so registration fires nothing.
    pub(crate) fn new(
        id: WatcherId,
        target: Target<H::Element>,
        offsets: Offsets,
        span: Span,
        viewport: &Viewport,
    ) -> Self {
        let visibility = Visibility::of(span, viewport);
        Self {
            id,
            target,
            offsets,
            span,
            resolved: true,
            locked: false,
            visibility,
            previous: visibility,
            location_changed: false,
            subscriptions: Subscriptions::new(),
        }
    }

    /// This watcher's id.
    pub fn id(&self) -> WatcherId {
        self.id
    }

    /// What is being watched.
    pub fn target(&self) -> &Target<H::Element> {
        &self.target
    }

    /// Offsets applied on every resolution.
    pub fn offsets(&self) -> Offsets {
        self.offsets
    }

    /// Resolved span, offsets included.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Resolved top edge.
    pub fn top(&self) -> f64 {
        self.span.top
    }

    /// Resolved bottom edge.
    pub fn bottom(&self) -> f64 {
        self.span.bottom
    }

    /// Resolved height.
    pub fn height(&self) -> f64 {
        self.span.height()
    }

    /// Current visibility flags.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// The top edge is above the viewport.
    pub fn is_above_viewport(&self) -> bool {
        self.visibility.contains(Visibility::ABOVE)
    }

    /// The bottom edge is below the viewport.
    pub fn is_below_viewport(&self) -> bool {
        self.visibility.contains(Visibility::BELOW)
    }

    /// Some part of the span is visible.
    pub fn is_in_viewport(&self) -> bool {
        self.visibility.contains(Visibility::IN)
    }

    /// The whole span is visible (or straddles the viewport).
    pub fn is_fully_in_viewport(&self) -> bool {
        self.visibility.contains(Visibility::FULLY_IN)
    }

    /// Geometry is frozen.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Number of live subscriptions for `kind`.
    pub fn subscription_count(&self, kind: EventKind) -> usize {
        self.subscriptions.len(kind)
    }

    /// Store a freshly resolved span, queueing a location change when a bound moved.
    pub(crate) fn relocate(&mut self, span: Span) {
        if self.resolved && span != self.span {
            self.location_changed = true;
        }
        self.span = span;
        self.resolved = true;
    }

    /// Recompute the flags against `viewport`.
    pub(crate) fn update(&mut self, viewport: &Viewport) {
        self.visibility = Visibility::of(self.span, viewport);
    }

    /// Drain a queued location change.
    pub(crate) fn take_location_change(&mut self) -> bool {
        core::mem::take(&mut self.location_changed)
    }

    /// Events owed since the last call, then advance the snapshot.
    pub(crate) fn take_transitions(&mut self) -> Vec<EventKind> {
        let mut out = Vec::new();
        if self.take_location_change() {
            out.push(EventKind::LocationChange);
        }
        out.extend(transitions(self.previous, self.visibility));
        self.previous = self.visibility;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use alloc::vec;

    fn viewport(top: f64, height: f64) -> Viewport {
        let mut host = MemoryHost::new(height, 10_000.0);
        host.set_scroll_top(top);
        let mut vp = Viewport::default();
        let _ = vp.recompute(&host);
        vp
    }

    #[test]
    fn region_inside_viewport() {
        let vp = viewport(0.0, 800.0);
        let v = Visibility::of(Span::new(100.0, 200.0), &vp);
        assert_eq!(v, Visibility::IN | Visibility::FULLY_IN);
    }

    #[test]
    fn region_entirely_above() {
        let vp = viewport(1000.0, 800.0);
        let v = Visibility::of(Span::new(100.0, 200.0), &vp);
        assert!(v.contains(Visibility::ABOVE));
        assert!(!v.contains(Visibility::BELOW));
        assert!(!v.contains(Visibility::IN));
        assert!(!v.contains(Visibility::FULLY_IN));
    }

    #[test]
    fn straddling_region_is_fully_in() {
        let vp = viewport(1000.0, 800.0);
        let v = Visibility::of(Span::new(500.0, 3000.0), &vp);
        assert_eq!(v, Visibility::all());
    }

    #[test]
    fn partially_visible_at_bottom_edge() {
        let vp = viewport(0.0, 800.0);
        let v = Visibility::of(Span::new(700.0, 900.0), &vp);
        assert_eq!(v, Visibility::BELOW | Visibility::IN);
    }

    #[test]
    fn touching_edges_count_as_in() {
        let vp = viewport(100.0, 800.0);
        assert!(Visibility::of(Span::new(0.0, 100.0), &vp).contains(Visibility::IN));
        assert!(Visibility::of(Span::new(900.0, 950.0), &vp).contains(Visibility::IN));
    }

    #[test]
    fn fully_in_implies_in_across_positions() {
        let vp = viewport(1000.0, 800.0);
        let mut top = -500.0;
        while top < 3000.0 {
            for height in [0.0, 50.0, 800.0, 2000.0] {
                let v = Visibility::of(Span::new(top, top + height), &vp);
                if v.contains(Visibility::FULLY_IN) {
                    assert!(v.contains(Visibility::IN), "top={top} height={height}");
                }
            }
            top += 37.0;
        }
    }

    #[test]
    fn no_change_fires_nothing() {
        let v = Visibility::IN | Visibility::FULLY_IN;
        assert!(transitions(v, v).is_empty());
    }

    #[test]
    fn entering_from_below_fully() {
        let was = Visibility::BELOW;
        let now = Visibility::IN | Visibility::FULLY_IN;
        assert_eq!(
            transitions(was, now),
            vec![
                EventKind::EnterViewport,
                EventKind::FullyEnterViewport,
                EventKind::VisibilityChange,
                EventKind::StateChange,
            ]
        );
    }

    #[test]
    fn partial_exit_keeps_visibility() {
        let was = Visibility::IN | Visibility::FULLY_IN;
        let now = Visibility::IN | Visibility::ABOVE;
        assert_eq!(
            transitions(was, now),
            vec![EventKind::PartiallyExitViewport, EventKind::StateChange]
        );
    }

    #[test]
    fn pass_through_from_below_to_above() {
        let was = Visibility::BELOW;
        let now = Visibility::ABOVE;
        assert_eq!(
            transitions(was, now),
            vec![
                EventKind::VisibilityChange,
                EventKind::FullyEnterViewport,
                EventKind::PartiallyExitViewport,
                EventKind::EnterViewport,
                EventKind::ExitViewport,
                EventKind::StateChange,
            ]
        );
    }

    #[test]
    fn tall_region_flipping_both_edges_while_visible() {
        // Fully visible, then scrolled so it straddles the whole viewport.
        let was = Visibility::IN | Visibility::FULLY_IN;
        let now = Visibility::all();
        assert_eq!(
            transitions(was, now),
            vec![EventKind::VisibilityChange, EventKind::StateChange]
        );
    }

    #[test]
    fn immediate_conditions() {
        let visible = Visibility::IN | Visibility::FULLY_IN;
        assert!(visible.satisfies(EventKind::EnterViewport));
        assert!(visible.satisfies(EventKind::FullyEnterViewport));
        assert!(!visible.satisfies(EventKind::ExitViewport));

        let above = Visibility::ABOVE;
        assert!(above.satisfies(EventKind::ExitViewport));
        assert!(above.satisfies(EventKind::VisibilityChange));
        assert!(above.satisfies(EventKind::PartiallyExitViewport));

        let below = Visibility::BELOW;
        assert!(!below.satisfies(EventKind::ExitViewport));
        assert!(!below.satisfies(EventKind::VisibilityChange));

        for v in [visible, above, below, Visibility::all()] {
            assert!(!v.satisfies(EventKind::LocationChange));
            assert!(!v.satisfies(EventKind::StateChange));
        }
    }
}
