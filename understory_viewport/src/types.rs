// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the monitor: identifiers, event kinds, and host signals.
//!
//! ## Overview
//!
//! These types name the things a caller holds on to ([`WatcherId`], [`HandlerId`]) and the
//! fixed vocabulary of transitions a watcher can report ([`EventKind`]).

use core::fmt;
use core::str::FromStr;

use crate::error::Error;

/// Identifier for a registered watcher.
///
/// Returned by [`Monitor::watch`](crate::monitor::Monitor::watch). Identifiers are
/// allocated from a monotonically increasing counter and never reused, so a
/// stale id can never alias a newer watcher. Ordering follows registration order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct WatcherId(pub(crate) u64);

impl WatcherId {
    /// Raw counter value, useful for logging.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Identifier for a single subscription.
///
/// Returned by [`Monitor::on`](crate::monitor::Monitor::on) and friends, and passed back to
/// [`Monitor::off`](crate::monitor::Monitor::off) to remove exactly that subscription.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct HandlerId(pub(crate) u64);

/// The host signal that triggered the update currently being dispatched.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Signal {
    /// The host document scrolled.
    Scroll,
    /// A debounced burst of resize notifications settled.
    Resize,
}

/// Transition events a watcher can emit.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EventKind {
    /// Visibility toggled (entered or left the viewport, or skipped across it).
    VisibilityChange,
    /// Some part of the watched region became visible.
    EnterViewport,
    /// The whole watched region became visible.
    FullyEnterViewport,
    /// The watched region is no longer visible at all.
    ExitViewport,
    /// The watched region stopped being fully visible.
    PartiallyExitViewport,
    /// Resolved geometry changed after the first resolution.
    LocationChange,
    /// Any of the four visibility flags changed.
    StateChange,
}

impl EventKind {
    /// Number of event kinds.
    pub const COUNT: usize = 7;

    /// Every event kind, in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::VisibilityChange,
        Self::EnterViewport,
        Self::FullyEnterViewport,
        Self::ExitViewport,
        Self::PartiallyExitViewport,
        Self::LocationChange,
        Self::StateChange,
    ];

    /// Comma separated list of every valid event name, as accepted by [`FromStr`].
    pub const VALID_NAMES: &'static str = "visibilityChange, enterViewport, fullyEnterViewport, \
         exitViewport, partiallyExitViewport, locationChange, stateChange";

    /// Canonical name of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VisibilityChange => "visibilityChange",
            Self::EnterViewport => "enterViewport",
            Self::FullyEnterViewport => "fullyEnterViewport",
            Self::ExitViewport => "exitViewport",
            Self::PartiallyExitViewport => "partiallyExitViewport",
            Self::LocationChange => "locationChange",
            Self::StateChange => "stateChange",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| Error::InvalidEventType { name: name.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
        }
    }

    #[test]
    fn valid_names_lists_every_kind() {
        for kind in EventKind::ALL {
            assert!(
                EventKind::VALID_NAMES.contains(kind.as_str()),
                "missing {kind}"
            );
        }
    }

    #[test]
    fn unknown_name_is_rejected_with_valid_set() {
        let err = "scroll".parse::<EventKind>().unwrap_err();
        assert_eq!(
            err,
            Error::InvalidEventType {
                name: "scroll".into()
            }
        );
        let message = err.to_string();
        assert!(message.contains("scroll"));
        assert!(message.contains(EventKind::VALID_NAMES));
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!("EnterViewport".parse::<EventKind>().is_err());
    }

    #[test]
    fn index_matches_position_in_all() {
        for (i, kind) in EventKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn watcher_ids_order_by_registration() {
        assert!(WatcherId(1) < WatcherId(2));
        assert_eq!(WatcherId(7).get(), 7);
    }
}
