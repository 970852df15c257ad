// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types returned by the monitor and by subscription handlers.

use alloc::string::String;

use thiserror::Error;

use crate::host::HostCapabilities;
use crate::types::{EventKind, WatcherId};

/// Errors surfaced to callers of the [`Monitor`](crate::monitor::Monitor).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// An event name did not match any [`EventKind`].
    #[error("unknown event type `{name}`; valid types are: {valid}", valid = EventKind::VALID_NAMES)]
    InvalidEventType {
        /// The rejected name.
        name: String,
    },

    /// A watch target could not be resolved to geometry (for example a detached element).
    #[error("watch target cannot be resolved to geometry (watcher: {watcher:?})")]
    UnresolvableTarget {
        /// The affected watcher, or `None` when resolution failed during registration.
        watcher: Option<WatcherId>,
    },

    /// The id does not refer to a live watcher.
    #[error("no watcher registered for {0:?}")]
    UnknownWatcher(WatcherId),

    /// The host cannot deliver the signals the monitor relies on.
    #[error("host is missing required signal capabilities: {missing:?}")]
    MissingCapabilities {
        /// Capabilities the host lacks.
        missing: HostCapabilities,
    },
}

/// Failure reported by a subscription handler.
///
/// Handler failures never abort a dispatch pass; they are logged and collected
/// in [`UpdateReport::failures`](crate::monitor::UpdateReport::failures).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Create a handler error carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn missing_capabilities_names_flags() {
        let err = Error::MissingCapabilities {
            missing: HostCapabilities::RESIZE,
        };
        assert!(err.to_string().contains("RESIZE"));
    }

    #[test]
    fn handler_error_displays_message() {
        let err = HandlerError::from("boom");
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.message(), "boom");
    }
}
