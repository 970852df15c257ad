// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport state: the visible slice of the document.

use crate::host::Host;

/// The visible region of the host document, in document coordinates.
///
/// One instance is owned by each [`Monitor`](crate::monitor::Monitor). It is
/// recomputed on every scroll, settled resize, and manual update.
///
/// Invariant: `bottom == top + height` after every recomputation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Viewport {
    top: f64,
    bottom: f64,
    height: f64,
    document_height: f64,
    // `None` until the first recomputation, or after invalidation.
    previous_document_height: Option<f64>,
}

impl Viewport {
    /// Top of the visible region.
    pub fn top(&self) -> f64 {
        self.top
    }

    /// Bottom of the visible region.
    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    /// Height of the visible region.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Total scrollable extent of the document.
    pub fn document_height(&self) -> f64 {
        self.document_height
    }

    /// Re-read scroll offset, visible height and document extent from `host`.
    ///
    /// Returns `true` when the document extent differs from the last recomputation
    /// (or nothing was cached), meaning absolute positions may have shifted and every
    /// watcher must be re-resolved.
    pub(crate) fn recompute<H: Host>(&mut self, host: &H) -> bool {
        self.height = host.viewport_height();
        self.top = host.scroll_top();
        self.bottom = self.top + self.height;
        self.document_height = host.document_height();
        let changed = self.previous_document_height != Some(self.document_height);
        self.previous_document_height = Some(self.document_height);
        changed
    }

    /// Forget the cached document extent so the next recomputation reports a change.
    pub(crate) fn invalidate_document_height(&mut self) {
        self.previous_document_height = None;
    }
}
