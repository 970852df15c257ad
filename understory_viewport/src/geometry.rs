// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry resolution: turn a watch target plus offsets into an absolute vertical span.
//!
//! ## Target kinds
//!
//! - [`Target::Element`]: measured through [`Host::element_rect`], which reports a rectangle
//!   relative to the visible region; the current viewport top converts it to document space.
//! - [`Target::Position`]: a positive value is an absolute position; a non-positive value is
//!   measured from the document height (`document_height - value`).
//! - [`Target::Region`]: an explicit span, copied verbatim.
//!
//! Offsets then grow the span (`top - offsets.top`, `bottom + offsets.bottom`). Negative offsets shrink it.

use crate::error::Error;
use crate::host::Host;
use crate::viewport::Viewport;

/// A vertical extent in document coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Span {
    /// Top edge (smaller y).
    pub top: f64,
    /// Bottom edge (larger y).
    pub bottom: f64,
}

impl Span {
    /// Create a span from its edges.
    pub const fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    /// A zero-height span at `y`.
    pub const fn point(y: f64) -> Self {
        Self { top: y, bottom: y }
    }

    /// `bottom - top`.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Margins that expand (or, when negative, shrink) the watched span.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Offsets {
    /// Subtracted from the resolved top.
    pub top: f64,
    /// Added to the resolved bottom.
    pub bottom: f64,
}

impl Offsets {
    /// No expansion.
    pub const ZERO: Self = Self {
        top: 0.0,
        bottom: 0.0,
    };

    /// Explicit top and bottom margins.
    pub const fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    /// The same margin on both edges.
    pub const fn uniform(margin: f64) -> Self {
        Self {
            top: margin,
            bottom: margin,
        }
    }

    fn apply(self, span: Span) -> Span {
        Span {
            top: span.top - self.top,
            bottom: span.bottom + self.bottom,
        }
    }
}

impl From<f64> for Offsets {
    fn from(margin: f64) -> Self {
        Self::uniform(margin)
    }
}

impl From<(f64, f64)> for Offsets {
    fn from((top, bottom): (f64, f64)) -> Self {
        Self::new(top, bottom)
    }
}

/// What a watcher observes.
#[derive(Clone, Debug, PartialEq)]
pub enum Target<E> {
    /// A host element, measured on every resolution.
    Element(E),
    /// A scalar position; non-positive values count from the bottom of the document.
    Position(f64),
    /// An explicit region in document coordinates.
    Region(Span),
}

impl<E> From<Span> for Target<E> {
    fn from(span: Span) -> Self {
        Self::Region(span)
    }
}

/// Resolve `target` to an absolute span with `offsets` applied.
pub(crate) fn resolve<H: Host>(
    host: &mut H,
    target: &Target<H::Element>,
    offsets: Offsets,
    viewport: &Viewport,
) -> Result<Span, Error> {
    let raw = match target {
        Target::Element(element) => {
            let rect = measure(host, element).ok_or(Error::UnresolvableTarget { watcher: None })?;
            Span::new(rect.y0 + viewport.top(), rect.y1 + viewport.top())
        }
        Target::Position(y) if *y > 0.0 => Span::point(*y),
        Target::Position(y) => Span::point(viewport.document_height() - y),
        Target::Region(span) => *span,
    };
    Ok(offsets.apply(raw))
}

/// Measure an element, lifting layout suppression for the duration of the query.
pub(crate) fn measure<H: Host>(host: &mut H, element: &H::Element) -> Option<kurbo::Rect> {
    let suppressed = host.is_layout_suppressed(element);
    if suppressed {
        host.set_layout_suppressed(element, false);
    }
    let rect = host.element_rect(element);
    if suppressed {
        host.set_layout_suppressed(element, true);
    }
    rect
}
