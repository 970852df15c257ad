// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host binding: where scroll offsets, extents and element geometry come from.
//!
//! The monitor never performs layout. It reads everything through [`Host`], and the
//! host forwards its scroll and resize notifications to
//! [`Monitor::on_host_scroll`](crate::monitor::Monitor::on_host_scroll) and
//! [`Monitor::on_host_resize`](crate::monitor::Monitor::on_host_resize).
//!
//! [`MemoryHost`] is a small in-memory document, handy for tests, demos and headless use.

use alloc::vec::Vec;

use kurbo::Rect;

bitflags::bitflags! {
    /// Signals a host is able to deliver.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct HostCapabilities: u8 {
        /// The host reports scroll notifications.
        const SCROLL = 0b0000_0001;
        /// The host reports resize notifications.
        const RESIZE = 0b0000_0010;
    }
}

impl HostCapabilities {
    /// What [`Monitor::new`](crate::monitor::Monitor::new) requires.
    pub const REQUIRED: Self = Self::SCROLL.union(Self::RESIZE);
}

/// Geometry provider for a scrollable document.
pub trait Host {
    /// Handle to an element the host can measure.
    type Element;

    /// Signals this host delivers to the monitor.
    fn capabilities(&self) -> HostCapabilities;

    /// Current vertical scroll offset.
    fn scroll_top(&self) -> f64;

    /// Height of the visible region.
    fn viewport_height(&self) -> f64;

    /// Total scrollable extent of the document.
    fn document_height(&self) -> f64;

    /// Bounding rectangle of `element` relative to the visible region.
    ///
    /// Returns `None` when the element cannot be measured (for example, it was detached).
    fn element_rect(&self, element: &Self::Element) -> Option<Rect>;

    /// Whether `element` is currently excluded from layout (and therefore measures as empty).
    fn is_layout_suppressed(&self, _element: &Self::Element) -> bool {
        false
    }

    /// Toggle layout suppression for `element`.
    ///
    /// Called in pairs around a measurement of a suppressed element.
    fn set_layout_suppressed(&mut self, _element: &Self::Element, _suppressed: bool) {}
}

/// Handle to an element of a [`MemoryHost`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementId(usize);

#[derive(Clone, Debug)]
struct ElementSlot {
    bounds: Rect, // document space
    suppressed: bool,
}

/// An in-memory document.
///
/// Elements are stored in document coordinates and reported relative to the
/// current scroll offset. A layout-suppressed element measures as [`Rect::ZERO`],
/// mirroring how hidden content collapses in a real layout engine.
#[derive(Clone, Debug)]
pub struct MemoryHost {
    scroll_top: f64,
    viewport_height: f64,
    document_height: f64,
    capabilities: HostCapabilities,
    elements: Vec<Option<ElementSlot>>,
    suppression_toggles: usize,
}

impl MemoryHost {
    /// Create a document of `document_height`, scrolled to the top, showing `viewport_height`.
    pub fn new(viewport_height: f64, document_height: f64) -> Self {
        Self {
            scroll_top: 0.0,
            viewport_height,
            document_height,
            capabilities: HostCapabilities::all(),
            elements: Vec::new(),
            suppression_toggles: 0,
        }
    }

    /// Override the reported capabilities.
    pub fn with_capabilities(mut self, capabilities: HostCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the scroll offset.
    pub fn set_scroll_top(&mut self, y: f64) {
        self.scroll_top = y;
    }

    /// Set the height of the visible region.
    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height;
    }

    /// Set the document extent.
    pub fn set_document_height(&mut self, height: f64) {
        self.document_height = height;
    }

    /// Add an element with document-space `bounds`.
    pub fn add_element(&mut self, bounds: Rect) -> ElementId {
        self.elements.push(Some(ElementSlot {
            bounds,
            suppressed: false,
        }));
        ElementId(self.elements.len() - 1)
    }

    /// Move an element. Ignored for detached elements.
    pub fn set_element_bounds(&mut self, element: ElementId, bounds: Rect) {
        if let Some(Some(slot)) = self.elements.get_mut(element.0) {
            slot.bounds = bounds;
        }
    }

    /// Remove an element from the document; later measurements fail.
    pub fn detach(&mut self, element: ElementId) {
        if let Some(slot) = self.elements.get_mut(element.0) {
            *slot = None;
        }
    }

    /// Number of suppression toggles performed so far.
    pub fn suppression_toggles(&self) -> usize {
        self.suppression_toggles
    }
}

impl Host for MemoryHost {
    type Element = ElementId;

    fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn document_height(&self) -> f64 {
        self.document_height
    }

    fn element_rect(&self, element: &ElementId) -> Option<Rect> {
        let slot = self.elements.get(element.0)?.as_ref()?;
        if slot.suppressed {
            return Some(Rect::ZERO);
        }
        Some(slot.bounds - kurbo::Vec2::new(0.0, self.scroll_top))
    }

    fn is_layout_suppressed(&self, element: &ElementId) -> bool {
        matches!(self.elements.get(element.0), Some(Some(slot)) if slot.suppressed)
    }

    fn set_layout_suppressed(&mut self, element: &ElementId, suppressed: bool) {
        if let Some(Some(slot)) = self.elements.get_mut(element.0) {
            slot.suppressed = suppressed;
            self.suppression_toggles += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_rect_is_relative_to_scroll() {
        let mut host = MemoryHost::new(800.0, 4000.0);
        let el = host.add_element(Rect::new(0.0, 1000.0, 50.0, 1100.0));
        host.set_scroll_top(900.0);
        assert_eq!(
            host.element_rect(&el),
            Some(Rect::new(0.0, 100.0, 50.0, 200.0))
        );
    }

    #[test]
    fn suppressed_element_measures_empty() {
        let mut host = MemoryHost::new(800.0, 4000.0);
        let el = host.add_element(Rect::new(0.0, 10.0, 50.0, 20.0));
        host.set_layout_suppressed(&el, true);
        assert!(host.is_layout_suppressed(&el));
        assert_eq!(host.element_rect(&el), Some(Rect::ZERO));
    }

    #[test]
    fn detached_element_cannot_be_measured() {
        let mut host = MemoryHost::new(800.0, 4000.0);
        let el = host.add_element(Rect::new(0.0, 10.0, 50.0, 20.0));
        host.detach(el);
        assert_eq!(host.element_rect(&el), None);
        assert!(!host.is_layout_suppressed(&el));
    }

    #[test]
    fn required_capabilities() {
        assert!(HostCapabilities::all().contains(HostCapabilities::REQUIRED));
        assert!(!HostCapabilities::SCROLL.contains(HostCapabilities::REQUIRED));
    }
}
