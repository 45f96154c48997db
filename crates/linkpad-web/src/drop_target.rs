#![forbid(unsafe_code)]

//! Drop target resolution and the caller-side drop contract.
//!
//! [`DropTargetCoordinator`] asks a [`HitTester`] what is under a point and a
//! caller predicate whether that element accepts drops. [`DropSink`] is the
//! receiving side: the controller reports hover, leave, and release to it.

use std::fmt;

use linkpad_core::{NodeKind, Point, Rect};

/// Point-based element lookup (the DOM's `elementFromPoint`).
pub trait HitTester {
    type Element;

    fn element_at(&self, point: Point) -> Option<Self::Element>;
}

/// Stateless wrapper that turns a hit test plus a predicate into a yes/no.
#[derive(Debug, Clone, Default)]
pub struct DropTargetCoordinator<H> {
    hit_tester: H,
}

impl<H: HitTester> DropTargetCoordinator<H> {
    #[must_use]
    pub const fn new(hit_tester: H) -> Self {
        Self { hit_tester }
    }

    #[must_use]
    pub const fn hit_tester(&self) -> &H {
        &self.hit_tester
    }

    pub fn hit_tester_mut(&mut self) -> &mut H {
        &mut self.hit_tester
    }

    /// Whether the element under `point` satisfies `predicate`.
    ///
    /// Returns `false` without calling `predicate` when nothing is under the point.
    pub fn is_drop_target(
        &self,
        point: Point,
        predicate: impl FnOnce(&H::Element) -> bool,
    ) -> bool {
        self.hit_tester
            .element_at(point)
            .is_some_and(|element| predicate(&element))
    }
}

/// Z-ordered rectangles standing in for a DOM. Later regions are on top.
#[derive(Debug, Clone)]
pub struct RectHitTester<E> {
    regions: Vec<(Rect, E)>,
}

impl<E> Default for RectHitTester<E> {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
        }
    }
}

impl<E> RectHitTester<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region above every existing one.
    pub fn push(&mut self, rect: Rect, element: E) {
        self.regions.push((rect, element));
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl<E: Clone> HitTester for RectHitTester<E> {
    type Element = E;

    fn element_at(&self, point: Point) -> Option<E> {
        self.regions
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(point))
            .map(|(_, element)| element.clone())
    }
}

/// Payload of a hover report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOverEvent {
    pub pointer_id: u32,
    /// Pointer position in viewport coordinates.
    pub position: Point,
    /// Where the ghost currently is.
    pub ghost_rect: Rect,
}

/// Error returned by a [`DropSink`] callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropSinkError {
    message: String,
}

impl DropSinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DropSinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DropSinkError {}

/// Receiver of drag events, usually the editor canvas.
///
/// `drop` is called on every release of a drag, whether or not the last
/// hover was over an accepting element; the sink decides what to do.
pub trait DropSink<E: ?Sized> {
    /// Whether `element` is a place this sink accepts drops on.
    fn accepts(&self, element: &E) -> bool;

    fn drag_over(&mut self, event: &DragOverEvent, kind: NodeKind) -> Result<(), DropSinkError>;

    fn drag_leave(&mut self) -> Result<(), DropSinkError>;

    fn drop(&mut self, kind: NodeKind) -> Result<(), DropSinkError>;
}
