#![forbid(unsafe_code)]

//! Declarative drag feedback.
//!
//! The controller keeps one [`DragVisual`] value and hands out a new snapshot
//! whenever it changes. Rendering it (a CSS overlay with a cut-out, an
//! absolutely positioned clone, a canvas layer) is the job of a
//! [`DragPresenter`].

use linkpad_core::Rect;

/// Opacity of a ghost that is not over a drop target.
pub const GHOST_OPAQUE: f32 = 1.0;

/// Direction of the overlay's fade animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayFade {
    In,
    Out,
}

/// Full-viewport translucent layer with a hole over the picked item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub mask: Rect,
    pub fade: OverlayFade,
}

/// Floating clone of the palette item that follows the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ghost {
    pub rect: Rect,
    pub opacity: f32,
}

/// Everything the presenter needs to draw the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragVisual {
    pub overlay: Option<Overlay>,
    pub ghost: Option<Ghost>,
}

impl DragVisual {
    pub const EMPTY: Self = Self {
        overlay: None,
        ghost: None,
    };

    /// Nothing to draw.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.overlay.is_none() && self.ghost.is_none()
    }

    /// Whether the ghost is dimmed (hovering a drop target).
    #[must_use]
    pub fn is_dimmed(&self) -> bool {
        self.ghost.is_some_and(|ghost| ghost.opacity < GHOST_OPAQUE)
    }
}

/// Swappable presentation layer for [`DragVisual`] snapshots.
pub trait DragPresenter {
    fn present(&mut self, visual: &DragVisual);
}

impl<P: DragPresenter + ?Sized> DragPresenter for &mut P {
    fn present(&mut self, visual: &DragVisual) {
        (**self).present(visual);
    }
}

/// Presenter that keeps every snapshot it is given.
///
/// Useful for hosts without a rendering surface and for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    frames: Vec<DragVisual>,
}

impl RecordingPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn frames(&self) -> &[DragVisual] {
        &self.frames
    }

    #[must_use]
    pub fn last(&self) -> Option<&DragVisual> {
        self.frames.last()
    }
}

impl DragPresenter for RecordingPresenter {
    fn present(&mut self, visual: &DragVisual) {
        self.frames.push(*visual);
    }
}
