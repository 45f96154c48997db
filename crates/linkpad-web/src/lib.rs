#![forbid(unsafe_code)]

//! `linkpad-web` is the browser-side interaction layer for the linkpad editor.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding page pushes pointer, scroll, and timer
//!   signals and applies the returned listener commands itself.
//! - **Deterministic time**: every call takes an explicit monotonic `now`.
//! - **No DOM**: hit testing and presentation are traits, so the whole
//!   gesture lifecycle runs in plain unit tests.
//!
//! The pieces:
//! - [`palette_drag`]: the pick-up/drag/drop state machine.
//! - [`drop_target`]: hit testing plus the [`DropSink`] callback contract.
//! - [`drag_visual`]: overlay and ghost as a value, rendered by a [`DragPresenter`].
//! - [`listeners`]: exactly-once attach/detach bookkeeping.
//! - [`editor_sink`]: a [`DropSink`] that drives a `linkpad_core::Editor`.

pub mod drag_visual;
pub mod drop_target;
pub mod editor_sink;
pub mod listeners;
pub mod palette_drag;

pub use drag_visual::{DragPresenter, DragVisual, Ghost, Overlay, OverlayFade, RecordingPresenter};
pub use drop_target::{
    DragOverEvent, DropSink, DropSinkError, DropTargetCoordinator, HitTester, RectHitTester,
};
pub use editor_sink::EditorDropSink;
pub use listeners::{ContainerId, Listener, ListenerCommand, ListenerSet};
pub use palette_drag::{
    ArmTimerRequest, CallbackFailure, CallbackFailureKind, GestureToken, Overflow,
    PaletteDragCancelReason, PaletteDragConfig, PaletteDragConfigError, PaletteDragController,
    PaletteDragDispatch, PaletteDragEffect, PaletteDragIgnoredReason, PaletteDragLifecyclePhase,
    PaletteDragLogEntry, PaletteDragLogOutcome, PaletteDragState, PaletteItem, PointerKind,
    ScrollContainer, SinkCallback,
};
