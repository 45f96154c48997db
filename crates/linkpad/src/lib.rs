#![forbid(unsafe_code)]

//! linkpad public facade crate.
//!
//! Re-exports the graph model and editor from `linkpad-core`, share tokens
//! from `linkpad-transfer`, and the palette drag controller from
//! `linkpad-web`, plus share-link helpers in [`share`].

pub mod share;

// --- Core re-exports -------------------------------------------------------

pub use linkpad_core::codec::{self, CodecError, CorruptStateReason};
pub use linkpad_core::{
    Bounds, DropPreview, Editor, GraphState, Link, Node, NodeKind, NodeRef, NodeShape, Point, Rect,
};

// --- Transfer re-exports ---------------------------------------------------

pub use linkpad_transfer::{
    DecompressionFailure, DecompressionFallback, FallbackError, HttpFallback, HttpFallbackConfig,
    NoFallback, TOKEN_QUERY_PARAM, TransferConfig, TransferDecoder, TransferEncoder, TransferError,
};

// --- Web re-exports --------------------------------------------------------

pub use linkpad_web::{
    DragPresenter, DragVisual, DropSink, DropSinkError, EditorDropSink, HitTester,
    PaletteDragConfig, PaletteDragController, PaletteDragDispatch, PaletteDragEffect, PaletteItem,
    PointerKind, RectHitTester,
};

pub use share::{restore_from_url, share_url};

/// Prelude for embedding pages.
pub mod prelude {
    pub use crate::share::{restore_from_url, share_url};
    pub use crate::{
        DragPresenter, DropSink, Editor, EditorDropSink, GraphState, NodeKind, PaletteDragConfig,
        PaletteDragController, PaletteItem, Point, PointerKind, Rect, TransferConfig,
        TransferDecoder, TransferEncoder,
    };
}
