#![forbid(unsafe_code)]

//! Core: geometry, the editable graph model, its binary codec, and editor commands.
//!
//! # Role in linkpad
//! `linkpad-core` owns the persisted [`GraphState`] and the only mutation path
//! into it ([`Editor`]). It has no I/O: the share-token layer
//! (`linkpad-transfer`) wraps [`codec`] for URLs, and the palette drag
//! controller (`linkpad-web`) drives [`Editor`] through drop callbacks.
//!
//! # Primary responsibilities
//! - **Graph model**: [`Node`] as a tagged [`NodeShape`], index-addressed by [`NodeRef`].
//! - **Codec**: compact little-endian encoding with bounds-checked decode.
//! - **Editor**: selection, pending links, drop previews, redraw requests.

pub mod codec;
pub mod editor;
pub mod geometry;
pub mod graph;

pub use codec::{CodecError, CorruptStateReason};
pub use editor::{DropPreview, Editor};
pub use geometry::{Point, Rect};
pub use graph::{Bounds, GraphState, Link, Node, NodeKind, NodeRef, NodeShape, UnknownNodeKind};
