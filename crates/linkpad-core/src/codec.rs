#![forbid(unsafe_code)]

//! Binary encoding of [`GraphState`].
//!
//! # Layout
//!
//! All multi-byte fields are little-endian; there is no padding.
//!
//! ```text
//! header (36 bytes)   left:f64 top:f64 right:f64 bottom:f64 node_count:u32
//! node   (17 + body)  kind:u8 x:f64 y:f64 body...
//! ```
//!
//! | kind | body                                           | bytes        |
//! |------|------------------------------------------------|--------------|
//! | 0    | -                                              | 0            |
//! | 1    | angle                                          | 8            |
//! | 2    | angle delta                                    | 16           |
//! | 3    | angle min_angle max_angle                      | 24           |
//! | 4    | x1 y1 x2 y2 delta                              | 40           |
//! | 5    | cx cy r min_angle max_angle delta              | 48           |
//! | 6    | delta point_count:u32 (x y)*point_count        | 12 + 16*n    |
//!
//! # Failure Modes
//!
//! [`decode`] checks remaining length before every read. A buffer that ends
//! inside a header or body, or a node with an unknown kind byte, yields
//! [`CodecError::CorruptState`]. Counts read from the wire never drive an
//! allocation larger than the remaining bytes could hold.

use std::fmt;

use crate::geometry::Point;
use crate::graph::{Bounds, GraphState, Node, NodeKind, NodeShape};

/// Size of the state header in bytes.
pub const STATE_HEADER_LEN: usize = 4 * F64_LEN + U32_LEN;
/// Size of each node header (kind + x + y) in bytes.
pub const NODE_HEADER_LEN: usize = 1 + 2 * F64_LEN;
/// Size of one polygon vertex in bytes.
pub const POLYGON_POINT_LEN: usize = 2 * F64_LEN;

const F64_LEN: usize = 8;
const U32_LEN: usize = 4;
const POLYGON_FIXED_LEN: usize = F64_LEN + U32_LEN;

/// Why a buffer was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptStateReason {
    /// Fewer bytes remained than the next field requires.
    Truncated { needed: usize, remaining: usize },
    /// Node kind byte outside `0..=6`.
    UnknownKind(u8),
}

/// Errors from [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer does not describe a well-formed state.
    CorruptState {
        /// Byte offset where decoding stopped.
        offset: usize,
        reason: CorruptStateReason,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptState {
                offset,
                reason: CorruptStateReason::Truncated { needed, remaining },
            } => write!(
                f,
                "corrupt state at byte {offset}: need {needed} bytes, {remaining} remain"
            ),
            Self::CorruptState {
                offset,
                reason: CorruptStateReason::UnknownKind(kind),
            } => write!(f, "corrupt state at byte {offset}: unknown node kind {kind}"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Body length of a fixed-size kind. Polygons return their fixed prefix only.
pub const fn body_len(kind: NodeKind) -> usize {
    match kind {
        NodeKind::Fixed => 0,
        NodeKind::Rotating => F64_LEN,
        NodeKind::Translating => 2 * F64_LEN,
        NodeKind::Clamped => 3 * F64_LEN,
        NodeKind::ClampedTranslating => 5 * F64_LEN,
        NodeKind::ArcTranslating => 6 * F64_LEN,
        NodeKind::PolygonalTranslating => POLYGON_FIXED_LEN,
    }
}

/// Exact encoded size of one node.
pub fn node_encoded_len(node: &Node) -> usize {
    let variable = match &node.shape {
        NodeShape::PolygonalTranslating { points, .. } => points.len() * POLYGON_POINT_LEN,
        _ => 0,
    };
    NODE_HEADER_LEN + body_len(node.kind()) + variable
}

/// Exact size of `encode(state)`.
pub fn encoded_len(state: &GraphState) -> usize {
    STATE_HEADER_LEN + state.nodes.iter().map(node_encoded_len).sum::<usize>()
}

/// Serialize `state` to its binary form.
///
/// # Panics
///
/// Panics if the node count or a polygon's point count exceeds `u32::MAX`,
/// which no in-memory editor state can reach.
pub fn encode(state: &GraphState) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(state));
    let Bounds {
        left,
        top,
        right,
        bottom,
    } = state.bounds;
    for edge in [left, top, right, bottom] {
        put_f64(&mut out, edge);
    }
    put_u32(&mut out, count_u32(state.nodes.len()));

    for node in &state.nodes {
        out.push(node.kind().as_u8());
        put_f64(&mut out, node.x);
        put_f64(&mut out, node.y);
        match &node.shape {
            NodeShape::Fixed => {}
            NodeShape::Rotating { angle } => put_f64(&mut out, *angle),
            NodeShape::Translating { angle, delta } => {
                put_f64(&mut out, *angle);
                put_f64(&mut out, *delta);
            }
            NodeShape::Clamped {
                angle,
                min_angle,
                max_angle,
            } => {
                for value in [*angle, *min_angle, *max_angle] {
                    put_f64(&mut out, value);
                }
            }
            NodeShape::ClampedTranslating {
                x1,
                y1,
                x2,
                y2,
                delta,
            } => {
                for value in [*x1, *y1, *x2, *y2, *delta] {
                    put_f64(&mut out, value);
                }
            }
            NodeShape::ArcTranslating {
                cx,
                cy,
                r,
                min_angle,
                max_angle,
                delta,
            } => {
                for value in [*cx, *cy, *r, *min_angle, *max_angle, *delta] {
                    put_f64(&mut out, value);
                }
            }
            NodeShape::PolygonalTranslating { delta, points } => {
                put_f64(&mut out, *delta);
                put_u32(&mut out, count_u32(points.len()));
                for point in points {
                    put_f64(&mut out, point.x);
                    put_f64(&mut out, point.y);
                }
            }
        }
    }

    debug_assert_eq!(out.len(), encoded_len(state));
    out
}

/// Parse a buffer produced by [`encode`].
///
/// Bytes after the last declared node are ignored.
pub fn decode(buf: &[u8]) -> Result<GraphState, CodecError> {
    let mut reader = Reader::new(buf);

    reader.require(STATE_HEADER_LEN)?;
    let bounds = Bounds::new(
        reader.f64()?,
        reader.f64()?,
        reader.f64()?,
        reader.f64()?,
    );
    let node_count = reader.u32()? as usize;

    let mut nodes = Vec::with_capacity(node_count.min(reader.remaining() / NODE_HEADER_LEN));
    for _ in 0..node_count {
        nodes.push(decode_node(&mut reader)?);
    }

    if reader.remaining() > 0 {
        tracing::debug!(
            trailing = reader.remaining(),
            node_count,
            "ignoring trailing bytes after graph state"
        );
    }

    Ok(GraphState { bounds, nodes })
}

fn decode_node(reader: &mut Reader<'_>) -> Result<Node, CodecError> {
    reader.require(NODE_HEADER_LEN)?;
    let kind_offset = reader.offset();
    let kind_byte = reader.u8()?;
    let kind = NodeKind::try_from(kind_byte).map_err(|_| CodecError::CorruptState {
        offset: kind_offset,
        reason: CorruptStateReason::UnknownKind(kind_byte),
    })?;
    let x = reader.f64()?;
    let y = reader.f64()?;

    reader.require(body_len(kind))?;
    let shape = match kind {
        NodeKind::Fixed => NodeShape::Fixed,
        NodeKind::Rotating => NodeShape::Rotating {
            angle: reader.f64()?,
        },
        NodeKind::Translating => NodeShape::Translating {
            angle: reader.f64()?,
            delta: reader.f64()?,
        },
        NodeKind::Clamped => NodeShape::Clamped {
            angle: reader.f64()?,
            min_angle: reader.f64()?,
            max_angle: reader.f64()?,
        },
        NodeKind::ClampedTranslating => NodeShape::ClampedTranslating {
            x1: reader.f64()?,
            y1: reader.f64()?,
            x2: reader.f64()?,
            y2: reader.f64()?,
            delta: reader.f64()?,
        },
        NodeKind::ArcTranslating => NodeShape::ArcTranslating {
            cx: reader.f64()?,
            cy: reader.f64()?,
            r: reader.f64()?,
            min_angle: reader.f64()?,
            max_angle: reader.f64()?,
            delta: reader.f64()?,
        },
        NodeKind::PolygonalTranslating => {
            let delta = reader.f64()?;
            let point_count = reader.u32()? as usize;
            let points_len = point_count
                .checked_mul(POLYGON_POINT_LEN)
                .unwrap_or(usize::MAX);
            reader.require(points_len)?;
            let mut points = Vec::with_capacity(point_count);
            for _ in 0..point_count {
                points.push(Point::new(reader.f64()?, reader.f64()?));
            }
            NodeShape::PolygonalTranslating { delta, points }
        }
    };

    Ok(Node::new(x, y, shape))
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).expect("count exceeds u32 wire field")
}

#[inline]
fn put_f64(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[inline]
fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Bounds-checked little-endian cursor.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    const fn offset(&self) -> usize {
        self.pos
    }

    #[inline]
    const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fail unless at least `needed` bytes remain.
    fn require(&self, needed: usize) -> Result<(), CodecError> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(CodecError::CorruptState {
                offset: self.pos,
                reason: CorruptStateReason::Truncated { needed, remaining },
            });
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        self.require(N)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take::<1>()?[0])
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_le_bytes(self.take()?))
    }
}
