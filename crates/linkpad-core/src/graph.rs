#![forbid(unsafe_code)]

//! Editable kinematic-joint graph.
//!
//! A [`GraphState`] is the persisted part of the editor: the viewport
//! [`Bounds`] plus an insertion-ordered list of [`Node`]s. Everything else the
//! editor tracks (selection, pending links, drop previews) lives in
//! [`crate::editor::Editor`] and never reaches the codec.
//!
//! Nodes are a single tagged variant ([`NodeShape`]) rather than a type
//! hierarchy, stored in a flat `Vec` and addressed by index ([`NodeRef`]).

use std::f64::consts::{FRAC_PI_4, PI};
use std::fmt;

use crate::geometry::Point;

/// Viewport bounds of the workspace. No ordering between edges is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Bounds {
    #[inline]
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Wire discriminant of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum NodeKind {
    Fixed = 0,
    Rotating = 1,
    Translating = 2,
    Clamped = 3,
    ClampedTranslating = 4,
    ArcTranslating = 5,
    PolygonalTranslating = 6,
}

impl NodeKind {
    /// All kinds in discriminant order.
    pub const ALL: [NodeKind; 7] = [
        NodeKind::Fixed,
        NodeKind::Rotating,
        NodeKind::Translating,
        NodeKind::Clamped,
        NodeKind::ClampedTranslating,
        NodeKind::ArcTranslating,
        NodeKind::PolygonalTranslating,
    ];

    /// Wire byte.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human-readable name, stable for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Rotating => "rotating",
            Self::Translating => "translating",
            Self::Clamped => "clamped",
            Self::ClampedTranslating => "clamped_translating",
            Self::ArcTranslating => "arc_translating",
            Self::PolygonalTranslating => "polygonal_translating",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for a byte that names no [`NodeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownNodeKind(pub u8);

impl fmt::Display for UnknownNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown node kind {}", self.0)
    }
}

impl std::error::Error for UnknownNodeKind {}

impl TryFrom<u8> for NodeKind {
    type Error = UnknownNodeKind;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        NodeKind::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(UnknownNodeKind(value))
    }
}

/// Kind-specific constraint parameters of a node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum NodeShape {
    Fixed,
    Rotating {
        angle: f64,
    },
    Translating {
        angle: f64,
        delta: f64,
    },
    Clamped {
        angle: f64,
        min_angle: f64,
        max_angle: f64,
    },
    ClampedTranslating {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        delta: f64,
    },
    ArcTranslating {
        cx: f64,
        cy: f64,
        r: f64,
        min_angle: f64,
        max_angle: f64,
        delta: f64,
    },
    PolygonalTranslating {
        delta: f64,
        points: Vec<Point>,
    },
}

impl NodeShape {
    /// Discriminant of this shape.
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Fixed => NodeKind::Fixed,
            Self::Rotating { .. } => NodeKind::Rotating,
            Self::Translating { .. } => NodeKind::Translating,
            Self::Clamped { .. } => NodeKind::Clamped,
            Self::ClampedTranslating { .. } => NodeKind::ClampedTranslating,
            Self::ArcTranslating { .. } => NodeKind::ArcTranslating,
            Self::PolygonalTranslating { .. } => NodeKind::PolygonalTranslating,
        }
    }

    /// Palette defaults for `kind`, laid out around `at`.
    pub fn default_for(kind: NodeKind, at: Point) -> Self {
        const HALF: f64 = 50.0;
        match kind {
            NodeKind::Fixed => Self::Fixed,
            NodeKind::Rotating => Self::Rotating { angle: 0.0 },
            NodeKind::Translating => Self::Translating {
                angle: 0.0,
                delta: 0.0,
            },
            NodeKind::Clamped => Self::Clamped {
                angle: 0.0,
                min_angle: -FRAC_PI_4,
                max_angle: FRAC_PI_4,
            },
            NodeKind::ClampedTranslating => Self::ClampedTranslating {
                x1: at.x - HALF,
                y1: at.y,
                x2: at.x + HALF,
                y2: at.y,
                delta: 0.0,
            },
            NodeKind::ArcTranslating => Self::ArcTranslating {
                cx: at.x,
                cy: at.y,
                r: HALF,
                min_angle: 0.0,
                max_angle: PI,
                delta: 0.0,
            },
            NodeKind::PolygonalTranslating => Self::PolygonalTranslating {
                delta: 0.0,
                points: vec![
                    Point::new(at.x - HALF, at.y - HALF),
                    Point::new(at.x + HALF, at.y - HALF),
                    Point::new(at.x + HALF, at.y + HALF),
                    Point::new(at.x - HALF, at.y + HALF),
                ],
            },
        }
    }
}

/// One joint in the graph.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub x: f64,
    pub y: f64,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub shape: NodeShape,
}

impl Node {
    #[inline]
    pub const fn new(x: f64, y: f64, shape: NodeShape) -> Self {
        Self { x, y, shape }
    }

    /// A node of `kind` at `at` with palette-default parameters.
    pub fn with_defaults(kind: NodeKind, at: Point) -> Self {
        Self::new(at.x, at.y, NodeShape::default_for(kind, at))
    }

    #[inline]
    pub const fn kind(&self) -> NodeKind {
        self.shape.kind()
    }

    #[inline]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Persisted editor state: bounds plus ordered nodes.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphState {
    pub bounds: Bounds,
    pub nodes: Vec<Node>,
}

impl GraphState {
    /// Empty graph over `bounds`.
    pub const fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            nodes: Vec::new(),
        }
    }

    /// Resolve a node reference; `None` if it dangles.
    #[inline]
    pub fn node(&self, node_ref: NodeRef) -> Option<&Node> {
        self.nodes.get(node_ref.index())
    }
}

/// Index of a node in [`GraphState::nodes`].
///
/// Plain index, not an owning handle: it may dangle after removals and is
/// resolved against a state at use time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeRef(pub usize);

impl NodeRef {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A link being dragged into place. Transient, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub parent: Option<NodeRef>,
    pub child: Option<NodeRef>,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Link {
    /// Start a link at `from`, optionally anchored on `parent`.
    pub const fn starting_at(parent: Option<NodeRef>, from: Point) -> Self {
        Self {
            parent,
            child: None,
            x1: from.x,
            y1: from.y,
            x2: from.x,
            y2: from.y,
        }
    }

    /// Both ends resolved against `state`. Dangling references yield `None`.
    pub fn resolve<'a>(&self, state: &'a GraphState) -> (Option<&'a Node>, Option<&'a Node>) {
        (
            self.parent.and_then(|r| state.node(r)),
            self.child.and_then(|r| state.node(r)),
        )
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn json_export_tags_shapes_by_kind() {
        let mut state = GraphState::new(Bounds::new(0.0, 0.0, 10.0, 10.0));
        state.nodes.push(Node::new(1.0, 2.0, NodeShape::Rotating { angle: 0.5 }));
        let json = serde_json::to_value(&state).expect("serializes");
        assert_eq!(json["nodes"][0]["kind"], "rotating");
        assert_eq!(json["nodes"][0]["angle"], 0.5);
        let back: GraphState = serde_json::from_value(json).expect("deserializes");
        assert_eq!(back, state);
    }
}
