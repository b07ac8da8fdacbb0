// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key and identifier types for arena-based storage.
//!
//! Each element gets a type-safe slot map key for O(1) lookup in the arena.
//! Keys are generational, so a key to a deleted face never aliases a newer
//! face. Alongside the key, every element carries a human-readable
//! [`ElementId`] (`v3`, `e7`, `e7_1`, `f2`) used for logging, snapshots and
//! lookups by label.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Key for a vertex (point in the plane).
    pub struct VertexKey;

    /// Key for a half-edge (one directed side of an edge).
    pub struct HalfEdgeKey;

    /// Key for an edge (pair of twin half-edges).
    pub struct EdgeKey;

    /// Key for a face (region bounded by a half-edge cycle).
    pub struct FaceKey;
}

/// A key that can reference any topology element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyKey {
    Vertex(VertexKey),
    HalfEdge(HalfEdgeKey),
    Edge(EdgeKey),
    Face(FaceKey),
}

impl TopologyKey {
    /// Returns the element kind of this key.
    pub fn kind(&self) -> ElementKind {
        match self {
            TopologyKey::Vertex(_) => ElementKind::Vertex,
            TopologyKey::HalfEdge(_) => ElementKind::HalfEdge,
            TopologyKey::Edge(_) => ElementKind::Edge,
            TopologyKey::Face(_) => ElementKind::Face,
        }
    }
}

impl From<VertexKey> for TopologyKey {
    fn from(k: VertexKey) -> Self {
        TopologyKey::Vertex(k)
    }
}

impl From<HalfEdgeKey> for TopologyKey {
    fn from(k: HalfEdgeKey) -> Self {
        TopologyKey::HalfEdge(k)
    }
}

impl From<EdgeKey> for TopologyKey {
    fn from(k: EdgeKey) -> Self {
        TopologyKey::Edge(k)
    }
}

impl From<FaceKey> for TopologyKey {
    fn from(k: FaceKey) -> Self {
        TopologyKey::Face(k)
    }
}

/// Discriminant for element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    Vertex = 0,
    HalfEdge = 1,
    Edge = 2,
    Face = 3,
}

impl ElementKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Vertex => "Vertex",
            ElementKind::HalfEdge => "HalfEdge",
            ElementKind::Edge => "Edge",
            ElementKind::Face => "Face",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of its parent edge a half-edge is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Leaves the edge's first vertex.
    First,
    /// Leaves the edge's second vertex.
    Second,
}

impl Side {
    fn suffix(self) -> u8 {
        match self {
            Side::First => 1,
            Side::Second => 2,
        }
    }
}

/// Human-readable, write-once element identifier.
///
/// Vertices, edges and faces are numbered by independent counters. Half-edges
/// reuse their parent edge's number plus a side suffix. `f0` is always the
/// unbounded face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementId {
    Vertex(u32),
    HalfEdge(u32, Side),
    Edge(u32),
    Face(u32),
}

impl ElementId {
    /// The identifier reserved for the unbounded face.
    pub const UNBOUNDED_FACE: ElementId = ElementId::Face(0);

    pub fn kind(&self) -> ElementKind {
        match self {
            ElementId::Vertex(_) => ElementKind::Vertex,
            ElementId::HalfEdge(..) => ElementKind::HalfEdge,
            ElementId::Edge(_) => ElementKind::Edge,
            ElementId::Face(_) => ElementKind::Face,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Vertex(n) => write!(f, "v{n}"),
            ElementId::HalfEdge(n, side) => write!(f, "e{n}_{}", side.suffix()),
            ElementId::Edge(n) => write!(f, "e{n}"),
            ElementId::Face(n) => write!(f, "f{n}"),
        }
    }
}

/// Error returned when a label cannot be parsed as an [`ElementId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not an element label: {0:?}")]
pub struct ParseElementIdError(pub String);

impl FromStr for ElementId {
    type Err = ParseElementIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseElementIdError(s.to_string());
        let mut chars = s.chars();
        let prefix = chars.next().ok_or_else(err)?;
        let rest = chars.as_str();

        match prefix {
            'v' => rest.parse().map(ElementId::Vertex).map_err(|_| err()),
            'f' => rest.parse().map(ElementId::Face).map_err(|_| err()),
            'e' => match rest.split_once('_') {
                None => rest.parse().map(ElementId::Edge).map_err(|_| err()),
                Some((n, side)) => {
                    let n = n.parse().map_err(|_| err())?;
                    let side = match side {
                        "1" => Side::First,
                        "2" => Side::Second,
                        _ => return Err(err()),
                    };
                    Ok(ElementId::HalfEdge(n, side))
                }
            },
            _ => Err(err()),
        }
    }
}

impl Serialize for ElementId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Opaque handle to a resource owned by the rendering layer (a face mesh, a
/// link arc). The core never interprets it; it only hands it back for
/// release when the element it decorates disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);
