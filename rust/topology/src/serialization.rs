// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON snapshots of the topology.
//!
//! Elements are referenced by their labels (`v3`, `e7_1`, `f2`) rather than
//! slot map keys, so the output is stable across runs and readable by
//! external viewers. Elements are listed in creation order.

use serde::{Deserialize, Serialize};

use crate::arena::*;
use crate::error::{Error, Result};
use crate::keys::ElementId;

/// Serializable view of a whole topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologySnapshot {
    pub current_time: u64,
    pub vertices: Vec<VertexSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
    pub faces: Vec<FaceSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexSnapshot {
    pub id: ElementId,
    pub time_created: u64,
    pub position: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSnapshot {
    pub id: ElementId,
    pub time_created: u64,
    pub start: ElementId,
    pub end: ElementId,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceSnapshot {
    pub id: ElementId,
    pub time_created: u64,
    /// Boundary half-edges in `next` order; empty for `f0`.
    pub boundary: Vec<ElementId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<[f64; 3]>,
}

impl Topology {
    /// Serializes the topology to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Captures the current state as a label-keyed snapshot.
    pub fn to_snapshot(&self) -> TopologySnapshot {
        let label = |key| self.half_edges.get(key).map(HalfEdge::id);
        let vertex_label = |key| self.vertices.get(key).map(Vertex::id);

        let mut vertices: Vec<_> = self
            .vertices
            .values()
            .map(|v| VertexSnapshot {
                id: v.id(),
                time_created: v.meta.time_created(),
                position: [v.position.x, v.position.y, v.position.z],
            })
            .collect();
        vertices.sort_by_key(|v| v.time_created);

        let mut edges: Vec<_> = self
            .edges
            .values()
            .filter_map(|e| {
                let start = self.half_edges.get(e.half_edges[0])?.origin;
                let end = self.half_edges.get(e.half_edges[1])?.origin;
                Some(EdgeSnapshot {
                    id: e.id(),
                    time_created: e.meta.time_created(),
                    start: vertex_label(start)?,
                    end: vertex_label(end)?,
                    length: e.length,
                })
            })
            .collect();
        edges.sort_by_key(|e| e.time_created);

        let mut faces: Vec<_> = self
            .faces
            .values()
            .map(|f| FaceSnapshot {
                id: f.id(),
                time_created: f.meta.time_created(),
                boundary: f.boundary.iter().filter_map(|&he| label(he)).collect(),
                centroid: f.representative_point.map(|p| [p.x, p.y, p.z]),
            })
            .collect();
        faces.sort_by_key(|f| f.time_created);

        TopologySnapshot {
            current_time: self.current_time(),
            vertices,
            edges,
            faces,
        }
    }
}

impl TopologySnapshot {
    /// Parses a snapshot previously produced by [`Topology::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }
}
