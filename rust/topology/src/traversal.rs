// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Navigation over the half-edge structure.
//!
//! Boundary walks follow `next` pointers around a face; fan queries list the
//! edges and neighbours around a vertex.

use rustc_hash::FxHashSet;

use crate::arena::Topology;
use crate::error::{Error, Result};
use crate::keys::*;

/// Iterator over a face boundary cycle, starting at a given half-edge and
/// following `next` until it comes back around.
///
/// The iterator is bounded by the number of half-edges in the arena, so a
/// corrupted structure ends the walk instead of looping forever.
pub struct BoundaryCycle<'a> {
    topology: &'a Topology,
    start: HalfEdgeKey,
    current: Option<HalfEdgeKey>,
    remaining: usize,
}

impl<'a> Iterator for BoundaryCycle<'a> {
    type Item = HalfEdgeKey;

    fn next(&mut self) -> Option<HalfEdgeKey> {
        let current = self.current?;
        if self.remaining == 0 {
            self.current = None;
            return None;
        }
        self.remaining -= 1;
        self.current = self
            .topology
            .half_edges
            .get(current)
            .map(|he| he.next)
            .filter(|&next| next != self.start);
        Some(current)
    }
}

impl Topology {
    /// Iterates the boundary cycle that `start` belongs to.
    pub fn boundary_cycle(&self, start: HalfEdgeKey) -> BoundaryCycle<'_> {
        BoundaryCycle {
            topology: self,
            start,
            current: self.half_edges.contains_key(start).then_some(start),
            remaining: self.half_edges.len(),
        }
    }

    /// Collects the boundary cycle of `start`, failing if the walk does not
    /// close.
    pub fn walk_boundary(&self, start: HalfEdgeKey) -> Result<Vec<HalfEdgeKey>> {
        if !self.half_edges.contains_key(start) {
            return Err(Error::HalfEdgeNotFound(start));
        }
        let cycle: Vec<_> = self.boundary_cycle(start).collect();
        let closes = cycle
            .last()
            .and_then(|&last| self.half_edges.get(last))
            .is_some_and(|he| he.next == start);
        if !closes {
            let label = self
                .half_edges
                .get(start)
                .map(|he| he.id().to_string())
                .unwrap_or_default();
            return Err(Error::BrokenCycle(label, cycle.len()));
        }
        Ok(cycle)
    }

    /// Edges incident to a vertex, in counter-clockwise order.
    pub fn vertex_edges(&self, key: VertexKey) -> Vec<EdgeKey> {
        self.vertices
            .get(key)
            .map(|v| {
                v.sorted_half_edges
                    .iter()
                    .filter_map(|&he| self.half_edges.get(he))
                    .map(|he| he.edge)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Vertices joined to `key` by an edge, in counter-clockwise order.
    pub fn vertex_neighbors(&self, key: VertexKey) -> Vec<VertexKey> {
        self.vertices
            .get(key)
            .map(|v| {
                v.sorted_half_edges
                    .iter()
                    .filter_map(|&he| self.destination(he))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Distinct faces touching a vertex.
    pub fn vertex_faces(&self, key: VertexKey) -> Vec<FaceKey> {
        let mut seen = FxHashSet::default();
        self.vertices
            .get(key)
            .map(|v| {
                v.sorted_half_edges
                    .iter()
                    .filter_map(|&he| self.half_edges.get(he)?.face)
                    .filter(|f| seen.insert(*f))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Vertices on a face boundary, in boundary order.
    pub fn face_vertices(&self, key: FaceKey) -> Option<Vec<VertexKey>> {
        let face = self.faces.get(key)?;
        Some(
            face.boundary
                .iter()
                .filter_map(|&he| self.half_edges.get(he))
                .map(|he| he.origin)
                .collect(),
        )
    }

    /// Faces sharing a boundary half-edge pair with `key`, excluding the
    /// unbounded face.
    pub fn adjacent_faces(&self, key: FaceKey) -> Vec<FaceKey> {
        let mut seen = FxHashSet::default();
        let Some(face) = self.faces.get(key) else {
            return Vec::new();
        };
        face.boundary
            .iter()
            .filter_map(|&he| self.half_edges.get(he))
            .filter_map(|he| self.half_edges.get(he.twin)?.face)
            .filter(|&f| f != key && f != self.unbounded)
            .filter(|f| seen.insert(*f))
            .collect()
    }
}
