// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Moving vertices and deleting edges or vertices.

use nalgebra::Point3;
use rustc_hash::FxHashSet;

use crate::arena::Topology;
use crate::construction::check_finite;
use crate::error::{Error, Result};
use crate::keys::*;
use crate::observer::Action;

impl Topology {
    /// Moves a vertex and refreshes everything derived from its position.
    ///
    /// Bearings, fan order, edge lengths and midpoints, and face centroids
    /// are recomputed. Observers then see `modified` for the vertex, each
    /// incident edge, and each incident bounded face, in that order.
    pub fn move_vertex(&mut self, key: VertexKey, position: Point3<f64>) -> Result<()> {
        check_finite(&position)?;
        let vertex = self.vertices.get_mut(key).ok_or(Error::VertexNotFound(key))?;
        vertex.position = position;
        let outgoing = vertex.half_edges.clone();

        let mut edges = Vec::with_capacity(outgoing.len());
        let mut neighbors = Vec::with_capacity(outgoing.len());
        let mut faces = Vec::new();
        let mut seen_faces = FxHashSet::default();
        for &he in &outgoing {
            let Some((twin, edge)) = self.half_edges.get(he).map(|h| (h.twin, h.edge)) else {
                continue;
            };
            self.update_bearing(he);
            self.update_bearing(twin);
            edges.push(edge);
            if let Some(n) = self.destination(he) {
                neighbors.push(n);
            }
            for side in [he, twin] {
                if let Some(f) = self.half_edges.get(side).and_then(|h| h.face) {
                    if f != self.unbounded && seen_faces.insert(f) {
                        faces.push(f);
                    }
                }
            }
        }

        let mut rewired = self.rewire_fan(key);
        let mut seen = FxHashSet::default();
        for n in neighbors {
            if seen.insert(n) {
                rewired |= self.rewire_fan(n);
            }
        }
        for &edge in &edges {
            self.update_edge_metrics(edge);
        }

        if rewired {
            tracing::debug!(
                vertex = ?self.element_id(key.into()),
                "move changed the edge order around a vertex, re-walking faces"
            );
            for &face in &faces {
                let Some(&start) = self.faces.get(face).and_then(|f| f.boundary.first()) else {
                    continue;
                };
                let cycle = self.walk_boundary(start)?;
                self.assign_boundary(face, cycle);
            }
        } else {
            for &face in &faces {
                self.update_representative_point(face);
            }
        }

        self.notify(Action::Modified, key);
        for edge in edges {
            self.notify(Action::Modified, edge);
        }
        for face in faces {
            self.notify(Action::Modified, face);
        }
        Ok(())
    }

    /// Deletes an edge, merging the faces on either side if they differ.
    ///
    /// Observers see the edge's `deleted` notification while it is still
    /// readable. Merging two bounded faces creates a new face and deletes
    /// both; merging with the unbounded face deletes only the bounded one.
    pub fn delete_edge(&mut self, key: EdgeKey) -> Result<()> {
        let edge = self.edges.get(key).ok_or(Error::EdgeNotFound(key))?;
        let id = edge.meta.id();
        let [he1, he2] = edge.half_edges;
        let h1 = self.half_edges.get(he1).ok_or(Error::HalfEdgeNotFound(he1))?;
        let h2 = self.half_edges.get(he2).ok_or(Error::HalfEdgeNotFound(he2))?;
        let (a, b) = (h1.origin, h2.origin);
        let f1 = h1.face.unwrap_or(self.unbounded);
        let f2 = h2.face.unwrap_or(self.unbounded);
        // Half-edges leaving `b` and `a` right after this edge in their
        // faces; both survive the deletion.
        let survivors: Vec<_> = [h1.next, h2.next]
            .into_iter()
            .filter(|&k| k != he1 && k != he2)
            .collect();

        self.notify(Action::Deleted, key);

        for (vertex, he) in [(a, he1), (b, he2)] {
            if let Some(v) = self.vertices.get_mut(vertex) {
                v.half_edges.retain(|&k| k != he);
            }
        }
        for he in [he1, he2] {
            if let Some(removed) = self.half_edges.remove(he) {
                self.labels.remove(&removed.meta.id());
            }
        }
        self.edges.remove(key);
        self.labels.remove(&id);
        self.rewire_fan(a);
        self.rewire_fan(b);
        tracing::debug!(edge = %id, "edge deleted");

        if f1 != f2 {
            self.merge_faces(f1, f2, &survivors)
        } else {
            self.reshape_face(f1, &survivors)
        }
    }

    fn merge_faces(&mut self, f1: FaceKey, f2: FaceKey, survivors: &[HalfEdgeKey]) -> Result<()> {
        let Some(&start) = survivors.first() else {
            return Ok(());
        };
        let cycle = self.walk_boundary(start)?;

        if f1 == self.unbounded || f2 == self.unbounded {
            let bounded = if f1 == self.unbounded { f2 } else { f1 };
            let f0 = self.unbounded;
            self.assign_boundary(f0, cycle);
            self.remove_face(bounded);
            self.notify(Action::Modified, f0);
        } else {
            let merged = self.insert_face(cycle);
            self.notify(Action::Created, merged);
            self.remove_face(f1);
            self.remove_face(f2);
        }
        Ok(())
    }

    /// Re-walks a face after one of its internal edges went away. Removing
    /// a bridge leaves two cycles; a bounded face keeps the one enclosing
    /// the larger signed area as its boundary and the detached component
    /// floats in the unbounded face, as a fresh one would.
    fn reshape_face(&mut self, face: FaceKey, survivors: &[HalfEdgeKey]) -> Result<()> {
        let mut cycles: Vec<Vec<HalfEdgeKey>> = Vec::new();
        for &start in survivors {
            if cycles.iter().any(|c| c.contains(&start)) {
                continue;
            }
            cycles.push(self.walk_boundary(start)?);
        }
        if cycles.is_empty() {
            self.notify(Action::Modified, face);
            return Ok(());
        }

        let f0 = self.unbounded;
        let areas: Vec<f64> = cycles.iter().map(|c| self.cycle_signed_area(c)).collect();
        let best = (0..cycles.len())
            .max_by(|&i, &j| areas[i].total_cmp(&areas[j]))
            .unwrap_or(0);
        let mut detached = false;
        for (i, cycle) in cycles.into_iter().enumerate() {
            if i == best || face == f0 {
                self.assign_boundary(face, cycle);
            } else {
                tracing::debug!(
                    face = ?self.element_id(face.into()),
                    half_edges = cycle.len(),
                    "component detached into the unbounded face"
                );
                self.set_face(&cycle, f0);
                detached = true;
            }
        }
        self.notify(Action::Modified, face);
        if detached {
            self.notify(Action::Modified, f0);
        }
        Ok(())
    }

    /// Deletes a vertex together with every edge incident to it.
    pub fn delete_vertex(&mut self, key: VertexKey) -> Result<()> {
        if !self.vertices.contains_key(key) {
            return Err(Error::VertexNotFound(key));
        }
        for edge in self.vertex_edges(key) {
            self.delete_edge(edge)?;
        }
        self.notify(Action::Deleted, key);
        if let Some(vertex) = self.vertices.remove(key) {
            self.labels.remove(&vertex.meta.id());
            tracing::debug!(vertex = %vertex.meta.id(), "vertex deleted");
        }
        Ok(())
    }
}
