// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Incremental construction: vertices, edges, and the face bookkeeping that
//! edge insertion triggers.
//!
//! Inserting an edge splices its two half-edges into the bearing-sorted fans
//! at both endpoints. The new boundary cycles are then compared against the
//! faces they used to belong to, which either leaves the face count alone
//! (isolated segment, dangling edge, bridge) or splits one face into two.

use nalgebra::Point3;

use crate::arena::*;
use crate::error::{Error, Result};
use crate::geometry::signed_area;
use crate::keys::*;
use crate::observer::Action;

impl Topology {
    /// Creates a vertex at `position` and notifies observers.
    ///
    /// Returns an error if any coordinate is NaN or infinite.
    pub fn create_vertex(&mut self, position: Point3<f64>) -> Result<VertexKey> {
        check_finite(&position)?;

        let id = self.next_vertex_id();
        let time_created = self.tick();
        let key = self.vertices.insert(Vertex {
            meta: ElementMeta::new(id, time_created),
            position,
            half_edges: Vec::new(),
            sorted_half_edges: Vec::new(),
        });
        self.labels.insert(id, key.into());

        tracing::debug!(vertex = %id, x = position.x, y = position.y, "vertex created");
        self.notify(Action::Created, key);
        Ok(key)
    }

    /// Creates an edge between two existing vertices and updates faces.
    ///
    /// Returns `Ok(None)` when `first == second`; self-loops are ignored.
    ///
    /// Observers see the edge's `created` notification once its half-edges
    /// are wired into both fans, followed by any face notifications caused
    /// by the insertion.
    pub fn create_edge(&mut self, first: VertexKey, second: VertexKey) -> Result<Option<EdgeKey>> {
        if !self.vertices.contains_key(first) {
            return Err(Error::VertexNotFound(first));
        }
        if !self.vertices.contains_key(second) {
            return Err(Error::VertexNotFound(second));
        }
        if first == second {
            tracing::debug!(vertex = ?self.element_id(first.into()), "self-loop ignored");
            return Ok(None);
        }

        let number = self.next_edge_number();
        let time_created = self.tick();
        let (edge, he1, he2) = self.insert_edge_records(number, time_created, first, second);

        if let Some(v) = self.vertices.get_mut(first) {
            v.half_edges.push(he1);
        }
        if let Some(v) = self.vertices.get_mut(second) {
            v.half_edges.push(he2);
        }
        self.update_bearing(he1);
        self.update_bearing(he2);
        self.update_edge_metrics(edge);
        self.rewire_fan(first);
        self.rewire_fan(second);

        tracing::debug!(edge = %ElementId::Edge(number), "edge created");
        self.notify(Action::Created, edge);

        self.resolve_faces_after_insert(he1, he2)?;
        Ok(Some(edge))
    }

    /// Allocates the edge and its two twin half-edges. Until the fans are
    /// rewired each half-edge forms a 2-cycle with its twin.
    fn insert_edge_records(
        &mut self,
        number: u32,
        time_created: u64,
        first: VertexKey,
        second: VertexKey,
    ) -> (EdgeKey, HalfEdgeKey, HalfEdgeKey) {
        let placeholder = |id, origin| HalfEdge {
            meta: ElementMeta::new(id, time_created),
            origin,
            twin: HalfEdgeKey::default(),
            next: HalfEdgeKey::default(),
            prev: HalfEdgeKey::default(),
            edge: EdgeKey::default(),
            face: None,
            bearing: 0.0,
        };
        let id1 = ElementId::HalfEdge(number, Side::First);
        let id2 = ElementId::HalfEdge(number, Side::Second);
        let he1 = self.half_edges.insert(placeholder(id1, first));
        let he2 = self.half_edges.insert(placeholder(id2, second));

        let id = ElementId::Edge(number);
        let edge = self.edges.insert(Edge {
            meta: ElementMeta::new(id, time_created),
            half_edges: [he1, he2],
            length: 0.0,
            midpoint: Point3::origin(),
        });

        for (key, twin) in [(he1, he2), (he2, he1)] {
            if let Some(he) = self.half_edges.get_mut(key) {
                he.twin = twin;
                he.next = twin;
                he.prev = twin;
                he.edge = edge;
            }
        }

        self.labels.insert(id, edge.into());
        self.labels.insert(id1, he1.into());
        self.labels.insert(id2, he2.into());
        (edge, he1, he2)
    }

    /// Re-sorts a vertex's outgoing half-edges by bearing and rebuilds the
    /// `next`/`prev` pointers that pass through it.
    ///
    /// For consecutive outgoing half-edges `a`, `b` (by increasing bearing),
    /// the half-edge arriving along `b` continues out along `a`, its nearest
    /// clockwise neighbour, so bounded faces wind counter-clockwise. Equal
    /// bearings keep insertion order.
    ///
    /// Returns `true` if any pointer changed.
    pub(crate) fn rewire_fan(&mut self, key: VertexKey) -> bool {
        let Some(vertex) = self.vertices.get(key) else {
            return false;
        };
        let mut sorted = vertex.half_edges.clone();
        sorted.sort_by(|&a, &b| {
            let ba = self.half_edges.get(a).map_or(0.0, |he| he.bearing);
            let bb = self.half_edges.get(b).map_or(0.0, |he| he.bearing);
            ba.total_cmp(&bb)
        });

        let n = sorted.len();
        let mut changed = false;
        for i in 0..n {
            let outgoing = sorted[i];
            let following = sorted[(i + 1) % n];
            let Some(arriving) = self.half_edges.get(following).map(|he| he.twin) else {
                continue;
            };
            if let Some(he) = self.half_edges.get_mut(arriving) {
                changed |= he.next != outgoing;
                he.next = outgoing;
            }
            if let Some(he) = self.half_edges.get_mut(outgoing) {
                changed |= he.prev != arriving;
                he.prev = arriving;
            }
        }

        if let Some(vertex) = self.vertices.get_mut(key) {
            vertex.sorted_half_edges = sorted;
        }
        changed
    }

    /// Picks the face a cycle used to belong to: the first bounded face
    /// found along it, else the unbounded face.
    pub(crate) fn previous_face(&self, cycle: &[HalfEdgeKey]) -> FaceKey {
        cycle
            .iter()
            .filter_map(|&he| self.half_edges.get(he)?.face)
            .find(|&f| f != self.unbounded)
            .unwrap_or(self.unbounded)
    }

    pub(crate) fn cycle_signed_area(&self, cycle: &[HalfEdgeKey]) -> f64 {
        let points: Vec<_> = cycle
            .iter()
            .filter_map(|&he| self.half_edges.get(he))
            .filter_map(|he| self.vertices.get(he.origin))
            .map(|v| v.position)
            .collect();
        signed_area(&points)
    }

    fn warn_if_ambiguous(&self, area: f64, start: HalfEdgeKey) {
        if area.abs() < self.config.area_tolerance {
            tracing::warn!(
                half_edge = ?self.element_id(start.into()),
                area,
                tolerance = self.config.area_tolerance,
                "boundary area below tolerance, face orientation is ambiguous"
            );
        }
    }

    fn resolve_faces_after_insert(&mut self, he1: HalfEdgeKey, he2: HalfEdgeKey) -> Result<()> {
        let cycle1 = self.walk_boundary(he1)?;

        if cycle1.len() == 2 {
            let f0 = self.unbounded;
            self.set_face(&cycle1, f0);
            return Ok(());
        }

        let existing = self.previous_face(&cycle1);

        if cycle1.contains(&he2) {
            // The edge hangs into, or bridges across, a single face.
            self.assign_boundary(existing, cycle1);
            self.notify(Action::Modified, existing);
            return Ok(());
        }

        let cycle2 = self.walk_boundary(he2)?;
        let area1 = self.cycle_signed_area(&cycle1);
        let area2 = self.cycle_signed_area(&cycle2);
        self.warn_if_ambiguous(area1, he1);
        self.warn_if_ambiguous(area2, he2);

        if existing == self.unbounded {
            let (outer, inner) = if area1 <= area2 {
                (cycle1, cycle2)
            } else {
                (cycle2, cycle1)
            };
            self.set_face(&outer, existing);
            let face = self.insert_face(inner);
            self.notify(Action::Created, face);
            self.notify(Action::Modified, existing);
        } else {
            let a = self.insert_face(cycle1);
            let b = self.insert_face(cycle2);
            self.notify(Action::Created, a);
            self.notify(Action::Created, b);
            self.remove_face(existing);
        }
        Ok(())
    }

    /// Points every half-edge of `cycle` at `face`.
    pub(crate) fn set_face(&mut self, cycle: &[HalfEdgeKey], face: FaceKey) {
        for &key in cycle {
            if let Some(he) = self.half_edges.get_mut(key) {
                he.face = Some(face);
            }
        }
    }

    /// Replaces a face's boundary and points the cycle at it. The unbounded
    /// face keeps no stored boundary since it may touch many components.
    pub(crate) fn assign_boundary(&mut self, face: FaceKey, cycle: Vec<HalfEdgeKey>) {
        self.set_face(&cycle, face);
        if face == self.unbounded {
            return;
        }
        if let Some(f) = self.faces.get_mut(face) {
            f.boundary = cycle;
        }
        self.update_representative_point(face);
    }

    /// Allocates a face for `boundary` without notifying.
    pub(crate) fn insert_face(&mut self, boundary: Vec<HalfEdgeKey>) -> FaceKey {
        let id = self.next_face_id();
        let time_created = self.tick();
        let key = self.faces.insert(Face {
            meta: ElementMeta::new(id, time_created),
            boundary: Vec::new(),
            representative_point: None,
            visual: None,
        });
        self.labels.insert(id, key.into());
        if id != ElementId::UNBOUNDED_FACE {
            self.assign_boundary(key, boundary);
            tracing::debug!(face = %id, "face created");
        }
        key
    }

    /// Notifies, then deletes a bounded face. Its visual handle, if any, is
    /// queued for release.
    pub(crate) fn remove_face(&mut self, key: FaceKey) {
        if key == self.unbounded {
            tracing::warn!("refusing to delete the unbounded face");
            return;
        }
        if !self.faces.contains_key(key) {
            return;
        }
        self.notify(Action::Deleted, key);
        if let Some(face) = self.faces.remove(key) {
            self.labels.remove(&face.meta.id());
            if let Some(handle) = face.visual {
                self.released_visuals.push(handle);
            }
            tracing::debug!(face = %face.meta.id(), "face deleted");
        }
    }
}

pub(crate) fn check_finite(p: &Point3<f64>) -> Result<()> {
    if p.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(Error::NonFiniteCoordinate(p.x, p.y, p.z))
    }
}
