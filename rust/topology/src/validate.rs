// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structural invariant checks.

use rustc_hash::FxHashSet;

use crate::arena::Topology;
use crate::keys::{ElementId, HalfEdgeKey};

/// A broken invariant found by [`Topology::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyIssue {
    #[error("{0}: twin of twin is not itself")]
    TwinMismatch(ElementId),

    #[error("{0}: next.prev is not itself")]
    NextPrevMismatch(ElementId),

    #[error("{0}: following next does not return to it")]
    OpenCycle(ElementId),

    #[error("{0}: no face assigned")]
    Unassigned(ElementId),

    #[error("{half_edge}: listed on the boundary of {face} but points at another face")]
    FaceMismatch { face: ElementId, half_edge: ElementId },

    #[error("{0}: stored boundary is not a closed next-cycle")]
    StaleBoundary(ElementId),

    #[error("{half_edge}: points at {face} but is not on its boundary")]
    Detached { face: ElementId, half_edge: ElementId },

    #[error("{0}: missing from its origin's half-edge fan")]
    FanMismatch(ElementId),
}

impl Topology {
    /// Checks every structural invariant and returns what is broken.
    /// An empty vector means the topology is consistent.
    pub fn validate(&self) -> Vec<TopologyIssue> {
        let mut issues = Vec::new();
        let on_bounded: FxHashSet<HalfEdgeKey> = self
            .faces
            .iter()
            .filter(|(k, _)| *k != self.unbounded)
            .flat_map(|(_, f)| f.boundary.iter().copied())
            .collect();

        for (key, he) in &self.half_edges {
            let id = he.id();
            if self.half_edges.get(he.twin).map(|t| t.twin) != Some(key) {
                issues.push(TopologyIssue::TwinMismatch(id));
            }
            if self.half_edges.get(he.next).map(|n| n.prev) != Some(key) {
                issues.push(TopologyIssue::NextPrevMismatch(id));
            }
            // The walk is bounded by the half-edge count, so an open chain
            // ends on a half-edge whose `next` is not `key`.
            let closes = self
                .boundary_cycle(key)
                .last()
                .and_then(|last| self.half_edges.get(last))
                .is_some_and(|last| last.next == key);
            if !closes {
                issues.push(TopologyIssue::OpenCycle(id));
            }
            match he.face {
                Some(f) if f != self.unbounded && !on_bounded.contains(&key) => {
                    if let Some(face) = self.faces.get(f) {
                        issues.push(TopologyIssue::Detached {
                            face: face.id(),
                            half_edge: id,
                        });
                    } else {
                        issues.push(TopologyIssue::Unassigned(id));
                    }
                }
                Some(f) if self.faces.contains_key(f) => {}
                _ => issues.push(TopologyIssue::Unassigned(id)),
            }
            let in_fan = self
                .vertices
                .get(he.origin)
                .is_some_and(|v| v.half_edges.contains(&key) && v.sorted_half_edges.contains(&key));
            if !in_fan {
                issues.push(TopologyIssue::FanMismatch(id));
            }
        }

        for (key, face) in &self.faces {
            if key == self.unbounded {
                continue;
            }
            for &he in &face.boundary {
                let Some(h) = self.half_edges.get(he) else {
                    issues.push(TopologyIssue::StaleBoundary(face.id()));
                    break;
                };
                if h.face != Some(key) {
                    issues.push(TopologyIssue::FaceMismatch {
                        face: face.id(),
                        half_edge: h.id(),
                    });
                }
            }
            let walked: Vec<_> = face
                .boundary
                .first()
                .map(|&start| self.boundary_cycle(start).collect())
                .unwrap_or_default();
            if walked != face.boundary {
                issues.push(TopologyIssue::StaleBoundary(face.id()));
            }
        }

        if !issues.is_empty() {
            tracing::warn!(count = issues.len(), "topology failed validation");
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn p(x: f64, y: f64) -> Point3<f64> {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn empty_topology_is_valid() {
        assert!(Topology::new().validate().is_empty());
    }

    #[test]
    fn grid_stays_valid_through_every_insertion() {
        let mut topo = Topology::new();
        let mut grid = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                grid.push(topo.create_vertex(p(i as f64, j as f64)).unwrap());
            }
        }
        let at = |i: usize, j: usize| grid[j * 3 + i];
        for j in 0..3 {
            for i in 0..2 {
                topo.create_edge(at(i, j), at(i + 1, j)).unwrap();
                assert!(topo.validate().is_empty());
                topo.create_edge(at(j, i), at(j, i + 1)).unwrap();
                assert!(topo.validate().is_empty());
            }
        }
        assert_eq!(topo.bounded_face_count(), 4);

        // Every half-edge lies on exactly one face.
        let f0 = topo.unbounded_face();
        let bounded: usize = topo
            .faces()
            .filter(|(k, _)| *k != f0)
            .map(|(_, f)| f.boundary().len())
            .sum();
        let outer = topo
            .half_edges()
            .filter(|(_, he)| he.face() == Some(f0))
            .count();
        assert_eq!(bounded + outer, topo.half_edge_count());
        assert_eq!(outer, 8);
    }

    #[test]
    fn corrupted_twin_is_reported() {
        let mut topo = Topology::new();
        let a = topo.create_vertex(p(0.0, 0.0)).unwrap();
        let b = topo.create_vertex(p(1.0, 0.0)).unwrap();
        let c = topo.create_vertex(p(0.0, 1.0)).unwrap();
        let e0 = topo.create_edge(a, b).unwrap().unwrap();
        let e1 = topo.create_edge(b, c).unwrap().unwrap();

        let he = topo.edge(e0).unwrap().first();
        let other = topo.edge(e1).unwrap().first();
        topo.half_edges[he].twin = other;

        let issues = topo.validate();
        assert!(issues.contains(&TopologyIssue::TwinMismatch(ElementId::HalfEdge(
            0,
            crate::keys::Side::First
        ))));
        assert_eq!(
            issues[0].to_string(),
            "e0_1: twin of twin is not itself"
        );
    }

    #[test]
    fn half_edge_off_its_face_boundary_is_reported() {
        let mut topo = Topology::new();
        let a = topo.create_vertex(p(0.0, 0.0)).unwrap();
        let b = topo.create_vertex(p(4.0, 0.0)).unwrap();
        let c = topo.create_vertex(p(0.0, 4.0)).unwrap();
        topo.create_edge(a, b).unwrap();
        topo.create_edge(b, c).unwrap();
        topo.create_edge(c, a).unwrap();
        let d = topo.create_vertex(p(1.0, 1.0)).unwrap();
        let e = topo.create_vertex(p(2.0, 1.0)).unwrap();
        let segment = topo.create_edge(d, e).unwrap().unwrap();
        assert!(topo.validate().is_empty());

        let triangle = topo
            .faces()
            .find(|(_, f)| !f.is_unbounded())
            .map(|(k, _)| k)
            .unwrap();
        let he = topo.edge(segment).unwrap().first();
        topo.half_edges[he].face = Some(triangle);

        assert_eq!(
            topo.validate(),
            vec![TopologyIssue::Detached {
                face: ElementId::Face(1),
                half_edge: ElementId::HalfEdge(3, crate::keys::Side::First),
            }]
        );
    }
}
