// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face-to-face adjacency (the dual graph of the blocks).
//!
//! Two bounded faces are linked when they share a boundary edge. The
//! unbounded face never takes part.

use rustc_hash::FxHashSet;
use streetnet_topology::{FaceKey, HalfEdgeKey, Topology, TopologyKey, TopologyObserver};

use crate::adjacency::{AdjacencyGraph, FxIndexMap};
use crate::link::{LinkAttributes, LinkVisuals};

/// Block graph kept in step with a [`Topology`] it observes.
#[derive(Debug, Default)]
pub struct FaceGraph {
    graph: AdjacencyGraph<FaceKey>,
}

impl FaceGraph {
    /// Creates an empty face graph that draws nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty face graph that draws its links through `visuals`.
    pub fn with_visuals(visuals: Box<dyn LinkVisuals>) -> Self {
        Self {
            graph: AdjacencyGraph::with_visuals(visuals),
        }
    }

    /// Read-only view of the links.
    pub fn graph(&self) -> &AdjacencyGraph<FaceKey> {
        &self.graph
    }

    /// The bounded faces currently in the graph.
    pub fn faces(&self) -> FxHashSet<FaceKey> {
        self.graph.nodes().collect()
    }

    /// Bounded faces across the boundary of `face`, each with the first
    /// boundary half-edge found on the shared border.
    fn across_boundary(topology: &Topology, face: FaceKey) -> FxIndexMap<FaceKey, HalfEdgeKey> {
        let mut found = FxIndexMap::default();
        let Some(f) = topology.face(face) else {
            return found;
        };
        let unbounded = topology.unbounded_face();
        for &he in f.boundary() {
            let across = topology
                .half_edge(he)
                .and_then(|h| topology.half_edge(h.twin()))
                .and_then(|t| t.face());
            match across {
                Some(other) if other != face && other != unbounded => {
                    found.entry(other).or_insert(he);
                }
                _ => {}
            }
        }
        found
    }

    /// Brings the links of `face` in line with its current boundary.
    ///
    /// Missing links are created, links to faces no longer across the
    /// boundary are dropped, and every remaining link gets the distance
    /// between the current centroids, its arc moved to match.
    fn relink(&mut self, topology: &Topology, face: FaceKey) {
        self.graph.ensure_node(face);
        let wanted = Self::across_boundary(topology, face);

        let stale: Vec<FaceKey> = self
            .graph
            .neighbors(face)
            .map(|(other, _)| other)
            .filter(|other| !wanted.contains_key(other))
            .collect();
        for other in stale {
            self.graph.delete_link(face, other);
            self.graph.delete_link(other, face);
        }

        let Some(from) = topology.representative_point(face.into()) else {
            return;
        };
        for (other, via) in wanted {
            let Some(to) = topology.representative_point(other.into()) else {
                continue;
            };
            let existing = self
                .graph
                .link(face, other)
                .or_else(|| self.graph.link(other, face))
                .and_then(|l| l.visual);
            let visual = match existing {
                Some(handle) => {
                    self.graph.visuals_mut().update_arc(handle, from, to);
                    Some(handle)
                }
                None => self.graph.visuals_mut().create_arc(from, to),
            };
            let attributes = LinkAttributes::new()
                .with_distance(nalgebra::distance(&from, &to))
                .with_via(via)
                .with_visual(visual);
            for (a, b) in [(face, other), (other, face)] {
                if let Err(err) = self.graph.set_link(a, b, attributes.clone()) {
                    tracing::warn!(%err, "face graph link rejected");
                }
            }
        }
    }
}

impl TopologyObserver for FaceGraph {
    fn on_created(&mut self, topology: &Topology, element: TopologyKey) {
        match element {
            TopologyKey::Face(f) if f != topology.unbounded_face() => self.relink(topology, f),
            _ => {}
        }
    }

    fn on_modified(&mut self, topology: &Topology, element: TopologyKey) {
        match element {
            TopologyKey::Face(f) if f != topology.unbounded_face() => self.relink(topology, f),
            _ => {}
        }
    }

    fn on_deleted(&mut self, _topology: &Topology, element: TopologyKey) {
        if let TopologyKey::Face(f) = element {
            self.graph.remove_node(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::algorithms::{dijkstra, DijkstraOptions};
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use streetnet_topology::VertexKey;

    fn p(x: f64, y: f64) -> Point3<f64> {
        Point3::new(x, y, 0.0)
    }

    fn observed() -> (Topology, Rc<RefCell<FaceGraph>>) {
        let mut topo = Topology::new();
        let graph = Rc::new(RefCell::new(FaceGraph::new()));
        topo.subscribe(graph.clone());
        (topo, graph)
    }

    fn square(topo: &mut Topology) -> [VertexKey; 4] {
        let v = [
            topo.create_vertex(p(0.0, 0.0)).unwrap(),
            topo.create_vertex(p(2.0, 0.0)).unwrap(),
            topo.create_vertex(p(2.0, 2.0)).unwrap(),
            topo.create_vertex(p(0.0, 2.0)).unwrap(),
        ];
        for i in 0..4 {
            topo.create_edge(v[i], v[(i + 1) % 4]).unwrap();
        }
        v
    }

    #[test]
    fn the_unbounded_face_is_never_a_node() {
        let (mut topo, graph) = observed();
        square(&mut topo);
        let g = graph.borrow();
        assert!(!g.graph().contains_node(topo.unbounded_face()));
        assert_eq!(g.graph().node_count(), 1);
        assert_eq!(g.graph().link_count(), 0);
    }

    #[test]
    fn splitting_a_face_links_the_halves() {
        let (mut topo, graph) = observed();
        let [a, _, c, _] = square(&mut topo);
        let diagonal = topo.create_edge(a, c).unwrap().unwrap();

        let g = graph.borrow();
        let faces: Vec<FaceKey> = g.graph().nodes().collect();
        assert_eq!(faces.len(), 2);
        let link = g.graph().get_link(faces[0], faces[1]).unwrap();
        let via = match link.via {
            Some(TopologyKey::HalfEdge(he)) => he,
            other => panic!("unexpected via {other:?}"),
        };
        assert_eq!(topo.half_edge(via).unwrap().edge(), diagonal);
        assert!(g.graph().link(faces[1], faces[0]).is_some());
    }

    #[test]
    fn merging_faces_drops_their_nodes() {
        let (mut topo, graph) = observed();
        let [a, _, c, _] = square(&mut topo);
        let diagonal = topo.create_edge(a, c).unwrap().unwrap();
        topo.delete_edge(diagonal).unwrap();

        let g = graph.borrow();
        assert_eq!(g.graph().node_count(), 1);
        assert_eq!(g.graph().link_count(), 0);
        let merged = g.graph().nodes().next().unwrap();
        assert!(topo.face(merged).is_some());
    }

    #[test]
    fn a_row_of_blocks_is_a_path_in_the_dual() {
        let (mut topo, graph) = observed();
        // Three unit blocks side by side.
        let bottom: Vec<_> = (0..4).map(|x| topo.create_vertex(p(x as f64, 0.0)).unwrap()).collect();
        let top: Vec<_> = (0..4).map(|x| topo.create_vertex(p(x as f64, 1.0)).unwrap()).collect();
        for i in 0..3 {
            topo.create_edge(bottom[i], bottom[i + 1]).unwrap();
            topo.create_edge(top[i], top[i + 1]).unwrap();
        }
        for i in 0..4 {
            topo.create_edge(bottom[i], top[i]).unwrap();
        }

        let g = graph.borrow();
        assert_eq!(g.graph().node_count(), 3);
        assert_eq!(g.graph().link_count(), 4);
        let degrees: Vec<usize> = g
            .graph()
            .nodes()
            .map(|f| g.graph().neighbors(f).count())
            .collect();
        let mut sorted = degrees.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, [1, 1, 2]);
        assert_eq!(g.faces().len(), 3);
    }

    /// Two unit blocks side by side: `f1` on the left, `f2` on the right.
    fn two_blocks(topo: &mut Topology) -> ([VertexKey; 3], [VertexKey; 3]) {
        let bottom = [0.0, 1.0, 2.0].map(|x| topo.create_vertex(p(x, 0.0)).unwrap());
        let top = [0.0, 1.0, 2.0].map(|x| topo.create_vertex(p(x, 1.0)).unwrap());
        for i in 0..2 {
            topo.create_edge(bottom[i], bottom[i + 1]).unwrap();
            topo.create_edge(top[i], top[i + 1]).unwrap();
        }
        for i in 0..3 {
            topo.create_edge(bottom[i], top[i]).unwrap();
        }
        (bottom, top)
    }

    #[test]
    fn links_carry_the_distance_between_centroids() {
        let (mut topo, graph) = observed();
        two_blocks(&mut topo);

        let g = graph.borrow();
        let faces: Vec<FaceKey> = g.graph().nodes().collect();
        assert_eq!(faces.len(), 2);
        for (a, b) in [(faces[0], faces[1]), (faces[1], faces[0])] {
            let distance = g.graph().get_link(a, b).unwrap().distance.unwrap();
            assert_relative_eq!(distance, 1.0);
        }

        let reached: Vec<_> = dijkstra(g.graph(), faces[0], DijkstraOptions::default())
            .unwrap()
            .collect();
        assert_eq!(reached.len(), 2);
        assert_eq!(reached[1].id, faces[1]);
        assert_relative_eq!(reached[1].cost, 1.0);
    }

    #[test]
    fn moving_a_corner_refreshes_the_distance() {
        let (mut topo, graph) = observed();
        let (bottom, _) = two_blocks(&mut topo);
        topo.move_vertex(bottom[2], p(3.0, 0.0)).unwrap();

        let g = graph.borrow();
        let faces: Vec<FaceKey> = g.graph().nodes().collect();
        let left = topo.face(faces[0]).unwrap().representative_point().unwrap();
        let right = topo.face(faces[1]).unwrap().representative_point().unwrap();
        let expected = nalgebra::distance(&left, &right);
        assert!(expected > 1.0);
        for (a, b) in [(faces[0], faces[1]), (faces[1], faces[0])] {
            let distance = g.graph().get_link(a, b).unwrap().distance.unwrap();
            assert_relative_eq!(distance, expected);
        }
    }
}
