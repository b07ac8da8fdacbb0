// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge-to-edge adjacency (the line graph of the street network).
//!
//! Two edges are linked when they meet at a vertex. A link carries the turn
//! angle between them and half the length of each, so a path through the
//! edge graph costs the distance from midpoint to midpoint.

use streetnet_topology::{
    absolute_bearing_difference, EdgeKey, HalfEdge, HalfEdgeKey, Topology, TopologyKey,
    TopologyObserver, VertexKey,
};

use crate::adjacency::AdjacencyGraph;
use crate::link::{LinkAttributes, LinkVisuals};

/// One junction between two edges, seen from the first.
struct Junction {
    neighbor: EdgeKey,
    via: VertexKey,
    bearing_change: f64,
    distance: f64,
}

/// Street graph kept in step with a [`Topology`] it observes.
#[derive(Debug, Default)]
pub struct EdgeGraph {
    graph: AdjacencyGraph<EdgeKey>,
}

impl EdgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty street graph that draws its links through `visuals`.
    pub fn with_visuals(visuals: Box<dyn LinkVisuals>) -> Self {
        Self {
            graph: AdjacencyGraph::with_visuals(visuals),
        }
    }

    pub fn graph(&self) -> &AdjacencyGraph<EdgeKey> {
        &self.graph
    }

    /// Every edge meeting `edge` at either end.
    ///
    /// For each half-edge of `edge` the junction is its destination; the
    /// other half-edges leaving that vertex are the ways on. The twin is
    /// skipped since it leads back along `edge` itself.
    fn junctions(topology: &Topology, edge: EdgeKey) -> Vec<Junction> {
        let Some(e) = topology.edge(edge) else {
            return Vec::new();
        };
        let mut junctions = Vec::new();
        for he_key in e.half_edges() {
            let Some((he, via)) = Self::arrival(topology, he_key) else {
                continue;
            };
            let Some(v) = topology.vertex(via) else {
                continue;
            };
            for &out_key in v.sorted_half_edges() {
                if out_key == he.twin() {
                    continue;
                }
                let Some(out) = topology.half_edge(out_key) else {
                    continue;
                };
                let Some(other) = topology.edge(out.edge()) else {
                    continue;
                };
                junctions.push(Junction {
                    neighbor: out.edge(),
                    via,
                    bearing_change: absolute_bearing_difference(he.bearing(), out.bearing()),
                    distance: e.length() / 2.0 + other.length() / 2.0,
                });
            }
        }
        junctions
    }

    fn arrival(topology: &Topology, key: HalfEdgeKey) -> Option<(&HalfEdge, VertexKey)> {
        Some((topology.half_edge(key)?, topology.destination(key)?))
    }

    fn edge_created(&mut self, topology: &Topology, edge: EdgeKey) {
        self.graph.ensure_node(edge);
        let Some(from) = topology.edge(edge).map(|e| e.midpoint()) else {
            return;
        };
        for j in Self::junctions(topology, edge) {
            let Some(to) = topology.edge(j.neighbor).map(|e| e.midpoint()) else {
                continue;
            };
            let arc = self.graph.visuals_mut().create_arc(from, to);
            let attributes = LinkAttributes::new()
                .with_distance(j.distance)
                .with_bearing_change(j.bearing_change)
                .with_via(j.via)
                .with_visual(arc);
            for (a, b) in [(edge, j.neighbor), (j.neighbor, edge)] {
                if let Err(err) = self.graph.set_link(a, b, attributes.clone()) {
                    tracing::warn!(%err, "edge graph link rejected");
                }
            }
        }
    }

    /// Refreshes turn angles, distances and arcs of the links that already
    /// exist. Links are never added here.
    fn edge_modified(&mut self, topology: &Topology, edge: EdgeKey) {
        let Some(from) = topology.edge(edge).map(|e| e.midpoint()) else {
            return;
        };
        for j in Self::junctions(topology, edge) {
            let mut visual = None;
            for (a, b) in [(edge, j.neighbor), (j.neighbor, edge)] {
                if let Some(link) = self.graph.link_mut(a, b) {
                    link.bearing_change = Some(j.bearing_change);
                    link.distance = Some(j.distance);
                    visual = visual.or(link.visual);
                }
            }
            let to = topology.edge(j.neighbor).map(|e| e.midpoint());
            if let (Some(handle), Some(to)) = (visual, to) {
                self.graph.visuals_mut().update_arc(handle, from, to);
            }
        }
    }
}

impl TopologyObserver for EdgeGraph {
    fn on_created(&mut self, topology: &Topology, element: TopologyKey) {
        if let TopologyKey::Edge(e) = element {
            self.edge_created(topology, e);
        }
    }

    fn on_modified(&mut self, topology: &Topology, element: TopologyKey) {
        if let TopologyKey::Edge(e) = element {
            self.edge_modified(topology, e);
        }
    }

    fn on_deleted(&mut self, _topology: &Topology, element: TopologyKey) {
        if let TopologyKey::Edge(e) = element {
            self.graph.remove_node(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn p(x: f64, y: f64) -> Point3<f64> {
        Point3::new(x, y, 0.0)
    }

    /// `a - b - c` in a straight line with a spur `b - d` going north.
    fn junction() -> (Topology, Rc<RefCell<EdgeGraph>>, [EdgeKey; 3], VertexKey) {
        let mut topo = Topology::new();
        let graph = Rc::new(RefCell::new(EdgeGraph::new()));
        topo.subscribe(graph.clone());
        let a = topo.create_vertex(p(0.0, 0.0)).unwrap();
        let b = topo.create_vertex(p(2.0, 0.0)).unwrap();
        let c = topo.create_vertex(p(6.0, 0.0)).unwrap();
        let d = topo.create_vertex(p(2.0, 2.0)).unwrap();
        let ab = topo.create_edge(a, b).unwrap().unwrap();
        let bc = topo.create_edge(b, c).unwrap().unwrap();
        let bd = topo.create_edge(b, d).unwrap().unwrap();
        (topo, graph, [ab, bc, bd], b)
    }

    #[test]
    fn edges_meeting_at_a_vertex_are_linked_with_turn_angles() {
        let (_topo, graph, [ab, bc, bd], b) = junction();
        let g = graph.borrow();

        let straight = g.graph().get_link(ab, bc).unwrap();
        assert_relative_eq!(straight.bearing_change.unwrap(), 0.0);
        assert_relative_eq!(straight.distance.unwrap(), 3.0);
        assert_eq!(straight.via, Some(TopologyKey::Vertex(b)));

        let turn = g.graph().get_link(ab, bd).unwrap();
        assert_relative_eq!(turn.bearing_change.unwrap(), 90.0);
        assert_relative_eq!(turn.distance.unwrap(), 2.0);

        assert_relative_eq!(g.graph().get_link(bd, bc).unwrap().bearing_change.unwrap(), 90.0);
        assert_eq!(g.graph().link_count(), 6);
    }

    #[test]
    fn links_are_symmetric() {
        let (_topo, graph, [ab, bc, bd], _) = junction();
        let g = graph.borrow();
        for (x, y) in [(ab, bc), (ab, bd), (bc, bd)] {
            assert_eq!(g.graph().get_link(x, y).unwrap(), g.graph().get_link(y, x).unwrap());
        }
    }

    #[test]
    fn moving_the_junction_refreshes_existing_links() {
        let (mut topo, graph, [ab, bc, bd], b) = junction();
        topo.move_vertex(b, p(2.0, -2.0)).unwrap();

        let g = graph.borrow();
        let turn = g.graph().get_link(ab, bc).unwrap();
        assert!(turn.bearing_change.unwrap() > 0.0);
        let ab_len = topo.edge(ab).unwrap().length();
        let bd_len = topo.edge(bd).unwrap().length();
        assert_relative_eq!(
            g.graph().get_link(ab, bd).unwrap().distance.unwrap(),
            ab_len / 2.0 + bd_len / 2.0
        );
        assert_eq!(g.graph().link_count(), 6);
    }

    #[test]
    fn deleted_edges_leave_the_graph() {
        let (mut topo, graph, [ab, bc, bd], _) = junction();
        topo.delete_edge(bd).unwrap();

        let g = graph.borrow();
        assert!(!g.graph().contains_node(bd));
        assert!(g.graph().link(ab, bd).is_none());
        assert!(g.graph().link(ab, bc).is_some());
        assert_eq!(g.graph().link_count(), 2);
    }

    #[test]
    fn isolated_edges_are_nodes_without_links() {
        let mut topo = Topology::new();
        let graph = Rc::new(RefCell::new(EdgeGraph::new()));
        topo.subscribe(graph.clone());
        let a = topo.create_vertex(p(0.0, 0.0)).unwrap();
        let b = topo.create_vertex(p(1.0, 0.0)).unwrap();
        let e = topo.create_edge(a, b).unwrap().unwrap();

        let g = graph.borrow();
        assert!(g.graph().contains_node(e));
        assert_eq!(g.graph().neighbors(e).count(), 0);
    }
}
