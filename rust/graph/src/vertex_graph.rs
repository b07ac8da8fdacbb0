// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertex-to-vertex adjacency: two vertices are linked when an edge joins
//! them.

use serde::{Deserialize, Serialize};
use streetnet_topology::{EdgeKey, Topology, TopologyKey, TopologyObserver, VertexKey};

use crate::adjacency::AdjacencyGraph;
use crate::link::{LinkAttributes, LinkVisuals};

/// Tunables for [`VertexGraph`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphConfig {
    /// Recompute link distances when an edge's endpoints move. Off by
    /// default: a modified edge only moves the link's arc and the stored
    /// distance keeps the length the edge had when it was created.
    pub refresh_distance_on_modify: bool,
}

/// Links each pair of vertices joined by an edge, both ways, with
/// `{distance: edge length, via: edge}`.
#[derive(Debug, Default)]
pub struct VertexGraph {
    graph: AdjacencyGraph<VertexKey>,
    config: GraphConfig,
}

impl VertexGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty junction graph with the given settings.
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            graph: AdjacencyGraph::new(),
            config,
        }
    }

    /// Like [`with_config`](Self::with_config), drawing links through `visuals`.
    pub fn with_visuals(config: GraphConfig, visuals: Box<dyn LinkVisuals>) -> Self {
        Self {
            graph: AdjacencyGraph::with_visuals(visuals),
            config,
        }
    }

    pub fn graph(&self) -> &AdjacencyGraph<VertexKey> {
        &self.graph
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn edge_created(&mut self, topology: &Topology, edge: EdgeKey) {
        let (Some((a, b)), Some(e)) = (topology.edge_vertices(edge), topology.edge(edge)) else {
            return;
        };
        let (Some(pa), Some(pb)) = (topology.vertex(a), topology.vertex(b)) else {
            return;
        };
        let arc = self.graph.visuals_mut().create_arc(pa.position(), pb.position());
        let attributes = LinkAttributes::new()
            .with_distance(e.length())
            .with_via(edge)
            .with_visual(arc);

        for (from, to) in [(a, b), (b, a)] {
            if let Err(err) = self.graph.set_link(from, to, attributes.clone()) {
                tracing::warn!(edge = %e.id(), %err, "vertex graph link rejected");
            }
        }
    }

    fn edge_modified(&mut self, topology: &Topology, edge: EdgeKey) {
        let (Some((a, b)), Some(e)) = (topology.edge_vertices(edge), topology.edge(edge)) else {
            return;
        };
        let visual = match self.graph.get_link(a, b) {
            Ok(link) => link.visual,
            Err(err) => {
                tracing::warn!(edge = %e.id(), %err, "modified edge has no vertex graph link");
                return;
            }
        };
        if let (Some(handle), Some(pa), Some(pb)) = (visual, topology.vertex(a), topology.vertex(b)) {
            self.graph
                .visuals_mut()
                .update_arc(handle, pa.position(), pb.position());
        }
        if self.config.refresh_distance_on_modify {
            for (from, to) in [(a, b), (b, a)] {
                if let Some(link) = self.graph.link_mut(from, to) {
                    link.distance = Some(e.length());
                }
            }
        }
    }

    fn edge_deleted(&mut self, topology: &Topology, edge: EdgeKey) {
        let Some((a, b)) = topology.edge_vertices(edge) else {
            return;
        };
        let via = Some(TopologyKey::Edge(edge));
        for (from, to) in [(a, b), (b, a)] {
            if self.graph.link(from, to).is_some_and(|l| l.via == via) {
                self.graph.delete_link(from, to);
            }
        }
    }
}

impl TopologyObserver for VertexGraph {
    fn on_created(&mut self, topology: &Topology, element: TopologyKey) {
        match element {
            TopologyKey::Vertex(v) => self.graph.ensure_node(v),
            TopologyKey::Edge(e) => self.edge_created(topology, e),
            _ => {}
        }
    }

    fn on_modified(&mut self, topology: &Topology, element: TopologyKey) {
        if let TopologyKey::Edge(e) = element {
            self.edge_modified(topology, e);
        }
    }

    fn on_deleted(&mut self, topology: &Topology, element: TopologyKey) {
        match element {
            TopologyKey::Vertex(v) => {
                self.graph.remove_node(v);
            }
            TopologyKey::Edge(e) => self.edge_deleted(topology, e),
            _ => {}
        }
    }
}
