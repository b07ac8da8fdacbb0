// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Streetnet Graph
//!
//! Adjacency graphs derived from a [`streetnet_topology::Topology`] and the
//! traversals that run on them.
//!
//! - [`VertexGraph`]: junctions linked by the streets between them.
//! - [`EdgeGraph`]: streets linked at the junctions they share, carrying turn
//!   angles for angular analysis.
//! - [`FaceGraph`]: blocks linked across shared streets.
//!
//! Each graph is a [`TopologyObserver`] and stays in step with the topology
//! once subscribed:
//!
//! ```no_run
//! use std::{cell::RefCell, rc::Rc};
//! use nalgebra::Point3;
//! use streetnet_graph::{run, TraversalSettings, VertexGraph};
//! use streetnet_topology::Topology;
//!
//! let mut topology = Topology::new();
//! let graph = Rc::new(RefCell::new(VertexGraph::new()));
//! topology.subscribe(graph.clone());
//!
//! let a = topology.create_vertex(Point3::new(0.0, 0.0, 0.0))?;
//! let b = topology.create_vertex(Point3::new(4.0, 0.0, 0.0))?;
//! topology.create_edge(a, b)?;
//!
//! let graph = graph.borrow();
//! for progress in run(graph.graph(), a, &TraversalSettings::default())? {
//!     println!("{:?}", progress);
//! }
//! # Ok::<(), streetnet_graph::Error>(())
//! ```
//!
//! [`TopologyObserver`]: streetnet_topology::TopologyObserver

pub mod adjacency;
pub mod algorithms;
pub mod edge_graph;
pub mod error;
pub mod face_graph;
pub mod link;
pub mod priority_queue;
pub mod settings;
pub mod vertex_graph;

pub use adjacency::{AdjacencyGraph, FxIndexMap, GraphSnapshot, LinkSnapshot};
pub use algorithms::{
    betweenness, bfs, dijkstra, dijkstra_all, shortest_path, Centrality, DijkstraOptions, Pacer,
    Reached, ReachedAll, Visit, U_TURN_PENALTY,
};
pub use edge_graph::EdgeGraph;
pub use error::{Error, Result};
pub use face_graph::FaceGraph;
pub use link::{CostName, LinkAttributes, LinkVisuals, NoVisuals};
pub use priority_queue::PriorityQueue;
pub use settings::{run, run_paced, Algorithm, Progress, ProgressIter, TraversalSettings};
pub use vertex_graph::{GraphConfig, VertexGraph};
