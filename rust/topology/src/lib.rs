// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Streetnet Topology
//!
//! Planar doubly-connected edge list (DCEL) for interactively drawn street
//! networks.
//!
//! Vertices are placed one at a time and joined by edges; every insertion
//! keeps the half-edge fans sorted by bearing and splits the face it closes
//! off, so the set of faces (blocks) is always current. Elements live in
//! slot map arenas and refer to each other by key. Derived structures such
//! as adjacency graphs follow along by subscribing a [`TopologyObserver`].

pub mod arena;
pub mod construction;
pub mod editing;
pub mod error;
pub mod geometry;
pub mod keys;
pub mod observer;
pub mod serialization;
pub mod traversal;
pub mod validate;

pub use arena::{Edge, ElementMeta, Face, HalfEdge, Topology, TopologyConfig, Vertex};
pub use error::{Error, Result};
pub use geometry::{absolute_bearing_difference, bearing};
pub use keys::{
    EdgeKey, ElementId, ElementKind, FaceKey, HalfEdgeKey, ParseElementIdError, Side, TopologyKey,
    VertexKey, VisualHandle,
};
pub use observer::{Action, Notification, ObserverId, TopologyObserver};
pub use serialization::TopologySnapshot;
pub use traversal::BoundaryCycle;
pub use validate::TopologyIssue;
