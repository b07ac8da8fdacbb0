// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for topology operations.

use crate::keys::{EdgeKey, FaceKey, HalfEdgeKey, VertexKey};

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during topology operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Vertex key not found in the arena.
    #[error("vertex not found: {0:?}")]
    VertexNotFound(VertexKey),

    /// Half-edge key not found in the arena.
    #[error("half-edge not found: {0:?}")]
    HalfEdgeNotFound(HalfEdgeKey),

    /// Edge key not found in the arena.
    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeKey),

    /// Face key not found in the arena.
    #[error("face not found: {0:?}")]
    FaceNotFound(FaceKey),

    /// A position had a NaN or infinite coordinate.
    #[error("position has a non-finite coordinate: [{0}, {1}, {2}]")]
    NonFiniteCoordinate(f64, f64, f64),

    /// Following `next` pointers did not return to the start.
    #[error("boundary walk from {0} did not close after {1} steps")]
    BrokenCycle(String, usize),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
