// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for graph operations.

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or traversing graphs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The node has no entry in the link table.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// There is no directed link between the two nodes.
    #[error("no link from {from} to {to}")]
    LinkNotFound { from: String, to: String },

    /// A numeric link attribute was NaN or infinite.
    #[error("link attribute {name} is not finite: {value}")]
    InvalidAttribute { name: String, value: f64 },

    /// Traversal settings could not be parsed or are out of range.
    #[error("invalid traversal settings: {0}")]
    InvalidSettings(String),

    /// Error raised by the underlying topology.
    #[error(transparent)]
    Topology(#[from] streetnet_topology::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
