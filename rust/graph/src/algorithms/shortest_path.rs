// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt::Debug;
use std::hash::Hash;

use super::{dijkstra, DijkstraOptions};
use crate::adjacency::AdjacencyGraph;
use crate::error::{Error, Result};

/// Cheapest route from `start` to `end`, stopping as soon as `end` is
/// settled.
///
/// Returns the nodes along the route, both ends included, with its total
/// cost, or `None` if `end` is out of reach within the options' limits.
pub fn shortest_path<K>(
    graph: &AdjacencyGraph<K>,
    start: K,
    end: K,
    options: DijkstraOptions,
) -> Result<Option<(Vec<K>, f64)>>
where
    K: Copy + Eq + Hash + Debug,
{
    if !graph.contains_node(end) {
        return Err(Error::NodeNotFound(format!("{end:?}")));
    }
    let mut search = dijkstra(graph, start, options)?;
    search.settle(end);
    let Some(cost) = search.cost(end).filter(|_| search.is_settled(end)) else {
        return Ok(None);
    };

    let mut route = vec![end];
    let mut node = end;
    while let Some(prev) = search.predecessor(node) {
        route.push(prev);
        node = prev;
        if route.len() > graph.node_count() {
            tracing::warn!(start = ?start, end = ?end, "predecessor chain does not terminate");
            return Ok(None);
        }
    }
    route.reverse();
    Ok(Some((route, cost)))
}
