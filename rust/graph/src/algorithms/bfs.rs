// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Breadth-first search with a depth limit. Link costs are ignored.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashSet;

use super::Pacer;
use crate::adjacency::AdjacencyGraph;
use crate::error::{Error, Result};

/// A node reached by [`Bfs`], yielded exactly once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visit<K> {
    pub id: K,
    pub predecessor: Option<K>,
    pub depth: u32,
}

/// Level-order traversal from a start node.
///
/// Nodes at `limit` are yielded but not expanded.
#[derive(Debug)]
pub struct Bfs<'g, K> {
    graph: &'g AdjacencyGraph<K>,
    limit: u32,
    queue: VecDeque<Visit<K>>,
    visited: FxHashSet<K>,
    index: usize,
    pacer: Pacer<'g>,
}

/// Starts a breadth-first search at `start`.
pub fn bfs<K>(graph: &AdjacencyGraph<K>, start: K, limit: u32) -> Result<Bfs<'_, K>>
where
    K: Copy + Eq + Hash + Debug,
{
    if !graph.contains_node(start) {
        return Err(Error::NodeNotFound(format!("{start:?}")));
    }
    let mut visited = FxHashSet::default();
    visited.insert(start);
    Ok(Bfs {
        graph,
        limit,
        queue: VecDeque::from([Visit {
            id: start,
            predecessor: None,
            depth: 0,
        }]),
        visited,
        index: 0,
        pacer: Pacer::none(),
    })
}

impl<'g, K> Bfs<'g, K> {
    /// Installs a pause hook called between batches of work.
    pub fn with_pacer(mut self, pacer: Pacer<'g>) -> Self {
        self.pacer = pacer;
        self
    }
}

impl<K> Iterator for Bfs<'_, K>
where
    K: Copy + Eq + Hash + Debug,
{
    type Item = Visit<K>;

    fn next(&mut self) -> Option<Visit<K>> {
        let current = self.queue.pop_front()?;
        self.pacer.tick(self.index);
        self.index += 1;

        if current.depth < self.limit {
            for (neighbor, _) in self.graph.neighbors(current.id) {
                if self.visited.insert(neighbor) {
                    self.queue.push_back(Visit {
                        id: neighbor,
                        predecessor: Some(current.id),
                        depth: current.depth + 1,
                    });
                }
            }
        }

        tracing::trace!(node = ?current.id, depth = current.depth, "bfs visit");
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::fixtures::{link, path};
    use std::cell::Cell;

    #[test]
    fn depth_limit_stops_expansion_but_yields_the_frontier() {
        let g = path();
        let visits: Vec<_> = bfs(&g, "v0", 2).unwrap().map(|v| (v.id, v.depth)).collect();
        assert_eq!(visits, [("v0", 0), ("v1", 1), ("v2", 2)]);
    }

    #[test]
    fn predecessors_form_a_tree() {
        let mut g = path();
        link(&mut g, "v0", "v2", 10.0);
        let visits: Vec<_> = bfs(&g, "v0", 10).unwrap().collect();
        assert_eq!(visits.len(), 5);
        assert_eq!(visits[0].predecessor, None);
        let v2 = visits.iter().find(|v| v.id == "v2").unwrap();
        assert_eq!(v2.depth, 1);
        assert_eq!(v2.predecessor, Some("v0"));
    }

    #[test]
    fn limit_zero_yields_only_the_start() {
        let g = path();
        let visits: Vec<_> = bfs(&g, "v2", 0).unwrap().collect();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].id, "v2");
    }

    #[test]
    fn unknown_start_is_an_error() {
        let g = path();
        assert!(matches!(bfs(&g, "v9", 3), Err(Error::NodeNotFound(_))));
    }

    #[test]
    fn pacer_is_called_per_batch() {
        let g = path();
        let pauses = Cell::new(0);
        let pacer = Pacer::new(std::time::Duration::ZERO, |_| pauses.set(pauses.get() + 1));
        let count = bfs(&g, "v0", 10).unwrap().with_pacer(pacer).count();
        assert_eq!(count, 5);
        assert!(pauses.get() >= 1);
    }
}
