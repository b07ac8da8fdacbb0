// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dijkstra that keeps every shortest path.
//!
//! Each node records all predecessors on a shortest path and how many
//! distinct shortest paths reach it. An exact tie adds the current node as
//! another predecessor and yields the node again.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashSet;
use smallvec::{smallvec, SmallVec};

use super::{DijkstraOptions, Pacer};
use crate::adjacency::{AdjacencyGraph, FxIndexMap};
use crate::error::{Error, Result};
use crate::priority_queue::PriorityQueue;

/// Shortest-path bookkeeping for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct PathState<K> {
    pub cost: f64,
    pub predecessors: SmallVec<[K; 2]>,
    /// Number of distinct shortest paths from the start.
    pub path_count: f64,
    /// Sequence number of the last change to this entry.
    pub updated: u64,
}

/// A node reached, improved or tied by [`DijkstraAll`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReachedAll<K> {
    pub id: K,
    pub predecessors: SmallVec<[K; 2]>,
    pub cost: f64,
    pub path_count: f64,
}

#[derive(Debug)]
pub struct DijkstraAll<'g, K> {
    graph: &'g AdjacencyGraph<K>,
    options: DijkstraOptions,
    states: FxIndexMap<K, PathState<K>>,
    visited: FxHashSet<K>,
    queue: PriorityQueue<K>,
    pending: VecDeque<ReachedAll<K>>,
    sequence: u64,
    expanded: usize,
    finished: bool,
    pacer: Pacer<'g>,
}

/// Starts an all-shortest-paths search at `start`.
pub fn dijkstra_all<K>(
    graph: &AdjacencyGraph<K>,
    start: K,
    options: DijkstraOptions,
) -> Result<DijkstraAll<'_, K>>
where
    K: Copy + Eq + Hash + Debug,
{
    if !graph.contains_node(start) {
        return Err(Error::NodeNotFound(format!("{start:?}")));
    }
    let mut states = FxIndexMap::default();
    states.insert(
        start,
        PathState {
            cost: 0.0,
            predecessors: SmallVec::new(),
            path_count: 1.0,
            updated: 0,
        },
    );
    let mut queue = PriorityQueue::new();
    queue.enqueue(start, 0.0);
    Ok(DijkstraAll {
        graph,
        options,
        states,
        visited: FxHashSet::default(),
        queue,
        pending: VecDeque::from([ReachedAll {
            id: start,
            predecessors: SmallVec::new(),
            cost: 0.0,
            path_count: 1.0,
        }]),
        sequence: 1,
        expanded: 0,
        finished: false,
        pacer: Pacer::none(),
    })
}

impl<'g, K> DijkstraAll<'g, K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Installs a pause hook called between batches of work.
    pub fn with_pacer(mut self, pacer: Pacer<'g>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Every node reached so far, in the order it was first reached.
    pub fn states(&self) -> &FxIndexMap<K, PathState<K>> {
        &self.states
    }

    /// Drains the search and returns the final state of every node.
    pub fn into_states(mut self) -> FxIndexMap<K, PathState<K>> {
        while self.next().is_some() {}
        self.states
    }

    fn record(&mut self, id: K) {
        if let Some(state) = self.states.get(&id) {
            self.pending.push_back(ReachedAll {
                id,
                predecessors: state.predecessors.clone(),
                cost: state.cost,
                path_count: state.path_count,
            });
        }
    }

    fn expand_next(&mut self) -> bool {
        let graph = self.graph;
        while let Some(current) = self.queue.dequeue() {
            if !self.visited.insert(current) {
                continue;
            }
            self.pacer.tick(self.expanded);
            self.expanded += 1;

            let Some((base, paths, first_pred)) = self
                .states
                .get(&current)
                .map(|s| (s.cost, s.path_count, s.predecessors.first().copied()))
            else {
                continue;
            };
            let arrived_via = first_pred
                .and_then(|p| graph.link(current, p))
                .and_then(|l| l.via);

            for (neighbor, link) in graph.neighbors(current) {
                let Some(step) = self.options.step_cost(current, neighbor, link, arrived_via) else {
                    continue;
                };
                let updated = base + step;
                if updated > self.options.cost_limit {
                    continue;
                }

                let sequence = self.sequence;
                match self.states.get_mut(&neighbor) {
                    Some(state) if updated < state.cost => {
                        state.cost = updated;
                        state.predecessors = smallvec![current];
                        state.path_count = paths;
                        state.updated = sequence;
                    }
                    // A settled node is never re-opened on a tie; with
                    // zero-cost links that would let two nodes become each
                    // other's predecessor.
                    Some(state) if updated == state.cost && !self.visited.contains(&neighbor) => {
                        if state.predecessors.contains(&current) {
                            continue;
                        }
                        state.predecessors.push(current);
                        state.path_count += paths;
                        state.updated = sequence;
                    }
                    Some(_) => continue,
                    None => {
                        self.states.insert(
                            neighbor,
                            PathState {
                                cost: updated,
                                predecessors: smallvec![current],
                                path_count: paths,
                                updated: sequence,
                            },
                        );
                    }
                }
                self.sequence += 1;
                self.queue.enqueue(neighbor, updated);
                self.record(neighbor);
            }

            if base > self.options.cost_limit {
                tracing::debug!(node = ?current, cost = base, "cost limit reached");
                return false;
            }
            return true;
        }
        false
    }
}

impl<K> Iterator for DijkstraAll<'_, K>
where
    K: Copy + Eq + Hash + Debug,
{
    type Item = ReachedAll<K>;

    fn next(&mut self) -> Option<ReachedAll<K>> {
        loop {
            if let Some(reached) = self.pending.pop_front() {
                tracing::trace!(
                    node = ?reached.id,
                    cost = reached.cost,
                    paths = reached.path_count,
                    "dijkstra_all reached"
                );
                return Some(reached);
            }
            if self.finished {
                return None;
            }
            if !self.expand_next() {
                self.finished = true;
            }
        }
    }
}
