// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brandes betweenness centrality on weighted links.
//!
//! Every node in turn is a source for [`dijkstra_all`]; dependencies are
//! then accumulated back from the farthest node. Scores add up across
//! sources and are never reset. A finite cost limit restricts each source
//! to the paths within that radius.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use super::{dijkstra_all, DijkstraOptions, Pacer, PathState};
use crate::adjacency::{AdjacencyGraph, FxIndexMap};
use crate::error::Result;

/// Centrality score per node, in graph order.
pub type Centrality<K> = FxIndexMap<K, f64>;

/// Back-propagation of one source's shortest-path tree.
#[derive(Debug)]
struct Accumulation<K> {
    source: K,
    states: FxIndexMap<K, PathState<K>>,
    /// Nodes ordered so every predecessor comes before its successors;
    /// popped from the end.
    stack: Vec<K>,
    dependency: FxHashMap<K, f64>,
}

/// Lazy betweenness computation yielding a snapshot after every node
/// popped off a source's stack, then a final snapshot.
#[derive(Debug)]
pub struct Betweenness<'g, K> {
    graph: &'g AdjacencyGraph<K>,
    options: DijkstraOptions,
    sources: Vec<K>,
    next_source: usize,
    centrality: Centrality<K>,
    current: Option<Accumulation<K>>,
    finished: bool,
    pacer: Pacer<'g>,
}

/// Starts a betweenness computation over every node of `graph`.
pub fn betweenness<K>(graph: &AdjacencyGraph<K>, options: DijkstraOptions) -> Betweenness<'_, K>
where
    K: Copy + Eq + Hash + Debug,
{
    Betweenness {
        graph,
        options,
        sources: graph.nodes().collect(),
        next_source: 0,
        centrality: graph.nodes().map(|k| (k, 0.0)).collect(),
        current: None,
        finished: false,
        pacer: Pacer::none(),
    }
}

impl<'g, K> Betweenness<'g, K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Installs a pause hook called between batches of work.
    pub fn with_pacer(mut self, pacer: Pacer<'g>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Scores accumulated so far.
    pub fn centrality(&self) -> &Centrality<K> {
        &self.centrality
    }

    /// Runs to completion and returns the final scores.
    pub fn finish(mut self) -> Centrality<K> {
        while self.next().is_some() {}
        self.centrality
    }

    fn start_source(&mut self, source: K) -> Result<Accumulation<K>> {
        let states = dijkstra_all(self.graph, source, self.options.clone())?.into_states();
        let mut stack: Vec<K> = states.keys().copied().collect();
        stack.sort_by_key(|k| states.get(k).map_or(0, |s| s.updated));
        tracing::debug!(source = ?source, reached = stack.len(), "betweenness source done");
        Ok(Accumulation {
            source,
            states,
            stack,
            dependency: FxHashMap::default(),
        })
    }

    /// Pops one node and spreads its dependency to its predecessors.
    fn pop(&mut self) -> bool {
        let Some(acc) = self.current.as_mut() else {
            return false;
        };
        let Some(w) = acc.stack.pop() else {
            return false;
        };
        let Some(state) = acc.states.get(&w) else {
            return true;
        };
        let dep_w = acc.dependency.get(&w).copied().unwrap_or(0.0);
        for v in &state.predecessors {
            let sigma_v = acc.states.get(v).map_or(0.0, |s| s.path_count);
            let share = (sigma_v / state.path_count) * (1.0 + dep_w);
            *acc.dependency.entry(*v).or_insert(0.0) += share;
        }
        if w != acc.source {
            *self.centrality.entry(w).or_insert(0.0) += dep_w;
        }
        true
    }
}

impl<K> Iterator for Betweenness<'_, K>
where
    K: Copy + Eq + Hash + Debug,
{
    type Item = Centrality<K>;

    fn next(&mut self) -> Option<Centrality<K>> {
        loop {
            if self.pop() {
                return Some(self.centrality.clone());
            }
            if let Some(&source) = self.sources.get(self.next_source) {
                self.next_source += 1;
                self.pacer.pause();
                match self.start_source(source) {
                    Ok(acc) => self.current = Some(acc),
                    Err(err) => {
                        tracing::warn!(source = ?source, %err, "betweenness source skipped");
                        self.current = None;
                    }
                }
                continue;
            }
            if self.finished {
                return None;
            }
            self.finished = true;
            self.current = None;
            return Some(self.centrality.clone());
        }
    }
}
