// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-source Dijkstra bounded by a total cost limit.
//!
//! Costs are never initialised to infinity: a node enters the cost table
//! the first time it is reached. Every improvement is yielded, so a node
//! may appear several times with decreasing cost.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use streetnet_topology::TopologyKey;

use super::{Pacer, U_TURN_PENALTY};
use crate::adjacency::AdjacencyGraph;
use crate::error::{Error, Result};
use crate::link::{CostName, LinkAttributes};
use crate::priority_queue::PriorityQueue;

/// Parameters shared by the Dijkstra-based traversals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DijkstraOptions {
    /// Link attribute minimised by the search.
    pub cost_name: CostName,
    /// Nodes costing more than this are neither yielded nor expanded.
    pub cost_limit: f64,
    /// When positive, steps costing more than this are not taken.
    pub step_limit: f64,
    /// Adds [`U_TURN_PENALTY`] to steps that leave through the junction
    /// they arrived by.
    pub u_turn_penalty: bool,
}

impl Default for DijkstraOptions {
    fn default() -> Self {
        Self {
            cost_name: CostName::Distance,
            cost_limit: f64::INFINITY,
            step_limit: 0.0,
            u_turn_penalty: false,
        }
    }
}

impl DijkstraOptions {
    /// Sets the link attribute to minimise.
    pub fn with_cost_name(mut self, cost_name: impl Into<CostName>) -> Self {
        self.cost_name = cost_name.into();
        self
    }

    /// Sets the largest total cost still reached.
    pub fn with_cost_limit(mut self, limit: f64) -> Self {
        self.cost_limit = limit;
        self
    }

    /// Sets the largest single step taken; `0` disables the limit.
    pub fn with_step_limit(mut self, limit: f64) -> Self {
        self.step_limit = limit;
        self
    }

    /// Turns the u-turn penalty on or off.
    pub fn with_u_turn_penalty(mut self, enabled: bool) -> Self {
        self.u_turn_penalty = enabled;
        self
    }

    /// Cost of stepping along `link`, or `None` if the step is not taken.
    ///
    /// `arrived_via` is the junction of the link back to the current node's
    /// predecessor.
    pub(crate) fn step_cost<K: Debug>(
        &self,
        from: K,
        to: K,
        link: &LinkAttributes,
        arrived_via: Option<TopologyKey>,
    ) -> Option<f64> {
        let Some(mut step) = link.cost(&self.cost_name) else {
            tracing::warn!(from = ?from, to = ?to, cost = %self.cost_name, "link has no such cost, skipped");
            return None;
        };
        if self.u_turn_penalty && arrived_via.is_some() && link.via == arrived_via {
            tracing::debug!(from = ?from, to = ?to, "u-turn penalty applied");
            step += U_TURN_PENALTY;
        }
        if self.step_limit > 0.0 && step > self.step_limit {
            tracing::debug!(from = ?from, to = ?to, step, limit = self.step_limit, "step limit exceeded");
            return None;
        }
        Some(step)
    }
}

/// A node reached or improved by [`Dijkstra`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reached<K> {
    pub id: K,
    /// `None` for the start node.
    pub predecessor: Option<K>,
    /// Total cost from the start.
    pub cost: f64,
}

/// Lazy single-source Dijkstra; see the module docs.
#[derive(Debug)]
pub struct Dijkstra<'g, K> {
    graph: &'g AdjacencyGraph<K>,
    options: DijkstraOptions,
    total: FxHashMap<K, f64>,
    predecessor: FxHashMap<K, K>,
    visited: FxHashSet<K>,
    queue: PriorityQueue<K>,
    pending: VecDeque<Reached<K>>,
    expanded: usize,
    finished: bool,
    pacer: Pacer<'g>,
}

/// Starts a bounded Dijkstra search at `start`. The start itself is the
/// first item yielded, at cost `0`.
pub fn dijkstra<K>(
    graph: &AdjacencyGraph<K>,
    start: K,
    options: DijkstraOptions,
) -> Result<Dijkstra<'_, K>>
where
    K: Copy + Eq + Hash + Debug,
{
    if !graph.contains_node(start) {
        return Err(Error::NodeNotFound(format!("{start:?}")));
    }
    let mut total = FxHashMap::default();
    total.insert(start, 0.0);
    let mut queue = PriorityQueue::new();
    queue.enqueue(start, 0.0);
    Ok(Dijkstra {
        graph,
        options,
        total,
        predecessor: FxHashMap::default(),
        visited: FxHashSet::default(),
        queue,
        pending: VecDeque::from([Reached {
            id: start,
            predecessor: None,
            cost: 0.0,
        }]),
        expanded: 0,
        finished: false,
        pacer: Pacer::none(),
    })
}

impl<'g, K> Dijkstra<'g, K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Installs a pause hook called between batches of expansions.
    pub fn with_pacer(mut self, pacer: Pacer<'g>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Best known cost of `id` so far.
    pub fn cost(&self, id: K) -> Option<f64> {
        self.total.get(&id).copied()
    }

    /// Node `id` was last reached from; `None` for the start.
    pub fn predecessor(&self, id: K) -> Option<K> {
        self.predecessor.get(&id).copied()
    }

    /// Whether `id` has been dequeued, fixing its cost.
    pub fn is_settled(&self, id: K) -> bool {
        self.visited.contains(&id)
    }

    /// Settles the next node and queues the improvements it causes.
    /// Returns `false` once the search is over.
    fn expand_next(&mut self) -> bool {
        let graph = self.graph;
        while let Some(current) = self.queue.dequeue() {
            if !self.visited.insert(current) {
                continue;
            }
            self.pacer.tick(self.expanded);
            self.expanded += 1;

            let base = self.total.get(&current).copied().unwrap_or(0.0);
            let arrived_via = self
                .predecessor
                .get(&current)
                .and_then(|&p| graph.link(current, p))
                .and_then(|l| l.via);

            for (neighbor, link) in graph.neighbors(current) {
                let Some(step) = self.options.step_cost(current, neighbor, link, arrived_via) else {
                    continue;
                };
                let updated = base + step;
                if updated > self.options.cost_limit {
                    continue;
                }
                let improves = self.total.get(&neighbor).map_or(true, |&known| updated < known);
                if improves {
                    self.total.insert(neighbor, updated);
                    self.predecessor.insert(neighbor, current);
                    self.queue.enqueue(neighbor, updated);
                    self.pending.push_back(Reached {
                        id: neighbor,
                        predecessor: Some(current),
                        cost: updated,
                    });
                }
            }

            if base > self.options.cost_limit {
                tracing::debug!(node = ?current, cost = base, "cost limit reached");
                return false;
            }
            return true;
        }
        false
    }

    /// Runs the search until `target` is settled or nothing is left.
    pub(crate) fn settle(&mut self, target: K) {
        while !self.is_settled(target) {
            self.pending.clear();
            if self.finished || !self.expand_next() {
                self.finished = true;
                return;
            }
        }
    }
}

impl<K> Iterator for Dijkstra<'_, K>
where
    K: Copy + Eq + Hash + Debug,
{
    type Item = Reached<K>;

    fn next(&mut self) -> Option<Reached<K>> {
        loop {
            if let Some(reached) = self.pending.pop_front() {
                tracing::trace!(node = ?reached.id, cost = reached.cost, "dijkstra reached");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::fixtures::{link, path};
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use streetnet_topology::Topology;

    fn last_costs<K: Copy + Eq + Hash>(reached: impl Iterator<Item = Reached<K>>) -> FxHashMap<K, f64> {
        reached.map(|r| (r.id, r.cost)).collect()
    }

    #[test]
    fn start_is_yielded_first() {
        let g = path();
        let first = dijkstra(&g, "v2", DijkstraOptions::default()).unwrap().next().unwrap();
        assert_eq!(first, Reached { id: "v2", predecessor: None, cost: 0.0 });
    }

    #[test]
    fn cost_limit_is_inclusive_for_discovery() {
        let mut g = AdjacencyGraph::new();
        link(&mut g, "v0", "near", 3.0);
        link(&mut g, "v0", "far", 7.0);
        link(&mut g, "near", "edge", 2.0);

        let opts = DijkstraOptions::default().with_cost_limit(5.0);
        let costs = last_costs(dijkstra(&g, "v0", opts).unwrap());
        assert_eq!(costs.get("near"), Some(&3.0));
        assert_eq!(costs.get("edge"), Some(&5.0));
        assert!(!costs.contains_key("far"));
    }

    #[test]
    fn improvements_are_yielded_again() {
        let mut g = AdjacencyGraph::new();
        link(&mut g, "s", "t", 10.0);
        link(&mut g, "s", "m", 1.0);
        link(&mut g, "m", "t", 1.0);

        let reached: Vec<_> = dijkstra(&g, "s", DijkstraOptions::default())
            .unwrap()
            .filter(|r| r.id == "t")
            .collect();
        assert_eq!(reached.len(), 2);
        assert_eq!(reached[0].cost, 10.0);
        assert_eq!(reached[1].cost, 2.0);
        assert_eq!(reached[1].predecessor, Some("m"));
    }

    #[test]
    fn step_limit_cuts_expensive_links() {
        let mut g = AdjacencyGraph::new();
        link(&mut g, "a", "b", 1.0);
        link(&mut g, "a", "c", 4.0);
        let opts = DijkstraOptions::default().with_step_limit(2.0);
        let costs = last_costs(dijkstra(&g, "a", opts).unwrap());
        assert!(costs.contains_key("b"));
        assert!(!costs.contains_key("c"));
    }

    #[test]
    fn step_cost_counts_links() {
        let g = path();
        let opts = DijkstraOptions::default().with_cost_name("step");
        let costs = last_costs(dijkstra(&g, "v0", opts).unwrap());
        assert_eq!(costs["v4"], 4.0);
    }

    #[test]
    fn missing_cost_skips_the_link() {
        let mut g = AdjacencyGraph::new();
        g.set_link("a", "b", LinkAttributes::new().with_cost("time", 2.0)).unwrap();
        g.set_link("a", "c", LinkAttributes::new().with_distance(1.0)).unwrap();
        let opts = DijkstraOptions::default().with_cost_name("time");
        let costs = last_costs(dijkstra(&g, "a", opts).unwrap());
        assert_eq!(costs.get("b"), Some(&2.0));
        assert!(!costs.contains_key("c"));
    }

    /// Three collinear edges `x - y - z` seen as an edge graph: links
    /// carry the junction vertex they pass through.
    #[test]
    fn u_turn_adds_a_half_turn() {
        let mut topo = Topology::new();
        let j1 = topo.create_vertex(Point3::new(1.0, 0.0, 0.0)).unwrap();
        let j2 = topo.create_vertex(Point3::new(2.0, 0.0, 0.0)).unwrap();
        let mut g = AdjacencyGraph::new();
        let straight = |via| LinkAttributes::new().with_bearing_change(0.0).with_via(via);
        for (a, b, via) in [("x", "y", j1), ("y", "z", j2)] {
            g.set_link(a, b, straight(via)).unwrap();
            g.set_link(b, a, straight(via)).unwrap();
        }
        // A second way out of `y` through the junction it was entered by.
        g.set_link("y", "w", straight(j1)).unwrap();

        let opts = DijkstraOptions::default()
            .with_cost_name("bearingChange")
            .with_u_turn_penalty(true);
        let costs = last_costs(dijkstra(&g, "x", opts.clone()).unwrap());
        assert_relative_eq!(costs["z"], 0.0);
        assert_relative_eq!(costs["w"], U_TURN_PENALTY);

        let plain = last_costs(dijkstra(&g, "x", opts.with_u_turn_penalty(false)).unwrap());
        assert_relative_eq!(plain["w"], 0.0);
        assert_eq!(g.get_link("y", "w").unwrap().via, Some(TopologyKey::Vertex(j1)));
    }

    #[test]
    fn settle_stops_at_the_target() {
        let g = path();
        let mut search = dijkstra(&g, "v0", DijkstraOptions::default()).unwrap();
        search.settle("v2");
        assert!(search.is_settled("v2"));
        assert!(!search.is_settled("v4"));
        assert_eq!(search.cost("v2"), Some(2.0));
        assert_eq!(search.predecessor("v2"), Some("v1"));
    }
}
