// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Incremental traversals over an [`AdjacencyGraph`].
//!
//! Every traversal is a lazy iterator that yields a progress record each
//! time it discovers or improves a node, so a renderer can colour the
//! network while the search runs. Between batches of work an optional
//! [`Pacer`] hook is called with the configured delay; it has no effect on
//! the results.
//!
//! [`AdjacencyGraph`]: crate::adjacency::AdjacencyGraph

mod betweenness;
mod bfs;
mod dijkstra;
mod dijkstra_all;
mod shortest_path;

pub use betweenness::{betweenness, Betweenness, Centrality};
pub use bfs::{bfs, Bfs, Visit};
pub use dijkstra::{dijkstra, Dijkstra, DijkstraOptions, Reached};
pub use dijkstra_all::{dijkstra_all, DijkstraAll, PathState, ReachedAll};
pub use shortest_path::shortest_path;

use std::fmt;
use std::time::Duration;

/// Cost added to a step that leaves a node through the junction it was
/// entered by.
pub const U_TURN_PENALTY: f64 = 180.0;

/// Number of expanded nodes between two pauses.
pub const PAUSE_INTERVAL: usize = 10;

/// Pause hook called between batches of traversal work.
pub type PauseHook<'a> = Box<dyn FnMut(Duration) + 'a>;

/// Calls a [`PauseHook`] every [`PAUSE_INTERVAL`] steps.
#[derive(Default)]
pub struct Pacer<'a> {
    hook: Option<PauseHook<'a>>,
    delay: Duration,
}

impl<'a> Pacer<'a> {
    /// A pacer that never pauses.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(delay: Duration, hook: impl FnMut(Duration) + 'a) -> Self {
        Self {
            hook: Some(Box::new(hook)),
            delay,
        }
    }

    /// Pauses before step `index` if it starts a new batch.
    pub(crate) fn tick(&mut self, index: usize) {
        if index % PAUSE_INTERVAL == 0 {
            self.pause();
        }
    }

    /// Pauses unconditionally.
    pub(crate) fn pause(&mut self) {
        if let Some(hook) = self.hook.as_mut() {
            hook(self.delay);
        }
    }
}

impl fmt::Debug for Pacer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pacer")
            .field("hook", &self.hook.is_some())
            .field("delay", &self.delay)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn pacer_pauses_every_batch() {
        let pauses = Cell::new(0);
        let mut pacer = Pacer::new(Duration::from_millis(20), |d| {
            assert_eq!(d, Duration::from_millis(20));
            pauses.set(pauses.get() + 1);
        });
        for i in 0..25 {
            pacer.tick(i);
        }
        assert_eq!(pauses.get(), 3);
        Pacer::none().pause();
    }
}
