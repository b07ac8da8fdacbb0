// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traversal settings and the dispatcher that turns them into a running
//! traversal.
//!
//! The settings mirror the analysis panel of the drawing tool and parse from
//! its JSON:
//!
//! ```json
//! {
//!   "algorithm": "Dijkstra Single Source",
//!   "costName": "bearingChange",
//!   "costLimit": 90,
//!   "stepLimit": 0,
//!   "uTurnPenalty": true,
//!   "delay": 20
//! }
//! ```

use std::fmt::{self, Debug};
use std::hash::Hash;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adjacency::AdjacencyGraph;
use crate::algorithms::{
    betweenness, bfs, dijkstra, Centrality, DijkstraOptions, Pacer, Reached, Visit,
};
use crate::error::{Error, Result};
use crate::link::CostName;

/// The traversals offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "Breadth First Search", alias = "bfs")]
    BreadthFirstSearch,
    #[serde(rename = "Dijkstra Single Source", alias = "dijkstra")]
    DijkstraSingleSource,
    #[serde(rename = "Betweenness Centrality", alias = "betweenness")]
    BetweennessCentrality,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::BreadthFirstSearch => "Breadth First Search",
            Algorithm::DijkstraSingleSource => "Dijkstra Single Source",
            Algorithm::BetweennessCentrality => "Betweenness Centrality",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TraversalSettings {
    pub algorithm: Algorithm,
    pub cost_name: CostName,
    pub cost_limit: f64,
    /// Zero disables the step limit.
    pub step_limit: f64,
    pub u_turn_penalty: bool,
    /// Pause between batches, in milliseconds.
    pub delay: u64,
    /// Depth limit for breadth-first search; `cost_limit` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_limit: Option<u32>,
}

impl Default for TraversalSettings {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::BreadthFirstSearch,
            cost_name: CostName::Distance,
            cost_limit: 5.0,
            step_limit: 0.0,
            u_turn_penalty: false,
            delay: 20,
            depth_limit: None,
        }
    }
}

impl TraversalSettings {
    /// Parses and validates settings from JSON. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cost_limit.is_nan() || self.cost_limit < 0.0 {
            return Err(Error::InvalidSettings(format!(
                "costLimit must be a non-negative number, got {}",
                self.cost_limit
            )));
        }
        if !self.step_limit.is_finite() || self.step_limit < 0.0 {
            return Err(Error::InvalidSettings(format!(
                "stepLimit must be a finite non-negative number, got {}",
                self.step_limit
            )));
        }
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }

    /// Depth limit used by breadth-first search.
    pub fn bfs_depth(&self) -> u32 {
        self.depth_limit.unwrap_or_else(|| {
            if self.cost_limit >= u32::MAX as f64 {
                u32::MAX
            } else {
                self.cost_limit.max(0.0) as u32
            }
        })
    }

    pub fn dijkstra_options(&self) -> DijkstraOptions {
        DijkstraOptions {
            cost_name: self.cost_name.clone(),
            cost_limit: self.cost_limit,
            step_limit: self.step_limit,
            u_turn_penalty: self.u_turn_penalty,
        }
    }
}

/// One progress record from [`run`].
#[derive(Debug, Clone)]
pub enum Progress<K> {
    Visited(Visit<K>),
    Reached(Reached<K>),
    Centrality(Centrality<K>),
}

impl<K: Copy> Progress<K> {
    /// The node this record is about; `None` for centrality snapshots.
    pub fn id(&self) -> Option<K> {
        match self {
            Progress::Visited(v) => Some(v.id),
            Progress::Reached(r) => Some(r.id),
            Progress::Centrality(_) => None,
        }
    }

    /// Depth for a visit, total cost for a reached node.
    pub fn value(&self) -> Option<f64> {
        match self {
            Progress::Visited(v) => Some(f64::from(v.depth)),
            Progress::Reached(r) => Some(r.cost),
            Progress::Centrality(_) => None,
        }
    }
}

/// Boxed stream of progress records.
pub type ProgressIter<'g, K> = Box<dyn Iterator<Item = Progress<K>> + 'g>;

/// Starts the traversal selected by `settings` from `start`.
///
/// Betweenness visits every node and ignores `start`.
pub fn run<'g, K>(
    graph: &'g AdjacencyGraph<K>,
    start: K,
    settings: &TraversalSettings,
) -> Result<ProgressIter<'g, K>>
where
    K: Copy + Eq + Hash + Debug + 'g,
{
    dispatch(graph, start, settings, Pacer::none())
}

/// Like [`run`], calling `pause` with the configured delay between
/// batches of work.
pub fn run_paced<'g, K>(
    graph: &'g AdjacencyGraph<K>,
    start: K,
    settings: &TraversalSettings,
    pause: impl FnMut(Duration) + 'g,
) -> Result<ProgressIter<'g, K>>
where
    K: Copy + Eq + Hash + Debug + 'g,
{
    dispatch(graph, start, settings, Pacer::new(settings.delay(), pause))
}

fn dispatch<'g, K>(
    graph: &'g AdjacencyGraph<K>,
    start: K,
    settings: &TraversalSettings,
    pacer: Pacer<'g>,
) -> Result<ProgressIter<'g, K>>
where
    K: Copy + Eq + Hash + Debug + 'g,
{
    settings.validate()?;
    tracing::debug!(algorithm = %settings.algorithm, start = ?start, "starting traversal");
    let progress: ProgressIter<'g, K> = match settings.algorithm {
        Algorithm::BreadthFirstSearch => Box::new(
            bfs(graph, start, settings.bfs_depth())?
                .with_pacer(pacer)
                .map(Progress::Visited),
        ),
        Algorithm::DijkstraSingleSource => Box::new(
            dijkstra(graph, start, settings.dijkstra_options())?
                .with_pacer(pacer)
                .map(Progress::Reached),
        ),
        Algorithm::BetweennessCentrality => Box::new(
            betweenness(graph, settings.dijkstra_options())
                .with_pacer(pacer)
                .map(Progress::Centrality),
        ),
    };
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::fixtures::path;
    use std::cell::Cell;

    #[test]
    fn defaults_match_the_analysis_panel() {
        let s = TraversalSettings::from_json("{}").unwrap();
        assert_eq!(s, TraversalSettings::default());
        assert_eq!(s.algorithm, Algorithm::BreadthFirstSearch);
        assert_eq!(s.cost_limit, 5.0);
        assert_eq!(s.delay(), Duration::from_millis(20));
    }

    #[test]
    fn parses_gui_labels() {
        let s = TraversalSettings::from_json(
            r#"{"algorithm": "Betweenness Centrality", "costName": "bearingChange", "uTurnPenalty": true}"#,
        )
        .unwrap();
        assert_eq!(s.algorithm, Algorithm::BetweennessCentrality);
        assert_eq!(s.cost_name, CostName::BearingChange);
        assert!(s.u_turn_penalty);
        assert_eq!(
            serde_json::to_string(&Algorithm::DijkstraSingleSource).unwrap(),
            "\"Dijkstra Single Source\""
        );
    }

    #[test]
    fn rejects_unknown_algorithms_and_bad_limits() {
        assert!(matches!(
            TraversalSettings::from_json(r#"{"algorithm": "A*"}"#),
            Err(Error::InvalidSettings(_))
        ));
        assert!(matches!(
            TraversalSettings::from_json(r#"{"costLimit": -1}"#),
            Err(Error::InvalidSettings(_))
        ));
    }

    #[test]
    fn bfs_depth_falls_back_to_cost_limit() {
        let mut s = TraversalSettings::default();
        assert_eq!(s.bfs_depth(), 5);
        s.depth_limit = Some(2);
        assert_eq!(s.bfs_depth(), 2);
        s.depth_limit = None;
        s.cost_limit = f64::INFINITY;
        assert_eq!(s.bfs_depth(), u32::MAX);
    }

    #[test]
    fn dispatches_on_algorithm() {
        let g = path();
        let mut s = TraversalSettings {
            depth_limit: Some(1),
            ..Default::default()
        };
        let ids: Vec<_> = run(&g, "v2", &s).unwrap().filter_map(|p| p.id()).collect();
        assert_eq!(ids, ["v2", "v1", "v3"]);

        s.algorithm = Algorithm::DijkstraSingleSource;
        s.cost_limit = 1.5;
        let values: Vec<_> = run(&g, "v0", &s).unwrap().filter_map(|p| p.value()).collect();
        assert_eq!(values, [0.0, 1.0]);

        s.algorithm = Algorithm::BetweennessCentrality;
        s.cost_limit = f64::INFINITY;
        let last = run(&g, "v0", &s).unwrap().last().unwrap();
        match last {
            Progress::Centrality(c) => assert!(c["v2"] > c["v1"]),
            other => panic!("unexpected progress {other:?}"),
        }
    }

    #[test]
    fn paced_runs_call_the_hook() {
        let g = path();
        let pauses = Cell::new(0);
        let s = TraversalSettings {
            algorithm: Algorithm::BetweennessCentrality,
            delay: 7,
            ..Default::default()
        };
        let count = run_paced(&g, "v0", &s, |d| {
            assert_eq!(d, Duration::from_millis(7));
            pauses.set(pauses.get() + 1);
        })
        .unwrap()
        .count();
        assert!(count > 0);
        assert_eq!(pauses.get(), 5);
    }

    #[test]
    fn unknown_start_is_reported() {
        let g = path();
        let s = TraversalSettings::default();
        assert!(matches!(run(&g, "v9", &s), Err(Error::NodeNotFound(_))));
    }
}
