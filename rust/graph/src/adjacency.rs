// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The generic directed link table shared by every graph.
//!
//! Links are stored as `from -> to -> attributes`. The table never
//! symmetrises on its own; undirected relationships are two links set by
//! the caller. Both levels keep insertion order, which fixes the order in
//! which traversals expand neighbours.

use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::hash::{BuildHasherDefault, Hash};

use indexmap::IndexMap;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use streetnet_topology::{Topology, TopologyKey, VisualHandle};

use crate::error::{Error, Result};
use crate::link::{LinkAttributes, LinkVisuals, NoVisuals};

/// Insertion-ordered map with the Fx hasher.
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Directed, attributed adjacency over node ids of type `K`.
pub struct AdjacencyGraph<K> {
    links: FxIndexMap<K, FxIndexMap<K, LinkAttributes>>,
    visuals: Box<dyn LinkVisuals>,
}

impl<K: Debug> Debug for AdjacencyGraph<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdjacencyGraph")
            .field("nodes", &self.links.len())
            .field("links", &self.links.values().map(|l| l.len()).sum::<usize>())
            .finish()
    }
}

impl<K: Copy + Eq + Hash + Debug> Default for AdjacencyGraph<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash + Debug> AdjacencyGraph<K> {
    /// Creates an empty graph that draws nothing.
    pub fn new() -> Self {
        Self::with_visuals(Box::new(NoVisuals))
    }

    /// Creates an empty graph that draws its links through `visuals`.
    pub fn with_visuals(visuals: Box<dyn LinkVisuals>) -> Self {
        Self {
            links: FxIndexMap::default(),
            visuals,
        }
    }

    pub fn visuals_mut(&mut self) -> &mut dyn LinkVisuals {
        self.visuals.as_mut()
    }

    // --- Building ---

    /// Makes sure `id` has an entry, possibly with no links.
    pub fn ensure_node(&mut self, id: K) {
        self.links.entry(id).or_default();
    }

    /// Makes sure the directed link `from -> to` exists, empty if new.
    pub fn ensure_link(&mut self, from: K, to: K) -> &mut LinkAttributes {
        self.links.entry(from).or_default().entry(to).or_default()
    }

    /// Merges `attributes` into the directed link `from -> to`, creating
    /// both the node and the link if needed.
    ///
    /// Returns an error, leaving the table untouched, if a numeric attribute
    /// is not finite.
    pub fn set_link(&mut self, from: K, to: K, attributes: LinkAttributes) -> Result<()> {
        attributes.check_finite()?;
        self.ensure_link(from, to).merge(attributes);
        Ok(())
    }

    // --- Queries ---

    /// Returns the attributes of `from -> to`.
    pub fn get_link(&self, from: K, to: K) -> Result<&LinkAttributes> {
        self.link(from, to).ok_or_else(|| Error::LinkNotFound {
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        })
    }

    pub fn link(&self, from: K, to: K) -> Option<&LinkAttributes> {
        self.links.get(&from)?.get(&to)
    }

    pub fn link_mut(&mut self, from: K, to: K) -> Option<&mut LinkAttributes> {
        self.links.get_mut(&from)?.get_mut(&to)
    }

    pub fn contains_node(&self, id: K) -> bool {
        self.links.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.links.len()
    }

    /// Number of directed links.
    pub fn link_count(&self) -> usize {
        self.links.values().map(FxIndexMap::len).sum()
    }

    /// Node ids in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = K> + '_ {
        self.links.keys().copied()
    }

    /// Outgoing links of `id` in insertion order; empty for unknown nodes.
    pub fn neighbors(&self, id: K) -> impl Iterator<Item = (K, &LinkAttributes)> + '_ {
        self.links
            .get(&id)
            .into_iter()
            .flat_map(|links| links.iter().map(|(k, a)| (*k, a)))
    }

    // --- Removal ---

    /// Removes only the directed link `from -> to`.
    ///
    /// A missing node or link is logged and ignored. The link's visual is
    /// released unless the reverse link still shares it.
    pub fn delete_link(&mut self, from: K, to: K) -> Option<LinkAttributes> {
        let Some(outgoing) = self.links.get_mut(&from) else {
            tracing::warn!(from = ?from, "delete_link: source node not found");
            return None;
        };
        let Some(removed) = outgoing.shift_remove(&to) else {
            tracing::warn!(from = ?from, to = ?to, "delete_link: link not found");
            return None;
        };
        if let Some(handle) = removed.visual {
            let shared = self.link(to, from).is_some_and(|l| l.visual == Some(handle));
            if !shared {
                self.visuals.release(handle);
            }
        }
        Some(removed)
    }

    /// Removes `id` and every link from or to it, releasing their visuals.
    /// Returns `false` if the node did not exist.
    pub fn remove_node(&mut self, id: K) -> bool {
        let mut released: Vec<VisualHandle> = Vec::new();
        let existed = match self.links.shift_remove(&id) {
            Some(outgoing) => {
                released.extend(outgoing.values().filter_map(|l| l.visual));
                true
            }
            None => false,
        };
        for outgoing in self.links.values_mut() {
            if let Some(link) = outgoing.shift_remove(&id) {
                released.extend(link.visual);
            }
        }
        released.sort_unstable_by_key(|h| h.0);
        released.dedup();
        for handle in released {
            self.visuals.release(handle);
        }
        existed
    }

    /// Read-only view of the whole table.
    pub fn links(&self) -> &FxIndexMap<K, FxIndexMap<K, LinkAttributes>> {
        &self.links
    }
}

/// One link in a JSON snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing_change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub costs: BTreeMap<String, f64>,
}

/// Label-keyed snapshot of a graph over topology elements.
pub type GraphSnapshot = IndexMap<String, IndexMap<String, LinkSnapshot>>;

impl<K> AdjacencyGraph<K>
where
    K: Copy + Eq + Hash + Debug + Into<TopologyKey>,
{
    /// Captures the link table with every id replaced by its label.
    pub fn to_snapshot(&self, topology: &Topology) -> GraphSnapshot {
        let label = |key: TopologyKey| {
            topology
                .element_id(key)
                .map(|id| id.to_string())
                .unwrap_or_else(|| format!("{key:?}"))
        };
        self.links
            .iter()
            .map(|(from, outgoing)| {
                let outgoing = outgoing
                    .iter()
                    .map(|(to, a)| {
                        let link = LinkSnapshot {
                            distance: a.distance,
                            bearing_change: a.bearing_change,
                            via: a.via.map(label),
                            costs: a.costs.iter().map(|(k, v)| (k.clone(), *v)).collect(),
                        };
                        (label((*to).into()), link)
                    })
                    .collect();
                (label((*from).into()), outgoing)
            })
            .collect()
    }

    /// Serializes the link table to pretty-printed JSON.
    pub fn to_json(&self, topology: &Topology) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot(topology))
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use nalgebra::Point3;

    #[derive(Default)]
    struct Released(Rc<RefCell<Vec<VisualHandle>>>);

    impl LinkVisuals for Released {
        fn release(&mut self, handle: VisualHandle) {
            self.0.borrow_mut().push(handle);
        }
    }

    fn link(d: f64) -> LinkAttributes {
        LinkAttributes::new().with_distance(d)
    }

    #[test]
    fn ensure_node_and_link_create_empty_entries() {
        let mut g = AdjacencyGraph::new();
        g.ensure_node("a");
        assert!(g.contains_node("a"));
        assert_eq!(g.link_count(), 0);

        g.ensure_link("a", "b");
        assert_eq!(g.get_link("a", "b").unwrap(), &LinkAttributes::default());
        // Links are directional: "b" has no entry of its own.
        assert!(!g.contains_node("b"));
        assert!(g.get_link("b", "a").is_err());
    }

    #[test]
    fn set_link_merges_into_existing_attributes() {
        let mut g = AdjacencyGraph::new();
        g.set_link(1, 2, link(3.0).with_bearing_change(45.0)).unwrap();
        g.set_link(1, 2, link(5.0)).unwrap();

        let l = g.get_link(1, 2).unwrap();
        assert_eq!(l.distance, Some(5.0));
        assert_eq!(l.bearing_change, Some(45.0));
    }

    #[test]
    fn set_link_rejects_non_finite_costs() {
        let mut g = AdjacencyGraph::new();
        let err = g.set_link(1, 2, link(f64::NAN)).unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute { .. }));
        assert_eq!(g.node_count(), 0);
    }

    #[test]
    fn get_link_reports_missing_links() {
        let mut g = AdjacencyGraph::new();
        g.ensure_node(7);
        let err = g.get_link(7, 8).unwrap_err();
        assert_eq!(err.to_string(), "no link from 7 to 8");
    }

    #[test]
    fn neighbours_keep_insertion_order() {
        let mut g = AdjacencyGraph::new();
        for to in ["z", "a", "m"] {
            g.set_link("s", to, link(1.0)).unwrap();
        }
        let order: Vec<_> = g.neighbors("s").map(|(k, _)| k).collect();
        assert_eq!(order, ["z", "a", "m"]);
        assert_eq!(g.neighbors("missing").count(), 0);
    }

    #[test]
    fn delete_link_removes_one_direction_only() {
        let mut g = AdjacencyGraph::new();
        g.set_link(1, 2, link(1.0)).unwrap();
        g.set_link(2, 1, link(1.0)).unwrap();

        assert!(g.delete_link(1, 2).is_some());
        assert!(g.link(1, 2).is_none());
        assert!(g.link(2, 1).is_some());
        assert!(g.delete_link(1, 2).is_none());
        assert!(g.delete_link(9, 1).is_none());
    }

    #[test]
    fn remove_node_scrubs_incoming_links_and_releases_visuals_once() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let mut g = AdjacencyGraph::with_visuals(Box::new(Released(released.clone())));
        let arc = Some(VisualHandle(5));
        g.set_link(1, 2, link(1.0).with_visual(arc)).unwrap();
        g.set_link(2, 1, link(1.0).with_visual(arc)).unwrap();
        g.set_link(2, 3, link(1.0)).unwrap();

        assert!(g.remove_node(1));
        assert!(!g.contains_node(1));
        assert!(g.link(2, 1).is_none());
        assert!(g.link(2, 3).is_some());
        assert_eq!(*released.borrow(), vec![VisualHandle(5)]);
        assert!(!g.remove_node(1));
    }

    #[test]
    fn delete_link_keeps_a_visual_still_shared_by_the_reverse_link() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let mut g = AdjacencyGraph::with_visuals(Box::new(Released(released.clone())));
        let arc = Some(VisualHandle(8));
        g.set_link(1, 2, link(1.0).with_visual(arc)).unwrap();
        g.set_link(2, 1, link(1.0).with_visual(arc)).unwrap();

        g.delete_link(1, 2);
        assert!(released.borrow().is_empty());
        g.delete_link(2, 1);
        assert_eq!(*released.borrow(), vec![VisualHandle(8)]);
    }

    #[test]
    fn snapshot_uses_element_labels() {
        let mut topo = Topology::new();
        let a = topo.create_vertex(Point3::new(0.0, 0.0, 0.0)).unwrap();
        let b = topo.create_vertex(Point3::new(2.0, 0.0, 0.0)).unwrap();
        let e = topo.create_edge(a, b).unwrap().unwrap();

        let mut g = AdjacencyGraph::new();
        g.set_link(a, b, link(2.0).with_via(e)).unwrap();
        g.ensure_node(b);

        let snap = g.to_snapshot(&topo);
        assert_eq!(snap["v0"]["v1"].distance, Some(2.0));
        assert_eq!(snap["v0"]["v1"].via.as_deref(), Some("e0"));
        assert!(snap["v1"].is_empty());

        let json = g.to_json(&topo).unwrap();
        assert!(json.contains("\"via\": \"e0\""));
        assert!(!json.contains("bearingChange"));
    }
}
