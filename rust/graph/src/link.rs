// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Link attributes and the hook for drawing links.
//!
//! A link carries a fixed set of well-known attributes (`distance`,
//! `bearingChange`, `via`, a visual handle) plus any number of extra named
//! costs. Traversals pick the cost to minimise by [`CostName`].

use std::fmt;
use std::str::FromStr;

use nalgebra::Point3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use streetnet_topology::{TopologyKey, VisualHandle};

use crate::error::{Error, Result};

/// Which attribute a traversal treats as the step cost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CostName {
    /// Euclidean distance between the linked elements.
    #[default]
    Distance,
    /// Turn angle in degrees, `0` straight on to `180` reversal.
    BearingChange,
    /// Every link costs `1`.
    Step,
    /// An extra cost stored under this name.
    Named(String),
}

impl CostName {
    pub fn as_str(&self) -> &str {
        match self {
            CostName::Distance => "distance",
            CostName::BearingChange => "bearingChange",
            CostName::Step => "step",
            CostName::Named(name) => name,
        }
    }
}

impl fmt::Display for CostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for CostName {
    fn from(s: &str) -> Self {
        match s {
            "distance" => CostName::Distance,
            "bearingChange" | "angle" => CostName::BearingChange,
            "step" => CostName::Step,
            other => CostName::Named(other.to_string()),
        }
    }
}

impl FromStr for CostName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(CostName::from(s))
    }
}

impl Serialize for CostName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CostName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(CostName::from(s.as_str()))
    }
}

/// Attributes of one directed link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkAttributes {
    pub distance: Option<f64>,
    pub bearing_change: Option<f64>,
    /// The element shared by both ends: the edge between two vertices, the
    /// junction between two edges, the half-edge between two faces.
    pub via: Option<TopologyKey>,
    pub visual: Option<VisualHandle>,
    /// Extra costs by name.
    pub costs: FxHashMap<String, f64>,
}

impl LinkAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_bearing_change(mut self, degrees: f64) -> Self {
        self.bearing_change = Some(degrees);
        self
    }

    pub fn with_via(mut self, via: impl Into<TopologyKey>) -> Self {
        self.via = Some(via.into());
        self
    }

    pub fn with_visual(mut self, visual: Option<VisualHandle>) -> Self {
        self.visual = visual;
        self
    }

    pub fn with_cost(mut self, name: impl Into<String>, value: f64) -> Self {
        self.costs.insert(name.into(), value);
        self
    }

    /// Shallow merge: every attribute set in `other` overwrites the same
    /// attribute here, everything else is kept.
    pub fn merge(&mut self, other: LinkAttributes) {
        if other.distance.is_some() {
            self.distance = other.distance;
        }
        if other.bearing_change.is_some() {
            self.bearing_change = other.bearing_change;
        }
        if other.via.is_some() {
            self.via = other.via;
        }
        if other.visual.is_some() {
            self.visual = other.visual;
        }
        self.costs.extend(other.costs);
    }

    /// The step cost under `name`, or `None` if this link does not carry it.
    pub fn cost(&self, name: &CostName) -> Option<f64> {
        match name {
            CostName::Distance => self.distance,
            CostName::BearingChange => self.bearing_change,
            CostName::Step => Some(1.0),
            CostName::Named(name) => self.costs.get(name).copied(),
        }
    }

    /// Rejects NaN and infinite numeric attributes.
    pub fn check_finite(&self) -> Result<()> {
        let named = self.costs.iter().map(|(k, v)| (k.as_str(), *v));
        let fixed = [("distance", self.distance), ("bearingChange", self.bearing_change)]
            .into_iter()
            .filter_map(|(k, v)| Some((k, v?)));
        for (name, value) in fixed.chain(named) {
            if !value.is_finite() {
                return Err(Error::InvalidAttribute {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Renderer hook for the arcs that visualise links.
///
/// Graphs call it when links appear, move, or disappear. The default
/// methods draw nothing.
pub trait LinkVisuals {
    /// Draws an arc between two points and returns its handle.
    fn create_arc(&mut self, _from: Point3<f64>, _to: Point3<f64>) -> Option<VisualHandle> {
        None
    }

    /// Moves an existing arc.
    fn update_arc(&mut self, _handle: VisualHandle, _from: Point3<f64>, _to: Point3<f64>) {}

    /// Disposes of an arc whose links are gone.
    fn release(&mut self, _handle: VisualHandle) {}
}

/// Draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVisuals;

impl LinkVisuals for NoVisuals {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_names_parse_from_gui_labels() {
        assert_eq!(CostName::from("distance"), CostName::Distance);
        assert_eq!(CostName::from("bearingChange"), CostName::BearingChange);
        assert_eq!(CostName::from("angle"), CostName::BearingChange);
        assert_eq!(CostName::from("step"), CostName::Step);
        assert_eq!(CostName::from("time"), CostName::Named("time".into()));
        assert_eq!(CostName::Named("time".into()).to_string(), "time");
    }

    #[test]
    fn cost_names_round_trip_through_json() {
        let json = serde_json::to_string(&CostName::BearingChange).unwrap();
        assert_eq!(json, "\"bearingChange\"");
        let back: CostName = serde_json::from_str("\"money\"").unwrap();
        assert_eq!(back, CostName::Named("money".into()));
    }

    #[test]
    fn merge_overwrites_only_supplied_attributes() {
        let mut link = LinkAttributes::new()
            .with_distance(4.0)
            .with_bearing_change(90.0)
            .with_cost("time", 2.0);
        link.merge(LinkAttributes::new().with_distance(6.0).with_cost("money", 1.0));

        assert_eq!(link.distance, Some(6.0));
        assert_eq!(link.bearing_change, Some(90.0));
        assert_eq!(link.costs.get("time"), Some(&2.0));
        assert_eq!(link.costs.get("money"), Some(&1.0));
    }

    #[test]
    fn cost_lookup_by_name() {
        let link = LinkAttributes::new().with_distance(3.0).with_cost("time", 7.5);
        assert_eq!(link.cost(&CostName::Distance), Some(3.0));
        assert_eq!(link.cost(&CostName::BearingChange), None);
        assert_eq!(link.cost(&CostName::Step), Some(1.0));
        assert_eq!(link.cost(&"time".into()), Some(7.5));
    }

    #[test]
    fn non_finite_attributes_are_rejected() {
        assert!(LinkAttributes::new().with_distance(1.0).check_finite().is_ok());
        let err = LinkAttributes::new()
            .with_bearing_change(f64::NAN)
            .check_finite()
            .unwrap_err();
        assert!(err.to_string().starts_with("link attribute bearingChange"));
        assert!(LinkAttributes::new()
            .with_cost("time", f64::INFINITY)
            .check_finite()
            .is_err());
    }
}
