// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar geometry used by the topology.
//!
//! All measurements are taken in the x/y plane; `z` is carried along as an
//! elevation but ignored. Bearings are in degrees, counter-clockwise from
//! +x, normalised to `[0, 360)`. Counter-clockwise cycles have a positive
//! signed area.

use nalgebra::{Point3, Vector2};

use crate::arena::Topology;
use crate::keys::*;

/// Bearing from `from` toward `to`, in degrees in `[0, 360)`.
pub fn bearing(from: &Point3<f64>, to: &Point3<f64>) -> f64 {
    let d = Vector2::new(to.x - from.x, to.y - from.y);
    let degrees = d.y.atan2(d.x).to_degrees();
    (degrees + 360.0) % 360.0
}

/// Absolute difference between two bearings folded into `[0, 180]`.
///
/// Arriving along bearing `a` and leaving along bearing `b` gives the turn
/// angle: `0` for straight on, `180` for a full reversal.
pub fn absolute_bearing_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

/// One shoelace term: twice-halved cross product of consecutive points.
pub fn signed_area_term(p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    (p1.x * p2.y - p2.x * p1.y) / 2.0
}

/// Signed area of a closed polygon given by its vertices in order.
pub fn signed_area(points: &[Point3<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| signed_area_term(&points[i], &points[(i + 1) % n]))
        .sum()
}

/// Mean of a set of points, or `None` when empty.
pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

impl Topology {
    /// Returns the `(first, second)` vertices of an edge.
    pub fn edge_vertices(&self, key: EdgeKey) -> Option<(VertexKey, VertexKey)> {
        let edge = self.edges.get(key)?;
        let first = self.half_edges.get(edge.half_edges[0])?.origin;
        let second = self.half_edges.get(edge.half_edges[1])?.origin;
        Some((first, second))
    }

    /// The vertex a half-edge points at (its twin's origin).
    pub fn destination(&self, key: HalfEdgeKey) -> Option<VertexKey> {
        let he = self.half_edges.get(key)?;
        self.half_edges.get(he.twin).map(|t| t.origin)
    }

    /// Signed area enclosed by a face's stored boundary. Negative for the
    /// outer boundary of a component, positive for a bounded face.
    pub fn face_signed_area(&self, key: FaceKey) -> Option<f64> {
        let face = self.faces.get(key)?;
        let points: Option<Vec<_>> = face
            .boundary
            .iter()
            .map(|&he| {
                let origin = self.half_edges.get(he)?.origin;
                self.vertices.get(origin).map(|v| v.position)
            })
            .collect();
        Some(signed_area(&points?))
    }

    /// Recomputes the bearing of a half-edge from its endpoint positions.
    pub(crate) fn update_bearing(&mut self, key: HalfEdgeKey) {
        let Some(he) = self.half_edges.get(key) else {
            return;
        };
        let (Some(from), Some(to)) = (
            self.vertices.get(he.origin).map(|v| v.position),
            self.destination(key)
                .and_then(|d| self.vertices.get(d))
                .map(|v| v.position),
        ) else {
            return;
        };
        if let Some(he) = self.half_edges.get_mut(key) {
            he.bearing = bearing(&from, &to);
        }
    }

    /// Recomputes an edge's cached length and midpoint.
    pub(crate) fn update_edge_metrics(&mut self, key: EdgeKey) {
        let Some((a, b)) = self.edge_vertices(key) else {
            return;
        };
        let (Some(pa), Some(pb)) = (
            self.vertices.get(a).map(|v| v.position),
            self.vertices.get(b).map(|v| v.position),
        ) else {
            return;
        };
        if let Some(edge) = self.edges.get_mut(key) {
            edge.length = nalgebra::distance(&pa, &pb);
            edge.midpoint = nalgebra::center(&pa, &pb);
        }
    }

    /// Recomputes a bounded face's centroid from its boundary.
    pub(crate) fn update_representative_point(&mut self, key: FaceKey) {
        if key == self.unbounded {
            return;
        }
        let Some(face) = self.faces.get(key) else {
            return;
        };
        let points: Vec<_> = face
            .boundary
            .iter()
            .filter_map(|&he| self.half_edges.get(he))
            .filter_map(|he| self.vertices.get(he.origin))
            .map(|v| v.position)
            .collect();
        let point = centroid(&points);
        if let Some(face) = self.faces.get_mut(key) {
            face.representative_point = point;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point3<f64> {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn bearings_are_counter_clockwise_from_east() {
        let o = p(0.0, 0.0);
        assert_relative_eq!(bearing(&o, &p(1.0, 0.0)), 0.0);
        assert_relative_eq!(bearing(&o, &p(0.0, 1.0)), 90.0);
        assert_relative_eq!(bearing(&o, &p(-1.0, 0.0)), 180.0);
        assert_relative_eq!(bearing(&o, &p(0.0, -1.0)), 270.0);
        assert_relative_eq!(bearing(&o, &p(1.0, -1.0)), 315.0);
    }

    #[test]
    fn bearing_ignores_elevation() {
        let a = Point3::new(0.0, 0.0, 5.0);
        let b = Point3::new(1.0, 1.0, -3.0);
        assert_relative_eq!(bearing(&a, &b), 45.0);
    }

    #[test]
    fn bearing_difference_folds_to_half_turn() {
        assert_relative_eq!(absolute_bearing_difference(10.0, 10.0), 0.0);
        assert_relative_eq!(absolute_bearing_difference(0.0, 90.0), 90.0);
        assert_relative_eq!(absolute_bearing_difference(350.0, 10.0), 20.0);
        assert_relative_eq!(absolute_bearing_difference(0.0, 180.0), 180.0);
        assert_relative_eq!(absolute_bearing_difference(45.0, 315.0), 90.0);
    }

    #[test]
    fn signed_area_sign_follows_winding() {
        let ccw = [p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)];
        assert_relative_eq!(signed_area(&ccw), 4.0);

        let mut cw = ccw;
        cw.reverse();
        assert_relative_eq!(signed_area(&cw), -4.0);
    }

    #[test]
    fn degenerate_cycle_has_zero_area() {
        let there_and_back = [p(0.0, 0.0), p(3.0, 1.0)];
        assert_relative_eq!(signed_area(&there_and_back), 0.0);
    }

    #[test]
    fn centroid_of_square() {
        let pts = [p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)];
        let c = centroid(&pts).unwrap();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 1.0);
        assert!(centroid(&[]).is_none());
    }
}
