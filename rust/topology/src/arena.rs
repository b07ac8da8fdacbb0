// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for the planar half-edge structure.
//!
//! The [`Topology`] is the central owner of all elements. Vertices,
//! half-edges, edges and faces live inside slot maps with stable,
//! generational keys, and every "pointer" of the classic doubly-connected
//! edge list (`twin`, `next`, `prev`, `origin`, `edge`, `face`) is stored as
//! a key into those maps. Nothing owns anything else, so the cyclic
//! half-edge relationships need no reference counting.
//!
//! The arena starts with exactly one element: the unbounded face `f0`,
//! which is never deleted.

use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::Point3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::keys::*;
use crate::observer::{ObserverId, TopologyObserver};

/// Tunables for topology maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TopologyConfig {
    /// Signed boundary areas with an absolute value below this are reported
    /// as ambiguous when deciding which side of a split stays unbounded.
    pub area_tolerance: f64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            area_tolerance: 1e-4,
        }
    }
}

/// Identity shared by every element: a label and a creation stamp, both
/// fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementMeta {
    id: ElementId,
    time_created: u64,
}

impl ElementMeta {
    pub(crate) fn new(id: ElementId, time_created: u64) -> Self {
        Self { id, time_created }
    }

    /// The element's label.
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Value of the topology clock when the element was created.
    pub fn time_created(&self) -> u64 {
        self.time_created
    }
}

/// A point in the plane with its fan of outgoing half-edges.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub(crate) meta: ElementMeta,
    pub(crate) position: Point3<f64>,
    /// Outgoing half-edges in insertion order.
    pub(crate) half_edges: Vec<HalfEdgeKey>,
    /// Outgoing half-edges by ascending bearing; ties keep insertion order.
    pub(crate) sorted_half_edges: Vec<HalfEdgeKey>,
}

impl Vertex {
    /// Label and creation stamp of this vertex.
    pub fn meta(&self) -> &ElementMeta {
        &self.meta
    }

    /// Returns the vertex label, e.g. `v3`.
    pub fn id(&self) -> ElementId {
        self.meta.id
    }

    /// Returns the vertex position.
    pub fn position(&self) -> Point3<f64> {
        self.position
    }

    /// Outgoing half-edges in the order they were attached.
    pub fn half_edges(&self) -> &[HalfEdgeKey] {
        &self.half_edges
    }

    /// Outgoing half-edges sorted counter-clockwise by bearing.
    pub fn sorted_half_edges(&self) -> &[HalfEdgeKey] {
        &self.sorted_half_edges
    }

    /// Number of incident edges.
    pub fn degree(&self) -> usize {
        self.half_edges.len()
    }
}

/// One directed side of an edge. The face it bounds lies to its left.
#[derive(Debug, Clone)]
pub struct HalfEdge {
    pub(crate) meta: ElementMeta,
    pub(crate) origin: VertexKey,
    pub(crate) twin: HalfEdgeKey,
    pub(crate) next: HalfEdgeKey,
    pub(crate) prev: HalfEdgeKey,
    pub(crate) edge: EdgeKey,
    pub(crate) face: Option<FaceKey>,
    /// Degrees in `[0, 360)`, measured counter-clockwise from +x.
    pub(crate) bearing: f64,
}

impl HalfEdge {
    /// Label and creation stamp; the stamp is the parent edge's.
    pub fn meta(&self) -> &ElementMeta {
        &self.meta
    }

    /// Returns the half-edge label, e.g. `e2_1`.
    pub fn id(&self) -> ElementId {
        self.meta.id
    }

    /// Returns the vertex this half-edge leaves from.
    pub fn origin(&self) -> VertexKey {
        self.origin
    }

    /// Returns the opposite half-edge of the same edge.
    pub fn twin(&self) -> HalfEdgeKey {
        self.twin
    }

    /// Next half-edge around the face to the left.
    pub fn next(&self) -> HalfEdgeKey {
        self.next
    }

    /// Previous half-edge around the face to the left.
    pub fn prev(&self) -> HalfEdgeKey {
        self.prev
    }

    /// Returns the edge this half-edge belongs to.
    pub fn edge(&self) -> EdgeKey {
        self.edge
    }

    /// The face to the left, `None` only transiently during edge insertion.
    pub fn face(&self) -> Option<FaceKey> {
        self.face
    }

    /// Direction from origin to destination, in degrees counter-clockwise from +x.
    pub fn bearing(&self) -> f64 {
        self.bearing
    }
}

/// A segment between two vertices, owning its two half-edges.
#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) meta: ElementMeta,
    /// `[first, second]`; each is the other's twin.
    pub(crate) half_edges: [HalfEdgeKey; 2],
    pub(crate) length: f64,
    pub(crate) midpoint: Point3<f64>,
}

impl Edge {
    /// Label and creation stamp of this edge.
    pub fn meta(&self) -> &ElementMeta {
        &self.meta
    }

    /// Returns the edge label, e.g. `e2`.
    pub fn id(&self) -> ElementId {
        self.meta.id
    }

    /// The half-edge leaving the first vertex.
    pub fn first(&self) -> HalfEdgeKey {
        self.half_edges[0]
    }

    /// The half-edge leaving the second vertex.
    pub fn second(&self) -> HalfEdgeKey {
        self.half_edges[1]
    }

    /// Returns both half-edges as `[first, second]`.
    pub fn half_edges(&self) -> [HalfEdgeKey; 2] {
        self.half_edges
    }

    /// Returns the distance between the two end vertices.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Returns the point halfway between the two end vertices.
    pub fn midpoint(&self) -> Point3<f64> {
        self.midpoint
    }
}

/// A region of the plane bounded by a counter-clockwise half-edge cycle.
#[derive(Debug, Clone)]
pub struct Face {
    pub(crate) meta: ElementMeta,
    /// Boundary half-edges in `next` order.
    pub(crate) boundary: Vec<HalfEdgeKey>,
    pub(crate) representative_point: Option<Point3<f64>>,
    pub(crate) visual: Option<VisualHandle>,
}

impl Face {
    /// Label and creation stamp of this face.
    pub fn meta(&self) -> &ElementMeta {
        &self.meta
    }

    /// Returns the face label; `f0` is the unbounded face.
    pub fn id(&self) -> ElementId {
        self.meta.id
    }

    /// Whether this is the face outside every cycle.
    pub fn is_unbounded(&self) -> bool {
        self.meta.id == ElementId::UNBOUNDED_FACE
    }

    /// Boundary half-edges in `next` order; empty for the unbounded face.
    pub fn boundary(&self) -> &[HalfEdgeKey] {
        &self.boundary
    }

    /// Centroid of the boundary vertices; `None` for the unbounded face.
    pub fn representative_point(&self) -> Option<Point3<f64>> {
        self.representative_point
    }

    /// Returns the visual handle attached by the renderer, if any.
    pub fn visual(&self) -> Option<VisualHandle> {
        self.visual
    }
}

#[derive(Debug, Default)]
struct IdCounters {
    vertex: u32,
    edge: u32,
    face: u32,
}

/// The planar topology: owner of every vertex, half-edge, edge and face.
///
/// # Example
///
/// ```
/// use nalgebra::Point3;
/// use streetnet_topology::Topology;
///
/// let mut topo = Topology::new();
/// let a = topo.create_vertex(Point3::new(0.0, 0.0, 0.0)).unwrap();
/// let b = topo.create_vertex(Point3::new(1.0, 0.0, 0.0)).unwrap();
/// let c = topo.create_vertex(Point3::new(0.0, 1.0, 0.0)).unwrap();
/// topo.create_edge(a, b).unwrap();
/// topo.create_edge(b, c).unwrap();
/// topo.create_edge(c, a).unwrap();
///
/// assert_eq!(topo.bounded_face_count(), 1);
/// ```
pub struct Topology {
    pub(crate) vertices: SlotMap<VertexKey, Vertex>,
    pub(crate) half_edges: SlotMap<HalfEdgeKey, HalfEdge>,
    pub(crate) edges: SlotMap<EdgeKey, Edge>,
    pub(crate) faces: SlotMap<FaceKey, Face>,

    pub(crate) unbounded: FaceKey,
    pub(crate) labels: FxHashMap<ElementId, TopologyKey>,

    clock: u64,
    counters: IdCounters,

    pub(crate) config: TopologyConfig,
    pub(crate) observers: Vec<(ObserverId, Rc<RefCell<dyn TopologyObserver>>)>,
    pub(crate) next_observer: u64,
    pub(crate) released_visuals: Vec<VisualHandle>,
}

impl std::fmt::Debug for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topology")
            .field("vertices", &self.vertices.len())
            .field("edges", &self.edges.len())
            .field("faces", &self.faces.len())
            .field("time", &self.clock)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Topology {
    /// Creates a topology holding only the unbounded face `f0`.
    pub fn new() -> Self {
        Self::with_config(TopologyConfig::default())
    }

    /// Creates an empty topology with explicit tunables.
    pub fn with_config(config: TopologyConfig) -> Self {
        let mut topo = Self {
            vertices: SlotMap::with_key(),
            half_edges: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            faces: SlotMap::with_key(),
            unbounded: FaceKey::default(),
            labels: FxHashMap::default(),
            clock: 0,
            counters: IdCounters::default(),
            config,
            observers: Vec::new(),
            next_observer: 0,
            released_visuals: Vec::new(),
        };
        topo.unbounded = topo.insert_face(Vec::new());
        topo
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Current value of the logical clock (the stamp the next element gets).
    pub fn current_time(&self) -> u64 {
        self.clock
    }

    pub(crate) fn tick(&mut self) -> u64 {
        let now = self.clock;
        self.clock += 1;
        now
    }

    pub(crate) fn next_vertex_id(&mut self) -> ElementId {
        let id = ElementId::Vertex(self.counters.vertex);
        self.counters.vertex += 1;
        id
    }

    pub(crate) fn next_edge_number(&mut self) -> u32 {
        let n = self.counters.edge;
        self.counters.edge += 1;
        n
    }

    pub(crate) fn next_face_id(&mut self) -> ElementId {
        let id = ElementId::Face(self.counters.face);
        self.counters.face += 1;
        id
    }

    // --- Vertex access ---

    pub fn vertex(&self, key: VertexKey) -> Option<&Vertex> {
        self.vertices.get(key)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &Vertex)> {
        self.vertices.iter()
    }

    // --- Half-edge access ---

    pub fn half_edge(&self, key: HalfEdgeKey) -> Option<&HalfEdge> {
        self.half_edges.get(key)
    }

    pub fn half_edge_count(&self) -> usize {
        self.half_edges.len()
    }

    pub fn half_edges(&self) -> impl Iterator<Item = (HalfEdgeKey, &HalfEdge)> {
        self.half_edges.iter()
    }

    // --- Edge access ---

    pub fn edge(&self, key: EdgeKey) -> Option<&Edge> {
        self.edges.get(key)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &Edge)> {
        self.edges.iter()
    }

    // --- Face access ---

    pub fn face(&self, key: FaceKey) -> Option<&Face> {
        self.faces.get(key)
    }

    /// Number of faces including the unbounded face.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of faces excluding the unbounded face.
    pub fn bounded_face_count(&self) -> usize {
        self.faces.len().saturating_sub(1)
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceKey, &Face)> {
        self.faces.iter()
    }

    /// Key of the unbounded face `f0`.
    pub fn unbounded_face(&self) -> FaceKey {
        self.unbounded
    }

    // --- Identity ---

    /// Returns `true` if the key references a live element.
    pub fn contains(&self, key: TopologyKey) -> bool {
        match key {
            TopologyKey::Vertex(k) => self.vertices.contains_key(k),
            TopologyKey::HalfEdge(k) => self.half_edges.contains_key(k),
            TopologyKey::Edge(k) => self.edges.contains_key(k),
            TopologyKey::Face(k) => self.faces.contains_key(k),
        }
    }

    /// Returns the label of any live element.
    pub fn element_id(&self, key: TopologyKey) -> Option<ElementId> {
        match key {
            TopologyKey::Vertex(k) => self.vertices.get(k).map(Vertex::id),
            TopologyKey::HalfEdge(k) => self.half_edges.get(k).map(HalfEdge::id),
            TopologyKey::Edge(k) => self.edges.get(k).map(Edge::id),
            TopologyKey::Face(k) => self.faces.get(k).map(Face::id),
        }
    }

    /// Resolves a label such as `"v3"` or `"e2_1"` to a live element.
    pub fn lookup(&self, label: &str) -> Option<TopologyKey> {
        let id: ElementId = label.parse().ok()?;
        self.labels.get(&id).copied()
    }

    /// Position used to draw an element: vertex position, edge midpoint, or
    /// bounded-face centroid.
    pub fn representative_point(&self, key: TopologyKey) -> Option<Point3<f64>> {
        match key {
            TopologyKey::Vertex(k) => self.vertices.get(k).map(|v| v.position),
            TopologyKey::HalfEdge(k) => {
                let he = self.half_edges.get(k)?;
                self.edges.get(he.edge).map(|e| e.midpoint)
            }
            TopologyKey::Edge(k) => self.edges.get(k).map(|e| e.midpoint),
            TopologyKey::Face(k) => self.faces.get(k)?.representative_point,
        }
    }

    // --- Visual handles ---

    /// Associates a renderer-owned handle with a face. It is queued for
    /// release when the face is deleted.
    pub fn attach_visual(&mut self, face: FaceKey, handle: VisualHandle) -> crate::Result<()> {
        let face = self
            .faces
            .get_mut(face)
            .ok_or(crate::Error::FaceNotFound(face))?;
        face.visual = Some(handle);
        Ok(())
    }

    /// Hands back every visual handle whose element has been deleted since
    /// the last call.
    pub fn drain_released_visuals(&mut self) -> Vec<VisualHandle> {
        std::mem::take(&mut self.released_visuals)
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_topology_has_only_the_unbounded_face() {
        let topo = Topology::new();
        assert_eq!(topo.vertex_count(), 0);
        assert_eq!(topo.edge_count(), 0);
        assert_eq!(topo.half_edge_count(), 0);
        assert_eq!(topo.face_count(), 1);
        assert_eq!(topo.bounded_face_count(), 0);

        let f0 = topo.face(topo.unbounded_face()).unwrap();
        assert!(f0.is_unbounded());
        assert_eq!(f0.id().to_string(), "f0");
        assert!(f0.representative_point().is_none());
    }

    #[test]
    fn unbounded_face_consumes_the_first_clock_tick() {
        let topo = Topology::new();
        let f0 = topo.face(topo.unbounded_face()).unwrap();
        assert_eq!(f0.meta().time_created(), 0);
        assert_eq!(topo.current_time(), 1);
    }

    #[test]
    fn lookup_resolves_labels() {
        let topo = Topology::new();
        assert_eq!(
            topo.lookup("f0"),
            Some(TopologyKey::Face(topo.unbounded_face()))
        );
        assert_eq!(topo.lookup("v0"), None);
        assert_eq!(topo.lookup("garbage"), None);
    }

    #[test]
    fn config_defaults_and_overrides() {
        assert_eq!(TopologyConfig::default().area_tolerance, 1e-4);

        let cfg: TopologyConfig = serde_json::from_str(r#"{"areaTolerance": 0.5}"#).unwrap();
        assert_eq!(cfg.area_tolerance, 0.5);
        let topo = Topology::with_config(cfg);
        assert_eq!(topo.config().area_tolerance, 0.5);

        let empty: TopologyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, TopologyConfig::default());
    }

    #[test]
    fn attach_visual_to_missing_face_fails() {
        let mut topo = Topology::new();
        let f0 = topo.unbounded_face();
        topo.attach_visual(f0, VisualHandle(9)).unwrap();
        assert_eq!(topo.face(f0).unwrap().visual(), Some(VisualHandle(9)));
        assert!(topo.drain_released_visuals().is_empty());
    }
}
