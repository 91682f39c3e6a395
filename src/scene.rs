//! Owned in-memory scene
//!
//! A straightforward implementation of the [`crate::host`] traits for callers
//! that already hold tessellated geometry, plus a table-backed
//! [`PropertySource`].

use std::collections::HashMap;

use nalgebra::Point3;

use crate::host::{
    AttributeValue, BodyPolygon, Lookup, MaterialId, MeshBody, PropertySource, SourceElement,
    SourceModel, SurfaceMaterial,
};

/// A polygon made of one or more convex pieces
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Material of the polygon
    pub material: MaterialId,
    /// Hidden polygons are skipped by the exporter
    pub invisible: bool,
    /// Body vertex indices of each convex piece
    pub convex_polygons: Vec<Vec<usize>>,
}

impl Polygon {
    /// Create a visible polygon consisting of a single convex piece
    pub fn new(material: MaterialId, vertices: Vec<usize>) -> Self {
        Self {
            material,
            invisible: false,
            convex_polygons: vec![vertices],
        }
    }

    /// Create a visible polygon from several convex pieces
    pub fn with_convex_polygons(material: MaterialId, convex_polygons: Vec<Vec<usize>>) -> Self {
        Self {
            material,
            invisible: false,
            convex_polygons,
        }
    }

    /// Mark the polygon invisible
    pub fn hidden(mut self) -> Self {
        self.invisible = true;
        self
    }
}

impl BodyPolygon for Polygon {
    fn is_invisible(&self) -> bool {
        self.invisible
    }

    fn material(&self) -> MaterialId {
        self.material
    }

    fn convex_polygon_count(&self) -> usize {
        self.convex_polygons.len()
    }

    fn convex_polygon(&self, index: usize) -> Option<&[usize]> {
        self.convex_polygons.get(index).map(Vec::as_slice)
    }
}

/// A tessellated body with world-space vertices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    /// Vertex positions
    pub vertices: Vec<Point3<f64>>,
    /// Faces referencing `vertices`
    pub polygons: Vec<Polygon>,
}

impl Body {
    /// Create an empty body
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex and return its index
    pub fn add_vertex(&mut self, x: f64, y: f64, z: f64) -> usize {
        self.vertices.push(Point3::new(x, y, z));
        self.vertices.len() - 1
    }

    /// Append a triangle
    pub fn add_triangle(&mut self, material: MaterialId, v1: usize, v2: usize, v3: usize) {
        self.polygons.push(Polygon::new(material, vec![v1, v2, v3]));
    }

    /// Append a polygon
    pub fn add_polygon(&mut self, polygon: Polygon) {
        self.polygons.push(polygon);
    }
}

impl MeshBody for Body {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn vertex(&self, index: usize) -> Option<Point3<f64>> {
        self.vertices.get(index).copied()
    }

    fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    fn polygon(&self, index: usize) -> Option<&dyn BodyPolygon> {
        self.polygons.get(index).map(|p| p as &dyn BodyPolygon)
    }
}

/// One element of the scene
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Unique identifier
    pub guid: String,
    /// Invalid elements are skipped by the exporter
    pub valid: bool,
    /// Tessellated bodies
    pub bodies: Vec<Body>,
}

impl Element {
    /// Create a valid element without geometry
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            valid: true,
            bodies: Vec::new(),
        }
    }

    /// Builder-style body addition
    pub fn with_body(mut self, body: Body) -> Self {
        self.bodies.push(body);
        self
    }
}

impl SourceElement for Element {
    fn guid(&self) -> &str {
        &self.guid
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn body(&self, index: usize) -> Option<&dyn MeshBody> {
        self.bodies.get(index).map(|b| b as &dyn MeshBody)
    }
}

/// A complete scene: elements in export order plus a material library
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Elements in export order
    pub elements: Vec<Element>,
    /// Materials by identifier
    pub materials: HashMap<MaterialId, SurfaceMaterial>,
    next_material: u32,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material and return its identifier
    pub fn add_material(&mut self, material: SurfaceMaterial) -> MaterialId {
        while self.materials.contains_key(&MaterialId(self.next_material)) {
            self.next_material += 1;
        }
        let id = MaterialId(self.next_material);
        self.materials.insert(id, material);
        self.next_material += 1;
        id
    }

    /// Append an element
    pub fn add_element(&mut self, element: Element) {
        self.elements.push(element);
    }
}

impl SourceModel for Scene {
    fn element_count(&self) -> usize {
        self.elements.len()
    }

    fn element(&self, index: usize) -> Option<&dyn SourceElement> {
        self.elements.get(index).map(|e| e as &dyn SourceElement)
    }

    fn material(&self, id: MaterialId) -> Option<SurfaceMaterial> {
        self.materials.get(&id).copied()
    }
}

/// Classification, attributes and ownership stored in maps
///
/// An element with a parent but no value of its own inherits from the parent.
#[derive(Debug, Clone, Default)]
pub struct PropertyTable {
    classifications: HashMap<String, String>,
    attributes: HashMap<String, Vec<AttributeValue>>,
    parents: HashMap<String, String>,
}

impl PropertyTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the classification of an element
    pub fn set_classification(&mut self, guid: impl Into<String>, class: impl Into<String>) {
        self.classifications.insert(guid.into(), class.into());
    }

    /// Append an attribute to an element
    pub fn add_attribute(&mut self, guid: impl Into<String>, attribute: AttributeValue) {
        self.attributes.entry(guid.into()).or_default().push(attribute);
    }

    /// Record `parent` as the owner of `child`
    pub fn set_parent(&mut self, child: impl Into<String>, parent: impl Into<String>) {
        self.parents.insert(child.into(), parent.into());
    }
}

impl PropertySource for PropertyTable {
    fn classification(&self, guid: &str) -> Lookup<String> {
        match self.classifications.get(guid) {
            Some(class) => Lookup::Found(class.clone()),
            None if self.parents.contains_key(guid) => Lookup::Inherit,
            None => Lookup::Unavailable,
        }
    }

    fn attributes(&self, guid: &str) -> Lookup<Vec<AttributeValue>> {
        match self.attributes.get(guid) {
            Some(attributes) => Lookup::Found(attributes.clone()),
            None if self.parents.contains_key(guid) => Lookup::Inherit,
            None => Lookup::Unavailable,
        }
    }

    fn parent(&self, guid: &str) -> Option<String> {
        self.parents.get(guid).cloned()
    }
}
