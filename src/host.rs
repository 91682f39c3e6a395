//! Interfaces to the host application's model
//!
//! The exporter never owns scene data. It walks the host's model through these
//! traits: elements, their tessellated bodies, polygons and vertices, material
//! colors, and element classifications and attributes. Indices handed to the
//! `*(index)` methods are always below the matching `*_count()`; returning
//! `None` for such an index is treated as a geometry access failure.
//!
//! [`crate::scene`] provides an owned in-memory implementation.

use nalgebra::Point3;

/// Opaque identifier of a host material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

/// Surface appearance of a host material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMaterial {
    /// Surface color, each channel in `0.0..=1.0`
    pub color: [f64; 3],
    /// Transparency in `0.0..=1.0` (0 = opaque)
    pub transparency: f64,
}

impl SurfaceMaterial {
    /// Create a material from an RGB color and transparency
    pub fn new(red: f64, green: f64, blue: f64, transparency: f64) -> Self {
        Self {
            color: [red, green, blue],
            transparency,
        }
    }
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 0.0)
    }
}

/// The host model being exported
pub trait SourceModel {
    /// Number of elements
    fn element_count(&self) -> usize;

    /// Element at `index`, in the host's native order
    fn element(&self, index: usize) -> Option<&dyn SourceElement>;

    /// Color and transparency of a material referenced by polygons
    fn material(&self, id: MaterialId) -> Option<SurfaceMaterial>;
}

/// One exportable element
pub trait SourceElement {
    /// Globally unique identifier, as written to the container
    fn guid(&self) -> &str;

    /// Whether the host considers the element usable
    fn is_valid(&self) -> bool {
        true
    }

    /// Number of tessellated bodies
    fn body_count(&self) -> usize;

    /// Tessellated body at `index`
    fn body(&self, index: usize) -> Option<&dyn MeshBody>;
}

/// A tessellated mesh belonging to an element
pub trait MeshBody {
    /// Number of vertices
    fn vertex_count(&self) -> usize;

    /// Vertex position in world coordinates
    fn vertex(&self, index: usize) -> Option<Point3<f64>>;

    /// Number of polygons
    fn polygon_count(&self) -> usize;

    /// Polygon at `index`
    fn polygon(&self, index: usize) -> Option<&dyn BodyPolygon>;
}

/// A face of a body, decomposed into convex pieces
pub trait BodyPolygon {
    /// Invisible polygons are not exported
    fn is_invisible(&self) -> bool {
        false
    }

    /// Material of the polygon
    fn material(&self) -> MaterialId;

    /// Number of convex sub-polygons
    fn convex_polygon_count(&self) -> usize;

    /// Body vertex indices of one convex sub-polygon, in winding order
    fn convex_polygon(&self, index: usize) -> Option<&[usize]>;
}

/// Outcome of a per-element property lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The element has the value
    Found(T),
    /// The element exists but has no value of its own; ask its parent
    Inherit,
    /// The element is unknown to the property source
    Unavailable,
}

/// One property of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    /// Property name
    pub name: String,
    /// Property value; properties without a value are not exported
    pub value: Option<String>,
    /// Value type name (e.g. `IfcLabel`)
    pub value_type: String,
}

impl AttributeValue {
    /// Create an attribute with a value
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        value_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_type: value_type.into(),
        }
    }
}

/// Classification and attribute lookup by element identity
pub trait PropertySource {
    /// Classification (e.g. IFC entity type) of an element
    fn classification(&self, guid: &str) -> Lookup<String>;

    /// Attributes of an element
    fn attributes(&self, guid: &str) -> Lookup<Vec<AttributeValue>>;

    /// Owner of an element nested in a multi-element container
    fn parent(&self, guid: &str) -> Option<String>;
}

/// Property source for hosts without classification data
///
/// Every element gets the default category and no attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProperties;

impl PropertySource for NoProperties {
    fn classification(&self, _guid: &str) -> Lookup<String> {
        Lookup::Unavailable
    }

    fn attributes(&self, _guid: &str) -> Lookup<Vec<AttributeValue>> {
        Lookup::Unavailable
    }

    fn parent(&self, _guid: &str) -> Option<String> {
        None
    }
}
