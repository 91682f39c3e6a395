//! Binary layout of the Fragments container
//!
//! The container follows the FlatBuffers wire format: tables are described by
//! vtables and referenced through forward `u32` offsets, while the types in this
//! module are fixed-size structs stored inline (inside a table or packed back to
//! back in a vector). Everything is little-endian.
//!
//! The split matters for readers: inline structs can be read in place at a
//! computed position without following any offset.

/// A fixed-size struct stored inline in the buffer
pub trait InlineStruct: Copy {
    /// Encoded size in bytes, including trailing padding
    const SIZE: usize;
    /// Required alignment of the first byte
    const ALIGN: usize;

    /// Append the little-endian encoding (exactly `SIZE` bytes)
    fn write_le(&self, out: &mut Vec<u8>);

    /// Decode from the first `SIZE` bytes of `bytes`
    ///
    /// Callers guarantee `bytes.len() >= SIZE`.
    fn read_le(bytes: &[u8]) -> Self;
}

pub(crate) fn read_u8(buf: &[u8], pos: usize) -> u8 {
    buf[pos]
}

pub(crate) fn read_u16(buf: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([buf[pos], buf[pos + 1]])
}

pub(crate) fn read_u32(buf: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

pub(crate) fn read_i32(buf: &[u8], pos: usize) -> i32 {
    i32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

pub(crate) fn read_f32(buf: &[u8], pos: usize) -> f32 {
    f32::from_bits(read_u32(buf, pos))
}

pub(crate) fn read_f64(buf: &[u8], pos: usize) -> f64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[pos..pos + 8]);
    f64::from_le_bytes(bytes)
}

/// Three single-precision components
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatVector {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl FloatVector {
    /// Create a new vector
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl InlineStruct for FloatVector {
    const SIZE: usize = 12;
    const ALIGN: usize = 4;

    fn write_le(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
        out.extend_from_slice(&self.z.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        Self::new(read_f32(bytes, 0), read_f32(bytes, 4), read_f32(bytes, 8))
    }
}

/// Three double-precision components
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DoubleVector {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl DoubleVector {
    /// Create a new vector
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl InlineStruct for DoubleVector {
    const SIZE: usize = 24;
    const ALIGN: usize = 8;

    fn write_le(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
        out.extend_from_slice(&self.z.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        Self::new(read_f64(bytes, 0), read_f64(bytes, 8), read_f64(bytes, 16))
    }
}

/// A coordinate frame: origin plus the X and Y axes of a right-handed basis
///
/// The Z axis is implied as `x_direction × y_direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Origin of the frame
    pub position: DoubleVector,
    /// Unit X axis
    pub x_direction: FloatVector,
    /// Unit Y axis
    pub y_direction: FloatVector,
}

impl Transform {
    /// The identity frame
    pub const IDENTITY: Transform = Transform {
        position: DoubleVector::new(0.0, 0.0, 0.0),
        x_direction: FloatVector::new(1.0, 0.0, 0.0),
        y_direction: FloatVector::new(0.0, 1.0, 0.0),
    };
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl InlineStruct for Transform {
    const SIZE: usize = 48;
    const ALIGN: usize = 8;

    fn write_le(&self, out: &mut Vec<u8>) {
        self.position.write_le(out);
        self.x_direction.write_le(out);
        self.y_direction.write_le(out);
    }

    fn read_le(bytes: &[u8]) -> Self {
        Self {
            position: DoubleVector::read_le(bytes),
            x_direction: FloatVector::read_le(&bytes[24..]),
            y_direction: FloatVector::read_le(&bytes[36..]),
        }
    }
}

/// Axis-aligned bounds of a representation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    /// Per-axis minimum
    pub min: FloatVector,
    /// Per-axis maximum
    pub max: FloatVector,
}

impl InlineStruct for BoundingBox {
    const SIZE: usize = 24;
    const ALIGN: usize = 4;

    fn write_le(&self, out: &mut Vec<u8>) {
        self.min.write_le(out);
        self.max.write_le(out);
    }

    fn read_le(bytes: &[u8]) -> Self {
        Self {
            min: FloatVector::read_le(bytes),
            max: FloatVector::read_le(&bytes[12..]),
        }
    }
}

/// Kind of geometry a representation points at
///
/// Stored as a raw byte; values outside the known set are preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RepresentationClass(pub u8);

impl RepresentationClass {
    /// No geometry
    pub const NONE: Self = Self(0);
    /// Geometry stored in `Meshes.shells`
    pub const SHELL: Self = Self(1);
    /// Geometry stored in `Meshes.circle_extrusions`
    pub const CIRCLE_EXTRUSION: Self = Self(2);

    /// Name of a known value
    pub fn variant_name(self) -> Option<&'static str> {
        match self {
            Self::NONE => Some("NONE"),
            Self::SHELL => Some("SHELL"),
            Self::CIRCLE_EXTRUSION => Some("CIRCLE_EXTRUSION"),
            _ => None,
        }
    }
}

/// Which faces of a material are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderedFaces(pub u8);

impl RenderedFaces {
    /// Front faces only
    pub const ONE: Self = Self(0);
    /// Front and back faces
    pub const TWO: Self = Self(1);
}

/// Outline style of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Stroke(pub u8);

impl Stroke {
    /// Viewer default stroke
    pub const DEFAULT: Self = Self(0);
}

/// Geometry reference with its bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Representation {
    /// Index of the geometry in the collection selected by the class
    pub id: u32,
    /// Bounds of the geometry in mesh coordinates
    pub bbox: BoundingBox,
    /// Geometry collection
    pub representation_class: RepresentationClass,
}

impl InlineStruct for Representation {
    // 4 + 24 + 1, padded to the 4-byte alignment
    const SIZE: usize = 32;
    const ALIGN: usize = 4;

    fn write_le(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
        self.bbox.write_le(out);
        out.push(self.representation_class.0);
        out.extend_from_slice(&[0u8; 3]);
    }

    fn read_le(bytes: &[u8]) -> Self {
        Self {
            id: read_u32(bytes, 0),
            bbox: BoundingBox::read_le(&bytes[4..]),
            representation_class: RepresentationClass(read_u8(bytes, 28)),
        }
    }
}

/// Surface appearance of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Material {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Opacity (255 = opaque)
    pub a: u8,
    /// Face culling mode
    pub rendered_faces: RenderedFaces,
    /// Outline style
    pub stroke: Stroke,
}

impl Material {
    /// Create a double-sided material with the default stroke
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r,
            g,
            b,
            a,
            rendered_faces: RenderedFaces::TWO,
            stroke: Stroke::DEFAULT,
        }
    }
}

impl InlineStruct for Material {
    const SIZE: usize = 6;
    const ALIGN: usize = 1;

    fn write_le(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[
            self.r,
            self.g,
            self.b,
            self.a,
            self.rendered_faces.0,
            self.stroke.0,
        ]);
    }

    fn read_le(bytes: &[u8]) -> Self {
        Self {
            r: bytes[0],
            g: bytes[1],
            b: bytes[2],
            a: bytes[3],
            rendered_faces: RenderedFaces(bytes[4]),
            stroke: Stroke(bytes[5]),
        }
    }
}

/// Binds one representation, material and local frame to a mesh item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sample {
    /// Index into `Meshes.meshes_items`
    pub item: u32,
    /// Index into `Meshes.materials`
    pub material: u32,
    /// Index into `Meshes.representations`
    pub representation: u32,
    /// Index into `Meshes.local_transforms`
    pub local_transform: u32,
}

impl InlineStruct for Sample {
    const SIZE: usize = 16;
    const ALIGN: usize = 4;

    fn write_le(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.item.to_le_bytes());
        out.extend_from_slice(&self.material.to_le_bytes());
        out.extend_from_slice(&self.representation.to_le_bytes());
        out.extend_from_slice(&self.local_transform.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        Self {
            item: read_u32(bytes, 0),
            material: read_u32(bytes, 4),
            representation: read_u32(bytes, 8),
            local_transform: read_u32(bytes, 12),
        }
    }
}

/// Vtable slot numbers of every table
#[allow(missing_docs)]
pub mod slot {
    /// `Model` (root table)
    pub mod model {
        pub const METADATA: usize = 0;
        pub const GUIDS: usize = 1;
        pub const GUIDS_ITEMS: usize = 2;
        pub const MAX_LOCAL_ID: usize = 3;
        pub const LOCAL_IDS: usize = 4;
        pub const CATEGORIES: usize = 5;
        pub const MESHES: usize = 6;
        pub const ATTRIBUTES: usize = 7;
        pub const RELATIONS: usize = 8;
        pub const RELATIONS_ITEMS: usize = 9;
        pub const GUID: usize = 10;
        pub const SPATIAL_STRUCTURE: usize = 11;
        pub const UNIQUE_ATTRIBUTES: usize = 12;
        pub const RELATION_NAMES: usize = 13;
    }

    /// `Meshes`
    pub mod meshes {
        pub const COORDINATES: usize = 0;
        pub const MESHES_ITEMS: usize = 1;
        pub const SAMPLES: usize = 2;
        pub const REPRESENTATIONS: usize = 3;
        pub const MATERIALS: usize = 4;
        pub const CIRCLE_EXTRUSIONS: usize = 5;
        pub const SHELLS: usize = 6;
        pub const LOCAL_TRANSFORMS: usize = 7;
        pub const GLOBAL_TRANSFORMS: usize = 8;
    }

    /// `Shell`
    pub mod shell {
        pub const PROFILES: usize = 0;
        pub const HOLES: usize = 1;
        pub const POINTS: usize = 2;
    }

    /// `ShellProfile`
    pub mod shell_profile {
        pub const INDICES: usize = 0;
    }

    /// `ShellHole`
    pub mod shell_hole {
        pub const INDICES: usize = 0;
        pub const PROFILE_ID: usize = 1;
    }

    /// `Attribute` and `Relation`
    pub mod string_list {
        pub const DATA: usize = 0;
    }

    /// `SpatialStructure`
    pub mod spatial_structure {
        pub const LOCAL_ID: usize = 0;
        pub const CATEGORY: usize = 1;
        pub const CHILDREN: usize = 2;
    }
}

/// Byte offset of a slot's entry inside a vtable
pub(crate) const fn vtable_entry(slot: usize) -> usize {
    4 + 2 * slot
}
