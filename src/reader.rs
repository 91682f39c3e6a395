//! Read-only typed views over verified buffers
//!
//! Views are created by [`root_as_model`], which runs the verifier first, so
//! accessors can index the buffer without further bounds checks. Absent
//! fields read as `None` (or the schema default for scalars).

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use crate::error::{Error, Result};
use crate::schema::{
    FloatVector, InlineStruct, Material, Representation, Sample, Transform, read_i32, read_u16,
    read_u32, slot, vtable_entry,
};
use crate::validator::{VerifierOptions, verify_model_buffer};

/// An element type that can be read out of a vector
pub trait Follow<'b>: Sized {
    /// Bytes occupied by one element inside a vector
    const SIZE: usize;

    /// Read the element stored at `pos`
    fn follow(buf: &'b [u8], pos: usize) -> Self;
}

impl<'b> Follow<'b> for u16 {
    const SIZE: usize = 2;

    fn follow(buf: &'b [u8], pos: usize) -> Self {
        read_u16(buf, pos)
    }
}

impl<'b> Follow<'b> for u32 {
    const SIZE: usize = 4;

    fn follow(buf: &'b [u8], pos: usize) -> Self {
        read_u32(buf, pos)
    }
}

impl<'b> Follow<'b> for &'b str {
    const SIZE: usize = 4;

    fn follow(buf: &'b [u8], pos: usize) -> Self {
        string_at(buf, pos + read_u32(buf, pos) as usize)
    }
}

macro_rules! follow_inline_struct {
    ($($ty:ty),*) => {
        $(
            impl<'b> Follow<'b> for $ty {
                const SIZE: usize = <$ty as InlineStruct>::SIZE;

                fn follow(buf: &'b [u8], pos: usize) -> Self {
                    let end = pos + <$ty as InlineStruct>::SIZE;
                    <$ty as InlineStruct>::read_le(&buf[pos..end])
                }
            }
        )*
    };
}

follow_inline_struct!(FloatVector, Transform, Sample, Representation, Material);

// Invalid UTF-8 was rejected during verification
fn string_at(buf: &[u8], pos: usize) -> &str {
    let len = read_u32(buf, pos) as usize;
    std::str::from_utf8(&buf[pos + 4..pos + 4 + len]).unwrap_or_default()
}

/// A length-prefixed vector inside a verified buffer
#[derive(Clone, Copy)]
pub struct Vector<'b, T> {
    buf: &'b [u8],
    start: usize,
    len: usize,
    _marker: PhantomData<T>,
}

impl<'b, T: Follow<'b>> Vector<'b, T> {
    fn at(buf: &'b [u8], pos: usize) -> Self {
        Self {
            buf,
            start: pos + 4,
            len: read_u32(buf, pos) as usize,
            _marker: PhantomData,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector has no elements
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<T> {
        (index < self.len).then(|| T::follow(self.buf, self.start + index * T::SIZE))
    }

    /// Iterate over all elements
    pub fn iter(&self) -> impl Iterator<Item = T> + use<'b, T> {
        let (buf, start) = (self.buf, self.start);
        (0..self.len).map(move |index| T::follow(buf, start + index * T::SIZE))
    }
}

impl<'b, T: Follow<'b> + fmt::Debug> fmt::Debug for Vector<'b, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[derive(Clone, Copy)]
struct Table<'b> {
    buf: &'b [u8],
    pos: usize,
}

impl<'b> Table<'b> {
    fn field(&self, slot: usize) -> Option<usize> {
        let vtable = (self.pos as i64 - read_i32(self.buf, self.pos) as i64) as usize;
        let vtable_len = read_u16(self.buf, vtable) as usize;
        let entry = vtable_entry(slot);
        if entry + 2 > vtable_len {
            return None;
        }
        match read_u16(self.buf, vtable + entry) as usize {
            0 => None,
            offset => Some(self.pos + offset),
        }
    }

    fn target(&self, slot: usize) -> Option<usize> {
        self.field(slot)
            .map(|pos| pos + read_u32(self.buf, pos) as usize)
    }

    fn get_u32(&self, slot: usize, default: u32) -> u32 {
        self.field(slot)
            .map_or(default, |pos| read_u32(self.buf, pos))
    }

    fn get_u16(&self, slot: usize, default: u16) -> u16 {
        self.field(slot)
            .map_or(default, |pos| read_u16(self.buf, pos))
    }

    fn get_str(&self, slot: usize) -> Option<&'b str> {
        self.target(slot).map(|pos| string_at(self.buf, pos))
    }

    fn get_struct<T: InlineStruct>(&self, slot: usize) -> Option<T> {
        self.field(slot)
            .map(|pos| T::read_le(&self.buf[pos..pos + T::SIZE]))
    }

    fn get_vector<T: Follow<'b>>(&self, slot: usize) -> Option<Vector<'b, T>> {
        self.target(slot).map(|pos| Vector::at(self.buf, pos))
    }

    fn get_table(&self, slot: usize) -> Option<Table<'b>> {
        self.target(slot).map(|pos| Table { buf: self.buf, pos })
    }
}

macro_rules! table_view {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $name<'b> {
            table: Table<'b>,
        }

        impl<'b> Follow<'b> for $name<'b> {
            const SIZE: usize = 4;

            fn follow(buf: &'b [u8], pos: usize) -> Self {
                Self {
                    table: Table {
                        buf,
                        pos: pos + read_u32(buf, pos) as usize,
                    },
                }
            }
        }

        impl<'b> $name<'b> {
            #[allow(dead_code)]
            fn new(table: Table<'b>) -> Self {
                Self { table }
            }
        }
    };
}

table_view!(
    /// Root table of a fragments container
    ModelView
);
table_view!(
    /// Geometry section of a model
    MeshesView
);
table_view!(
    /// Welded geometry of one (element, material) pair
    ShellView
);
table_view!(
    /// One convex face of a shell
    ShellProfileView
);
table_view!(
    /// A hole cut into a shell profile
    ShellHoleView
);
table_view!(
    /// Serialized properties of one element
    AttributeView
);

impl<'b> ModelView<'b> {
    /// Model identifier
    pub fn guid(&self) -> Option<&'b str> {
        self.table.get_str(slot::model::GUID)
    }

    /// Free-form metadata
    pub fn metadata(&self) -> Option<&'b str> {
        self.table.get_str(slot::model::METADATA)
    }

    /// Element identifiers in export order
    pub fn guids(&self) -> Option<Vector<'b, &'b str>> {
        self.table.get_vector(slot::model::GUIDS)
    }

    /// Local id of each entry in `guids`
    pub fn guids_items(&self) -> Option<Vector<'b, u32>> {
        self.table.get_vector(slot::model::GUIDS_ITEMS)
    }

    /// One past the largest local id
    pub fn max_local_id(&self) -> u32 {
        self.table.get_u32(slot::model::MAX_LOCAL_ID, 0)
    }

    /// Local ids in export order
    pub fn local_ids(&self) -> Option<Vector<'b, u32>> {
        self.table.get_vector(slot::model::LOCAL_IDS)
    }

    /// Element categories in export order
    pub fn categories(&self) -> Option<Vector<'b, &'b str>> {
        self.table.get_vector(slot::model::CATEGORIES)
    }

    /// Geometry section
    pub fn meshes(&self) -> Option<MeshesView<'b>> {
        self.table.get_table(slot::model::MESHES).map(MeshesView::new)
    }

    /// Element attributes in export order
    pub fn attributes(&self) -> Option<Vector<'b, AttributeView<'b>>> {
        self.table.get_vector(slot::model::ATTRIBUTES)
    }

    /// Relation names, when the producer wrote any
    pub fn relation_names(&self) -> Option<Vector<'b, &'b str>> {
        self.table.get_vector(slot::model::RELATION_NAMES)
    }

    /// Unique attribute keys, when the producer wrote any
    pub fn unique_attributes(&self) -> Option<Vector<'b, &'b str>> {
        self.table.get_vector(slot::model::UNIQUE_ATTRIBUTES)
    }
}

impl<'b> MeshesView<'b> {
    /// Base coordinate frame
    pub fn coordinates(&self) -> Option<Transform> {
        self.table.get_struct(slot::meshes::COORDINATES)
    }

    /// Mesh item ids, one per element
    pub fn meshes_items(&self) -> Option<Vector<'b, u32>> {
        self.table.get_vector(slot::meshes::MESHES_ITEMS)
    }

    /// Samples, one per (element, material) pair
    pub fn samples(&self) -> Option<Vector<'b, Sample>> {
        self.table.get_vector(slot::meshes::SAMPLES)
    }

    /// Representations, parallel to `samples`
    pub fn representations(&self) -> Option<Vector<'b, Representation>> {
        self.table.get_vector(slot::meshes::REPRESENTATIONS)
    }

    /// Material palette
    pub fn materials(&self) -> Option<Vector<'b, Material>> {
        self.table.get_vector(slot::meshes::MATERIALS)
    }

    /// Shell geometry
    pub fn shells(&self) -> Option<Vector<'b, ShellView<'b>>> {
        self.table.get_vector(slot::meshes::SHELLS)
    }

    /// Number of circle extrusions
    pub fn circle_extrusion_count(&self) -> usize {
        self.table
            .target(slot::meshes::CIRCLE_EXTRUSIONS)
            .map_or(0, |pos| read_u32(self.table.buf, pos) as usize)
    }

    /// Local frames referenced by samples
    pub fn local_transforms(&self) -> Option<Vector<'b, Transform>> {
        self.table.get_vector(slot::meshes::LOCAL_TRANSFORMS)
    }

    /// Global frames, one per mesh item
    pub fn global_transforms(&self) -> Option<Vector<'b, Transform>> {
        self.table.get_vector(slot::meshes::GLOBAL_TRANSFORMS)
    }
}

impl<'b> ShellView<'b> {
    /// Faces
    pub fn profiles(&self) -> Option<Vector<'b, ShellProfileView<'b>>> {
        self.table.get_vector(slot::shell::PROFILES)
    }

    /// Holes
    pub fn holes(&self) -> Option<Vector<'b, ShellHoleView<'b>>> {
        self.table.get_vector(slot::shell::HOLES)
    }

    /// Welded points
    pub fn points(&self) -> Option<Vector<'b, FloatVector>> {
        self.table.get_vector(slot::shell::POINTS)
    }
}

impl<'b> ShellProfileView<'b> {
    /// Point indices of the face
    pub fn indices(&self) -> Option<Vector<'b, u16>> {
        self.table.get_vector(slot::shell_profile::INDICES)
    }
}

impl<'b> ShellHoleView<'b> {
    /// Point indices of the hole outline
    pub fn indices(&self) -> Option<Vector<'b, u16>> {
        self.table.get_vector(slot::shell_hole::INDICES)
    }

    /// Profile the hole belongs to
    pub fn profile_id(&self) -> u16 {
        self.table.get_u16(slot::shell_hole::PROFILE_ID, 0)
    }
}

impl<'b> AttributeView<'b> {
    /// Serialized `["name","value","TYPE"]` entries
    pub fn data(&self) -> Option<Vector<'b, &'b str>> {
        self.table.get_vector(slot::string_list::DATA)
    }
}

/// Verify `buf` and return a view of its root model
pub fn root_as_model(buf: &[u8]) -> Result<ModelView<'_>> {
    root_as_model_with_opts(buf, &VerifierOptions::default())
}

/// Verify `buf` with custom limits and return a view of its root model
pub fn root_as_model_with_opts<'b>(buf: &'b [u8], options: &VerifierOptions) -> Result<ModelView<'b>> {
    verify_model_buffer(buf, options)?;
    Ok(ModelView::follow(buf, 0))
}

/// Accept a container in either write mode and return the raw buffer
///
/// The bytes are first probed as a zlib stream; if that fails or does not
/// decompress to a valid buffer, they are verified as a raw buffer.
pub fn decode_container(bytes: &[u8]) -> Result<Cow<'_, [u8]>> {
    #[cfg(feature = "compression")]
    {
        if let Ok(raw) = crate::compression::decompress(bytes) {
            if verify_model_buffer(&raw, &VerifierOptions::default()).is_ok() {
                return Ok(Cow::Owned(raw));
            }
        }
    }

    verify_model_buffer(bytes, &VerifierOptions::default())
        .map_err(|e| Error::InvalidBuffer(format!("neither compressed nor raw container ({})", e)))?;
    Ok(Cow::Borrowed(bytes))
}

/// Read a container file in either write mode
pub fn read_fragments_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)?;
    Ok(decode_container(&bytes)?.into_owned())
}
