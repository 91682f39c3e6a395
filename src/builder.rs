//! Back-to-front buffer builder
//!
//! Objects are written from the end of the buffer towards the front, so every
//! child exists before the table that references it and all offsets point
//! forward. Positions of written objects are tracked as distances from the end
//! of the buffer, which stay stable while the buffer grows.

use crate::schema::{InlineStruct, read_u16, vtable_entry};

const SIZE_UOFFSET: usize = 4;
const SIZE_SOFFSET: usize = 4;
const VTABLE_HEADER: usize = 4;

/// Location of a finished object, measured from the end of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset(u32);

impl Offset {
    /// Distance from the end of the buffer to the start of the object
    pub fn value(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldLoc {
    off: usize,
    slot: usize,
}

/// Builder for one FlatBuffers-layout buffer
#[derive(Debug)]
pub struct FlatBufferBuilder {
    buf: Vec<u8>,
    head: usize,
    min_align: usize,
    table_start: Option<usize>,
    field_locs: Vec<FieldLoc>,
    written_vtables: Vec<usize>,
    finished: bool,
}

impl Default for FlatBufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatBufferBuilder {
    /// Create a builder with a small initial allocation
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a builder with `capacity` bytes preallocated
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(16);
        Self {
            buf: vec![0; capacity],
            head: capacity,
            min_align: 1,
            table_start: None,
            field_locs: Vec::new(),
            written_vtables: Vec::new(),
            finished: false,
        }
    }

    /// Number of bytes written so far
    pub fn used_space(&self) -> usize {
        self.buf.len() - self.head
    }

    fn ensure_capacity(&mut self, want: usize) {
        if self.head >= want {
            return;
        }
        let used = self.used_space();
        let new_len = (self.buf.len() * 2).max(used + want);
        let mut grown = vec![0; new_len];
        grown[new_len - used..].copy_from_slice(&self.buf[self.head..]);
        self.buf = grown;
        self.head = new_len - used;
    }

    fn make_space(&mut self, len: usize) -> usize {
        self.ensure_capacity(len);
        self.head -= len;
        self.head
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        let at = self.make_space(bytes.len());
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);
    }

    fn pad(&mut self, len: usize) {
        let at = self.make_space(len);
        self.buf[at..at + len].fill(0);
    }

    /// Pad so that after writing `len` more bytes the write position is a
    /// multiple of `alignment`
    fn align(&mut self, len: usize, alignment: usize) {
        debug_assert!(alignment.is_power_of_two());
        self.min_align = self.min_align.max(alignment);
        let padding = (alignment - (self.used_space() + len) % alignment) % alignment;
        self.pad(padding);
    }

    fn push_u16(&mut self, value: u16) {
        self.align(2, 2);
        self.push_bytes(&value.to_le_bytes());
    }

    fn push_u32(&mut self, value: u32) {
        self.align(4, 4);
        self.push_bytes(&value.to_le_bytes());
    }

    /// Write a forward reference to an already written object
    fn push_uoffset(&mut self, target: Offset) {
        self.align(SIZE_UOFFSET, SIZE_UOFFSET);
        let target = target.0 as usize;
        debug_assert!(target <= self.used_space());
        let relative = self.used_space() + SIZE_UOFFSET - target;
        self.push_bytes(&(relative as u32).to_le_bytes());
    }

    fn end_vector(&mut self, len: usize) -> Offset {
        self.push_u32(len as u32);
        Offset(self.used_space() as u32)
    }

    /// Write a length-prefixed, NUL-terminated UTF-8 string
    pub fn create_string(&mut self, value: &str) -> Offset {
        debug_assert!(self.table_start.is_none(), "string created inside a table");
        let bytes = value.as_bytes();
        self.align(bytes.len() + 1, SIZE_UOFFSET);
        self.push_bytes(&[0]);
        self.push_bytes(bytes);
        self.end_vector(bytes.len())
    }

    /// Write a vector of `u32`
    pub fn create_vector_u32(&mut self, items: &[u32]) -> Offset {
        let mut data = Vec::with_capacity(items.len() * 4);
        for item in items {
            data.extend_from_slice(&item.to_le_bytes());
        }
        self.create_vector_raw(&data, items.len(), 4)
    }

    /// Write a vector of `u16`
    pub fn create_vector_u16(&mut self, items: &[u16]) -> Offset {
        let mut data = Vec::with_capacity(items.len() * 2);
        for item in items {
            data.extend_from_slice(&item.to_le_bytes());
        }
        self.create_vector_raw(&data, items.len(), 2)
    }

    /// Write a vector of inline structs packed back to back
    pub fn create_vector_of_structs<T: InlineStruct>(&mut self, items: &[T]) -> Offset {
        let mut data = Vec::with_capacity(items.len() * T::SIZE);
        for item in items {
            item.write_le(&mut data);
        }
        self.create_vector_raw(&data, items.len(), T::ALIGN)
    }

    fn create_vector_raw(&mut self, data: &[u8], len: usize, alignment: usize) -> Offset {
        debug_assert!(self.table_start.is_none(), "vector created inside a table");
        self.align(data.len(), alignment.max(SIZE_UOFFSET));
        self.push_bytes(data);
        self.end_vector(len)
    }

    /// Write a vector of references to strings or tables
    pub fn create_vector_of_offsets(&mut self, items: &[Offset]) -> Offset {
        debug_assert!(self.table_start.is_none(), "vector created inside a table");
        self.align(items.len() * SIZE_UOFFSET, SIZE_UOFFSET);
        for item in items.iter().rev() {
            self.push_uoffset(*item);
        }
        self.end_vector(items.len())
    }

    /// Begin a table; fields are added with the `add_*` methods
    pub fn start_table(&mut self) {
        debug_assert!(self.table_start.is_none(), "nested table");
        self.field_locs.clear();
        self.table_start = Some(self.used_space());
    }

    fn track_field(&mut self, slot: usize) {
        self.field_locs.push(FieldLoc {
            off: self.used_space(),
            slot,
        });
    }

    /// Add a `u32` field; values equal to `default` are omitted
    pub fn add_u32(&mut self, slot: usize, value: u32, default: u32) {
        if value == default {
            return;
        }
        self.push_u32(value);
        self.track_field(slot);
    }

    /// Add a `u16` field; values equal to `default` are omitted
    pub fn add_u16(&mut self, slot: usize, value: u16, default: u16) {
        if value == default {
            return;
        }
        self.push_u16(value);
        self.track_field(slot);
    }

    /// Add a reference to a string, vector or table
    pub fn add_offset(&mut self, slot: usize, target: Offset) {
        self.push_uoffset(target);
        self.track_field(slot);
    }

    /// Add an inline struct field
    pub fn add_struct<T: InlineStruct>(&mut self, slot: usize, value: &T) {
        let mut data = Vec::with_capacity(T::SIZE);
        value.write_le(&mut data);
        self.align(T::SIZE, T::ALIGN);
        self.push_bytes(&data);
        self.track_field(slot);
    }

    /// Close the current table, writing (or reusing) its vtable
    pub fn end_table(&mut self) -> Offset {
        let start = self.table_start.take().unwrap_or(self.used_space());

        // Placeholder for the signed offset to the vtable
        self.align(SIZE_SOFFSET, SIZE_SOFFSET);
        self.push_bytes(&[0; SIZE_SOFFSET]);
        let object_offset = self.used_space();
        let object_size = object_offset - start;

        let field_count = self
            .field_locs
            .iter()
            .map(|field| field.slot + 1)
            .max()
            .unwrap_or(0);
        let vtable_len = VTABLE_HEADER + 2 * field_count;
        let mut vtable = vec![0u8; vtable_len];
        vtable[0..2].copy_from_slice(&(vtable_len as u16).to_le_bytes());
        vtable[2..4].copy_from_slice(&(object_size as u16).to_le_bytes());
        for field in &self.field_locs {
            let position = (object_offset - field.off) as u16;
            let entry = vtable_entry(field.slot);
            vtable[entry..entry + 2].copy_from_slice(&position.to_le_bytes());
        }

        let existing = self.written_vtables.iter().copied().find(|&candidate| {
            let at = self.buf.len() - candidate;
            read_u16(&self.buf, at) as usize == vtable_len
                && self.buf[at..at + vtable_len] == vtable[..]
        });
        let vtable_offset = match existing {
            Some(candidate) => candidate,
            None => {
                self.push_bytes(&vtable);
                let written = self.used_space();
                self.written_vtables.push(written);
                written
            }
        };

        let soffset = vtable_offset as i64 - object_offset as i64;
        let at = self.buf.len() - object_offset;
        self.buf[at..at + SIZE_SOFFSET].copy_from_slice(&(soffset as i32).to_le_bytes());

        self.field_locs.clear();
        Offset(object_offset as u32)
    }

    /// Finish the buffer with `root` as the root table, without a file identifier
    pub fn finish_minimal(&mut self, root: Offset) {
        debug_assert!(!self.finished, "buffer finished twice");
        self.align(SIZE_UOFFSET, self.min_align);
        self.push_uoffset(root);
        self.finished = true;
    }

    /// The finished buffer
    pub fn finished_data(&self) -> &[u8] {
        debug_assert!(self.finished, "buffer not finished");
        &self.buf[self.head..]
    }

    /// Consume the builder, returning the finished buffer
    pub fn into_vec(mut self) -> Vec<u8> {
        debug_assert!(self.finished, "buffer not finished");
        self.buf.drain(..self.head);
        self.buf
    }
}
