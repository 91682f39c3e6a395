//! Structural verification of fragments buffers
//!
//! Every offset, vtable, vector and string reachable from the root `Model`
//! table is checked before any typed access happens:
//! - ranges lie inside the buffer and do not overflow
//! - scalars, offsets and inline structs are aligned to their size
//! - forward offsets are non-zero and vtables are well formed
//! - strings are NUL-terminated UTF-8
//! - nesting depth and the number of visited tables stay within limits
//!
//! No file identifier is expected.

mod tables;

use crate::error::{Error, Result};
use crate::schema::{InlineStruct, read_i32, read_u16, read_u32, vtable_entry};

const SIZE_UOFFSET: usize = 4;

/// Largest buffer the format can address
pub const MAX_BUFFER_SIZE: usize = i32::MAX as usize;

/// Limits applied while verifying a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierOptions {
    /// Maximum nesting depth of tables
    pub max_depth: usize,
    /// Maximum number of tables visited
    pub max_tables: usize,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_tables: 1_000_000,
        }
    }
}

impl VerifierOptions {
    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum number of tables
    pub fn with_max_tables(mut self, max_tables: usize) -> Self {
        self.max_tables = max_tables;
        self
    }
}

/// Verify that `buf` holds a well-formed `Model` buffer
pub fn verify_model_buffer(buf: &[u8], options: &VerifierOptions) -> Result<()> {
    let mut verifier = Verifier::new(buf, options)?;
    let root = verifier.follow_uoffset(0, "root")?;
    verifier.model(root)
}

/// A table whose header and vtable passed verification
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableRef {
    pos: usize,
    vtable: usize,
    vtable_len: usize,
    object_size: usize,
}

pub(crate) struct Verifier<'b> {
    buf: &'b [u8],
    options: VerifierOptions,
    depth: usize,
    tables: usize,
}

impl<'b> Verifier<'b> {
    fn new(buf: &'b [u8], options: &VerifierOptions) -> Result<Self> {
        if buf.len() < SIZE_UOFFSET {
            return Err(Error::invalid_buffer(
                "buffer",
                &format!("{} bytes is too short for a root offset", buf.len()),
            ));
        }
        if buf.len() > MAX_BUFFER_SIZE {
            return Err(Error::invalid_buffer(
                "buffer",
                &format!("{} bytes exceeds the addressable size", buf.len()),
            ));
        }
        Ok(Self {
            buf,
            options: *options,
            depth: 0,
            tables: 0,
        })
    }

    fn in_range(&self, pos: usize, len: usize, what: &str) -> Result<()> {
        match pos.checked_add(len) {
            Some(end) if end <= self.buf.len() => Ok(()),
            _ => Err(Error::invalid_buffer(
                what,
                &format!(
                    "range {}+{} exceeds buffer of {} bytes",
                    pos,
                    len,
                    self.buf.len()
                ),
            )),
        }
    }

    fn aligned(&self, pos: usize, alignment: usize, what: &str) -> Result<()> {
        if pos % alignment != 0 {
            return Err(Error::invalid_buffer(
                what,
                &format!("position {} is not {}-byte aligned", pos, alignment),
            ));
        }
        Ok(())
    }

    fn follow_uoffset(&self, pos: usize, what: &str) -> Result<usize> {
        self.aligned(pos, SIZE_UOFFSET, what)?;
        self.in_range(pos, SIZE_UOFFSET, what)?;
        let value = read_u32(self.buf, pos) as usize;
        if value == 0 {
            return Err(Error::invalid_buffer(what, "zero offset"));
        }
        pos.checked_add(value)
            .filter(|&target| target < self.buf.len())
            .ok_or_else(|| {
                Error::invalid_buffer(
                    what,
                    &format!("offset {} at {} points outside the buffer", value, pos),
                )
            })
    }

    fn enter_table(&mut self, pos: usize, what: &str) -> Result<TableRef> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(Error::invalid_buffer(
                what,
                &format!("nesting depth exceeds {}", self.options.max_depth),
            ));
        }
        self.tables += 1;
        if self.tables > self.options.max_tables {
            return Err(Error::invalid_buffer(
                what,
                &format!("more than {} tables", self.options.max_tables),
            ));
        }

        self.aligned(pos, 4, what)?;
        self.in_range(pos, 4, what)?;
        let vtable = pos as i64 - read_i32(self.buf, pos) as i64;
        if vtable < 0 || vtable as usize >= self.buf.len() {
            return Err(Error::invalid_buffer(what, "vtable outside the buffer"));
        }
        let vtable = vtable as usize;
        self.aligned(vtable, 2, what)?;
        self.in_range(vtable, 4, what)?;

        let vtable_len = read_u16(self.buf, vtable) as usize;
        let object_size = read_u16(self.buf, vtable + 2) as usize;
        if vtable_len < 4 || vtable_len % 2 != 0 {
            return Err(Error::invalid_buffer(
                what,
                &format!("malformed vtable length {}", vtable_len),
            ));
        }
        self.in_range(vtable, vtable_len, what)?;
        if object_size < 4 {
            return Err(Error::invalid_buffer(
                what,
                &format!("table size {} is smaller than its header", object_size),
            ));
        }
        self.in_range(pos, object_size, what)?;

        Ok(TableRef {
            pos,
            vtable,
            vtable_len,
            object_size,
        })
    }

    fn leave_table(&mut self) {
        self.depth -= 1;
    }

    fn field(
        &self,
        table: &TableRef,
        slot: usize,
        size: usize,
        alignment: usize,
        what: &str,
    ) -> Result<Option<usize>> {
        let entry = vtable_entry(slot);
        if entry + 2 > table.vtable_len {
            return Ok(None);
        }
        let offset = read_u16(self.buf, table.vtable + entry) as usize;
        if offset == 0 {
            return Ok(None);
        }
        if offset < 4 || offset + size > table.object_size {
            return Err(Error::invalid_buffer(
                what,
                &format!("field at {} does not fit in its table", offset),
            ));
        }
        let pos = table.pos + offset;
        self.aligned(pos, alignment, what)?;
        Ok(Some(pos))
    }

    fn scalar_field(&self, table: &TableRef, slot: usize, size: usize, what: &str) -> Result<()> {
        self.field(table, slot, size, size, what).map(|_| ())
    }

    fn struct_field<T: InlineStruct>(&self, table: &TableRef, slot: usize, what: &str) -> Result<()> {
        self.field(table, slot, T::SIZE, T::ALIGN, what).map(|_| ())
    }

    fn offset_field(&self, table: &TableRef, slot: usize, what: &str) -> Result<Option<usize>> {
        match self.field(table, slot, SIZE_UOFFSET, SIZE_UOFFSET, what)? {
            Some(pos) => self.follow_uoffset(pos, what).map(Some),
            None => Ok(None),
        }
    }

    /// Check a vector header and its payload; returns `(data start, length)`
    fn vector(&self, pos: usize, elem_size: usize, alignment: usize, what: &str) -> Result<(usize, usize)> {
        self.aligned(pos, SIZE_UOFFSET, what)?;
        self.in_range(pos, SIZE_UOFFSET, what)?;
        let len = read_u32(self.buf, pos) as usize;
        let start = pos + SIZE_UOFFSET;
        self.aligned(start, alignment, what)?;
        let bytes = len
            .checked_mul(elem_size)
            .ok_or_else(|| Error::invalid_buffer(what, "vector size overflows"))?;
        self.in_range(start, bytes, what)?;
        Ok((start, len))
    }

    fn string(&self, pos: usize, what: &str) -> Result<()> {
        let (start, len) = self.vector(pos, 1, 1, what)?;
        self.in_range(start, len + 1, what)?;
        if self.buf[start + len] != 0 {
            return Err(Error::invalid_buffer(what, "string is not NUL-terminated"));
        }
        std::str::from_utf8(&self.buf[start..start + len])
            .map_err(|e| Error::invalid_buffer(what, &format!("invalid UTF-8: {}", e)))?;
        Ok(())
    }

    fn string_field(&self, table: &TableRef, slot: usize, what: &str) -> Result<()> {
        if let Some(pos) = self.offset_field(table, slot, what)? {
            self.string(pos, what)?;
        }
        Ok(())
    }

    fn scalar_vector_field(&self, table: &TableRef, slot: usize, size: usize, what: &str) -> Result<()> {
        if let Some(pos) = self.offset_field(table, slot, what)? {
            self.vector(pos, size, size, what)?;
        }
        Ok(())
    }

    fn struct_vector_field<T: InlineStruct>(&self, table: &TableRef, slot: usize, what: &str) -> Result<()> {
        if let Some(pos) = self.offset_field(table, slot, what)? {
            self.vector(pos, T::SIZE, T::ALIGN, what)?;
        }
        Ok(())
    }

    fn string_vector_field(&self, table: &TableRef, slot: usize, what: &str) -> Result<()> {
        if let Some(pos) = self.offset_field(table, slot, what)? {
            let (start, len) = self.vector(pos, SIZE_UOFFSET, SIZE_UOFFSET, what)?;
            for i in 0..len {
                let string = self.follow_uoffset(start + i * SIZE_UOFFSET, what)?;
                self.string(string, what)?;
            }
        }
        Ok(())
    }

    fn table_field(
        &mut self,
        table: &TableRef,
        slot: usize,
        what: &str,
        verify: fn(&mut Self, usize) -> Result<()>,
    ) -> Result<()> {
        if let Some(pos) = self.offset_field(table, slot, what)? {
            verify(self, pos)?;
        }
        Ok(())
    }

    fn table_vector_field(
        &mut self,
        table: &TableRef,
        slot: usize,
        what: &str,
        verify: fn(&mut Self, usize) -> Result<()>,
    ) -> Result<()> {
        if let Some(pos) = self.offset_field(table, slot, what)? {
            let (start, len) = self.vector(pos, SIZE_UOFFSET, SIZE_UOFFSET, what)?;
            for i in 0..len {
                let child = self.follow_uoffset(start + i * SIZE_UOFFSET, what)?;
                verify(self, child)?;
            }
        }
        Ok(())
    }
}
