//! Error types for Fragments export and verification
//!
//! This module provides the single error type used across the crate. Every
//! error message carries an error code for categorization.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O errors
//! - **E2xxx**: Container format errors
//! - **E3xxx**: Source model and capacity errors
//! - **E4xxx**: Settings and unsupported features
//!
//! ## Common Error Codes
//!
//! - `E1001`: I/O error reading or writing a file
//! - `E2001`: Buffer failed structural verification
//! - `E2002`: Compression or decompression failure
//! - `E3001`: Host geometry query failed
//! - `E3002`: Shell exceeds the 16-bit point index range
//! - `E3003`: Invalid source model data
//! - `E4001`: Invalid settings record
//! - `E4002`: Unsupported feature

use std::io;
use thiserror::Error;

/// Result type for Fragments operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when exporting or reading Fragments containers
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading or writing
    ///
    /// **Error Code**: E1001
    ///
    /// **Common Causes**:
    /// - Destination directory does not exist
    /// - Insufficient permissions
    /// - Disk full
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// Buffer failed structural verification
    ///
    /// **Error Code**: E2001
    ///
    /// **Common Causes**:
    /// - Truncated file
    /// - Compressed container read as raw (or the reverse)
    /// - Offsets or vtables pointing outside the buffer
    ///
    /// **Suggestions**:
    /// - Use `decode_container` when the write mode is unknown
    /// - Re-export the file
    #[error("[E2001] Invalid fragments buffer: {0}")]
    InvalidBuffer(String),

    /// Compression or decompression failed
    ///
    /// **Error Code**: E2002
    ///
    /// **Common Causes**:
    /// - Corrupted zlib stream
    /// - Compressed output exceeded its worst-case bound
    #[error("[E2002] Compression error: {0}")]
    Compression(String),

    /// The host model returned no data for an index it reported as valid
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - Element, body or polygon counts inconsistent with the fetch methods
    /// - Convex polygon referencing a vertex the body does not have
    #[error("[E3001] Geometry access error: {0}")]
    GeometryAccess(String),

    /// A shell needs more points than 16-bit profile indices can address
    ///
    /// **Error Code**: E3002
    ///
    /// **Suggestions**:
    /// - Split the element into several bodies with distinct materials
    /// - Reduce tessellation density
    #[error(
        "[E3002] Shell capacity exceeded: element {element} needs more than {limit} distinct points"
    )]
    ShellCapacity {
        /// Identifier of the element whose shell overflowed
        element: String,
        /// Maximum number of points a single shell can hold
        limit: usize,
    },

    /// Source model data cannot be represented in the container
    ///
    /// **Error Code**: E3003
    ///
    /// **Common Causes**:
    /// - More elements, shells or materials than 32-bit indices can address
    #[error("[E3003] Invalid model: {0}")]
    InvalidModel(String),

    /// Settings record could not be decoded
    ///
    /// **Error Code**: E4001
    ///
    /// **Common Causes**:
    /// - Record written by an incompatible major version
    /// - Unknown compression mode value
    #[error("[E4001] Invalid settings: {0}")]
    InvalidSettings(String),

    /// Feature not available in this build
    ///
    /// **Error Code**: E4002
    ///
    /// **Common Causes**:
    /// - Compressed mode requested with the `compression` feature disabled
    #[error("[E4002] Unsupported feature: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create an InvalidBuffer error describing where verification stopped
    ///
    /// # Arguments
    /// * `context` - The table or field being verified (e.g., "Meshes.samples")
    /// * `message` - Description of the failure
    pub fn invalid_buffer(context: &str, message: &str) -> Self {
        Error::InvalidBuffer(format!("{}: {}", context, message))
    }

    /// Create a GeometryAccess error for a missing host object
    ///
    /// # Arguments
    /// * `what` - The kind of object requested (e.g., "body", "vertex")
    /// * `index` - The index that returned nothing
    /// * `count` - The count the host reported
    pub fn geometry_access(what: &str, index: usize, count: usize) -> Self {
        Error::GeometryAccess(format!(
            "host returned no {} at index {} (reported count {})",
            what, index, count
        ))
    }
}
