//! # fragments
//!
//! A pure Rust writer and inspector for fragments containers: compact binary
//! geometry files for BIM viewers.
//!
//! A container holds one model. Every exported element contributes its
//! identifier, a category, its serialized attributes and one shell per
//! material it uses. Shells store welded points in a Y-up frame together
//! with one index list per convex face. The layout follows the FlatBuffers
//! wire format without a file identifier, and files are written either raw or
//! as a single zlib stream.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Export from any host model through the [`SourceModel`] traits
//! - Owned in-memory [`Scene`] for already tessellated data
//! - Full structural verification before any buffer is read
//! - Line-oriented dump of container contents
//!
//! ## Example
//!
//! ```no_run
//! use fragments::{Body, CompressionMode, Element, ExportSettings, Exporter, Scene,
//!     SurfaceMaterial};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut scene = Scene::new();
//! let red = scene.add_material(SurfaceMaterial::new(1.0, 0.0, 0.0, 0.0));
//!
//! let mut body = Body::new();
//! let a = body.add_vertex(0.0, 0.0, 0.0);
//! let b = body.add_vertex(1.0, 0.0, 0.0);
//! let c = body.add_vertex(0.0, 1.0, 0.0);
//! body.add_triangle(red, a, b, c);
//! scene.add_element(Element::new("2O2Fr$t4X7Zf8NOew3FLOH").with_body(body));
//!
//! let settings = ExportSettings::new(CompressionMode::Compressed);
//! Exporter::new(&scene).export_to_file("model.frag", &settings)?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod compression;
pub mod dump;
pub mod error;
pub mod host;
pub mod properties;
pub mod reader;
pub mod scene;
pub mod schema;
pub mod settings;
mod validator;
mod writer;

pub use dump::{DumpOptions, INVALID_FILE_REPORT, ReportSink, TracingReport, dump_fragments};
pub use error::{Error, Result};
pub use host::{
    AttributeValue, BodyPolygon, Lookup, MaterialId, MeshBody, NoProperties, PropertySource,
    SourceElement, SourceModel, SurfaceMaterial,
};
pub use reader::{ModelView, decode_container, read_fragments_file, root_as_model};
pub use scene::{Body, Element, Polygon, PropertyTable, Scene};
pub use settings::{CompressionMode, ExportSettings};
pub use validator::{MAX_BUFFER_SIZE, VerifierOptions, verify_model_buffer};
pub use writer::{
    Exporter, MAX_SHELL_POINTS, encode_container, generate_model_guid, up_axis_rotation,
};

use std::path::Path;

/// Export `model` to `path` in one call
///
/// Categories and attributes are resolved through `properties`; pass
/// [`NoProperties`] when the host has none.
///
/// # Example
///
/// ```no_run
/// use fragments::{ExportSettings, NoProperties, Scene, export_fragments_file};
///
/// # fn main() -> fragments::Result<()> {
/// let scene = Scene::new();
/// export_fragments_file(&scene, &NoProperties, "empty.frag", &ExportSettings::default())?;
/// # Ok(())
/// # }
/// ```
pub fn export_fragments_file<P: AsRef<Path>>(
    model: &dyn SourceModel,
    properties: &dyn PropertySource,
    path: P,
    settings: &ExportSettings,
) -> Result<()> {
    Exporter::new(model)
        .with_properties(properties)
        .export_to_file(path, settings)
}
