//! Fragments container export
//!
//! [`Exporter`] walks a [`SourceModel`] once, builds the complete model buffer
//! in memory and then writes it either verbatim or as a single zlib stream.
//!
//! ```no_run
//! use fragments::{CompressionMode, ExportSettings, Exporter, Scene};
//!
//! # fn main() -> fragments::Result<()> {
//! let scene = Scene::new();
//! let settings = ExportSettings::new(CompressionMode::Compressed);
//! Exporter::new(&scene)
//!     .with_guid("0A1B2C3D-0000-4000-8000-000000000000")
//!     .export_to_file("model.frag", &settings)?;
//! # Ok(())
//! # }
//! ```

mod meshes;
mod model;
mod shell;

pub use shell::{MAX_SHELL_POINTS, up_axis_rotation};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use uuid::Uuid;

use crate::compression::compress;
use crate::error::Result;
use crate::host::{NoProperties, PropertySource, SourceModel};
use crate::settings::{CompressionMode, ExportSettings};

/// Builds fragments containers from a host model
pub struct Exporter<'m> {
    model: &'m dyn SourceModel,
    properties: &'m dyn PropertySource,
    guid: Option<String>,
}

impl<'m> Exporter<'m> {
    /// Create an exporter without property data and with a random model id
    pub fn new(model: &'m dyn SourceModel) -> Self {
        Self {
            model,
            properties: &NoProperties,
            guid: None,
        }
    }

    /// Resolve categories and attributes through `properties`
    pub fn with_properties(mut self, properties: &'m dyn PropertySource) -> Self {
        self.properties = properties;
        self
    }

    /// Use a fixed model identifier, for reproducible output
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    /// Build the raw (uncompressed) container buffer
    pub fn build(&self) -> Result<Vec<u8>> {
        let guid = self.guid.clone().unwrap_or_else(generate_model_guid);
        let (buffer, summary) = model::build_model(self.model, self.properties, &guid)?;
        tracing::info!(
            "Built model {}: {} elements ({} skipped), {} shells, {} materials, {} bytes",
            guid,
            summary.elements,
            summary.skipped,
            summary.shells,
            summary.materials,
            buffer.len()
        );
        Ok(buffer)
    }

    /// Build the container and encode it according to `settings`
    pub fn export_bytes(&self, settings: &ExportSettings) -> Result<Vec<u8>> {
        encode_container(self.build()?, settings.compression)
    }

    /// Export to a writer and return it
    pub fn export_to_writer<W: Write>(&self, mut writer: W, settings: &ExportSettings) -> Result<W> {
        let bytes = self.export_bytes(settings)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(writer)
    }

    /// Export to a file, creating or truncating it
    ///
    /// The file is only opened once the container has been fully built and
    /// encoded, so a failed build never leaves a partial file behind.
    pub fn export_to_file<P: AsRef<Path>>(&self, path: P, settings: &ExportSettings) -> Result<()> {
        let bytes = self.export_bytes(settings)?;
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        writer.write_all(&bytes)?;
        writer.flush()?;
        tracing::info!("Wrote {} bytes to {}", bytes.len(), path.as_ref().display());
        Ok(())
    }
}

/// Apply the output policy to a finished buffer
pub fn encode_container(buffer: Vec<u8>, mode: CompressionMode) -> Result<Vec<u8>> {
    match mode {
        CompressionMode::Raw => Ok(buffer),
        CompressionMode::Compressed => {
            let compressed = compress(&buffer)?;
            tracing::debug!("Compressed {} bytes to {}", buffer.len(), compressed.len());
            Ok(compressed)
        }
    }
}

/// Generate a random version 4 identifier in upper-case 8-4-4-4-12 form
pub fn generate_model_guid() -> String {
    Uuid::new_v4()
        .hyphenated()
        .encode_upper(&mut Uuid::encode_buffer())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_guid_format() {
        let guid = generate_model_guid();
        let groups: Vec<&str> = guid.split('-').collect();
        assert_eq!(
            groups.iter().map(|g| g.len()).collect::<Vec<_>>(),
            vec![8, 4, 4, 4, 12]
        );
        assert!(groups[2].starts_with('4'));
        assert!(matches!(&groups[3][..1], "8" | "9" | "A" | "B"));
        assert!(!guid.chars().any(|c| c.is_ascii_lowercase()));
        let parsed = Uuid::parse_str(&guid).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(parsed.get_variant(), uuid::Variant::RFC4122);
    }

    #[test]
    fn test_generated_guids_differ() {
        assert_ne!(generate_model_guid(), generate_model_guid());
    }

    #[test]
    fn test_raw_encoding_is_identity() {
        let buffer = vec![1u8, 2, 3, 4];
        assert_eq!(
            encode_container(buffer.clone(), CompressionMode::Raw).unwrap(),
            buffer
        );
    }
}
