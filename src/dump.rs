//! Human-readable dump of a fragments buffer
//!
//! The dump is a flat sequence of report lines. Each section starts with a
//! `--- name ---` header, which is written even when the field is absent;
//! only the section body is skipped in that case. Geometry sub-sections are
//! written only when the model has a `Meshes` table.

use crate::error::Result;
use crate::reader::{ModelView, ShellView, Vector, root_as_model};
use crate::schema::Transform;

/// Line written instead of a dump when verification fails
pub const INVALID_FILE_REPORT: &str = "Invalid fragments file.";

/// Destination of report lines
pub trait ReportSink {
    /// Receive one report line
    fn write_report(&mut self, line: &str);
}

impl ReportSink for Vec<String> {
    fn write_report(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Report sink forwarding every line to `tracing` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReport;

impl ReportSink for TracingReport {
    fn write_report(&mut self, line: &str) {
        tracing::info!("{}", line);
    }
}

/// Options of [`dump_fragments`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// List every shell point and profile
    pub details: bool,
}

impl DumpOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the per-shell listing of points and profiles
    pub fn with_details(mut self, details: bool) -> Self {
        self.details = details;
        self
    }
}

/// Verify `buf` and write its contents to `sink`
///
/// On verification failure [`INVALID_FILE_REPORT`] is the only line written
/// and the verification error is returned.
pub fn dump_fragments(buf: &[u8], options: &DumpOptions, sink: &mut dyn ReportSink) -> Result<()> {
    let model = match root_as_model(buf) {
        Ok(model) => model,
        Err(e) => {
            tracing::debug!("Verification failed: {}", e);
            sink.write_report(INVALID_FILE_REPORT);
            return Err(e);
        }
    };
    Dumper { options, sink }.model(&model);
    Ok(())
}

struct Dumper<'o, 's> {
    options: &'o DumpOptions,
    sink: &'s mut dyn ReportSink,
}

impl Dumper<'_, '_> {
    fn line(&mut self, line: &str) {
        self.sink.write_report(line);
    }

    fn section(&mut self, name: &str) {
        self.line(&format!("--- {} ---", name));
    }

    fn numbers(&mut self, values: Option<Vector<'_, u32>>) {
        for value in values.iter().flat_map(Vector::iter) {
            self.line(&value.to_string());
        }
    }

    fn strings<'b>(&mut self, values: Option<Vector<'b, &'b str>>) {
        for value in values.iter().flat_map(Vector::iter) {
            self.line(value);
        }
    }

    fn transforms(&mut self, transforms: Option<Vector<'_, Transform>>) {
        for transform in transforms.iter().flat_map(Vector::iter) {
            self.line(&format_transform(&transform));
        }
    }

    fn model(&mut self, model: &ModelView<'_>) {
        self.section("guid");
        if let Some(guid) = model.guid() {
            self.line(guid);
        }
        self.section("metadata");
        if let Some(metadata) = model.metadata() {
            self.line(metadata);
        }
        self.section("guids");
        self.strings(model.guids());
        self.section("guids_items");
        self.numbers(model.guids_items());
        self.section("max_local_id");
        self.line(&model.max_local_id().to_string());
        self.section("local_ids");
        self.numbers(model.local_ids());
        self.section("categories");
        self.strings(model.categories());

        self.section("meshes");
        if let Some(meshes) = model.meshes() {
            self.section("meshes_items");
            self.numbers(meshes.meshes_items());

            self.section("samples");
            for sample in meshes.samples().iter().flat_map(Vector::iter) {
                self.line(&format!(
                    "item: {}, material: {}, representation: {}, local_transform: {}",
                    sample.item, sample.material, sample.representation, sample.local_transform
                ));
            }

            self.section("representations");
            for representation in meshes.representations().iter().flat_map(Vector::iter) {
                self.line(&format!(
                    "id: {}, representation_class: {}",
                    representation.id, representation.representation_class.0
                ));
            }

            self.section("materials");
            for material in meshes.materials().iter().flat_map(Vector::iter) {
                self.line(&format!(
                    "r: {}, g: {}, b: {}, a: {}",
                    material.r, material.g, material.b, material.a
                ));
            }

            self.section("shells");
            for shell in meshes.shells().iter().flat_map(Vector::iter) {
                self.shell(&shell);
            }

            self.section("coordinates");
            if let Some(coordinates) = meshes.coordinates() {
                self.line(&format_transform(&coordinates));
            }
            self.section("local_transforms");
            self.transforms(meshes.local_transforms());
            self.section("global_transforms");
            self.transforms(meshes.global_transforms());
        }

        self.section("attributes");
        for attribute in model.attributes().iter().flat_map(Vector::iter) {
            self.line("attributes:");
            self.strings(attribute.data());
        }
    }

    fn shell(&mut self, shell: &ShellView<'_>) {
        self.line(&format!(
            "profiles: {}, holes: {}, points: {}",
            shell.profiles().map_or(0, |v| v.len()),
            shell.holes().map_or(0, |v| v.len()),
            shell.points().map_or(0, |v| v.len()),
        ));
        if !self.options.details {
            return;
        }

        self.line("points:");
        for point in shell.points().iter().flat_map(Vector::iter) {
            self.line(&format!("{:.6}, {:.6}, {:.6}", point.x, point.y, point.z));
        }
        self.line("profiles:");
        for profile in shell.profiles().iter().flat_map(Vector::iter) {
            let indices: Vec<String> = profile
                .indices()
                .iter()
                .flat_map(Vector::iter)
                .map(|index| index.to_string())
                .collect();
            self.line(&indices.join(" "));
        }
    }
}

fn format_transform(transform: &Transform) -> String {
    let (p, x, y) = (
        transform.position,
        transform.x_direction,
        transform.y_direction,
    );
    format!(
        "pos: {:.6}, {:.6}, {:.6}, x_dir: {:.6}, {:.6}, {:.6}, y_dir: {:.6}, {:.6}, {:.6}",
        p.x, p.y, p.z, x.x, x.y, x.z, y.x, y.y, y.z
    )
}
