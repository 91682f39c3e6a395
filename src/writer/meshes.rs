//! Accumulation of the geometry section
//!
//! Every exported element contributes one mesh item and one identity global
//! transform. Its visible polygons are grouped by material in first-seen
//! order and each group becomes a shell with a matching representation and
//! sample. Materials are shared across the whole model.

use std::collections::HashMap;

use crate::builder::{FlatBufferBuilder, Offset};
use crate::error::{Error, Result};
use crate::host::{MaterialId, SourceElement, SourceModel, SurfaceMaterial};
use crate::schema::{
    Material, Representation, RepresentationClass, Sample, Transform, slot,
};

use super::shell::{PolygonRef, ShellBuilder, ShellGeometry};

/// Visible polygons of one element sharing one material
pub(crate) struct MaterialGroup<'a> {
    pub material: MaterialId,
    pub polygons: Vec<PolygonRef<'a>>,
}

/// Group the visible polygons of an element by material
///
/// Groups keep the order in which their material was first seen while
/// walking bodies and polygons in index order. An element without visible
/// polygons yields no groups.
pub(crate) fn group_polygons<'a>(element: &'a dyn SourceElement) -> Result<Vec<MaterialGroup<'a>>> {
    let mut groups: Vec<MaterialGroup<'a>> = Vec::new();
    let mut by_material: HashMap<MaterialId, usize> = HashMap::new();

    let body_count = element.body_count();
    for body_index in 0..body_count {
        let body = element
            .body(body_index)
            .ok_or_else(|| Error::geometry_access("body", body_index, body_count))?;
        let polygon_count = body.polygon_count();
        for polygon_index in 0..polygon_count {
            let polygon = body
                .polygon(polygon_index)
                .ok_or_else(|| Error::geometry_access("polygon", polygon_index, polygon_count))?;
            if polygon.is_invisible() {
                continue;
            }
            let material = polygon.material();
            let group = *by_material.entry(material).or_insert_with(|| {
                groups.push(MaterialGroup {
                    material,
                    polygons: Vec::new(),
                });
                groups.len() - 1
            });
            groups[group].polygons.push(PolygonRef {
                body_index,
                body,
                polygon,
            });
        }
    }
    Ok(groups)
}

/// Convert a host material into the container palette entry
pub(crate) fn palette_entry(material: &SurfaceMaterial) -> Material {
    let channel = |value: f64| (value * 255.0) as u8;
    Material::new(
        channel(material.color[0]),
        channel(material.color[1]),
        channel(material.color[2]),
        channel(1.0 - material.transparency),
    )
}

pub(crate) fn index_u32(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::InvalidModel(format!("too many {} ({})", what, len)))
}

pub(crate) struct MeshListBuilder<'m> {
    model: &'m dyn SourceModel,
    palette_index: HashMap<MaterialId, u32>,
    meshes_items: Vec<u32>,
    samples: Vec<Sample>,
    representations: Vec<Representation>,
    materials: Vec<Material>,
    shells: Vec<Offset>,
    global_transforms: Vec<Transform>,
}

impl<'m> MeshListBuilder<'m> {
    pub fn new(model: &'m dyn SourceModel) -> Self {
        Self {
            model,
            palette_index: HashMap::new(),
            meshes_items: Vec::new(),
            samples: Vec::new(),
            representations: Vec::new(),
            materials: Vec::new(),
            shells: Vec::new(),
            global_transforms: Vec::new(),
        }
    }

    pub fn shell_count(&self) -> usize {
        self.shells.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Add the geometry of one element as mesh item `item`
    pub fn add_element(
        &mut self,
        fbb: &mut FlatBufferBuilder,
        item: u32,
        guid: &str,
        groups: &[MaterialGroup<'_>],
    ) -> Result<()> {
        self.meshes_items.push(item);
        self.global_transforms.push(Transform::IDENTITY);

        for group in groups {
            let mut shell = ShellBuilder::new(guid);
            for polygon in &group.polygons {
                shell.add_polygon(polygon)?;
            }
            let geometry = shell.finish();

            let material = self.palette_index(group.material)?;
            let representation = index_u32(self.representations.len(), "representations")?;
            self.representations.push(Representation {
                id: representation,
                bbox: geometry.bbox,
                representation_class: RepresentationClass::SHELL,
            });
            self.samples.push(Sample {
                item,
                material,
                representation,
                local_transform: 0,
            });
            let shell = write_shell(fbb, &geometry);
            self.shells.push(shell);
        }
        Ok(())
    }

    fn palette_index(&mut self, id: MaterialId) -> Result<u32> {
        if let Some(&index) = self.palette_index.get(&id) {
            return Ok(index);
        }
        let material = self.model.material(id).unwrap_or_else(|| {
            tracing::warn!("Material {} not found, using opaque white", id.0);
            SurfaceMaterial::default()
        });
        let index = index_u32(self.materials.len(), "materials")?;
        self.materials.push(palette_entry(&material));
        self.palette_index.insert(id, index);
        Ok(index)
    }

    /// Write the `Meshes` table
    pub fn finish(self, fbb: &mut FlatBufferBuilder) -> Offset {
        let meshes_items = fbb.create_vector_u32(&self.meshes_items);
        let samples = fbb.create_vector_of_structs(&self.samples);
        let representations = fbb.create_vector_of_structs(&self.representations);
        let materials = fbb.create_vector_of_structs(&self.materials);
        let circle_extrusions = fbb.create_vector_of_offsets(&[]);
        let shells = fbb.create_vector_of_offsets(&self.shells);
        let local_transforms = fbb.create_vector_of_structs(&[Transform::IDENTITY]);
        let global_transforms = fbb.create_vector_of_structs(&self.global_transforms);

        fbb.start_table();
        fbb.add_struct(slot::meshes::COORDINATES, &Transform::IDENTITY);
        fbb.add_offset(slot::meshes::GLOBAL_TRANSFORMS, global_transforms);
        fbb.add_offset(slot::meshes::LOCAL_TRANSFORMS, local_transforms);
        fbb.add_offset(slot::meshes::SHELLS, shells);
        fbb.add_offset(slot::meshes::CIRCLE_EXTRUSIONS, circle_extrusions);
        fbb.add_offset(slot::meshes::MATERIALS, materials);
        fbb.add_offset(slot::meshes::REPRESENTATIONS, representations);
        fbb.add_offset(slot::meshes::SAMPLES, samples);
        fbb.add_offset(slot::meshes::MESHES_ITEMS, meshes_items);
        fbb.end_table()
    }
}

/// Write a `Shell` table with one `ShellProfile` per convex piece
fn write_shell(fbb: &mut FlatBufferBuilder, geometry: &ShellGeometry) -> Offset {
    let mut profiles = Vec::with_capacity(geometry.profiles.len());
    for indices in &geometry.profiles {
        let indices = fbb.create_vector_u16(indices);
        fbb.start_table();
        fbb.add_offset(slot::shell_profile::INDICES, indices);
        profiles.push(fbb.end_table());
    }
    let profiles = fbb.create_vector_of_offsets(&profiles);
    let holes = fbb.create_vector_of_offsets(&[]);
    let points = fbb.create_vector_of_structs(&geometry.points);

    fbb.start_table();
    fbb.add_offset(slot::shell::POINTS, points);
    fbb.add_offset(slot::shell::HOLES, holes);
    fbb.add_offset(slot::shell::PROFILES, profiles);
    fbb.end_table()
}
