//! Per-table verification
//!
//! Reserved tables the exporter never writes are still verified in full when
//! present. `CircleExtrusion` has no fields in this schema revision and is
//! checked as an empty table.

use super::Verifier;
use crate::error::Result;
use crate::schema::{FloatVector, Material, Representation, Sample, Transform, slot};

impl Verifier<'_> {
    pub(crate) fn model(&mut self, pos: usize) -> Result<()> {
        use slot::model::*;

        let table = self.enter_table(pos, "Model")?;
        self.string_field(&table, METADATA, "Model.metadata")?;
        self.string_vector_field(&table, GUIDS, "Model.guids")?;
        self.scalar_vector_field(&table, GUIDS_ITEMS, 4, "Model.guids_items")?;
        self.scalar_field(&table, MAX_LOCAL_ID, 4, "Model.max_local_id")?;
        self.scalar_vector_field(&table, LOCAL_IDS, 4, "Model.local_ids")?;
        self.string_vector_field(&table, CATEGORIES, "Model.categories")?;
        self.table_field(&table, MESHES, "Model.meshes", Self::meshes)?;
        self.table_vector_field(&table, ATTRIBUTES, "Model.attributes", Self::string_list)?;
        self.table_vector_field(&table, RELATIONS, "Model.relations", Self::string_list)?;
        self.scalar_vector_field(&table, RELATIONS_ITEMS, 4, "Model.relations_items")?;
        self.string_field(&table, GUID, "Model.guid")?;
        self.table_field(
            &table,
            SPATIAL_STRUCTURE,
            "Model.spatial_structure",
            Self::spatial_structure,
        )?;
        self.string_vector_field(&table, UNIQUE_ATTRIBUTES, "Model.unique_attributes")?;
        self.string_vector_field(&table, RELATION_NAMES, "Model.relation_names")?;
        self.leave_table();
        Ok(())
    }

    fn meshes(&mut self, pos: usize) -> Result<()> {
        use slot::meshes::*;

        let table = self.enter_table(pos, "Meshes")?;
        self.struct_field::<Transform>(&table, COORDINATES, "Meshes.coordinates")?;
        self.scalar_vector_field(&table, MESHES_ITEMS, 4, "Meshes.meshes_items")?;
        self.struct_vector_field::<Sample>(&table, SAMPLES, "Meshes.samples")?;
        self.struct_vector_field::<Representation>(&table, REPRESENTATIONS, "Meshes.representations")?;
        self.struct_vector_field::<Material>(&table, MATERIALS, "Meshes.materials")?;
        self.table_vector_field(
            &table,
            CIRCLE_EXTRUSIONS,
            "Meshes.circle_extrusions",
            Self::circle_extrusion,
        )?;
        self.table_vector_field(&table, SHELLS, "Meshes.shells", Self::shell)?;
        self.struct_vector_field::<Transform>(&table, LOCAL_TRANSFORMS, "Meshes.local_transforms")?;
        self.struct_vector_field::<Transform>(&table, GLOBAL_TRANSFORMS, "Meshes.global_transforms")?;
        self.leave_table();
        Ok(())
    }

    fn shell(&mut self, pos: usize) -> Result<()> {
        use slot::shell::*;

        let table = self.enter_table(pos, "Shell")?;
        self.table_vector_field(&table, PROFILES, "Shell.profiles", Self::shell_profile)?;
        self.table_vector_field(&table, HOLES, "Shell.holes", Self::shell_hole)?;
        self.struct_vector_field::<FloatVector>(&table, POINTS, "Shell.points")?;
        self.leave_table();
        Ok(())
    }

    fn shell_profile(&mut self, pos: usize) -> Result<()> {
        let table = self.enter_table(pos, "ShellProfile")?;
        self.scalar_vector_field(&table, slot::shell_profile::INDICES, 2, "ShellProfile.indices")?;
        self.leave_table();
        Ok(())
    }

    fn shell_hole(&mut self, pos: usize) -> Result<()> {
        let table = self.enter_table(pos, "ShellHole")?;
        self.scalar_vector_field(&table, slot::shell_hole::INDICES, 2, "ShellHole.indices")?;
        self.scalar_field(&table, slot::shell_hole::PROFILE_ID, 2, "ShellHole.profile_id")?;
        self.leave_table();
        Ok(())
    }

    fn string_list(&mut self, pos: usize) -> Result<()> {
        let table = self.enter_table(pos, "Attribute")?;
        self.string_vector_field(&table, slot::string_list::DATA, "Attribute.data")?;
        self.leave_table();
        Ok(())
    }

    fn spatial_structure(&mut self, pos: usize) -> Result<()> {
        use slot::spatial_structure::*;

        let table = self.enter_table(pos, "SpatialStructure")?;
        self.scalar_field(&table, LOCAL_ID, 4, "SpatialStructure.local_id")?;
        self.string_field(&table, CATEGORY, "SpatialStructure.category")?;
        self.table_vector_field(
            &table,
            CHILDREN,
            "SpatialStructure.children",
            Self::spatial_structure,
        )?;
        self.leave_table();
        Ok(())
    }

    fn circle_extrusion(&mut self, pos: usize) -> Result<()> {
        self.enter_table(pos, "CircleExtrusion")?;
        self.leave_table();
        Ok(())
    }
}
