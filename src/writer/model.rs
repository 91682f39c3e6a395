//! Element loop and `Model` table assembly

use crate::builder::{FlatBufferBuilder, Offset};
use crate::error::{Error, Result};
use crate::host::{PropertySource, SourceElement, SourceModel};
use crate::properties::{collect_attributes, resolve_category};
use crate::schema::slot;

use super::meshes::{MeshListBuilder, group_polygons, index_u32};

/// Metadata written into every model
pub(crate) const MODEL_METADATA: &str = "{}";

/// Counters reported after a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BuildSummary {
    pub elements: usize,
    pub skipped: usize,
    pub shells: usize,
    pub materials: usize,
}

pub(crate) struct ModelBuilder<'m> {
    fbb: FlatBufferBuilder,
    meshes: MeshListBuilder<'m>,
    properties: &'m dyn PropertySource,
    guids: Vec<Offset>,
    local_ids: Vec<u32>,
    categories: Vec<Offset>,
    attributes: Vec<Offset>,
    skipped: usize,
}

impl<'m> ModelBuilder<'m> {
    pub fn new(model: &'m dyn SourceModel, properties: &'m dyn PropertySource) -> Self {
        Self {
            fbb: FlatBufferBuilder::with_capacity(1024),
            meshes: MeshListBuilder::new(model),
            properties,
            guids: Vec::new(),
            local_ids: Vec::new(),
            categories: Vec::new(),
            attributes: Vec::new(),
            skipped: 0,
        }
    }

    /// Export one element; returns `false` when the element is skipped
    pub fn add_element(&mut self, element: &dyn SourceElement) -> Result<bool> {
        let guid = element.guid();
        if !element.is_valid() {
            tracing::debug!("Skipping invalid element {}", guid);
            self.skipped += 1;
            return Ok(false);
        }
        let groups = group_polygons(element)?;
        if groups.is_empty() {
            tracing::debug!("Skipping element {} without visible polygons", guid);
            self.skipped += 1;
            return Ok(false);
        }

        let item = index_u32(self.local_ids.len(), "elements")?;
        let local_id = item
            .checked_add(1)
            .ok_or_else(|| Error::InvalidModel("local id overflow".to_string()))?;

        let guid_offset = self.fbb.create_string(guid);
        self.guids.push(guid_offset);
        self.local_ids.push(local_id);

        self.meshes.add_element(&mut self.fbb, item, guid, &groups)?;

        let category = resolve_category(self.properties, guid);
        let category = self.fbb.create_string(&category);
        self.categories.push(category);

        let attributes = collect_attributes(self.properties, guid);
        let attribute = self.write_attribute(&attributes);
        self.attributes.push(attribute);

        tracing::debug!(
            "Exported element {} as local id {} ({} shells)",
            guid,
            local_id,
            groups.len()
        );
        Ok(true)
    }

    fn write_attribute(&mut self, data: &[String]) -> Offset {
        let strings: Vec<Offset> = data.iter().map(|s| self.fbb.create_string(s)).collect();
        let data = self.fbb.create_vector_of_offsets(&strings);
        self.fbb.start_table();
        self.fbb.add_offset(slot::string_list::DATA, data);
        self.fbb.end_table()
    }

    /// Finalize the buffer under the model identifier `guid`
    pub fn finish(mut self, guid: &str) -> Result<(Vec<u8>, BuildSummary)> {
        let count = self.local_ids.len();
        let max_local_id = index_u32(count, "elements")?
            .checked_add(1)
            .ok_or_else(|| Error::InvalidModel("local id overflow".to_string()))?;
        let summary = BuildSummary {
            elements: count,
            skipped: self.skipped,
            shells: self.meshes.shell_count(),
            materials: self.meshes.material_count(),
        };

        let fbb = &mut self.fbb;
        let metadata = fbb.create_string(MODEL_METADATA);
        let guids = fbb.create_vector_of_offsets(&self.guids);
        let guids_items = fbb.create_vector_u32(&self.local_ids);
        let local_ids = fbb.create_vector_u32(&self.local_ids);
        let categories = fbb.create_vector_of_offsets(&self.categories);
        let meshes = self.meshes.finish(fbb);
        let attributes = fbb.create_vector_of_offsets(&self.attributes);
        let model_guid = fbb.create_string(guid);

        fbb.start_table();
        fbb.add_offset(slot::model::GUID, model_guid);
        fbb.add_offset(slot::model::ATTRIBUTES, attributes);
        fbb.add_offset(slot::model::MESHES, meshes);
        fbb.add_offset(slot::model::CATEGORIES, categories);
        fbb.add_offset(slot::model::LOCAL_IDS, local_ids);
        fbb.add_u32(slot::model::MAX_LOCAL_ID, max_local_id, 0);
        fbb.add_offset(slot::model::GUIDS_ITEMS, guids_items);
        fbb.add_offset(slot::model::GUIDS, guids);
        fbb.add_offset(slot::model::METADATA, metadata);
        let root = fbb.end_table();
        fbb.finish_minimal(root);

        Ok((self.fbb.into_vec(), summary))
    }
}

/// Run the element loop over a whole source model
pub(crate) fn build_model(
    model: &dyn SourceModel,
    properties: &dyn PropertySource,
    guid: &str,
) -> Result<(Vec<u8>, BuildSummary)> {
    let mut builder = ModelBuilder::new(model, properties);
    let count = model.element_count();
    for index in 0..count {
        let element = model
            .element(index)
            .ok_or_else(|| Error::geometry_access("element", index, count))?;
        builder.add_element(element)?;
    }
    builder.finish(guid)
}
