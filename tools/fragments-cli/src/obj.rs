//! OBJ import into an in-memory scene

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use fragments::{Body, Element, MaterialId, Polygon, Scene, SurfaceMaterial};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: false,
        triangulate: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Load an OBJ file, one element per OBJ object
///
/// Faces are kept whole, so every face must already be convex. Objects
/// without a material use light grey.
pub fn load_scene(path: &Path) -> Result<Scene> {
    let (models, materials) = tobj::load_obj(path, &load_options())
        .with_context(|| format!("loading {}", path.display()))?;

    let mut scene = Scene::new();
    let palette: Vec<MaterialId> = match materials {
        Ok(materials) => materials
            .iter()
            .map(|m| scene.add_material(surface_material(m)))
            .collect(),
        Err(e) => {
            tracing::warn!("material library not loaded: {}", e);
            Vec::new()
        }
    };
    let mut fallback = None;
    let mut guids = HashSet::new();

    for (index, model) in models.iter().enumerate() {
        let material = match model.mesh.material_id.and_then(|id| palette.get(id)) {
            Some(&id) => id,
            None => *fallback
                .get_or_insert_with(|| scene.add_material(SurfaceMaterial::new(0.8, 0.8, 0.8, 0.0))),
        };

        let mut guid = model.name.clone();
        if guid.is_empty() || guids.contains(&guid) {
            guid = format!("{}-{}", if guid.is_empty() { "object" } else { guid.as_str() }, index);
        }
        guids.insert(guid.clone());

        scene.add_element(Element::new(guid).with_body(mesh_body(&model.mesh, material)?));
    }

    Ok(scene)
}

fn surface_material(material: &tobj::Material) -> SurfaceMaterial {
    let [r, g, b] = material.diffuse.unwrap_or([0.8, 0.8, 0.8]);
    let transparency = 1.0 - material.dissolve.unwrap_or(1.0);
    SurfaceMaterial::new(r as f64, g as f64, b as f64, transparency as f64)
}

fn mesh_body(mesh: &tobj::Mesh, material: MaterialId) -> Result<Body> {
    let mut body = Body::new();
    for p in mesh.positions.chunks_exact(3) {
        body.add_vertex(p[0] as f64, p[1] as f64, p[2] as f64);
    }

    // An empty arity list means every face is a triangle
    let triangles;
    let arities: &[u32] = if mesh.face_arities.is_empty() {
        triangles = vec![3; mesh.indices.len() / 3];
        &triangles
    } else {
        &mesh.face_arities
    };

    let mut start = 0usize;
    for &arity in arities {
        let end = start + arity as usize;
        let face = mesh
            .indices
            .get(start..end)
            .context("face indices run past the end of the mesh")?;
        body.add_polygon(Polygon::new(
            material,
            face.iter().map(|&i| i as usize).collect(),
        ));
        start = end;
    }
    Ok(body)
}
