//! End-to-end export tests

mod common;

use common::*;
use fragments::schema::{RenderedFaces, RepresentationClass, Stroke, Transform};
use fragments::{
    AttributeValue, Body, CompressionMode, Element, Error, ExportSettings, Exporter, MaterialId,
    MeshBody, Polygon, PropertyTable, Scene, SourceElement, SourceModel, SurfaceMaterial,
    compression, read_fragments_file, root_as_model,
};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn test_triangle_and_empty_element() {
    let mut scene = Scene::new();
    let red = add_color(&mut scene, 1.0, 0.0, 0.0);
    scene.add_element(triangle_element("A", red));
    scene.add_element(empty_element("B"));

    let buf = build(&scene);
    let model = root_as_model(&buf).unwrap();

    assert_eq!(model.guid(), Some(MODEL_GUID));
    assert_eq!(model.metadata(), Some("{}"));
    assert_eq!(model.guids().unwrap().iter().collect::<Vec<_>>(), vec!["A"]);
    assert_eq!(model.local_ids().unwrap().iter().collect::<Vec<_>>(), vec![1]);
    assert_eq!(model.guids_items().unwrap().iter().collect::<Vec<_>>(), vec![1]);
    assert_eq!(model.max_local_id(), 2);
    assert_eq!(
        model.categories().unwrap().iter().collect::<Vec<_>>(),
        vec!["IFCBUILDINGELEMENTPROXY"]
    );

    let attributes = model.attributes().unwrap();
    assert_eq!(attributes.len(), 1);
    assert!(attributes.get(0).unwrap().data().unwrap().is_empty());

    let meshes = model.meshes().unwrap();
    assert_eq!(meshes.materials().unwrap().len(), 1);
    let shell = meshes.shells().unwrap().get(0).unwrap();
    assert_eq!(shell.points().unwrap().len(), 3);
    let profiles = shell.profiles().unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(
        profiles.get(0).unwrap().indices().unwrap().iter().collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(shell.holes().unwrap().is_empty());
}

#[test]
fn test_parallel_sequences_skip_unqualified_elements() {
    let mut scene = Scene::new();
    let grey = add_color(&mut scene, 0.5, 0.5, 0.5);

    let mut invalid = triangle_element("invalid", grey);
    invalid.valid = false;
    let mut hidden_body = Body::new();
    for x in 0..3 {
        hidden_body.add_vertex(x as f64, 0.0, 0.0);
    }
    hidden_body.add_polygon(Polygon::new(grey, vec![0, 1, 2]).hidden());

    scene.add_element(triangle_element("first", grey));
    scene.add_element(invalid);
    scene.add_element(Element::new("hidden").with_body(hidden_body));
    scene.add_element(empty_element("empty"));
    scene.add_element(cube_element("second", grey));

    let buf = build(&scene);
    let model = root_as_model(&buf).unwrap();

    assert_eq!(
        model.guids().unwrap().iter().collect::<Vec<_>>(),
        vec!["first", "second"]
    );
    assert_eq!(model.local_ids().unwrap().iter().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(model.guids_items().unwrap().iter().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(model.categories().unwrap().len(), 2);
    assert_eq!(model.attributes().unwrap().len(), 2);
    assert_eq!(model.max_local_id(), 3);

    let meshes = model.meshes().unwrap();
    assert_eq!(meshes.meshes_items().unwrap().iter().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(meshes.global_transforms().unwrap().len(), 2);
    assert_eq!(
        meshes.local_transforms().unwrap().iter().collect::<Vec<_>>(),
        vec![Transform::IDENTITY]
    );
    assert_eq!(meshes.coordinates(), Some(Transform::IDENTITY));
    assert_eq!(meshes.circle_extrusion_count(), 0);
}

#[test]
fn test_cube_vertices_are_welded() {
    let mut scene = Scene::new();
    let white = add_color(&mut scene, 1.0, 1.0, 1.0);
    scene.add_element(cube_element("cube", white));

    let buf = build(&scene);
    let model = root_as_model(&buf).unwrap();
    let shell = model.meshes().unwrap().shells().unwrap().get(0).unwrap();

    let points = shell.points().unwrap().len();
    assert_eq!(points, 8);
    let profiles = shell.profiles().unwrap();
    assert_eq!(profiles.len(), 12);
    for profile in profiles.iter() {
        let indices = profile.indices().unwrap();
        assert_eq!(indices.len(), 3);
        assert!(indices.iter().all(|index| (index as usize) < points));
    }
}

#[test]
fn test_bodies_do_not_share_points() {
    let mut scene = Scene::new();
    let white = add_color(&mut scene, 1.0, 1.0, 1.0);
    let element = Element::new("pair")
        .with_body(cube_body(white, [0.0, 0.0, 0.0]))
        .with_body(cube_body(white, [0.0, 0.0, 0.0]));
    scene.add_element(element);

    let buf = build(&scene);
    let model = root_as_model(&buf).unwrap();
    let shells = model.meshes().unwrap().shells().unwrap();
    assert_eq!(shells.len(), 1);
    assert_eq!(shells.get(0).unwrap().points().unwrap().len(), 16);
}

#[test]
fn test_material_shared_across_elements() {
    let mut scene = Scene::new();
    let blue = add_color(&mut scene, 0.0, 0.0, 1.0);
    for guid in ["a", "b", "c"] {
        scene.add_element(triangle_element(guid, blue));
    }

    let buf = build(&scene);
    let model = root_as_model(&buf).unwrap();
    let meshes = model.meshes().unwrap();
    assert_eq!(meshes.materials().unwrap().len(), 1);

    let samples: Vec<_> = meshes.samples().unwrap().iter().collect();
    assert_eq!(samples.len(), 3);
    for (index, sample) in samples.iter().enumerate() {
        assert_eq!(sample.material, 0);
        assert_eq!(sample.item, index as u32);
        assert_eq!(sample.representation, index as u32);
        assert_eq!(sample.local_transform, 0);
    }
}

#[test]
fn test_materials_in_first_seen_order() {
    let mut scene = Scene::new();
    let red = scene.add_material(SurfaceMaterial::new(1.0, 0.0, 0.0, 0.0));
    let glass = scene.add_material(SurfaceMaterial::new(1.0, 0.5, 0.0, 0.25));

    let mut body = Body::new();
    for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
        body.add_vertex(x, y, 0.0);
    }
    body.add_triangle(glass, 0, 1, 2);
    body.add_triangle(red, 0, 2, 3);
    body.add_triangle(glass, 1, 2, 3);
    scene.add_element(Element::new("window").with_body(body));

    let buf = build(&scene);
    let model = root_as_model(&buf).unwrap();
    let meshes = model.meshes().unwrap();

    let materials: Vec<_> = meshes.materials().unwrap().iter().collect();
    assert_eq!(materials.len(), 2);
    assert_eq!((materials[0].r, materials[0].g, materials[0].b, materials[0].a), (255, 127, 0, 191));
    assert_eq!((materials[1].r, materials[1].g, materials[1].b, materials[1].a), (255, 0, 0, 255));
    assert!(materials
        .iter()
        .all(|m| m.rendered_faces == RenderedFaces::TWO && m.stroke == Stroke::DEFAULT));

    let representations: Vec<_> = meshes.representations().unwrap().iter().collect();
    assert_eq!(representations.len(), 2);
    for (index, representation) in representations.iter().enumerate() {
        assert_eq!(representation.id, index as u32);
        assert_eq!(representation.representation_class, RepresentationClass::SHELL);
    }

    let shells = meshes.shells().unwrap();
    assert_eq!(shells.get(0).unwrap().profiles().unwrap().len(), 2);
    assert_eq!(shells.get(0).unwrap().points().unwrap().len(), 4);
    assert_eq!(shells.get(1).unwrap().profiles().unwrap().len(), 1);
    assert_eq!(shells.get(1).unwrap().points().unwrap().len(), 3);
}

#[test]
fn test_unknown_material_exports_white() {
    let mut scene = Scene::new();
    scene.add_element(triangle_element("orphan", MaterialId(42)));

    let buf = build(&scene);
    let model = root_as_model(&buf).unwrap();
    let material = model.meshes().unwrap().materials().unwrap().get(0).unwrap();
    assert_eq!((material.r, material.g, material.b, material.a), (255, 255, 255, 255));
}

#[test]
fn test_points_are_y_up_and_bounded() {
    let mut scene = Scene::new();
    let white = add_color(&mut scene, 1.0, 1.0, 1.0);
    scene.add_element(triangle_element("tri", white));
    scene.add_element(Element::new("box").with_body(cube_body(white, [2.0, -3.0, 1.5])));

    let buf = build(&scene);
    let model = root_as_model(&buf).unwrap();
    let meshes = model.meshes().unwrap();

    // Source vertex (0, 1, 2) lands at (0, 2, -1)
    let third = meshes.shells().unwrap().get(0).unwrap().points().unwrap().get(2).unwrap();
    assert!(approx(third.x, 0.0) && approx(third.y, 2.0) && approx(third.z, -1.0));

    let shells = meshes.shells().unwrap();
    for (shell, representation) in shells.iter().zip(meshes.representations().unwrap().iter()) {
        let points: Vec<_> = shell.points().unwrap().iter().collect();
        let fold = |pick: fn(&fragments::schema::FloatVector) -> f32, max: bool| {
            points
                .iter()
                .map(pick)
                .fold(if max { f32::MIN } else { f32::MAX }, |acc, v| {
                    if max { acc.max(v) } else { acc.min(v) }
                })
        };
        let bbox = representation.bbox;
        assert!(approx(bbox.min.x, fold(|p| p.x, false)));
        assert!(approx(bbox.min.y, fold(|p| p.y, false)));
        assert!(approx(bbox.min.z, fold(|p| p.z, false)));
        assert!(approx(bbox.max.x, fold(|p| p.x, true)));
        assert!(approx(bbox.max.y, fold(|p| p.y, true)));
        assert!(approx(bbox.max.z, fold(|p| p.z, true)));
    }

    // Cube spans x 2..3, source y -3..-2 -> z 2..3, source z 1.5..2.5 -> y 1.5..2.5
    let cube = meshes.representations().unwrap().get(1).unwrap().bbox;
    assert!(approx(cube.min.x, 2.0) && approx(cube.max.x, 3.0));
    assert!(approx(cube.min.y, 1.5) && approx(cube.max.y, 2.5));
    assert!(approx(cube.min.z, 2.0) && approx(cube.max.z, 3.0));
}

#[test]
fn test_compressed_matches_raw() {
    let mut scene = Scene::new();
    let white = add_color(&mut scene, 1.0, 1.0, 1.0);
    scene.add_element(cube_element("a", white));
    scene.add_element(triangle_element("b", white));

    let exporter = Exporter::new(&scene).with_guid(MODEL_GUID);
    let raw = exporter
        .export_bytes(&ExportSettings::new(CompressionMode::Raw))
        .unwrap();
    let compressed = exporter
        .export_bytes(&ExportSettings::new(CompressionMode::Compressed))
        .unwrap();

    assert_ne!(raw, compressed);
    assert_eq!(compression::decompress(&compressed).unwrap(), raw);
}

#[test]
fn test_export_is_deterministic_with_fixed_guid() {
    let mut scene = Scene::new();
    let white = add_color(&mut scene, 1.0, 1.0, 1.0);
    scene.add_element(cube_element("a", white));
    assert_eq!(build(&scene), build(&scene));
}

#[test]
fn test_random_guid_when_not_set() {
    let scene = Scene::new();
    let first = Exporter::new(&scene).build().unwrap();
    let second = Exporter::new(&scene).build().unwrap();
    let first_guid = root_as_model(&first).unwrap().guid().unwrap().to_string();
    let second_guid = root_as_model(&second).unwrap().guid().unwrap().to_string();
    assert_eq!(first_guid.len(), 36);
    assert_ne!(first_guid, second_guid);
}

#[test]
fn test_file_round_trip_in_both_modes() {
    let mut scene = Scene::new();
    let white = add_color(&mut scene, 1.0, 1.0, 1.0);
    scene.add_element(cube_element("a", white));
    let expected = build(&scene);

    let dir = tempfile::tempdir().unwrap();
    for mode in [CompressionMode::Raw, CompressionMode::Compressed] {
        let path = dir.path().join(format!("{:?}.frag", mode));
        Exporter::new(&scene)
            .with_guid(MODEL_GUID)
            .export_to_file(&path, &ExportSettings::new(mode))
            .unwrap();
        assert_eq!(read_fragments_file(&path).unwrap(), expected);
    }
}

#[test]
fn test_export_to_writer() {
    let mut scene = Scene::new();
    let white = add_color(&mut scene, 1.0, 1.0, 1.0);
    scene.add_element(triangle_element("a", white));

    let out = Exporter::new(&scene)
        .with_guid(MODEL_GUID)
        .export_to_writer(Vec::new(), &ExportSettings::default())
        .unwrap();
    assert_eq!(out, build(&scene));
}

#[test]
fn test_export_into_missing_directory_fails() {
    let scene = Scene::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("model.frag");
    let err = Exporter::new(&scene)
        .export_to_file(&path, &ExportSettings::default())
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_zero_elements_yield_valid_container() {
    let scene = Scene::new();
    let buf = build(&scene);
    let model = root_as_model(&buf).unwrap();

    assert!(model.guids().unwrap().is_empty());
    assert!(model.local_ids().unwrap().is_empty());
    assert!(model.categories().unwrap().is_empty());
    assert!(model.attributes().unwrap().is_empty());
    assert_eq!(model.max_local_id(), 1);

    let meshes = model.meshes().unwrap();
    assert!(meshes.shells().unwrap().is_empty());
    assert!(meshes.materials().unwrap().is_empty());
    assert_eq!(meshes.local_transforms().unwrap().len(), 1);
}

#[test]
fn test_categories_and_attributes_from_properties() {
    let mut scene = Scene::new();
    let white = add_color(&mut scene, 1.0, 1.0, 1.0);
    scene.add_element(triangle_element("wall", white));
    scene.add_element(triangle_element("panel", white));
    scene.add_element(triangle_element("loose", white));

    let mut properties = PropertyTable::new();
    properties.set_classification("wall", "IfcCurtainWall");
    properties.add_attribute("wall", AttributeValue::new("Name", "CW-01", "IfcLabel"));
    properties.add_attribute(
        "wall",
        AttributeValue {
            name: "Tag".to_string(),
            value: None,
            value_type: "IfcIdentifier".to_string(),
        },
    );
    properties.set_parent("panel", "wall");

    let buf = Exporter::new(&scene)
        .with_properties(&properties)
        .with_guid(MODEL_GUID)
        .build()
        .unwrap();
    let model = root_as_model(&buf).unwrap();

    assert_eq!(
        model.categories().unwrap().iter().collect::<Vec<_>>(),
        vec!["IFCCURTAINWALL", "IFCCURTAINWALL", "IFCBUILDINGELEMENTPROXY"]
    );
    let attributes: Vec<Vec<&str>> = model
        .attributes()
        .unwrap()
        .iter()
        .map(|attribute| attribute.data().unwrap().iter().collect())
        .collect();
    assert_eq!(attributes[0], vec![r#"["Name","CW-01","IFCLABEL"]"#]);
    assert_eq!(attributes[1], attributes[0]);
    assert!(attributes[2].is_empty());
}

#[test]
fn test_shell_capacity_error() {
    let mut scene = Scene::new();
    let white = add_color(&mut scene, 1.0, 1.0, 1.0);
    let mut body = Body::new();
    let count = fragments::MAX_SHELL_POINTS + 2;
    for i in 0..count {
        body.add_vertex(i as f64, (i % 7) as f64, 0.0);
    }
    for start in (0..count - 2).step_by(3) {
        body.add_triangle(white, start, start + 1, start + 2);
    }
    scene.add_element(Element::new("huge").with_body(body));

    match Exporter::new(&scene).build() {
        Err(Error::ShellCapacity { element, limit }) => {
            assert_eq!(element, "huge");
            assert_eq!(limit, 65536);
        }
        other => panic!("expected capacity error, got {:?}", other.map(|b| b.len())),
    }
}

/// A host that reports more elements than it can return
struct BrokenModel;

impl SourceModel for BrokenModel {
    fn element_count(&self) -> usize {
        2
    }

    fn element(&self, _index: usize) -> Option<&dyn SourceElement> {
        None
    }

    fn material(&self, _id: MaterialId) -> Option<SurfaceMaterial> {
        None
    }
}

/// A body that reports a vertex it cannot return
struct LyingBody(Body);

impl MeshBody for LyingBody {
    fn vertex_count(&self) -> usize {
        self.0.vertex_count() + 1
    }

    fn vertex(&self, index: usize) -> Option<nalgebra::Point3<f64>> {
        self.0.vertex(index)
    }

    fn polygon_count(&self) -> usize {
        self.0.polygon_count()
    }

    fn polygon(&self, index: usize) -> Option<&dyn fragments::BodyPolygon> {
        self.0.polygon(index)
    }
}

struct LyingElement(LyingBody);

impl SourceElement for LyingElement {
    fn guid(&self) -> &str {
        "liar"
    }

    fn body_count(&self) -> usize {
        1
    }

    fn body(&self, _index: usize) -> Option<&dyn MeshBody> {
        Some(&self.0)
    }
}

struct LyingModel(LyingElement);

impl SourceModel for LyingModel {
    fn element_count(&self) -> usize {
        1
    }

    fn element(&self, _index: usize) -> Option<&dyn SourceElement> {
        Some(&self.0)
    }

    fn material(&self, _id: MaterialId) -> Option<SurfaceMaterial> {
        Some(SurfaceMaterial::default())
    }
}

#[test]
fn test_missing_element_is_geometry_access_error() {
    let err = Exporter::new(&BrokenModel).build().unwrap_err();
    assert!(matches!(err, Error::GeometryAccess(_)));
    assert!(err.to_string().contains("[E3001]"));
}

#[test]
fn test_missing_vertex_is_geometry_access_error() {
    let mut body = Body::new();
    body.add_vertex(0.0, 0.0, 0.0);
    body.add_vertex(1.0, 0.0, 0.0);
    body.add_triangle(MaterialId(0), 0, 1, 2);
    let model = LyingModel(LyingElement(LyingBody(body)));

    let err = Exporter::new(&model).build().unwrap_err();
    assert!(matches!(err, Error::GeometryAccess(_)));
}
