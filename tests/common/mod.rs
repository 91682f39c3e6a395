//! Shared scene fixtures for integration tests

#![allow(dead_code)]

use fragments::{Body, Element, Exporter, MaterialId, Polygon, Scene, SurfaceMaterial};

/// Model identifier used for reproducible buffers
pub const MODEL_GUID: &str = "3F2504E0-4F89-41D3-9A0C-0305E82C3301";

/// Add an opaque material with the given color
pub fn add_color(scene: &mut Scene, r: f64, g: f64, b: f64) -> MaterialId {
    scene.add_material(SurfaceMaterial::new(r, g, b, 0.0))
}

/// An element with a single triangle
pub fn triangle_element(guid: &str, material: MaterialId) -> Element {
    let mut body = Body::new();
    let a = body.add_vertex(0.0, 0.0, 0.0);
    let b = body.add_vertex(1.0, 0.0, 0.0);
    let c = body.add_vertex(0.0, 1.0, 2.0);
    body.add_triangle(material, a, b, c);
    Element::new(guid).with_body(body)
}

/// An element without bodies
pub fn empty_element(guid: &str) -> Element {
    Element::new(guid)
}

/// A unit cube built from six quads, each split into two triangles
pub fn cube_body(material: MaterialId, origin: [f64; 3]) -> Body {
    let mut body = Body::new();
    for i in 0..8 {
        body.add_vertex(
            origin[0] + (i & 1) as f64,
            origin[1] + ((i >> 1) & 1) as f64,
            origin[2] + ((i >> 2) & 1) as f64,
        );
    }
    let quads = [
        [0, 2, 3, 1],
        [4, 5, 7, 6],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 4, 6, 2],
        [1, 3, 7, 5],
    ];
    for [a, b, c, d] in quads {
        body.add_polygon(Polygon::with_convex_polygons(
            material,
            vec![vec![a, b, c], vec![a, c, d]],
        ));
    }
    body
}

/// An element holding one cube
pub fn cube_element(guid: &str, material: MaterialId) -> Element {
    Element::new(guid).with_body(cube_body(material, [0.0, 0.0, 0.0]))
}

/// Build the raw buffer of `scene` with the fixed model identifier
pub fn build(scene: &Scene) -> Vec<u8> {
    Exporter::new(scene)
        .with_guid(MODEL_GUID)
        .build()
        .expect("export failed")
}
