//! Vertex welding for one shell
//!
//! A shell holds every visible polygon of one element that shares one
//! material. Corners referring to the same body vertex are welded into a
//! single point; the weld key is `(body ordinal, vertex ordinal)`, so vertices
//! are never shared between bodies or between shells.

use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;

use nalgebra::{Point3, Rotation3, Vector3};

use crate::error::{Error, Result};
use crate::host::{BodyPolygon, MeshBody};
use crate::schema::{BoundingBox, FloatVector};

/// Maximum number of points a shell can hold with 16-bit profile indices
pub const MAX_SHELL_POINTS: usize = u16::MAX as usize + 1;

/// Rotation converting the source Z-up frame into the container's Y-up frame
pub fn up_axis_rotation() -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2)
}

/// A visible polygon together with the body it belongs to
#[derive(Clone, Copy)]
pub(crate) struct PolygonRef<'a> {
    pub body_index: usize,
    pub body: &'a dyn MeshBody,
    pub polygon: &'a dyn BodyPolygon,
}

/// Welded geometry of a finished shell
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ShellGeometry {
    pub points: Vec<FloatVector>,
    pub profiles: Vec<Vec<u16>>,
    pub bbox: BoundingBox,
}

pub(crate) struct ShellBuilder<'g> {
    element: &'g str,
    rotation: Rotation3<f64>,
    welded: HashMap<(usize, usize), u16>,
    points: Vec<FloatVector>,
    profiles: Vec<Vec<u16>>,
    min: Vector3<f64>,
    max: Vector3<f64>,
}

impl<'g> ShellBuilder<'g> {
    pub fn new(element: &'g str) -> Self {
        Self {
            element,
            rotation: up_axis_rotation(),
            welded: HashMap::new(),
            points: Vec::new(),
            profiles: Vec::new(),
            min: Vector3::repeat(f64::MAX),
            max: Vector3::repeat(f64::MIN),
        }
    }

    /// Append one profile per convex piece of `polygon`
    pub fn add_polygon(&mut self, polygon: &PolygonRef<'_>) -> Result<()> {
        let count = polygon.polygon.convex_polygon_count();
        for convex_index in 0..count {
            let convex = polygon
                .polygon
                .convex_polygon(convex_index)
                .ok_or_else(|| Error::geometry_access("convex polygon", convex_index, count))?;
            let mut indices = Vec::with_capacity(convex.len());
            for &vertex in convex {
                indices.push(self.point_index(polygon.body_index, polygon.body, vertex)?);
            }
            self.profiles.push(indices);
        }
        Ok(())
    }

    fn point_index(&mut self, body_index: usize, body: &dyn MeshBody, vertex: usize) -> Result<u16> {
        if let Some(&index) = self.welded.get(&(body_index, vertex)) {
            return Ok(index);
        }
        if self.points.len() >= MAX_SHELL_POINTS {
            return Err(Error::ShellCapacity {
                element: self.element.to_string(),
                limit: MAX_SHELL_POINTS,
            });
        }

        let world = body
            .vertex(vertex)
            .ok_or_else(|| Error::geometry_access("vertex", vertex, body.vertex_count()))?;
        let rotated: Point3<f64> = self.rotation * world;
        self.min = self.min.inf(&rotated.coords);
        self.max = self.max.sup(&rotated.coords);

        let index = self.points.len() as u16;
        self.points.push(FloatVector::new(
            rotated.x as f32,
            rotated.y as f32,
            rotated.z as f32,
        ));
        self.welded.insert((body_index, vertex), index);
        Ok(index)
    }

    pub fn finish(self) -> ShellGeometry {
        // A shell whose polygons had no convex pieces has no extent
        let bbox = if self.points.is_empty() {
            BoundingBox::default()
        } else {
            BoundingBox {
                min: FloatVector::new(self.min.x as f32, self.min.y as f32, self.min.z as f32),
                max: FloatVector::new(self.max.x as f32, self.max.y as f32, self.max.z as f32),
            }
        };
        ShellGeometry {
            points: self.points,
            profiles: self.profiles,
            bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MaterialId;
    use crate::scene::{Body, Polygon};

    fn quad_body() -> Body {
        let mut body = Body::new();
        body.add_vertex(0.0, 0.0, 0.0);
        body.add_vertex(2.0, 0.0, 0.0);
        body.add_vertex(2.0, 3.0, 0.0);
        body.add_vertex(0.0, 3.0, 5.0);
        body.add_polygon(Polygon::with_convex_polygons(
            MaterialId(0),
            vec![vec![0, 1, 2], vec![0, 2, 3]],
        ));
        body
    }

    fn weld(body: &Body) -> Result<ShellGeometry> {
        let mut shell = ShellBuilder::new("element");
        let polygon = PolygonRef {
            body_index: 0,
            body,
            polygon: &body.polygons[0],
        };
        shell.add_polygon(&polygon)?;
        Ok(shell.finish())
    }

    #[test]
    fn test_shared_corners_are_welded() {
        let body = quad_body();
        let shell = weld(&body).unwrap();
        assert_eq!(shell.points.len(), 4);
        assert_eq!(shell.profiles, vec![vec![0, 1, 2], vec![0, 2, 3]]);
    }

    #[test]
    fn test_points_are_rotated_to_y_up() {
        let body = quad_body();
        let shell = weld(&body).unwrap();
        // (x, y, z) -> (x, z, -y)
        let last = shell.points[3];
        assert!((last.x - 0.0).abs() < 1e-6);
        assert!((last.y - 5.0).abs() < 1e-6);
        assert!((last.z + 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_bbox_covers_rotated_points() {
        let body = quad_body();
        let shell = weld(&body).unwrap();
        assert!((shell.bbox.min.z + 3.0).abs() < 1e-6);
        assert!((shell.bbox.max.z - 0.0).abs() < 1e-6);
        assert!((shell.bbox.max.y - 5.0).abs() < 1e-6);
        assert!((shell.bbox.max.x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_vertex_is_access_error() {
        let mut body = Body::new();
        body.add_vertex(0.0, 0.0, 0.0);
        body.add_triangle(MaterialId(0), 0, 1, 2);
        let err = weld(&body).unwrap_err();
        assert!(matches!(err, Error::GeometryAccess(_)));
    }

    #[test]
    fn test_shell_capacity_is_enforced() {
        let mut body = Body::new();
        let count = MAX_SHELL_POINTS + 1;
        for i in 0..count {
            body.add_vertex(i as f64, 0.0, 0.0);
        }
        let pieces = (0..count).collect::<Vec<_>>().chunks(3).map(<[usize]>::to_vec).collect();
        body.add_polygon(Polygon::with_convex_polygons(MaterialId(0), pieces));

        match weld(&body) {
            Err(Error::ShellCapacity { element, limit }) => {
                assert_eq!(element, "element");
                assert_eq!(limit, 65536);
            }
            other => panic!("expected capacity error, got {:?}", other.map(|s| s.points.len())),
        }
    }

    #[test]
    fn test_exactly_max_points_fit() {
        let mut body = Body::new();
        for i in 0..MAX_SHELL_POINTS {
            body.add_vertex(i as f64, 0.0, 0.0);
        }
        let pieces = (0..MAX_SHELL_POINTS)
            .collect::<Vec<_>>()
            .chunks(4)
            .map(<[usize]>::to_vec)
            .collect();
        body.add_polygon(Polygon::with_convex_polygons(MaterialId(0), pieces));
        let shell = weld(&body).unwrap();
        assert_eq!(shell.points.len(), MAX_SHELL_POINTS);
        assert_eq!(shell.profiles.last().unwrap().last(), Some(&u16::MAX));
    }
}
