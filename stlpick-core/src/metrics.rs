//! Bounding box, centre and size of a mesh.

use nalgebra::Vector3;

use crate::geometry::{Mesh, Point};
use crate::iterator::{IterationMode, VertexIterator};

/// Axis-aligned extents of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshMetrics {
    pub min_point: Point,
    pub max_point: Point,
    pub center_point: Point,
    /// Size along x
    pub width: f32,
    /// Size along y
    pub height: f32,
    /// Size along z
    pub depth: f32,
    /// Length of the box diagonal. Encloses the mesh when centred on
    /// `center_point`, but is not the tightest such sphere.
    pub bounding_radius: f32,
}

impl MeshMetrics {
    pub fn extents(&self) -> Vector3<f32> {
        Vector3::new(self.width, self.height, self.depth)
    }
}

impl Mesh {
    /// Scan every point once and derive the mesh metrics.
    ///
    /// Returns `None` for a mesh without points.
    pub fn generate_metrics(&self) -> Option<MeshMetrics> {
        if self.points.is_empty() {
            return None;
        }

        let mut min_point = Point::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max_point = Point::new(f32::MIN, f32::MIN, f32::MIN);
        let mut track = |point: &Point| {
            for axis in 0..3 {
                if point[axis] < min_point[axis] {
                    min_point[axis] = point[axis];
                }
                if point[axis] > max_point[axis] {
                    max_point[axis] = point[axis];
                }
            }
        };
        VertexIterator::inspecting(self, IterationMode::Points, &mut track).pump_all();

        let center_point = nalgebra::center(&min_point, &max_point);
        let extents = max_point - min_point;
        let metrics = MeshMetrics {
            min_point,
            max_point,
            center_point,
            width: extents.x,
            height: extents.y,
            depth: extents.z,
            bounding_radius: extents.norm(),
        };

        tracing::debug!(
            min = ?metrics.min_point,
            max = ?metrics.max_point,
            center = ?metrics.center_point,
            dimensions = ?metrics.extents(),
            bounding_radius = metrics.bounding_radius,
            "generated mesh metrics"
        );

        Some(metrics)
    }
}
