//! Geometry primitives: points, triangles and the indexed mesh

use nalgebra::{Point3, Vector3};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::chew::{ChewFlags, PointGraph};
use crate::error::{MeshError, Result};

/// Index into a mesh's `points` array
pub type PointIndex = usize;

/// Index into a mesh's `faces` array
pub type FaceIndex = usize;

/// A mesh point
pub type Point = Point3<f32>;

/// A triangle face defined by three point indices, in winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub points: [PointIndex; 3],
}

impl Triangle {
    pub const POINT_COUNT: usize = 3;

    pub fn new(a: PointIndex, b: PointIndex, c: PointIndex) -> Self {
        Self { points: [a, b, c] }
    }
}

impl From<[PointIndex; 3]> for Triangle {
    fn from(points: [PointIndex; 3]) -> Self {
        Self { points }
    }
}

/// Opaque identity of a mesh.
///
/// Issued once per constructed mesh and never derived from its content or
/// address, so two meshes with equal points still register separately in a
/// [`VertexBufferDraft`](crate::draft::VertexBufferDraft).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshKey(u64);

impl MeshKey {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// An indexed triangle mesh.
///
/// `points` and `faces` are the primary data. `graph`, `point_faces` and
/// `face_faces` are derived by [`Mesh::chew`] and are not refreshed when the
/// primary arrays change; call `chew` again after mutating them.
#[derive(Debug)]
pub struct Mesh {
    pub points: Vec<Point>,
    pub faces: Vec<Triangle>,
    /// Point adjacency, for each point the points sharing an edge with it
    pub graph: PointGraph,
    /// For each point the faces touching it
    pub point_faces: Vec<Vec<FaceIndex>>,
    /// For each face the faces sharing at least one point with it
    pub face_faces: Vec<Vec<FaceIndex>>,
    pub(crate) chewed: ChewFlags,
    key: MeshKey,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            faces: Vec::new(),
            graph: PointGraph::default(),
            point_faces: Vec::new(),
            face_faces: Vec::new(),
            chewed: ChewFlags::empty(),
            key: MeshKey::next(),
        }
    }

    pub fn from_parts(points: Vec<Point>, faces: Vec<Triangle>) -> Self {
        Self {
            points,
            faces,
            ..Self::new()
        }
    }

    pub fn key(&self) -> MeshKey {
        self.key
    }

    /// Flags passed to the most recent [`Mesh::chew`]
    pub fn last_chew(&self) -> ChewFlags {
        self.chewed
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() || self.faces.is_empty()
    }

    /// Clear primary and derived arrays. The mesh keeps its identity.
    pub fn clear(&mut self) {
        self.points.clear();
        self.faces.clear();
        self.graph.clear();
        self.point_faces.clear();
        self.face_faces.clear();
        self.chewed = ChewFlags::empty();
    }

    /// Check that every face references an existing point
    pub fn validate(&self) -> Result<()> {
        let count = self.points.len();
        for (face, triangle) in self.faces.iter().enumerate() {
            if let Some(&point) = triangle.points.iter().find(|&&p| p >= count) {
                return Err(MeshError::InvalidPointIndex { face, point, count });
            }
        }
        Ok(())
    }

    /// Unit normal of a face, `normalize((p2 - p1) x (p3 - p2))`.
    ///
    /// Degenerate faces give the zero vector.
    pub fn face_normal(&self, face: FaceIndex) -> Vector3<f32> {
        let [a, b, c] = self.faces[face].points;
        let p1 = self.points[a];
        let p2 = self.points[b];
        let p3 = self.points[c];

        let v1 = p2 - p1;
        let v2 = p3 - p2;

        v1.cross(&v2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Create an indexed cube centred at the origin, 8 points and 12 faces
    /// wound counter-clockwise when seen from outside
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let points = vec![
            Point::new(-h, -h, -h),
            Point::new(h, -h, -h),
            Point::new(h, h, -h),
            Point::new(-h, h, -h),
            Point::new(-h, -h, h),
            Point::new(h, -h, h),
            Point::new(h, h, h),
            Point::new(-h, h, h),
        ];

        let faces = [
            // Front face
            [4, 5, 6],
            [4, 6, 7],
            // Back face
            [0, 3, 2],
            [0, 2, 1],
            // Top face
            [3, 7, 6],
            [3, 6, 2],
            // Bottom face
            [0, 1, 5],
            [0, 5, 4],
            // Right face
            [1, 2, 6],
            [1, 6, 5],
            // Left face
            [0, 4, 7],
            [0, 7, 3],
        ]
        .into_iter()
        .map(Triangle::from)
        .collect();

        Self::from_parts(points, faces)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Mesh {
    /// Copies the data under a fresh [`MeshKey`]
    fn clone(&self) -> Self {
        Self {
            points: self.points.clone(),
            faces: self.faces.clone(),
            graph: self.graph.clone(),
            point_faces: self.point_faces.clone(),
            face_faces: self.face_faces.clone(),
            chewed: self.chewed,
            key: MeshKey::next(),
        }
    }
}
