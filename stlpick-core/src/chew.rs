//! Derivation of secondary mesh structures ("chewing").
//!
//! Chewing turns the primary `points`/`faces` arrays into lookup tables:
//! the point graph, the faces around each point and the faces around each
//! face.

use crate::geometry::{FaceIndex, Mesh, PointIndex};

bitflags::bitflags! {
    /// Selects which derived structures [`Mesh::chew`] rebuilds
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChewFlags: u32 {
        /// Rebuild the point adjacency graph
        const GRAPH = 0b0000_0001;
    }
}

impl ChewFlags {
    pub fn builds_graph(self) -> bool {
        self.contains(ChewFlags::GRAPH)
    }
}

/// Connections between points.
///
/// Symmetric: if `n` is listed for `m` then `m` is listed for `n`.
#[derive(Debug, Clone, Default)]
pub struct PointGraph {
    /// For each point, the points it shares an edge with
    pub connections: Vec<Vec<PointIndex>>,
}

impl PointGraph {
    /// Size the graph for `point_count` points and drop every connection
    pub fn resize(&mut self, point_count: usize) {
        self.connections.resize_with(point_count, Vec::new);
        for related in &mut self.connections {
            related.clear();
        }
    }

    /// Connect `m` and `n` in both directions, ignoring repeats
    pub fn put_pair(&mut self, m: PointIndex, n: PointIndex) {
        push_unique(&mut self.connections[m], n);
        push_unique(&mut self.connections[n], m);
    }

    pub fn neighbors(&self, point: PointIndex) -> &[PointIndex] {
        &self.connections[point]
    }

    pub fn clear(&mut self) {
        self.connections.clear();
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, value: T) {
    if !list.contains(&value) {
        list.push(value);
    }
}

impl Mesh {
    /// Build derived structures from the primary arrays.
    ///
    /// The point graph is rebuilt only when `flags` asks for it. Face
    /// adjacency (`point_faces` and `face_faces`) is rebuilt on every call.
    /// A face counts as adjacent to itself.
    pub fn chew(&mut self, flags: ChewFlags) {
        self.chewed = flags;

        if flags.builds_graph() {
            self.graph.resize(self.points.len());
            for triangle in &self.faces {
                let [a, b, c] = triangle.points;
                self.graph.put_pair(a, b);
                self.graph.put_pair(b, c);
                self.graph.put_pair(c, a);
            }
        }

        if self.faces.is_empty() {
            self.point_faces.clear();
            self.face_faces.clear();
            return;
        }

        self.point_faces.resize_with(self.points.len(), Vec::new);
        for faces_for_point in &mut self.point_faces {
            faces_for_point.clear();
        }
        for (face, triangle) in self.faces.iter().enumerate() {
            for &point in &triangle.points {
                push_unique(&mut self.point_faces[point], face);
            }
        }

        self.face_faces.resize_with(self.faces.len(), Vec::new);
        for (face, triangle) in self.faces.iter().enumerate() {
            let adjacent = &mut self.face_faces[face];
            adjacent.clear();
            for &point in &triangle.points {
                for &other in &self.point_faces[point] {
                    push_unique(adjacent, other);
                }
            }
        }

        tracing::debug!(
            points = self.points.len(),
            faces = self.faces.len(),
            graph = flags.builds_graph(),
            "chewed mesh"
        );
    }

    /// Faces adjacent to any face in `inner`, deduplicated, in first-seen
    /// order. Since every face is adjacent to itself the result contains
    /// `inner`. Requires a prior [`Mesh::chew`].
    pub fn adjacent_faces(&self, inner: &[FaceIndex]) -> Vec<FaceIndex> {
        let mut out = Vec::new();
        for &face in inner {
            for &other in &self.face_faces[face] {
                push_unique(&mut out, other);
            }
        }
        out
    }
}
