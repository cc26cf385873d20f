//! Per-frame vertex data shared by several meshes.
//!
//! Meshes swallow their geometry into one [`VertexBufferDraft`] each frame.
//! The draft remembers which range of floats every mesh wrote, so one
//! uploaded buffer can serve several draw calls.

use std::collections::HashMap;

use crate::geometry::MeshKey;

/// Floats per vertex in every draft
pub const FLOATS_PER_VERTEX: usize = 3;

/// Range of a draft's data written by one mesh, in floats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisteredInfo {
    pub offset: usize,
    pub size: usize,
}

impl RegisteredInfo {
    /// First vertex and vertex count, the shape draw calls want
    pub fn vertex_range(&self) -> (usize, usize) {
        (self.offset / FLOATS_PER_VERTEX, self.size / FLOATS_PER_VERTEX)
    }
}

/// Append-only float buffer with per-mesh range bookkeeping.
///
/// A mesh may register once between two calls to [`VertexBufferDraft::clear`];
/// a second registration is refused so a mesh reachable from two code paths
/// is not written twice in one frame.
#[derive(Debug, Default)]
pub struct VertexBufferDraft {
    data: Vec<f32>,
    registered: HashMap<MeshKey, RegisteredInfo>,
}

impl VertexBufferDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mesh` for this frame and hand out the buffer to append to.
    ///
    /// Returns `None` when the mesh is already registered; the caller should
    /// skip writing.
    pub fn register_for_frame(&mut self, mesh: MeshKey) -> Option<&mut Vec<f32>> {
        if self.registered.contains_key(&mesh) {
            return None;
        }
        self.registered.insert(
            mesh,
            RegisteredInfo {
                offset: self.data.len(),
                size: 0,
            },
        );
        Some(&mut self.data)
    }

    pub fn is_registered(&self, mesh: MeshKey) -> bool {
        self.registered.contains_key(&mesh)
    }

    /// Mark the current end of the data as the start of `mesh`'s range.
    /// Does nothing for a mesh that has not registered this frame.
    pub fn start_counting_pumped(&mut self, mesh: MeshKey) {
        let offset = self.data.len();
        if let Some(info) = self.registered.get_mut(&mesh) {
            info.offset = offset;
            info.size = 0;
        }
    }

    /// Close `mesh`'s range at the current end of the data
    pub fn stop_counting_pumped(&mut self, mesh: MeshKey) {
        let end = self.data.len();
        if let Some(info) = self.registered.get_mut(&mesh) {
            info.size = end - info.offset;
        }
    }

    /// Range written by `mesh` this frame, `None` if it never registered
    pub fn get_mesh_info(&self, mesh: MeshKey) -> Option<RegisteredInfo> {
        self.registered.get(&mesh).copied()
    }

    /// Floats written by `mesh` this frame
    pub fn mesh_data(&self, mesh: MeshKey) -> Option<&[f32]> {
        self.get_mesh_info(mesh)
            .map(|info| &self.data[info.offset..info.offset + info.size])
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut Vec<f32> {
        &mut self.data
    }

    /// Number of whole vertices in the buffer
    pub fn vertex_count(&self) -> usize {
        self.data.len() / FLOATS_PER_VERTEX
    }

    /// Forget every registration and drop the data; call once per frame
    pub fn clear(&mut self) {
        self.registered.clear();
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;

    #[test]
    fn test_register_once_per_frame() {
        let mesh = Mesh::new();
        let mut draft = VertexBufferDraft::new();

        assert!(draft.register_for_frame(mesh.key()).is_some());
        assert!(draft.register_for_frame(mesh.key()).is_none());
        assert!(draft.is_registered(mesh.key()));

        draft.clear();
        assert!(!draft.is_registered(mesh.key()));
        assert!(draft.register_for_frame(mesh.key()).is_some());
    }

    #[test]
    fn test_counting_does_not_register() {
        let mesh = Mesh::new();
        let mut draft = VertexBufferDraft::new();

        draft.start_counting_pumped(mesh.key());
        draft.stop_counting_pumped(mesh.key());
        assert!(draft.get_mesh_info(mesh.key()).is_none());
        assert!(draft.register_for_frame(mesh.key()).is_some());
    }

    #[test]
    fn test_identity_not_content() {
        let a = Mesh::cube(1.0);
        let b = Mesh::cube(1.0);
        let mut draft = VertexBufferDraft::new();
        assert!(draft.register_for_frame(a.key()).is_some());
        assert!(draft.register_for_frame(b.key()).is_some());
    }

    #[test]
    fn test_counting_brackets_a_write() {
        let first = Mesh::new();
        let second = Mesh::new();
        let mut draft = VertexBufferDraft::new();

        draft
            .register_for_frame(first.key())
            .expect("first registration")
            .extend_from_slice(&[0.0; 6]);

        let target = draft.register_for_frame(second.key()).expect("second registration");
        assert_eq!(target.len(), 6);
        draft.start_counting_pumped(second.key());
        draft.data_mut().extend_from_slice(&[1.0; 9]);
        draft.stop_counting_pumped(second.key());

        let info = draft.get_mesh_info(second.key()).expect("registered");
        assert_eq!(info, RegisteredInfo { offset: 6, size: 9 });
        assert_eq!(info.vertex_range(), (2, 3));
        assert_eq!(draft.mesh_data(second.key()), Some(&[1.0; 9][..]));
        assert_eq!(draft.vertex_count(), 5);
    }

    #[test]
    fn test_registered_without_writes_is_empty() {
        let mesh = Mesh::new();
        let mut draft = VertexBufferDraft::new();
        draft.data_mut().extend_from_slice(&[0.0; 3]);
        draft.register_for_frame(mesh.key());

        assert_eq!(
            draft.get_mesh_info(mesh.key()),
            Some(RegisteredInfo { offset: 3, size: 0 })
        );
    }

    #[test]
    fn test_unknown_mesh_has_no_info() {
        let mesh = Mesh::new();
        let draft = VertexBufferDraft::new();
        assert!(draft.get_mesh_info(mesh.key()).is_none());
        assert!(draft.mesh_data(mesh.key()).is_none());
    }

    #[test]
    fn test_clear_drops_data() {
        let mesh = Mesh::new();
        let mut draft = VertexBufferDraft::new();
        draft
            .register_for_frame(mesh.key())
            .expect("registration")
            .push(1.0);
        draft.clear();
        assert!(draft.data().is_empty());
        assert!(draft.get_mesh_info(mesh.key()).is_none());
    }
}
