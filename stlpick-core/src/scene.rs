//! Everything a viewer shows: the model, its selection overlay and the
//! base grid, plus the per-frame drafts they are swallowed into.
//!
//! A front-end drives a [`Scene`] with user actions (`open`, `click`,
//! `rebase_selected`, ...) and calls [`Scene::build_frame`] before drawing.
//! The drafts in [`MeshContext`] then hold:
//!
//! - `triangles`: model positions, three vertices per face,
//! - `normals`: one normal per model vertex, aligned with `triangles`,
//! - `wireframe`: line lists for the selection outline and the grid, sliced
//!   per mesh with [`VertexBufferDraft::get_mesh_info`].

use nalgebra::UnitQuaternion;
use std::path::Path;

use crate::chew::ChewFlags;
use crate::config::ViewerConfig;
use crate::draft::VertexBufferDraft;
use crate::error::{MeshError, Result};
use crate::faceid::{decode_face_id_bytes, NO_FACE};
use crate::geometry::{FaceIndex, Mesh, MeshKey, Point};
use crate::iterator::{Action, IterationMode, VertexIterator};
use crate::metrics::MeshMetrics;
use crate::projection::Camera;
use crate::stl::load_stl;

/// The loaded model and the buffers that only change with its geometry
#[derive(Debug)]
pub struct ModelMesh {
    pub mesh: Mesh,
    /// Encoded face id for every vertex of the `Triangles` walk
    pub id_projection: Vec<f32>,
    /// Face normal for every vertex of the `Triangles` walk
    pub normals: Vec<f32>,
}

impl ModelMesh {
    pub fn new(mut mesh: Mesh) -> Self {
        mesh.chew(ChewFlags::GRAPH);
        let mut model = Self {
            mesh,
            id_projection: Vec::new(),
            normals: Vec::new(),
        };
        model.rebuild_static_buffers();
        model
    }

    pub fn key(&self) -> MeshKey {
        self.mesh.key()
    }

    /// Recompute face ids and normals from the current geometry
    pub fn rebuild_static_buffers(&mut self) {
        self.id_projection.clear();
        VertexIterator::new(
            &self.mesh,
            &mut self.id_projection,
            IterationMode::Triangles,
            Action::PushFaceId,
        )
        .pump_all();

        self.normals.clear();
        VertexIterator::new(
            &self.mesh,
            &mut self.normals,
            IterationMode::PerTriangle,
            Action::PushNormal,
        )
        .pump_all();
    }

    /// Append the model triangles. Returns `false` if the model was already
    /// in the draft this frame.
    pub fn swallow(&self, draft: &mut VertexBufferDraft) -> bool {
        match VertexIterator::for_draft(
            &self.mesh,
            draft,
            IterationMode::Triangles,
            Action::PushPoint,
        ) {
            Some(mut iterator) => {
                iterator.pump_all();
                true
            }
            None => false,
        }
    }

    /// Append the precomputed normals
    pub fn swallow_normals(&self, draft: &mut VertexBufferDraft) -> bool {
        let key = self.key();
        let Some(target) = draft.register_for_frame(key) else {
            return false;
        };
        target.extend_from_slice(&self.normals);
        draft.stop_counting_pumped(key);
        true
    }

    /// Append the outline of `faces` as a line list
    pub fn swallow_overlay(&self, draft: &mut VertexBufferDraft, faces: &[FaceIndex]) -> bool {
        match VertexIterator::for_draft(
            &self.mesh,
            draft,
            IterationMode::TrianglesToLines,
            Action::PushPoint,
        ) {
            Some(iterator) => {
                iterator.restricted_to(faces).pump_all();
                true
            }
            None => false,
        }
    }
}

/// Square grid of lines in a horizontal plane, stored as point pairs
#[derive(Debug)]
pub struct BasegridMesh {
    pub mesh: Mesh,
    squares: u32,
    side: f32,
}

impl BasegridMesh {
    /// Grid of `squares` by `squares` cells of total size `side`, centred on
    /// `center` in x and y and lying at `center.z`
    pub fn new(squares: u32, side: f32, center: Point) -> Self {
        let squares = squares.max(1);
        let step = side / squares as f32;
        let x0 = center.x - side / 2.0;
        let y0 = center.y - side / 2.0;
        let z = center.z;

        let mut points = Vec::with_capacity((squares as usize + 1) * 4);
        for i in 0..=squares {
            let offset = step * i as f32;
            // Line along x
            points.push(Point::new(x0, y0 + offset, z));
            points.push(Point::new(x0 + side, y0 + offset, z));
            // Line along y
            points.push(Point::new(x0 + offset, y0, z));
            points.push(Point::new(x0 + offset, y0 + side, z));
        }

        Self {
            mesh: Mesh::from_parts(points, Vec::new()),
            squares,
            side,
        }
    }

    /// Grid sized and placed under a model with the given metrics
    pub fn under(metrics: &MeshMetrics, config: &ViewerConfig) -> Self {
        let side = config
            .grid_side
            .unwrap_or_else(|| 2.0 * metrics.width.max(metrics.height))
            .max(f32::EPSILON);
        let center = Point::new(
            metrics.center_point.x,
            metrics.center_point.y,
            metrics.min_point.z,
        );
        Self::new(config.grid_squares, side, center)
    }

    pub fn key(&self) -> MeshKey {
        self.mesh.key()
    }

    pub fn squares(&self) -> u32 {
        self.squares
    }

    pub fn side(&self) -> f32 {
        self.side
    }

    pub fn swallow(&self, draft: &mut VertexBufferDraft) -> bool {
        match VertexIterator::for_draft(&self.mesh, draft, IterationMode::Points, Action::PushPoint) {
            Some(mut iterator) => {
                iterator.pump_all();
                true
            }
            None => false,
        }
    }
}

/// Drafts filled once per frame
#[derive(Debug, Default)]
pub struct MeshContext {
    pub triangles: VertexBufferDraft,
    pub normals: VertexBufferDraft,
    pub wireframe: VertexBufferDraft,
}

impl MeshContext {
    pub fn clear(&mut self) {
        self.triangles.clear();
        self.normals.clear();
        self.wireframe.clear();
    }
}

/// Ordered set of picked faces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    faces: Vec<FaceIndex>,
}

impl Selection {
    /// Apply a click on `face`: the background clears, an additive click
    /// toggles the face and a plain click selects only it.
    pub fn click(&mut self, face: FaceIndex, additive: bool) {
        if face == NO_FACE as FaceIndex {
            self.faces.clear();
        } else if additive {
            self.toggle(face);
        } else {
            self.faces.clear();
            self.faces.push(face);
        }
    }

    pub fn toggle(&mut self, face: FaceIndex) {
        match self.faces.iter().position(|&f| f == face) {
            Some(i) => {
                self.faces.remove(i);
            }
            None => self.faces.push(face),
        }
    }

    /// Add every face sharing a point with the selection
    pub fn grow(&mut self, mesh: &Mesh) {
        let ring = mesh.adjacent_faces(&self.faces);
        for face in ring {
            if !self.faces.contains(&face) {
                self.faces.push(face);
            }
        }
    }

    pub fn clear(&mut self) {
        self.faces.clear();
    }

    pub fn faces(&self) -> &[FaceIndex] {
        &self.faces
    }

    pub fn first(&self) -> Option<FaceIndex> {
        self.faces.first().copied()
    }

    pub fn contains(&self, face: FaceIndex) -> bool {
        self.faces.contains(&face)
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }
}

/// Model, grid, selection and camera of one viewer
#[derive(Debug)]
pub struct Scene {
    pub model: ModelMesh,
    pub grid: BasegridMesh,
    selection: Selection,
    pub camera: Camera,
    pub context: MeshContext,
    config: ViewerConfig,
    metrics: MeshMetrics,
}

impl Scene {
    /// Scene showing `mesh`. Fails for a mesh without points or faces.
    pub fn new(mesh: Mesh, config: ViewerConfig) -> Result<Self> {
        let metrics = Self::checked_metrics(&mesh)?;
        let mut camera = Camera::default().with_zoom_rate(config.wheel_degrees_to_z_units);
        camera.reset_to(&metrics);

        Ok(Self {
            model: ModelMesh::new(mesh),
            grid: BasegridMesh::under(&metrics, &config),
            selection: Selection::default(),
            camera,
            context: MeshContext::default(),
            config,
            metrics,
        })
    }

    /// Load an STL file into a new scene
    pub fn load<P: AsRef<Path>>(path: P, config: ViewerConfig) -> Result<Self> {
        Self::new(load_stl(path)?, config)
    }

    /// Replace the model with the contents of an STL file. On failure the
    /// current model stays.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let mesh = load_stl(path)?;
        self.set_mesh(mesh)
    }

    /// Replace the model, reframe the camera and drop the selection
    pub fn set_mesh(&mut self, mesh: Mesh) -> Result<()> {
        let metrics = Self::checked_metrics(&mesh)?;
        self.model = ModelMesh::new(mesh);
        self.selection.clear();
        self.reframe(metrics);
        Ok(())
    }

    fn checked_metrics(mesh: &Mesh) -> Result<MeshMetrics> {
        if mesh.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        mesh.validate()?;
        mesh.generate_metrics().ok_or(MeshError::EmptyMesh)
    }

    fn reframe(&mut self, metrics: MeshMetrics) {
        self.metrics = metrics;
        self.camera.reset_to(&metrics);
        self.grid = BasegridMesh::under(&metrics, &self.config);
    }

    pub fn metrics(&self) -> &MeshMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Selected faces; only `click`, `grow_selection` and `clear_selection`
    /// change it, so every entry indexes the current model.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Update the selection from a face-id snapshot pixel and return the
    /// face under it, if any.
    pub fn click(&mut self, pixel: [u8; 3], additive: bool) -> Option<FaceIndex> {
        let id = decode_face_id_bytes(pixel);
        let face = id as FaceIndex;
        if id != NO_FACE && face >= self.model.mesh.faces.len() {
            tracing::warn!(id, "picked face id outside the model, ignoring");
            return None;
        }

        self.selection.click(face, additive);
        tracing::debug!(face, additive, selected = self.selection.len(), "picked");
        (id != NO_FACE).then_some(face)
    }

    /// Turn the model so the first selected face points along the configured
    /// rebase axis, then refresh everything derived from its geometry.
    pub fn rebase_selected(&mut self) -> Result<UnitQuaternion<f32>> {
        let face = self.selection.first().ok_or(MeshError::NoSelection)?;
        let axis = self.config.rebase_axis();
        let rotation = self.model.mesh.rebase(face, &axis)?;

        self.model.mesh.chew(ChewFlags::GRAPH);
        self.model.rebuild_static_buffers();
        let metrics = self.model.mesh.generate_metrics().ok_or(MeshError::EmptyMesh)?;
        self.reframe(metrics);
        Ok(rotation)
    }

    /// Widen the selection by one ring of neighbouring faces
    pub fn grow_selection(&mut self) {
        self.selection.grow(&self.model.mesh);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Refill the drafts for the next frame
    pub fn build_frame(&mut self) {
        self.context.clear();
        self.model.swallow(&mut self.context.triangles);
        self.model.swallow_normals(&mut self.context.normals);
        if !self.selection.is_empty() {
            self.model
                .swallow_overlay(&mut self.context.wireframe, self.selection.faces());
        }
        self.grid.swallow(&mut self.context.wireframe);
    }
}
