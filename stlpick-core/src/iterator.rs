//! Flattening of mesh data into vertex buffers.
//!
//! A [`VertexIterator`] walks a mesh in one of the [`IterationMode`]s and, at
//! every step, either appends three floats to a target (a point, an encoded
//! face id or a face normal) or hands the visited point to a callback. The
//! walk is driven by [`Indexer`]s whose delta cycles encode the visiting
//! order, so restricting it to a subset of faces only swaps the face indexer.

use crate::draft::VertexBufferDraft;
use crate::faceid::encode_face_index;
use crate::geometry::{FaceIndex, Mesh, MeshKey, Point, PointIndex};
use crate::indexer::{Indexer, IndexerIndirect, IndexerRanged};

/// Order in which a mesh is visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationMode {
    /// For each face visit corners A, B, C
    Triangles,
    /// For each face visit A, B, B, C, C, A (a line list of the outline)
    TrianglesToLines,
    /// Visit every entry of `points` once, ignoring faces
    Points,
    /// One step per face
    PerTriangle,
}

impl IterationMode {
    fn face_deltas(self) -> Option<Vec<isize>> {
        match self {
            IterationMode::Triangles => Some(vec![0, 0, 1]),
            IterationMode::TrianglesToLines => Some(vec![0, 0, 0, 0, 0, 1]),
            IterationMode::PerTriangle => Some(vec![1]),
            IterationMode::Points => None,
        }
    }

    fn corner_deltas(self) -> Option<Vec<isize>> {
        match self {
            IterationMode::Triangles => Some(vec![1, 1, -2]),
            IterationMode::TrianglesToLines => Some(vec![1, 0, 1, 0, -2, 0]),
            IterationMode::PerTriangle | IterationMode::Points => None,
        }
    }

    fn pump_kind(self) -> PumpKind {
        match self {
            IterationMode::Triangles | IterationMode::TrianglesToLines => PumpKind::ByFace,
            IterationMode::PerTriangle => PumpKind::ByFaceOnly,
            IterationMode::Points => PumpKind::ByPoint,
        }
    }
}

/// What a float-producing iterator writes at each step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Coordinates of the visited point
    PushPoint,
    /// The visited face's index as a colour, see [`crate::faceid`]
    PushFaceId,
    /// The visited face's unit normal. Under [`IterationMode::PerTriangle`]
    /// it is written three times, once for each corner of the face.
    PushNormal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpKind {
    ByFace,
    ByFaceOnly,
    ByPoint,
}

enum MeshRef<'a> {
    Shared(&'a Mesh),
    Exclusive(&'a mut Mesh),
}

impl MeshRef<'_> {
    fn get(&self) -> &Mesh {
        match self {
            MeshRef::Shared(mesh) => mesh,
            MeshRef::Exclusive(mesh) => mesh,
        }
    }
}

enum Target<'a> {
    Floats(&'a mut Vec<f32>),
    Draft {
        draft: &'a mut VertexBufferDraft,
        key: MeshKey,
    },
}

impl Target<'_> {
    fn buffer(&mut self) -> &mut Vec<f32> {
        match self {
            Target::Floats(out) => out,
            Target::Draft { draft, .. } => draft.data_mut(),
        }
    }
}

enum Work<'a> {
    Push { action: Action, target: Target<'a> },
    Inspect(&'a mut dyn FnMut(&Point)),
    Mutate(&'a mut dyn FnMut(&mut Point)),
}

/// Policy-driven walk over a mesh, see the [module docs](self).
///
/// Single use: once exhausted it stays exhausted.
pub struct VertexIterator<'a> {
    mesh: MeshRef<'a>,
    mode: IterationMode,
    work: Work<'a>,
    faces: Option<Box<dyn Indexer<Item = FaceIndex> + 'a>>,
    corners: Option<IndexerRanged>,
    points: Option<IndexerRanged>,
    face_index: FaceIndex,
    corner: usize,
    point_index: PointIndex,
    started: bool,
}

impl<'a> VertexIterator<'a> {
    fn build(mesh: MeshRef<'a>, mode: IterationMode, work: Work<'a>) -> Self {
        if let Work::Push { action, .. } = &work {
            assert!(
                mode != IterationMode::Points || *action == Action::PushPoint,
                "{:?} needs faces and cannot run in {:?} mode",
                action,
                mode
            );
        }

        let face_count = mesh.get().faces.len();
        let point_count = mesh.get().points.len();
        let faces = mode.face_deltas().map(|deltas| {
            Box::new(IndexerRanged::with_deltas(0, face_count, deltas))
                as Box<dyn Indexer<Item = FaceIndex> + 'a>
        });
        let corners = mode
            .corner_deltas()
            .map(|deltas| IndexerRanged::with_deltas(0, 3, deltas));
        let points = (mode == IterationMode::Points).then(|| IndexerRanged::new(0, point_count));

        Self {
            mesh,
            mode,
            work,
            faces,
            corners,
            points,
            face_index: 0,
            corner: 0,
            point_index: 0,
            started: false,
        }
    }

    /// Iterator appending to a plain float buffer
    pub fn new(mesh: &'a Mesh, target: &'a mut Vec<f32>, mode: IterationMode, action: Action) -> Self {
        Self::build(
            MeshRef::Shared(mesh),
            mode,
            Work::Push {
                action,
                target: Target::Floats(target),
            },
        )
    }

    /// Iterator appending to a shared draft.
    ///
    /// Registers `mesh` with the draft and returns `None` if it was already
    /// registered this frame, in which case nothing should be written.
    pub fn for_draft(
        mesh: &'a Mesh,
        draft: &'a mut VertexBufferDraft,
        mode: IterationMode,
        action: Action,
    ) -> Option<Self> {
        let key = mesh.key();
        draft.register_for_frame(key)?;
        Some(Self::build(
            MeshRef::Shared(mesh),
            mode,
            Work::Push {
                action,
                target: Target::Draft { draft, key },
            },
        ))
    }

    /// Iterator calling `visit` with every visited point
    pub fn inspecting(mesh: &'a Mesh, mode: IterationMode, visit: &'a mut dyn FnMut(&Point)) -> Self {
        Self::build(MeshRef::Shared(mesh), mode, Work::Inspect(visit))
    }

    /// Iterator calling `visit` with a mutable reference to every visited
    /// point. Face modes reach shared points once per face using them.
    pub fn mutating(mesh: &'a mut Mesh, mode: IterationMode, visit: &'a mut dyn FnMut(&mut Point)) -> Self {
        Self::build(MeshRef::Exclusive(mesh), mode, Work::Mutate(visit))
    }

    /// Visit only `faces`, in the given order, instead of every face.
    ///
    /// # Panics
    /// Panics in [`IterationMode::PerTriangle`] and [`IterationMode::Points`],
    /// and once pumping has started.
    pub fn restricted_to(mut self, faces: &'a [FaceIndex]) -> Self {
        assert!(!self.started, "face subset must be set before pumping");
        let deltas = match self.mode {
            IterationMode::Triangles | IterationMode::TrianglesToLines => self
                .mode
                .face_deltas()
                .expect("face modes have face deltas"),
            mode => panic!("a face subset is not supported in {:?} mode", mode),
        };
        self.faces = Some(Box::new(IndexerIndirect::with_deltas(faces, deltas)));
        self
    }

    pub fn mode(&self) -> IterationMode {
        self.mode
    }

    /// Visit one face corner and move to the next one. Returns `false` once
    /// the faces are exhausted.
    pub fn pump_by_face(&mut self) -> bool {
        self.started = true;
        let faces = self
            .faces
            .as_deref()
            .expect("pump_by_face needs a face iteration mode");
        if !faces.available() {
            return false;
        }
        self.face_index = faces.get();
        self.corner = self
            .corners
            .as_ref()
            .expect("pump_by_face needs a per-corner iteration mode")
            .get();

        self.apply();

        if let Some(corners) = self.corners.as_mut() {
            corners.next();
        }
        if let Some(faces) = self.faces.as_deref_mut() {
            faces.next();
        }
        true
    }

    /// Visit one face without touching corners. Returns `false` once the
    /// faces are exhausted.
    pub fn pump_by_face_only(&mut self) -> bool {
        self.started = true;
        let faces = self
            .faces
            .as_deref_mut()
            .expect("pump_by_face_only needs a face iteration mode");
        if !faces.available() {
            return false;
        }
        self.face_index = faces.get();
        faces.next();

        self.apply();
        true
    }

    /// Visit one entry of `points`. Returns `false` once the points are
    /// exhausted.
    pub fn pump_by_point(&mut self) -> bool {
        self.started = true;
        let points = self
            .points
            .as_mut()
            .expect("pump_by_point needs IterationMode::Points");
        if !points.available() {
            return false;
        }
        self.point_index = points.get();
        points.next();

        self.apply();
        true
    }

    /// One step with the pump matching the iteration mode
    pub fn pump(&mut self) -> bool {
        match self.mode.pump_kind() {
            PumpKind::ByFace => self.pump_by_face(),
            PumpKind::ByFaceOnly => self.pump_by_face_only(),
            PumpKind::ByPoint => self.pump_by_point(),
        }
    }

    /// Pump until exhausted and return the number of steps taken.
    ///
    /// When writing into a draft the written range is recorded as this
    /// mesh's range for the frame.
    pub fn pump_all(&mut self) -> usize {
        if let Work::Push {
            target: Target::Draft { draft, key },
            ..
        } = &mut self.work
        {
            draft.start_counting_pumped(*key);
        }

        let mut steps = 0;
        while self.pump() {
            steps += 1;
        }

        if let Work::Push {
            target: Target::Draft { draft, key },
            ..
        } = &mut self.work
        {
            draft.stop_counting_pumped(*key);
        }
        steps
    }

    fn visited_point(&self) -> PointIndex {
        match self.mode {
            IterationMode::Points => self.point_index,
            _ => self.mesh.get().faces[self.face_index].points[self.corner],
        }
    }

    fn apply(&mut self) {
        let point = self.visited_point();
        match &mut self.work {
            Work::Push { action, target } => {
                let mesh = self.mesh.get();
                let out = target.buffer();
                match action {
                    Action::PushPoint => out.extend_from_slice(mesh.points[point].coords.as_slice()),
                    Action::PushFaceId => out.extend_from_slice(&encode_face_index(self.face_index)),
                    Action::PushNormal => {
                        let normal = mesh.face_normal(self.face_index);
                        let copies = match self.mode {
                            IterationMode::PerTriangle => 3,
                            _ => 1,
                        };
                        for _ in 0..copies {
                            out.extend_from_slice(normal.as_slice());
                        }
                    }
                }
            }
            Work::Inspect(visit) => (*visit)(&self.mesh.get().points[point]),
            Work::Mutate(visit) => match &mut self.mesh {
                MeshRef::Exclusive(mesh) => (*visit)(&mut mesh.points[point]),
                MeshRef::Shared(_) => unreachable!("mutating iterators always hold the mesh exclusively"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faceid::{decode_face_id, ColorScale};
    use crate::geometry::Triangle;

    fn single_triangle() -> Mesh {
        Mesh::from_parts(
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(0.0, 1.0, 0.0),
            ],
            vec![Triangle::new(0, 1, 2)],
        )
    }

    fn two_triangles() -> Mesh {
        Mesh::from_parts(
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(0.0, 1.0, 0.0),
                Point::new(1.0, 1.0, 1.0),
            ],
            vec![Triangle::new(0, 1, 2), Triangle::new(1, 3, 2)],
        )
    }

    fn run(mesh: &Mesh, mode: IterationMode, action: Action) -> Vec<f32> {
        let mut out = Vec::new();
        VertexIterator::new(mesh, &mut out, mode, action).pump_all();
        out
    }

    #[test]
    fn test_triangles_push_points() {
        let mesh = single_triangle();
        let mut out = Vec::new();
        let mut iter = VertexIterator::new(&mesh, &mut out, IterationMode::Triangles, Action::PushPoint);
        assert!(iter.pump_by_face());
        assert!(iter.pump_by_face());
        assert!(iter.pump_by_face());
        assert!(!iter.pump_by_face());
        assert!(!iter.pump_by_face());
        drop(iter);
        assert_eq!(out, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_triangles_to_lines() {
        let mesh = single_triangle();
        let mut out = Vec::new();
        let mut iter = VertexIterator::new(&mesh, &mut out, IterationMode::TrianglesToLines, Action::PushPoint);
        while iter.pump_by_face() {}
        drop(iter);
        assert_eq!(
            out,
            vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, // A-B
                1.0, 0.0, 0.0, 0.0, 1.0, 0.0, // B-C
                0.0, 1.0, 0.0, 0.0, 0.0, 0.0, // C-A
            ]
        );
    }

    #[test]
    fn test_triangles_walk_every_face() {
        let mesh = two_triangles();
        let out = run(&mesh, IterationMode::Triangles, Action::PushPoint);
        assert_eq!(out.len(), 18);
        assert_eq!(&out[9..12], &[1.0, 0.0, 0.0]);
        assert_eq!(&out[12..15], &[1.0, 1.0, 1.0]);
        assert_eq!(&out[15..18], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_points_mode_ignores_faces() {
        let mut mesh = two_triangles();
        mesh.points.push(Point::new(9.0, 9.0, 9.0));
        let mut out = Vec::new();
        let mut iter = VertexIterator::new(&mesh, &mut out, IterationMode::Points, Action::PushPoint);
        assert_eq!(iter.pump_all(), 5);
        drop(iter);
        assert_eq!(out.len(), 15);
        assert_eq!(&out[12..], &[9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_face_ids_repeat_per_corner() {
        let mesh = two_triangles();
        let out = run(&mesh, IterationMode::Triangles, Action::PushFaceId);
        assert_eq!(out.len(), 18);
        let ids: Vec<u32> = out
            .chunks(3)
            .map(|c| decode_face_id([c[0], c[1], c[2]], ColorScale::Normalized))
            .collect();
        assert_eq!(ids, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_normals_align_with_triangle_positions() {
        let mesh = two_triangles();
        let per_corner = run(&mesh, IterationMode::Triangles, Action::PushNormal);
        let per_face = run(&mesh, IterationMode::PerTriangle, Action::PushNormal);
        assert_eq!(per_corner.len(), 18);
        assert_eq!(per_corner, per_face);
        assert_eq!(&per_face[0..3], &[0.0, 0.0, 1.0]);
        assert_eq!(&per_face[3..6], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_per_triangle_steps_once_per_face() {
        let mesh = two_triangles();
        let mut out = Vec::new();
        let mut iter = VertexIterator::new(&mesh, &mut out, IterationMode::PerTriangle, Action::PushFaceId);
        assert_eq!(iter.pump_all(), 2);
        drop(iter);
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn test_face_subset() {
        let mesh = two_triangles();
        let subset = [1];
        let mut out = Vec::new();
        VertexIterator::new(&mesh, &mut out, IterationMode::TrianglesToLines, Action::PushPoint)
            .restricted_to(&subset)
            .pump_all();
        assert_eq!(out.len(), 18);
        assert_eq!(&out[0..6], &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_face_subset_keeps_given_order() {
        let mesh = two_triangles();
        let subset = [1, 0];
        let mut out = Vec::new();
        VertexIterator::new(&mesh, &mut out, IterationMode::Triangles, Action::PushFaceId)
            .restricted_to(&subset)
            .pump_all();
        let ids: Vec<u32> = out
            .chunks(3)
            .map(|c| decode_face_id([c[0], c[1], c[2]], ColorScale::Normalized))
            .collect();
        assert_eq!(ids, vec![1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_empty_subset_writes_nothing() {
        let mesh = two_triangles();
        let mut out = Vec::new();
        let steps = VertexIterator::new(&mesh, &mut out, IterationMode::Triangles, Action::PushPoint)
            .restricted_to(&[])
            .pump_all();
        assert_eq!(steps, 0);
        assert!(out.is_empty());
    }

    #[test]
    #[should_panic(expected = "not supported")]
    fn test_per_triangle_subset_panics() {
        let mesh = two_triangles();
        let mut out = Vec::new();
        let _ = VertexIterator::new(&mesh, &mut out, IterationMode::PerTriangle, Action::PushNormal)
            .restricted_to(&[0]);
    }

    #[test]
    #[should_panic(expected = "needs faces")]
    fn test_face_action_in_points_mode_panics() {
        let mesh = two_triangles();
        let mut out = Vec::new();
        let _ = VertexIterator::new(&mesh, &mut out, IterationMode::Points, Action::PushNormal);
    }

    #[test]
    #[should_panic(expected = "pump_by_point")]
    fn test_wrong_pump_panics() {
        let mesh = two_triangles();
        let mut out = Vec::new();
        VertexIterator::new(&mesh, &mut out, IterationMode::Triangles, Action::PushPoint).pump_by_point();
    }

    #[test]
    fn test_draft_records_range() {
        let first = two_triangles();
        let second = single_triangle();
        let mut draft = VertexBufferDraft::new();

        VertexIterator::for_draft(&first, &mut draft, IterationMode::Triangles, Action::PushPoint)
            .expect("first registration")
            .pump_all();
        VertexIterator::for_draft(&second, &mut draft, IterationMode::TrianglesToLines, Action::PushPoint)
            .expect("second registration")
            .pump_all();

        let a = draft.get_mesh_info(first.key()).expect("first info");
        let b = draft.get_mesh_info(second.key()).expect("second info");
        assert_eq!((a.offset, a.size), (0, 18));
        assert_eq!((b.offset, b.size), (18, 18));
        assert_eq!(draft.data().len(), 36);
        assert_eq!(draft.mesh_data(second.key()).map(|d| d[3..6].to_vec()), Some(vec![1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_draft_rejects_second_swallow() {
        let mesh = single_triangle();
        let mut draft = VertexBufferDraft::new();
        VertexIterator::for_draft(&mesh, &mut draft, IterationMode::Triangles, Action::PushPoint)
            .expect("registration")
            .pump_all();
        assert!(VertexIterator::for_draft(&mesh, &mut draft, IterationMode::Triangles, Action::PushPoint).is_none());
        assert_eq!(draft.data().len(), 9);
    }

    #[test]
    fn test_partial_pumping_leaves_consistent_draft() {
        let mesh = two_triangles();
        let mut draft = VertexBufferDraft::new();
        {
            let mut iter = VertexIterator::for_draft(&mesh, &mut draft, IterationMode::Triangles, Action::PushPoint)
                .expect("registration");
            assert!(iter.pump());
            assert!(iter.pump());
        }
        assert_eq!(draft.data().len(), 6);
        assert_eq!(draft.get_mesh_info(mesh.key()).map(|i| i.offset), Some(0));
    }

    #[test]
    fn test_inspecting_visits_each_point_once() {
        let mesh = two_triangles();
        let mut sum = 0.0;
        let mut visits = 0;
        let mut visit = |p: &Point| {
            sum += p.x + p.y + p.z;
            visits += 1;
        };
        VertexIterator::inspecting(&mesh, IterationMode::Points, &mut visit).pump_all();
        assert_eq!(visits, 4);
        assert!((sum - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_inspecting_face_corners() {
        let mesh = two_triangles();
        let mut seen = Vec::new();
        let mut visit = |p: &Point| seen.push(*p);
        VertexIterator::inspecting(&mesh, IterationMode::Triangles, &mut visit).pump_all();
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[4], Point::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_mutating_moves_points() {
        let mut mesh = two_triangles();
        let mut shift = |p: &mut Point| p.z += 2.0;
        VertexIterator::mutating(&mut mesh, IterationMode::Points, &mut shift).pump_all();
        assert_eq!(mesh.points[0], Point::new(0.0, 0.0, 2.0));
        assert_eq!(mesh.points[3], Point::new(1.0, 1.0, 3.0));
    }

    #[test]
    fn test_exhausted_iterator_stays_exhausted() {
        let mesh = single_triangle();
        let mut out = Vec::new();
        let mut iter = VertexIterator::new(&mesh, &mut out, IterationMode::Triangles, Action::PushPoint);
        assert_eq!(iter.pump_all(), 3);
        assert_eq!(iter.pump_all(), 0);
        drop(iter);
        assert_eq!(out.len(), 9);
    }
}
