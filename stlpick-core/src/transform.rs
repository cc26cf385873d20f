//! Rotations: camera orbit state and mesh rebasing

use nalgebra::{Matrix4, Unit, UnitQuaternion, Vector3};

use crate::error::{MeshError, Result};
use crate::geometry::{FaceIndex, Mesh, Point};
use crate::iterator::{IterationMode, VertexIterator};

/// Pitch stays short of straight up or down so the view never flips
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Orbit of the view around the model (in radians)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    /// Turn about the vertical axis
    pub yaw: f32,
    /// Tilt towards or away from the viewer
    pub pitch: f32,
}

impl RotationState {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        let mut state = Self::default();
        state.rotate(yaw, pitch);
        state
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dyaw: f32, dpitch: f32) {
        self.yaw = (self.yaw + dyaw).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + dpitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Rotation matrix applying pitch about X after yaw about Z
    pub fn matrix(&self) -> Matrix4<f32> {
        let yaw = Matrix4::new_rotation(Vector3::new(0.0, 0.0, self.yaw));
        let pitch = Matrix4::new_rotation(Vector3::new(self.pitch, 0.0, 0.0));
        pitch * yaw
    }
}

/// Model matrix moving `center` to the origin, then orbiting by `rotation`
pub fn model_matrix(center: &Point, rotation: &RotationState) -> Matrix4<f32> {
    rotation.matrix() * Matrix4::new_translation(&-center.coords)
}

/// Shortest-arc rotation taking `normal` onto `axis`.
///
/// When the two point in opposite directions any half turn works; the one
/// about an axis perpendicular to `normal` is picked.
///
/// # Panics
/// Panics if either vector is zero.
pub fn rebase_rotation(normal: &Vector3<f32>, axis: &Vector3<f32>) -> UnitQuaternion<f32> {
    let from = Unit::try_new(*normal, f32::EPSILON).expect("normal must not be zero");
    let to = Unit::try_new(*axis, f32::EPSILON).expect("axis must not be zero");

    UnitQuaternion::rotation_between_axis(&from, &to).unwrap_or_else(|| {
        let helper = if from.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let perpendicular = Unit::new_normalize(from.cross(&helper));
        UnitQuaternion::from_axis_angle(&perpendicular, std::f32::consts::PI)
    })
}

impl Mesh {
    /// Rotate the whole mesh in place so the normal of `face` points along
    /// `axis`, and return the rotation applied.
    ///
    /// Derived adjacency stays valid since only point positions change.
    pub fn rebase(&mut self, face: FaceIndex, axis: &Vector3<f32>) -> Result<UnitQuaternion<f32>> {
        if face >= self.faces.len() {
            return Err(MeshError::FaceOutOfRange {
                face,
                count: self.faces.len(),
            });
        }
        let normal = self.face_normal(face);
        if normal == Vector3::zeros() {
            return Err(MeshError::DegenerateFace { face });
        }

        let rotation = rebase_rotation(&normal, axis);
        let mut rotate = |point: &mut Point| *point = rotation * *point;
        VertexIterator::mutating(self, IterationMode::Points, &mut rotate).pump_all();

        tracing::info!(
            face,
            angle = rotation.angle().to_degrees(),
            points = self.points.len(),
            "rebased mesh"
        );
        Ok(rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;

    fn down() -> Vector3<f32> {
        -Vector3::z()
    }

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::default();
        assert_eq!(state.yaw, 0.0);
        assert_eq!(state.pitch, 0.0);

        state.rotate(0.1, 0.2);
        assert!((state.yaw - 0.1).abs() < 1e-6);
        assert!((state.pitch - 0.2).abs() < 1e-6);

        state.rotate(0.0, 10.0);
        assert_eq!(state.pitch, PITCH_LIMIT);
    }

    #[test]
    fn test_yaw_wraps() {
        let state = RotationState::new(-0.5, 0.0);
        assert!((state.yaw - (std::f32::consts::TAU - 0.5)).abs() < 1e-5);
    }

    #[test]
    fn test_identity_rotation() {
        let matrix = RotationState::default().matrix();
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_model_matrix_centres() {
        let center = Point::new(1.0, 2.0, 3.0);
        let matrix = model_matrix(&center, &RotationState::default());
        let moved = matrix.transform_point(&center);
        assert!(moved.coords.norm() < 1e-6);
    }

    #[test]
    fn test_rebase_rotation_aligns() {
        let normal = Vector3::new(1.0, 2.0, 3.0);
        let rotation = rebase_rotation(&normal, &down());
        let turned = rotation * normal.normalize();
        assert!((turned - down()).norm() < 1e-5);
    }

    #[test]
    fn test_rebase_rotation_antiparallel() {
        let rotation = rebase_rotation(&Vector3::z(), &down());
        assert!((rotation * Vector3::z() - down()).norm() < 1e-5);
        assert!((rotation.angle() - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn test_rebase_rotation_already_aligned() {
        let rotation = rebase_rotation(&down(), &down());
        assert!(rotation.angle().abs() < 1e-6);
    }

    #[test]
    fn test_rebase_puts_face_down() {
        let mut mesh = Mesh::cube(2.0);
        // +X face
        let face = (0..mesh.faces.len())
            .find(|&f| (mesh.face_normal(f) - Vector3::x()).norm() < 1e-5)
            .expect("cube has a +X face");

        mesh.rebase(face, &down()).unwrap();
        assert!((mesh.face_normal(face) - down()).norm() < 1e-5);
        // Rotation keeps the cube centred
        let metrics = mesh.generate_metrics().unwrap();
        assert!(metrics.center_point.coords.norm() < 1e-5);
    }

    #[test]
    fn test_rebase_is_idempotent() {
        let mut mesh = Mesh::from_parts(
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.2, 0.5),
                Point::new(0.3, 1.0, -0.4),
            ],
            vec![Triangle::new(0, 1, 2)],
        );
        mesh.rebase(0, &down()).unwrap();
        let before = mesh.points.clone();

        let second = mesh.rebase(0, &down()).unwrap();
        assert!(second.angle().abs() < 1e-2);
        for (a, b) in before.iter().zip(&mesh.points) {
            assert!((a - b).norm() < 1e-4);
        }
    }

    #[test]
    fn test_rebase_errors() {
        let mut mesh = Mesh::from_parts(
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(2.0, 0.0, 0.0),
            ],
            vec![Triangle::new(0, 1, 2)],
        );
        assert!(matches!(
            mesh.rebase(0, &down()),
            Err(MeshError::DegenerateFace { face: 0 })
        ));
        assert!(matches!(
            mesh.rebase(3, &down()),
            Err(MeshError::FaceOutOfRange { face: 3, count: 1 })
        ));
    }
}
