//! Camera and projection utilities

use nalgebra::{Matrix4, Point3, Vector3};

use crate::geometry::Point;
use crate::metrics::MeshMetrics;
use crate::transform::{model_matrix, RotationState};

/// Distance from the model centre before any zoom, for a unit-sized model
const BASE_DISTANCE: f32 = 10.0;

/// Initial tilt, looking at the model from the front and slightly above
const DEFAULT_PITCH: f32 = -std::f32::consts::FRAC_PI_3;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

impl ProjectionMode {
    pub fn toggled(self) -> Self {
        match self {
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
        }
    }
}

/// Orbiting camera looking at a model centre.
///
/// The model is moved so `target` sits at the origin and then rotated by
/// `rotation`; the eye stays on the +Z axis at `distance()`.
#[derive(Debug, Clone)]
pub struct Camera {
    pub target: Point3<f32>,
    pub rotation: RotationState,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
    base_distance: f32,
    /// Accumulated wheel rotation in degrees
    zoom_degrees: f32,
    degrees_to_z_units: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: Point3::origin(),
            rotation: RotationState::new(0.0, DEFAULT_PITCH),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            aspect: width as f32 / height.max(1) as f32,
            near: 0.1,
            far: 100.0,
            mode: ProjectionMode::Perspective,
            base_distance: BASE_DISTANCE,
            zoom_degrees: 0.0,
            degrees_to_z_units: 0.01,
        }
    }

    /// Set how far one degree of wheel rotation moves the eye
    pub fn with_zoom_rate(mut self, degrees_to_z_units: f32) -> Self {
        self.degrees_to_z_units = degrees_to_z_units;
        self
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Frame a model with the given metrics: aim at its centre, back off in
    /// proportion to its size and drop any zoom.
    pub fn reset_to(&mut self, metrics: &MeshMetrics) {
        let size = metrics.bounding_radius.max(f32::EPSILON);
        self.target = metrics.center_point;
        self.rotation = RotationState::new(0.0, DEFAULT_PITCH);
        self.base_distance = size * 1.5;
        self.zoom_degrees = 0.0;
        self.near = size * 0.01;
        self.far = size * 10.0;
    }

    /// Apply a wheel turn. Positive degrees move the eye away.
    pub fn zoom(&mut self, degrees: f32) {
        self.zoom_degrees += degrees;
        let min = self.near * 2.0 - self.base_distance;
        if self.zoom_degrees * self.degrees_to_z_units < min {
            self.zoom_degrees = min / self.degrees_to_z_units;
        }
    }

    /// Eye distance from the model centre
    pub fn distance(&self) -> f32 {
        self.base_distance + self.zoom_degrees * self.degrees_to_z_units
    }

    pub fn position(&self) -> Point3<f32> {
        Point3::new(0.0, 0.0, self.distance())
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position(), &Point3::origin(), &self.up)
    }

    /// Model matrix centring and orbiting the model
    pub fn model_matrix(&self) -> Matrix4<f32> {
        model_matrix(&self.target, &self.rotation)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = self.distance() * (self.fov / 2.0).tan() * 2.0;
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Combined model, view and projection matrix
    pub fn mvp_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix() * self.model_matrix()
    }

    /// Project a model-space point to screen space with a precomputed
    /// [`Camera::mvp_matrix`]. Returns pixel x, pixel y and NDC depth, or
    /// `None` for points outside the view volume.
    pub fn project_to_screen(
        mvp: &Matrix4<f32>,
        point: &Point,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let clip = mvp * point.to_homogeneous();

        // Behind the eye or on its plane
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;

        // Clip test
        if ndc.iter().any(|v| !(-1.0..=1.0).contains(v)) {
            return None;
        }

        // Convert to screen space
        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
