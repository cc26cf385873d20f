//! Viewer configuration (TOML)
//!
//! Every field is optional in the file; missing ones fall back to the
//! defaults below.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Viewer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Squares along each side of the base grid (default: 10)
    #[serde(default = "default_grid_squares")]
    pub grid_squares: u32,
    /// Side length of the base grid; when unset the grid spans twice the
    /// model's larger horizontal extent
    #[serde(default)]
    pub grid_side: Option<f32>,
    /// Eye movement per degree of mouse wheel rotation (default: 0.05)
    #[serde(default = "default_wheel_degrees_to_z_units")]
    pub wheel_degrees_to_z_units: f32,
    /// Direction a rebased face is turned to (default: [0, 0, -1])
    #[serde(default = "default_rebase_axis")]
    pub rebase_axis: [f32; 3],
    /// Frame rate the front-end aims for (default: 30)
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// Orbit step per key press, in radians (default: 0.1)
    #[serde(default = "default_orbit_step")]
    pub orbit_step: f32,
}

fn default_grid_squares() -> u32 {
    10
}
fn default_wheel_degrees_to_z_units() -> f32 {
    0.05
}
fn default_rebase_axis() -> [f32; 3] {
    [0.0, 0.0, -1.0]
}
fn default_target_fps() -> u32 {
    30
}
fn default_orbit_step() -> f32 {
    0.1
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            grid_squares: default_grid_squares(),
            grid_side: None,
            wheel_degrees_to_z_units: default_wheel_degrees_to_z_units(),
            rebase_axis: default_rebase_axis(),
            target_fps: default_target_fps(),
            orbit_step: default_orbit_step(),
        }
    }
}

impl ViewerConfig {
    /// Parse a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Unit rebase axis. A zero vector falls back to the default axis.
    pub fn rebase_axis(&self) -> Vector3<f32> {
        let [x, y, z] = self.rebase_axis;
        Vector3::new(x, y, z)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| {
                tracing::warn!(axis = ?self.rebase_axis, "rebase axis is zero, using -Z");
                -Vector3::z()
            })
    }
}
