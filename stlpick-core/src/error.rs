//! Error types for stlpick.

use std::path::PathBuf;
use thiserror::Error;

use crate::geometry::{FaceIndex, PointIndex};

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while loading, validating or transforming a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no points or no faces.
    #[error("mesh is empty")]
    EmptyMesh,

    /// A face references a point that does not exist.
    #[error("face {face} references invalid point index {point} (mesh has {count} points)")]
    InvalidPointIndex {
        face: FaceIndex,
        point: PointIndex,
        count: usize,
    },

    /// A face index past the end of the face array.
    #[error("face {face} is out of range (mesh has {count} faces)")]
    FaceOutOfRange { face: FaceIndex, count: usize },

    /// The face has zero area, so it has no usable normal.
    #[error("face {face} is degenerate and has no normal")]
    DegenerateFace { face: FaceIndex },

    /// An operation needed a selected face but none was selected.
    #[error("no face is selected")]
    NoSelection,

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The STL data could not be parsed.
    #[error("failed to parse STL: {0}")]
    Parse(String),

    /// Error loading a mesh from a file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError { path: PathBuf, message: String },

    /// The configuration file is not valid TOML for this viewer.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}
