//! stlpick core library - mesh model and vertex streaming for an STL viewer
//!
//! This library holds everything that does not touch a screen: the indexed
//! mesh and its adjacency tables, the iterators that flatten it into float
//! buffers, the per-frame buffer drafts, face-id picking, STL loading,
//! rebasing and the scene a front-end drives.

pub mod chew;
pub mod config;
pub mod draft;
pub mod error;
pub mod faceid;
pub mod geometry;
pub mod indexer;
pub mod iterator;
pub mod metrics;
pub mod projection;
pub mod scene;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use chew::{ChewFlags, PointGraph};
pub use config::ViewerConfig;
pub use draft::{RegisteredInfo, VertexBufferDraft, FLOATS_PER_VERTEX};
pub use error::{MeshError, Result};
pub use faceid::{decode_face_id, decode_face_id_bytes, encode_face_id, ColorScale};
pub use geometry::{FaceIndex, Mesh, MeshKey, Point, PointIndex, Triangle};
pub use indexer::{Indexer, IndexerIndirect, IndexerRanged};
pub use iterator::{Action, IterationMode, VertexIterator};
pub use metrics::MeshMetrics;
pub use projection::{Camera, ProjectionMode};
pub use scene::{BasegridMesh, MeshContext, ModelMesh, Scene, Selection};
pub use stl::{load_stl, parse_stl};
pub use transform::{rebase_rotation, RotationState};
