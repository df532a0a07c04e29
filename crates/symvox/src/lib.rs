//! symvox - sparse voxel DAG decoding and single-frame snapshots
//!
//! This crate decodes the three SymVox octree-DAG encodings (`.svdag`,
//! `.ussvdag`, `.ssvdag`/`.esvdag`) behind one runtime-selected interface and
//! renders exactly one frame of the decoded scene with a hierarchical DDA ray
//! marcher. The frame is exported as a BMP.
//!
//! # Pipeline
//!
//! ```text
//! OctreeSlot::load ──► DecodedOctree ──► camera::initialize ──► Camera
//!                            │                                    │
//!                            └──────► render::configure_and_render ◄┘
//!                                               │
//!                                          Snapshot ──► export::save_bmp
//! ```
//!
//! Every stage is sequential and single-shot; [`pipeline::run`] threads the
//! owned state through all of them.
//!
//! # Example
//!
//! ```ignore
//! use symvox::{pipeline, CameraParameters, SnapshotConfig, SnapshotRequest};
//!
//! let request = SnapshotRequest {
//!     model: "model.svdag".into(),
//!     camera: CameraParameters { /* ... */ },
//! };
//! pipeline::run(&request, &SnapshotConfig::default())?;
//! ```

pub mod aabb;
pub mod constants;
pub use aabb::Aabb;

// Binary encodings and the decoder registry
pub mod format;
pub use format::{DecodeError, DecodedOctree, EncodedOctree, Lookup, OctreeFormat};

// Encoders (builders) for fixtures and tooling
pub mod encode;
pub use encode::{EncodeError, VoxelGrid};

// Arena-of-one ownership of the decoded octree
pub mod loader;
pub use loader::{LoadError, LoadFailure, OctreeSlot};

pub mod camera;
pub use camera::{Camera, CameraParameters, Ray, UpAxis};

// Headless drawing surface and worker pool
pub mod context;
pub use context::{ContextError, HeadlessContext};

pub mod stats;
pub use stats::RenderStats;

pub mod render;
pub use render::{RenderError, RenderMode, RenderSettings, Renderer, Snapshot, ViewerMode};

pub mod export;
pub use export::ExportError;

pub mod config;
pub use config::SnapshotConfig;

pub mod pipeline;
pub use pipeline::{RunReport, SnapshotError, SnapshotRequest};

#[cfg(test)]
pub(crate) mod test_utils;
