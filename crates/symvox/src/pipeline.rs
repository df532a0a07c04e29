//! The snapshot run: load, camera, render, export.
//!
//! ```text
//! Start ─► Loaded ─► CameraReady ─► Drawn ─► Exported
//!   └────────┴───────────┴────────────┴──► failure (octree released)
//! ```
//!
//! Each stage owns its output and hands it to the next; nothing is global.

use std::path::PathBuf;

use thiserror::Error;

use crate::camera::{self, CameraParameters, UpAxis};
use crate::context::ContextError;
use crate::export::{self, ExportError};
use crate::loader::{LoadError, OctreeSlot};
use crate::render::{self, RenderError};
use crate::{OctreeFormat, RenderStats, SnapshotConfig};

/// Inputs of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRequest {
	pub model: PathBuf,
	pub camera: CameraParameters,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
	pub format: OctreeFormat,
	pub up_axis: UpAxis,
	pub walk_factor: f32,
	pub output_path: PathBuf,
	pub stats: Option<RenderStats>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
	#[error(transparent)]
	Load(#[from] LoadError),

	#[error("render failed: {0}")]
	Render(#[from] RenderError),

	#[error("export failed: {0}")]
	Export(#[from] ExportError),
}

impl SnapshotError {
	/// Process exit status for this failure.
	pub fn exit_code(&self) -> i32 {
		match self {
			SnapshotError::Load(_) => 1,
			SnapshotError::Render(_) => -1,
			SnapshotError::Export(_) => 1,
		}
	}

	/// True for failures bringing up the drawing surface or backend.
	pub fn is_context_failure(&self) -> bool {
		matches!(self, SnapshotError::Render(RenderError::Context(_)))
	}
}

impl From<ContextError> for SnapshotError {
	fn from(err: ContextError) -> Self {
		SnapshotError::Render(RenderError::Context(err))
	}
}

/// Run every stage once.
pub fn run(request: &SnapshotRequest, config: &SnapshotConfig) -> Result<RunReport, SnapshotError> {
	let mut slot = OctreeSlot::new();
	let octree = slot.load(&request.model)?;

	let camera = camera::initialize(&request.camera, &octree.scene_bbox());
	let (up_axis, walk_factor) = (camera.up_axis, camera.walk_factor());

	let snapshot = render::configure_and_render(octree, camera, request.camera.light, &config.render)?;
	let format = octree.format();
	slot.release();

	export::save_bmp(&snapshot, &config.output_path)?;

	Ok(RunReport {
		format,
		up_axis,
		walk_factor,
		output_path: config.output_path.clone(),
		stats: snapshot.stats,
	})
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
