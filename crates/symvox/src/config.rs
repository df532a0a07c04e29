//! Configuration of a snapshot run.

use std::path::PathBuf;

use crate::constants::OUTPUT_FILE;
use crate::RenderSettings;

/// Everything about a run that does not come from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotConfig {
	/// Renderer flags, resolution and clear colour.
	pub render: RenderSettings,
	/// Destination of the exported frame.
	pub output_path: PathBuf,
}

impl Default for SnapshotConfig {
	fn default() -> Self {
		Self {
			render: RenderSettings::default(),
			output_path: PathBuf::from(OUTPUT_FILE),
		}
	}
}

impl SnapshotConfig {
	/// Override the output path.
	pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.output_path = path.into();
		self
	}

	/// Override the frame size.
	pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
		self.render.width = width;
		self.render.height = height;
		self
	}
}
