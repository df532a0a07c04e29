//! Arena-of-one ownership of the decoded octree.
//!
//! [`OctreeSlot`] holds at most one [`DecodedOctree`]. Loading always releases
//! the held octree first, so two decoded scenes are never alive at once, and a
//! failed load leaves the slot empty.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{DecodeError, DecodedOctree, OctreeFormat};

/// Why a model file could not be turned into a decoded octree.
#[derive(Debug, Error)]
pub enum LoadFailure {
	#[error("unrecognised extension (supported: {})", OctreeFormat::supported_extensions())]
	UnknownExtension,

	#[error("cannot read file: {0}")]
	Read(#[source] std::io::Error),

	#[error("invalid {format} data: {source}")]
	Decode {
		format: OctreeFormat,
		#[source]
		source: DecodeError,
	},
}

#[derive(Debug, Error)]
pub enum LoadError {
	#[error("unsupported octree '{}': {reason}", path.display())]
	UnsupportedOrInvalid { path: PathBuf, reason: LoadFailure },
}

impl LoadError {
	/// Path of the model that failed to load.
	pub fn path(&self) -> &Path {
		match self {
			LoadError::UnsupportedOrInvalid { path, .. } => path,
		}
	}

	pub fn reason(&self) -> &LoadFailure {
		match self {
			LoadError::UnsupportedOrInvalid { reason, .. } => reason,
		}
	}
}

/// Holder of the single live decoded octree.
#[derive(Debug, Default)]
pub struct OctreeSlot {
	current: Option<DecodedOctree>,
	file_name: Option<String>,
}

impl OctreeSlot {
	pub fn new() -> Self {
		Self::default()
	}

	/// Decode the file at `path` into the slot.
	///
	/// The decoder is chosen from the extension alone; an unknown extension
	/// fails before the file is opened.
	pub fn load(&mut self, path: &Path) -> Result<&DecodedOctree, LoadError> {
		let _span = tracing::info_span!("load_octree").entered();
		self.release();

		let fail = |reason| LoadError::UnsupportedOrInvalid {
			path: path.to_path_buf(),
			reason,
		};

		let file_name = path
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_default();
		tracing::debug!(file = %file_name, "selecting decoder");

		let format = OctreeFormat::from_path(path).ok_or_else(|| fail(LoadFailure::UnknownExtension))?;
		let bytes = std::fs::read(path).map_err(|e| fail(LoadFailure::Read(e)))?;
		let octree =
			DecodedOctree::decode(format, &bytes).map_err(|source| fail(LoadFailure::Decode { format, source }))?;

		tracing::info!(
			file = %file_name,
			%format,
			levels = octree.levels(),
			nodes = octree.node_count(),
			bytes = bytes.len(),
			"octree loaded"
		);
		self.file_name = Some(file_name);
		Ok(self.current.insert(octree))
	}

	/// Drop the held octree, if any.
	pub fn release(&mut self) {
		if let Some(octree) = self.current.take() {
			tracing::debug!(format = %octree.format(), "releasing octree");
		}
		self.file_name = None;
	}

	pub fn get(&self) -> Option<&DecodedOctree> {
		self.current.as_ref()
	}

	/// Move the held octree out, leaving the slot empty.
	pub fn take(&mut self) -> Option<DecodedOctree> {
		self.file_name = None;
		self.current.take()
	}

	/// Base name of the loaded file.
	pub fn file_name(&self) -> Option<&str> {
		self.file_name.as_deref()
	}
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;
