//! BMP export of the rendered frame.
//!
//! The image is encoded into a temporary file next to the destination and
//! renamed over it, so the destination is either the previous file or the
//! complete new image, never a partial write.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;

use crate::Snapshot;

#[derive(Debug, Error)]
pub enum ExportError {
	#[error("cannot write '{}': {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("cannot encode BMP: {0}")]
	Encode(#[from] image::ImageError),
}

/// Write `snapshot` to `path` as a 24-bit BMP, replacing any existing file.
pub fn save_bmp(snapshot: &Snapshot, path: &Path) -> Result<(), ExportError> {
	let _span = tracing::info_span!("export").entered();
	let temp = temp_path(path);

	let result = write_bmp(snapshot, &temp).and_then(|()| {
		fs::rename(&temp, path).map_err(|source| ExportError::Io {
			path: path.to_path_buf(),
			source,
		})
	});
	if result.is_err() {
		// Best effort: the temporary may not exist if creation failed
		let _ = fs::remove_file(&temp);
		return result;
	}

	tracing::info!(
		path = %path.display(),
		width = snapshot.width,
		height = snapshot.height,
		"snapshot written"
	);
	Ok(())
}

fn write_bmp(snapshot: &Snapshot, temp: &Path) -> Result<(), ExportError> {
	let io_err = |source| ExportError::Io {
		path: temp.to_path_buf(),
		source,
	};
	let file = File::create(temp).map_err(io_err)?;
	let mut writer = BufWriter::new(file);
	snapshot.to_rgb_image().write_to(&mut writer, ImageFormat::Bmp)?;
	writer.flush().map_err(io_err)?;
	let file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
	file.sync_all().map_err(io_err)?;
	Ok(())
}

/// Sibling path `.<name>.tmp` in the destination's directory.
fn temp_path(path: &Path) -> PathBuf {
	let name = path
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_else(|| "snapshot".to_owned());
	path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;
