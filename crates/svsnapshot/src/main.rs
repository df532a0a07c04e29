//! svsnapshot: render one frame of a SymVox octree-DAG model to `output.bmp`.
//!
//! ```text
//! svsnapshot <model> <pos xyz> <target xyz> <up xyz> <fovy> <near> <far> <light xyz>
//! ```
//!
//! Exit status: 0 on success, 1 for usage errors, unsupported models and
//! export failures, -1 (255) when the render context cannot be brought up.

mod cli;
mod logging;

use std::process::ExitCode;

use symvox::{pipeline, OctreeFormat, SnapshotConfig, SnapshotError};

fn main() -> ExitCode {
	logging::init();

	let args = match cli::parse() {
		Ok(args) => args,
		Err(stop) => return stop.exit_code(),
	};
	if !args.extra.is_empty() {
		tracing::debug!(count = args.extra.len(), "ignoring extra arguments");
	}

	let request = args.to_request();
	let config = SnapshotConfig::default();

	match pipeline::run(&request, &config) {
		Ok(report) => {
			tracing::info!(
				format = %report.format,
				up = ?report.up_axis,
				walk_factor = report.walk_factor,
				output = %report.output_path.display(),
				"snapshot complete"
			);
			ExitCode::SUCCESS
		}
		Err(err) => {
			report_failure(&err);
			exit_code(err.exit_code())
		}
	}
}

fn report_failure(err: &SnapshotError) {
	match err {
		SnapshotError::Load(load) => {
			println!("* ERROR: Unsupported octree '{}'", load.path().display());
			println!(
				"         This viewer supports {} files, built with the SymVox tool 'svbuilder'.",
				OctreeFormat::supported_extensions()
			);
			tracing::warn!(reason = %load.reason(), "model rejected");
		}
		err if err.is_context_failure() => eprintln!("ERROR: Failed to initialize the render context: {err}"),
		err => eprintln!("ERROR: {err}"),
	}
}

/// Process status byte for a signed exit code (-1 becomes 255).
fn exit_code(code: i32) -> ExitCode {
	ExitCode::from(code as u8)
}
