//! Positional command-line arguments.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use glam::Vec3;
use symvox::{CameraParameters, SnapshotRequest};

pub const USAGE: &str = "Usage: svsnapshot model.[svdag | ussvdag | ssvdag | esvdag] [position x y z] \
	[target x y z] [up x y z] [fovy] [z_near] [z_far] [light_pos x y z]";

/// Renders one frame of a voxel DAG model to output.bmp.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "svsnapshot", version, override_usage = USAGE)]
pub struct Args {
	/// Octree model (.svdag, .ussvdag, .ssvdag or .esvdag)
	pub model: PathBuf,

	/// Camera position
	#[arg(allow_negative_numbers = true)]
	pub pos_x: f32,
	#[arg(allow_negative_numbers = true)]
	pub pos_y: f32,
	#[arg(allow_negative_numbers = true)]
	pub pos_z: f32,

	/// Point the camera looks at
	#[arg(allow_negative_numbers = true)]
	pub target_x: f32,
	#[arg(allow_negative_numbers = true)]
	pub target_y: f32,
	#[arg(allow_negative_numbers = true)]
	pub target_z: f32,

	/// Up vector; Y-up when up_y > 0, Z-up otherwise
	#[arg(allow_negative_numbers = true)]
	pub up_x: f32,
	#[arg(allow_negative_numbers = true)]
	pub up_y: f32,
	#[arg(allow_negative_numbers = true)]
	pub up_z: f32,

	/// Vertical field of view in degrees
	#[arg(allow_negative_numbers = true)]
	pub fovy: f32,
	#[arg(allow_negative_numbers = true)]
	pub z_near: f32,
	#[arg(allow_negative_numbers = true)]
	pub z_far: f32,

	/// Point light position
	#[arg(allow_negative_numbers = true)]
	pub light_x: f32,
	#[arg(allow_negative_numbers = true)]
	pub light_y: f32,
	#[arg(allow_negative_numbers = true)]
	pub light_z: f32,

	/// Ignored trailing arguments
	#[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
	pub extra: Vec<String>,
}

impl Args {
	pub fn to_request(&self) -> SnapshotRequest {
		SnapshotRequest {
			model: self.model.clone(),
			camera: CameraParameters {
				eye: Vec3::new(self.pos_x, self.pos_y, self.pos_z),
				target: Vec3::new(self.target_x, self.target_y, self.target_z),
				up: Vec3::new(self.up_x, self.up_y, self.up_z),
				fovy: self.fovy,
				near: self.z_near,
				far: self.z_far,
				light: Vec3::new(self.light_x, self.light_y, self.light_z),
			},
		}
	}
}

/// Why parsing stopped short of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
	/// Help or version was printed.
	Info,
	/// Missing or malformed arguments; usage was printed.
	Usage,
}

impl Stop {
	pub fn exit_code(self) -> ExitCode {
		match self {
			Stop::Info => ExitCode::SUCCESS,
			Stop::Usage => ExitCode::FAILURE,
		}
	}
}

/// Parse the process arguments, printing help or usage when stopping.
pub fn parse() -> Result<Args, Stop> {
	parse_from(std::env::args_os())
}

pub fn parse_from<I, T>(args: I) -> Result<Args, Stop>
where
	I: IntoIterator<Item = T>,
	T: Into<std::ffi::OsString> + Clone,
{
	Args::try_parse_from(args).map_err(|err| match err.kind() {
		ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
			let _ = err.print();
			Stop::Info
		}
		ErrorKind::MissingRequiredArgument => {
			println!("{USAGE}");
			Stop::Usage
		}
		_ => {
			// Malformed value: clap's message on stderr, usage on stdout
			let _ = err.print();
			println!("{USAGE}");
			Stop::Usage
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	const FULL: [&str; 17] = [
		"svsnapshot", "model.svdag", "1", "2", "3", "0", "0", "0", "0", "1", "0", "45", "0.1", "100", "-5", "6.5",
		"7",
	];

	#[test]
	fn test_all_sixteen_arguments() {
		let args = Args::try_parse_from(FULL).unwrap();
		let request = args.to_request();
		assert_eq!(request.model, PathBuf::from("model.svdag"));
		assert_eq!(request.camera.eye, Vec3::new(1.0, 2.0, 3.0));
		assert_eq!(request.camera.up, Vec3::Y);
		assert_eq!(request.camera.fovy, 45.0);
		assert_eq!(request.camera.near, 0.1);
		assert_eq!(request.camera.far, 100.0);
		assert_eq!(request.camera.light, Vec3::new(-5.0, 6.5, 7.0));
		assert!(args.extra.is_empty());
	}

	#[test]
	fn test_fifteen_arguments_is_missing() {
		let err = Args::try_parse_from(&FULL[..16]).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
	}

	#[test]
	fn test_extra_arguments_are_ignored() {
		let mut argv = FULL.to_vec();
		argv.extend(["extra", "--more", "-1"]);
		let args = Args::try_parse_from(argv).unwrap();
		assert_eq!(args.extra, vec!["extra", "--more", "-1"]);
		assert_eq!(args.to_request(), Args::try_parse_from(FULL).unwrap().to_request());
	}

	#[test]
	fn test_negative_values() {
		let mut argv = FULL;
		argv[2] = "-1.5";
		argv[9] = "-0.1";
		let args = Args::try_parse_from(argv).unwrap();
		assert_eq!(args.pos_x, -1.5);
		assert_eq!(args.up_y, -0.1);
	}

	#[test]
	fn test_non_numeric_fails_fast() {
		let mut argv = FULL;
		argv[11] = "wide";
		let err = Args::try_parse_from(argv).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::ValueValidation);
	}

	#[test]
	fn test_parse_from_maps_exit_codes() {
		assert!(parse_from(FULL).is_ok());
		assert_eq!(parse_from(&FULL[..5]).unwrap_err(), Stop::Usage);
		assert_eq!(parse_from(["svsnapshot", "--help"]).unwrap_err(), Stop::Info);
	}
}
