use glam::Vec3;

use super::*;
use crate::format::live;
use crate::loader::LoadFailure;
use crate::test_utils::{sphere_grid, write_fixture};

fn request(model: PathBuf, up: Vec3) -> SnapshotRequest {
	SnapshotRequest {
		model,
		camera: CameraParameters {
			eye: Vec3::new(0.5, 0.5, 3.0),
			target: Vec3::splat(0.5),
			up,
			fovy: 45.0,
			near: 0.1,
			far: 10.0,
			light: Vec3::new(2.0, 3.0, 4.0),
		},
	}
}

fn small_config(dir: &std::path::Path) -> SnapshotConfig {
	let mut config = SnapshotConfig::default()
		.with_output_path(dir.join("output.bmp"))
		.with_resolution(48, 27);
	config.render.worker_threads = 2;
	config
}

#[test]
fn test_run_writes_snapshot() {
	let dir = tempfile::tempdir().unwrap();
	let model = write_fixture(dir.path(), "model.svdag", OctreeFormat::Svdag, &sphere_grid(4));
	let config = small_config(dir.path());

	live::reset();
	let report = run(&request(model, Vec3::new(0.0, 0.5, 0.0)), &config).unwrap();
	assert_eq!(report.format, OctreeFormat::Svdag);
	assert_eq!(report.up_axis, UpAxis::Y);
	assert_eq!(report.walk_factor, Vec3::ONE.length() * 0.001);
	assert_eq!(report.stats.unwrap().rays, 48 * 27);

	let image = image::open(&config.output_path).unwrap();
	assert_eq!((image.width(), image.height()), (48, 27));
	// The octree is gone once the run returns
	assert_eq!(live::counts().0, 0);
}

#[test]
fn test_z_up_request() {
	let dir = tempfile::tempdir().unwrap();
	let model = write_fixture(dir.path(), "model.esvdag", OctreeFormat::Ssvdag, &sphere_grid(4));
	let report = run(&request(model, Vec3::new(0.0, -0.1, 1.0)), &small_config(dir.path())).unwrap();
	assert_eq!(report.up_axis, UpAxis::Z);
	assert_eq!(report.format, OctreeFormat::Ssvdag);
}

#[test]
fn test_unsupported_model_exits_one_without_output() {
	let dir = tempfile::tempdir().unwrap();
	let model = dir.path().join("model.obj");
	std::fs::write(&model, b"o cube").unwrap();
	let config = small_config(dir.path());

	let err = run(&request(model, Vec3::Y), &config).unwrap_err();
	assert!(matches!(
		&err,
		SnapshotError::Load(e) if matches!(e.reason(), LoadFailure::UnknownExtension)
	));
	assert_eq!(err.exit_code(), 1);
	assert!(!config.output_path.exists());
}

#[test]
fn test_context_failure_exits_minus_one() {
	let dir = tempfile::tempdir().unwrap();
	let model = write_fixture(dir.path(), "model.ussvdag", OctreeFormat::Ussvdag, &sphere_grid(3));
	let config = small_config(dir.path()).with_resolution(0, 0);

	let err = run(&request(model, Vec3::Y), &config).unwrap_err();
	assert!(err.is_context_failure());
	assert_eq!(err.exit_code(), -1);
	assert!(!config.output_path.exists());
}

#[test]
fn test_export_failure_exits_one() {
	let dir = tempfile::tempdir().unwrap();
	let model = write_fixture(dir.path(), "model.svdag", OctreeFormat::Svdag, &sphere_grid(3));
	let config = small_config(dir.path()).with_output_path(dir.path().join("no/such/dir/output.bmp"));

	let err = run(&request(model, Vec3::Y), &config).unwrap_err();
	assert!(matches!(err, SnapshotError::Export(_)));
	assert_eq!(err.exit_code(), 1);
}
