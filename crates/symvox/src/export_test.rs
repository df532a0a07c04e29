use super::*;

fn checker(width: u32, height: u32) -> Snapshot {
	let pixels = (0..height)
		.flat_map(|y| (0..width).map(move |x| if (x + y) % 2 == 0 { [255, 0, 0, 255] } else { [0, 0, 255, 128] }))
		.collect();
	Snapshot {
		width,
		height,
		pixels,
		stats: None,
	}
}

#[test]
fn test_writes_readable_bmp() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("output.bmp");
	save_bmp(&checker(7, 3), &path).unwrap();

	let image = image::open(&path).unwrap().to_rgb8();
	assert_eq!(image.dimensions(), (7, 3));
	assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0]);
	// Alpha is dropped, colour kept
	assert_eq!(image.get_pixel(1, 0).0, [0, 0, 255]);
	assert_eq!(image.get_pixel(6, 2).0, [255, 0, 0]);

	let names: Vec<_> = fs::read_dir(dir.path())
		.unwrap()
		.map(|entry| entry.unwrap().file_name())
		.collect();
	assert_eq!(names, vec![std::ffi::OsString::from("output.bmp")]);
}

#[test]
fn test_overwrites_existing_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("output.bmp");
	fs::write(&path, b"stale").unwrap();

	save_bmp(&checker(4, 4), &path).unwrap();
	assert_eq!(image::open(&path).unwrap().width(), 4);
}

#[test]
fn test_missing_directory_fails_cleanly() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("missing").join("output.bmp");
	let err = save_bmp(&checker(2, 2), &path).unwrap_err();
	assert!(matches!(err, ExportError::Io { .. }));
	assert!(!path.exists());
}

#[test]
fn test_failed_rename_removes_temporary() {
	let dir = tempfile::tempdir().unwrap();
	// A non-empty directory where the file should go makes the rename fail
	let path = dir.path().join("output.bmp");
	fs::create_dir(&path).unwrap();
	fs::write(path.join("keep"), b"x").unwrap();

	let err = save_bmp(&checker(2, 2), &path).unwrap_err();
	assert!(matches!(err, ExportError::Io { .. }));
	assert!(!temp_path(&path).exists());
	assert!(path.join("keep").exists());
}

#[test]
fn test_temp_path_is_hidden_sibling() {
	assert_eq!(temp_path(Path::new("a/b/output.bmp")), Path::new("a/b/.output.bmp.tmp"));
	assert_eq!(temp_path(Path::new("output.bmp")), Path::new(".output.bmp.tmp"));
}
