//! Camera initialisation from explicit parameters and the scene box.
//!
//! The camera is computed once per run and never mutated afterwards.

use glam::Vec3;

use crate::constants::WALK_FACTOR_SCALE;
use crate::Aabb;

/// World axis treated as "up" by the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpAxis {
	Y,
	Z,
}

impl UpAxis {
	/// Y-up iff the up vector has a strictly positive Y component.
	pub fn from_up_vector(up: Vec3) -> Self {
		if up.y > 0.0 {
			UpAxis::Y
		} else {
			UpAxis::Z
		}
	}

	pub fn vector(self) -> Vec3 {
		match self {
			UpAxis::Y => Vec3::Y,
			UpAxis::Z => Vec3::Z,
		}
	}
}

/// Camera and light placement as given on the command line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParameters {
	pub eye: Vec3,
	pub target: Vec3,
	pub up: Vec3,
	/// Vertical field of view in degrees.
	pub fovy: f32,
	pub near: f32,
	pub far: f32,
	pub light: Vec3,
}

/// Orthonormal view basis.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Basis {
	forward: Vec3,
	right: Vec3,
	up: Vec3,
}

/// Resolved camera state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
	pub eye: Vec3,
	pub target: Vec3,
	pub up_axis: UpAxis,
	/// Vertical field of view in degrees.
	pub fovy: f32,
	pub near: f32,
	pub far: f32,
	walk_factor: f32,
	basis: Basis,
}

/// Primary ray through one pixel, in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
	pub origin: Vec3,
	/// Unit direction.
	pub direction: Vec3,
	/// Ray parameter where the view depth equals `near`.
	pub t_min: f32,
	/// Ray parameter where the view depth equals `far`.
	pub t_max: f32,
}

/// Build the camera for a scene.
///
/// Pure: no I/O and no failure mode.
pub fn initialize(params: &CameraParameters, bbox: &Aabb) -> Camera {
	let up_axis = UpAxis::from_up_vector(params.up);
	let walk_factor = bbox.diagonal_length() * WALK_FACTOR_SCALE;

	let camera = Camera {
		eye: params.eye,
		target: params.target,
		up_axis,
		fovy: params.fovy,
		near: params.near,
		far: params.far,
		walk_factor,
		basis: Basis::look_at(params.eye, params.target, up_axis),
	};
	tracing::debug!(?up_axis, walk_factor, fovy = params.fovy, forward = ?camera.forward(), "camera initialised");
	camera
}

impl Basis {
	fn look_at(eye: Vec3, target: Vec3, up_axis: UpAxis) -> Self {
		let forward = (target - eye).try_normalize().unwrap_or(Vec3::NEG_Z);
		let mut world_up = up_axis.vector();
		if forward.cross(world_up).length_squared() < 1e-12 {
			world_up = match up_axis {
				UpAxis::Y => Vec3::Z,
				UpAxis::Z => Vec3::Y,
			};
		}
		let right = forward.cross(world_up).normalize();
		let up = right.cross(forward);
		Self { forward, right, up }
	}
}

impl Camera {
	/// Movement scale derived from the scene size.
	pub fn walk_factor(&self) -> f32 {
		self.walk_factor
	}

	/// Unit view direction.
	pub fn forward(&self) -> Vec3 {
		self.basis.forward
	}

	/// Primary ray through the centre of pixel `(px, py)`; row 0 is the top.
	pub fn ray(&self, px: u32, py: u32, width: u32, height: u32) -> Ray {
		let aspect = width as f32 / height as f32;
		let tan_half = (self.fovy.to_radians() * 0.5).tan();
		let ndc_x = (px as f32 + 0.5) / width as f32 * 2.0 - 1.0;
		let ndc_y = 1.0 - (py as f32 + 0.5) / height as f32 * 2.0;

		let direction = (self.basis.forward
			+ self.basis.right * (ndc_x * tan_half * aspect)
			+ self.basis.up * (ndc_y * tan_half))
			.normalize();
		let cos = direction.dot(self.basis.forward);

		Ray {
			origin: self.eye,
			direction,
			t_min: self.near / cos,
			t_max: self.far / cos,
		}
	}
}

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;
