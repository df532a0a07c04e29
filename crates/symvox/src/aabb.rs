//! Axis-aligned bounding box of a decoded scene.

use glam::Vec3;

/// Single-precision axis-aligned bounding box.
///
/// Stored in every octree file header; the voxel grid spans the box's
/// largest side starting at `min`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
	/// Minimum corner (inclusive).
	pub min: Vec3,
	/// Maximum corner (inclusive).
	pub max: Vec3,
}

impl Aabb {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: Vec3, max: Vec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// True when both corners are finite and min <= max on every axis.
	pub fn is_valid(&self) -> bool {
		self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
	}

	/// Get the size of the AABB (max - min).
	#[inline]
	pub fn size(&self) -> Vec3 {
		self.max - self.min
	}

	/// Diagonal vector from min to max.
	#[inline]
	pub fn diagonal(&self) -> Vec3 {
		self.max - self.min
	}

	/// Length of the min-to-max diagonal.
	#[inline]
	pub fn diagonal_length(&self) -> f32 {
		self.diagonal().length()
	}

	/// Largest side length.
	#[inline]
	pub fn max_extent(&self) -> f32 {
		self.size().max_element()
	}

	/// Get the center of the AABB.
	#[inline]
	pub fn center(&self) -> Vec3 {
		(self.min + self.max) * 0.5
	}
}
