//! Dense voxel occupancy grid used as encoder input.

use glam::UVec3;

use crate::constants::{MAX_LEVELS, MIN_LEVELS};

/// Dense bitset of `2^levels` voxels per side.
///
/// Meant for fixtures and small scenes; memory grows with the cube of the
/// resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
	levels: u32,
	bits: Vec<u64>,
}

impl VoxelGrid {
	/// Create an empty grid.
	///
	/// # Panics
	/// Panics if `levels` is outside the supported octree depth range.
	pub fn new(levels: u32) -> Self {
		assert!(
			(MIN_LEVELS..=MAX_LEVELS).contains(&levels),
			"grid depth {} outside {}..={}",
			levels,
			MIN_LEVELS,
			MAX_LEVELS
		);
		let side = 1usize << levels;
		let voxels = side * side * side;
		Self {
			levels,
			bits: vec![0; voxels.div_ceil(64)],
		}
	}

	/// Create a grid whose voxels are set where `filled` returns true.
	pub fn from_fn(levels: u32, mut filled: impl FnMut(UVec3) -> bool) -> Self {
		let mut grid = Self::new(levels);
		let side = grid.side();
		for z in 0..side {
			for y in 0..side {
				for x in 0..side {
					let voxel = UVec3::new(x, y, z);
					if filled(voxel) {
						grid.set(voxel, true);
					}
				}
			}
		}
		grid
	}

	/// Octree depth.
	pub fn levels(&self) -> u32 {
		self.levels
	}

	/// Voxels per side.
	pub fn side(&self) -> u32 {
		1 << self.levels
	}

	#[inline]
	fn index(&self, voxel: UVec3) -> usize {
		let side = self.side() as usize;
		(voxel.z as usize * side + voxel.y as usize) * side + voxel.x as usize
	}

	/// Occupancy of one voxel; out-of-range voxels are empty.
	#[inline]
	pub fn get(&self, voxel: UVec3) -> bool {
		if voxel.max_element() >= self.side() {
			return false;
		}
		let i = self.index(voxel);
		self.bits[i / 64] & (1 << (i % 64)) != 0
	}

	/// Set one voxel. Out-of-range voxels are ignored.
	pub fn set(&mut self, voxel: UVec3, filled: bool) {
		if voxel.max_element() >= self.side() {
			return;
		}
		let i = self.index(voxel);
		if filled {
			self.bits[i / 64] |= 1 << (i % 64);
		} else {
			self.bits[i / 64] &= !(1 << (i % 64));
		}
	}

	/// Fill the inclusive box `[min, max]`, clamped to the grid.
	pub fn fill_box(&mut self, min: UVec3, max: UVec3) {
		let max = max.min(UVec3::splat(self.side() - 1));
		for z in min.z..=max.z {
			for y in min.y..=max.y {
				for x in min.x..=max.x {
					self.set(UVec3::new(x, y, z), true);
				}
			}
		}
	}

	/// Number of filled voxels.
	pub fn count(&self) -> u64 {
		self.bits.iter().map(|word| word.count_ones() as u64).sum()
	}
}
