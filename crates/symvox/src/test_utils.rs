//! Shared fixtures for unit tests: small voxel scenes and on-disk octrees.

use std::path::{Path, PathBuf};

use glam::{IVec3, UVec3, Vec3};

use crate::encode::{self, VoxelGrid};
use crate::format::Header;
use crate::{Aabb, DecodedOctree, Lookup, OctreeFormat};

/// Unit cube scene box.
pub fn unit_bbox() -> Aabb {
	Aabb::new(Vec3::ZERO, Vec3::ONE)
}

/// Solid sphere centred in the grid. Highly symmetric, so the symmetric
/// encoders collapse most of it into mirrored references.
pub fn sphere_grid(levels: u32) -> VoxelGrid {
	let side = 1i32 << levels;
	let radius = side as f32 * 0.4;
	VoxelGrid::from_fn(levels, |v| {
		let p = v.as_vec3() + 0.5 - Vec3::splat(side as f32 * 0.5);
		p.length() <= radius
	})
}

/// Lopsided scene with no global symmetry: a floor slab, an off-centre
/// tower and a lone voxel.
pub fn lopsided_grid(levels: u32) -> VoxelGrid {
	let side = 1u32 << levels;
	let mut grid = VoxelGrid::new(levels);
	grid.fill_box(UVec3::ZERO, UVec3::new(side - 1, 1, side - 1));
	grid.fill_box(UVec3::new(1, 2, side / 2), UVec3::new(3, side - 3, side / 2 + 2));
	grid.set(UVec3::new(side - 2, side - 1, 0), true);
	grid
}

/// Encode `grid` and decode it again through the runtime registry.
pub fn roundtrip(format: OctreeFormat, grid: &VoxelGrid) -> DecodedOctree {
	let bytes = encode::encode(format, grid, unit_bbox()).expect("encode fixture");
	DecodedOctree::decode(format, &bytes).expect("decode fixture")
}

/// Deep octree holding one full 4x4x4 brick at the far corner
/// `[res - 4, res)^3`, reached through a chain of single-child nodes.
///
/// The pool is written directly, so any depth up to the format maximum is
/// cheap. `.svdag` stores octant 7 at every level; `.ussvdag` stores it once
/// at the root with a full mirror and octant 0 below it.
pub fn corner_brick(format: OctreeFormat, levels: u32) -> DecodedOctree {
	let inner = (levels - 2) as usize;
	let mut pool = Vec::with_capacity(2 * inner + 2);
	for depth in 0..inner {
		let child = 2 * (depth + 1) as u32;
		match format {
			OctreeFormat::Svdag => pool.extend([1 << 7, child]),
			OctreeFormat::Ussvdag if depth == 0 => pool.extend([1 << 7, child << 3 | 0b111]),
			OctreeFormat::Ussvdag => pool.extend([1, child << 3]),
			OctreeFormat::Ssvdag => panic!("corner_brick writes u32 pools only"),
		}
	}
	pool.extend([u32::MAX, u32::MAX]);

	let header = Header {
		bbox: unit_bbox(),
		levels,
		node_count: inner as u32 + 1,
		word_count: pool.len() as u64,
	};
	let mut bytes = Vec::new();
	header.write(format, &mut bytes).expect("write header");
	for word in pool {
		bytes.extend_from_slice(&word.to_le_bytes());
	}
	DecodedOctree::decode(format, &bytes).expect("decode corner brick")
}

/// Write `grid` encoded as `format` to `dir/name`.
pub fn write_fixture(dir: &Path, name: &str, format: OctreeFormat, grid: &VoxelGrid) -> PathBuf {
	let bytes = encode::encode(format, grid, unit_bbox()).expect("encode fixture");
	let path = dir.join(name);
	std::fs::write(&path, bytes).expect("write fixture");
	path
}

/// Check every voxel of `octree` against `grid`, including that each
/// reported empty cell is really empty and aligned.
pub fn assert_matches_grid(octree: &DecodedOctree, grid: &VoxelGrid) {
	let side = grid.side();
	assert_eq!(octree.resolution(), side);
	for z in 0..side {
		for y in 0..side {
			for x in 0..side {
				let voxel = UVec3::new(x, y, z);
				match octree.lookup(voxel) {
					Lookup::Filled => assert!(grid.get(voxel), "{:?} reported filled", voxel),
					Lookup::Empty { size_log2 } => {
						assert!(!grid.get(voxel), "{:?} reported empty", voxel);
						assert_cell_empty(grid, voxel, size_log2);
					}
				}
			}
		}
	}
}

fn assert_cell_empty(grid: &VoxelGrid, voxel: UVec3, size_log2: u32) {
	let cell = (voxel.as_ivec3() >> size_log2 as i32) << size_log2 as i32;
	let size = 1i32 << size_log2;
	for dz in 0..size {
		for dy in 0..size {
			for dx in 0..size {
				let v = (cell + IVec3::new(dx, dy, dz)).as_uvec3();
				assert!(
					!grid.get(v),
					"cell of 2^{} around {:?} contains {:?}",
					size_log2,
					voxel,
					v
				);
			}
		}
	}
}
