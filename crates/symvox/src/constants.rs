//! Fixed values shared by the decoders, the renderer and the snapshot driver.
//!
//! # Octree layout
//!
//! ```text
//! depth 0            root (inner node, covers 2^L voxels per side)
//! depth 1..L-3       inner nodes
//! depth L-2          4×4×4 leaf bricks (64-bit masks)
//! ```
//!
//! A file with `L` levels therefore has `L - 2` inner levels. Octant index
//! bits are X (bit 0), Y (bit 1), Z (bit 2); leaf brick bit index is
//! `x + 4y + 16z`.

/// Snapshot width in pixels.
pub const SCREEN_WIDTH: u32 = 1280;

/// Snapshot height in pixels.
pub const SCREEN_HEIGHT: u32 = 720;

/// Movement scale per unit of scene diagonal length.
pub const WALK_FACTOR_SCALE: f32 = 0.001;

/// Background colour the colour buffer is cleared to before the draw.
pub const CLEAR_COLOR: [f32; 4] = [0.3, 0.5, 0.7, 1.0];

/// Viewer sub-mode used by the snapshot driver (shaded).
pub const SNAPSHOT_VIEWER_MODE: u32 = 3;

/// File name the snapshot is written to, relative to the working directory.
pub const OUTPUT_FILE: &str = "output.bmp";

/// On-disk format version understood by the decoders.
pub const FORMAT_VERSION: u32 = 1;

/// Size of the common file header in bytes.
pub const HEADER_SIZE: usize = 48;

/// Shallowest supported octree (one inner level above the leaf bricks).
pub const MIN_LEVELS: u32 = 3;

/// Deepest supported octree (65536 voxels per side).
pub const MAX_LEVELS: u32 = 16;

/// Levels covered by one leaf brick.
pub const LEAF_LEVELS: u32 = 2;

/// Voxels per side of a leaf brick.
pub const LEAF_SIDE: u32 = 1 << LEAF_LEVELS;

/// Upper bound on DDA steps for a single ray.
pub const MAX_DDA_ITERATIONS: u32 = 4096;

/// Ambient term of the shaded viewer mode.
pub const AMBIENT: f32 = 0.25;

/// Iteration count that maps to the hot end of the heat ramp.
pub const HEAT_ITERATIONS: u32 = 128;

/// Octant index of a voxel at the given bit level.
#[inline(always)]
pub const fn octant(x: u32, y: u32, z: u32, shift: u32) -> usize {
	(((x >> shift) & 1) | (((y >> shift) & 1) << 1) | (((z >> shift) & 1) << 2)) as usize
}

/// Bit index of a voxel inside a 4×4×4 leaf brick (coordinates in 0..4).
#[inline(always)]
pub const fn leaf_bit(x: u32, y: u32, z: u32) -> u32 {
	x + (y << 2) + (z << 4)
}

/// Mask of the eight brick bits covered by the 2×2×2 quadrant `octant`.
pub const fn leaf_octant_mask(octant: usize) -> u64 {
	let ox = (octant as u32 & 1) * 2;
	let oy = ((octant as u32 >> 1) & 1) * 2;
	let oz = ((octant as u32 >> 2) & 1) * 2;
	let mut mask = 0u64;
	let mut i = 0;
	while i < 8 {
		let bit = leaf_bit(ox + (i & 1), oy + ((i >> 1) & 1), oz + ((i >> 2) & 1));
		mask |= 1 << bit;
		i += 1;
	}
	mask
}

/// Brick masks for each 2×2×2 quadrant.
pub const LEAF_OCTANT_MASKS: [u64; 8] = [
	leaf_octant_mask(0),
	leaf_octant_mask(1),
	leaf_octant_mask(2),
	leaf_octant_mask(3),
	leaf_octant_mask(4),
	leaf_octant_mask(5),
	leaf_octant_mask(6),
	leaf_octant_mask(7),
];

/// Reflect a brick-local coordinate triple by the mirror bits (X = 1, Y = 2, Z = 4).
#[inline(always)]
pub const fn mirror_leaf_coord(x: u32, y: u32, z: u32, mirror: u32) -> (u32, u32, u32) {
	let max = LEAF_SIDE - 1;
	(
		if mirror & 1 != 0 { max - x } else { x },
		if mirror & 2 != 0 { max - y } else { y },
		if mirror & 4 != 0 { max - z } else { z },
	)
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
