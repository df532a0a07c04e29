//! Symmetry-aware DAG with uncompressed pointers (`.ussvdag`).
//!
//! Same node shape as `.svdag`, but every child pointer word is
//! `offset << 3 | mirror`: the referenced subtree is reflected along the
//! axes whose mirror bit is set (X = 1, Y = 2, Z = 4). Reflections compose
//! by XOR along the path from the root.

use byteorder::{ByteOrder, LittleEndian};
use glam::UVec3;
use smallvec::SmallVec;

use super::{validate_dag, DecodeError, EncodedOctree, Header, Lookup, OctreeFormat};
use crate::constants::{leaf_bit, mirror_leaf_coord, octant, LEAF_OCTANT_MASKS};

/// Words per leaf brick.
pub(crate) const LEAF_WORDS: usize = 2;

/// Bits of a pointer word reserved for the mirror transform.
pub(crate) const MIRROR_BITS: u32 = 3;

/// Decoded `.ussvdag` file.
#[derive(Debug, Clone)]
pub struct UssvdagOctree {
	header: Header,
	pool: Vec<u32>,
}

impl UssvdagOctree {
	#[inline]
	fn leaf_mask(&self, offset: usize) -> u64 {
		self.pool[offset] as u64 | (self.pool[offset + 1] as u64) << 32
	}

	fn children_of(&self, offset: usize, out: &mut SmallVec<[usize; 8]>) -> Result<(), DecodeError> {
		let mask = self.pool[offset];
		if mask & !0xff != 0 {
			return Err(DecodeError::ReservedBits {
				offset,
				header: mask,
			});
		}
		let count = mask.count_ones() as usize;
		if offset + 1 + count > self.pool.len() {
			return Err(DecodeError::NodeOverrun { offset });
		}
		out.extend(
			self.pool[offset + 1..offset + 1 + count]
				.iter()
				.map(|&word| (word >> MIRROR_BITS) as usize),
		);
		Ok(())
	}
}

impl EncodedOctree for UssvdagOctree {
	const FORMAT: OctreeFormat = OctreeFormat::Ussvdag;

	fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
		let (header, raw) = Header::read(Self::FORMAT, bytes)?;
		let mut pool = vec![0u32; raw.len() / 4];
		LittleEndian::read_u32_into(raw, &mut pool);

		let octree = Self { header, pool };
		validate_dag(octree.pool.len(), &octree.header, LEAF_WORDS, |offset, out| {
			octree.children_of(offset, out)
		})?;
		Ok(octree)
	}

	fn header(&self) -> &Header {
		&self.header
	}

	fn lookup(&self, voxel: UVec3) -> Lookup {
		debug_assert!(voxel.max_element() < self.header.resolution());

		let mut node = 0usize;
		let mut mirror = 0u32;
		for depth in 0..self.header.inner_levels() {
			let shift = self.header.levels - 1 - depth;
			// Octant as stored: the actual octant reflected by the accumulated mirror
			let child = octant(voxel.x, voxel.y, voxel.z, shift) ^ mirror as usize;
			let mask = self.pool[node];
			if mask & (1 << child) == 0 {
				return Lookup::Empty { size_log2: shift };
			}
			let rank = (mask & ((1 << child) - 1)).count_ones() as usize;
			let word = self.pool[node + 1 + rank];
			node = (word >> MIRROR_BITS) as usize;
			mirror ^= word & 0b111;
		}

		let bits = self.leaf_mask(node);
		let (x, y, z) = mirror_leaf_coord(voxel.x & 3, voxel.y & 3, voxel.z & 3, mirror);
		if bits & (1 << leaf_bit(x, y, z)) != 0 {
			Lookup::Filled
		} else if bits & LEAF_OCTANT_MASKS[octant(x, y, z, 1)] == 0 {
			Lookup::Empty { size_log2: 1 }
		} else {
			Lookup::Empty { size_log2: 0 }
		}
	}
}
