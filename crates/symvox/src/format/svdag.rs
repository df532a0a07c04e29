//! Plain sparse voxel DAG (`.svdag`).
//!
//! Node pool of u32 words. Inner node: `[child_mask, ptr...]` with one
//! absolute word offset per set mask bit, in ascending octant order. Leaf:
//! two words holding the 64-bit brick mask (low word first).

use byteorder::{ByteOrder, LittleEndian};
use glam::UVec3;

use super::{validate_dag, DecodeError, EncodedOctree, Header, Lookup, OctreeFormat};
use crate::constants::{leaf_bit, octant, LEAF_OCTANT_MASKS};

/// Words per leaf brick.
pub(crate) const LEAF_WORDS: usize = 2;

/// Decoded `.svdag` file.
#[derive(Debug, Clone)]
pub struct SvdagOctree {
	header: Header,
	pool: Vec<u32>,
}

impl SvdagOctree {
	#[inline]
	fn leaf_mask(&self, offset: usize) -> u64 {
		self.pool[offset] as u64 | (self.pool[offset + 1] as u64) << 32
	}

	fn children_of(&self, offset: usize, out: &mut smallvec::SmallVec<[usize; 8]>) -> Result<(), DecodeError> {
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
		out.extend(self.pool[offset + 1..offset + 1 + count].iter().map(|&ptr| ptr as usize));
		Ok(())
	}
}

impl EncodedOctree for SvdagOctree {
	const FORMAT: OctreeFormat = OctreeFormat::Svdag;

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
		for depth in 0..self.header.inner_levels() {
			let shift = self.header.levels - 1 - depth;
			let child = octant(voxel.x, voxel.y, voxel.z, shift);
			let mask = self.pool[node];
			if mask & (1 << child) == 0 {
				return Lookup::Empty { size_log2: shift };
			}
			let rank = (mask & ((1 << child) - 1)).count_ones() as usize;
			node = self.pool[node + 1 + rank] as usize;
		}

		let bits = self.leaf_mask(node);
		let (x, y, z) = (voxel.x & 3, voxel.y & 3, voxel.z & 3);
		if bits & (1 << leaf_bit(x, y, z)) != 0 {
			Lookup::Filled
		} else if bits & LEAF_OCTANT_MASKS[octant(x, y, z, 1)] == 0 {
			Lookup::Empty { size_log2: 1 }
		} else {
			Lookup::Empty { size_log2: 0 }
		}
	}
}
