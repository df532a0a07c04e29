//! Symmetry-aware DAG with variable-length pointers (`.ssvdag`, `.esvdag`).
//!
//! Node pool of u16 words. An inner node starts with a header word carrying
//! two bits per octant: `(header >> 2*i) & 3` is 0 for an absent child,
//! otherwise the length in words (1..=3) of that child's pointer. The pointers
//! follow in ascending octant order, low word first, each holding
//! `offset << 3 | mirror`. A leaf is four words of brick mask.

use byteorder::{ByteOrder, LittleEndian};
use glam::UVec3;
use smallvec::SmallVec;

use super::{validate_dag, DecodeError, EncodedOctree, Header, Lookup, OctreeFormat};
use crate::constants::{leaf_bit, mirror_leaf_coord, octant, LEAF_OCTANT_MASKS};

/// Words per leaf brick.
pub(crate) const LEAF_WORDS: usize = 4;

/// Pointer length in words for each octant of a header word.
#[inline(always)]
pub(crate) fn pointer_len(header: u16, octant: usize) -> usize {
	((header >> (2 * octant)) & 0b11) as usize
}

/// Decoded `.ssvdag` / `.esvdag` file.
#[derive(Debug, Clone)]
pub struct SsvdagOctree {
	header: Header,
	pool: Vec<u16>,
}

impl SsvdagOctree {
	#[inline]
	fn leaf_mask(&self, offset: usize) -> u64 {
		self.pool[offset..offset + LEAF_WORDS]
			.iter()
			.rev()
			.fold(0u64, |acc, &word| acc << 16 | word as u64)
	}

	/// Read a `len`-word pointer starting at `at`.
	#[inline]
	fn pointer(&self, at: usize, len: usize) -> u64 {
		self.pool[at..at + len]
			.iter()
			.rev()
			.fold(0u64, |acc, &word| acc << 16 | word as u64)
	}

	fn children_of(&self, offset: usize, out: &mut SmallVec<[usize; 8]>) -> Result<(), DecodeError> {
		let header = self.pool[offset];
		let size: usize = 1 + (0..8).map(|i| pointer_len(header, i)).sum::<usize>();
		if offset + size > self.pool.len() {
			return Err(DecodeError::NodeOverrun { offset });
		}
		let mut at = offset + 1;
		for i in 0..8 {
			let len = pointer_len(header, i);
			if len != 0 {
				out.push((self.pointer(at, len) >> 3) as usize);
				at += len;
			}
		}
		Ok(())
	}
}

impl EncodedOctree for SsvdagOctree {
	const FORMAT: OctreeFormat = OctreeFormat::Ssvdag;

	fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
		let (header, raw) = Header::read(Self::FORMAT, bytes)?;
		let mut pool = vec![0u16; raw.len() / 2];
		LittleEndian::read_u16_into(raw, &mut pool);

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
			let child = octant(voxel.x, voxel.y, voxel.z, shift) ^ mirror as usize;
			let header = self.pool[node];
			let len = pointer_len(header, child);
			if len == 0 {
				return Lookup::Empty { size_log2: shift };
			}
			let at = node + 1 + (0..child).map(|i| pointer_len(header, i)).sum::<usize>();
			let value = self.pointer(at, len);
			node = (value >> 3) as usize;
			mirror ^= (value & 0b111) as u32;
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
