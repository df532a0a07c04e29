//! Common 48-byte header shared by every octree-DAG encoding.
//!
//! ```text
//! offset  type      field
//! 0       [u8; 4]   magic ("SVDG" | "USVD" | "SSVD")
//! 4       u32       version (1)
//! 8       f32 × 3   scene box min
//! 20      f32 × 3   scene box max
//! 32      u32       levels
//! 36      u32       node count (inner nodes + leaves)
//! 40      u64       node pool length in words
//! 48      ...       node pool
//! ```
//!
//! All values little-endian.

use std::io::{self, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::Vec3;

use super::{DecodeError, OctreeFormat};
use crate::constants::{FORMAT_VERSION, HEADER_SIZE, MAX_LEVELS, MIN_LEVELS};
use crate::Aabb;

/// Decoded file header.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
	/// Scene bounding box.
	pub bbox: Aabb,
	/// Octree depth; the voxel grid is `2^levels` per side.
	pub levels: u32,
	/// Number of stored nodes (inner nodes and leaves).
	pub node_count: u32,
	/// Node pool length in words of the format's word size.
	pub word_count: u64,
}

impl Header {
	/// Parse the header and return it together with the node pool bytes.
	///
	/// Checks that the pool is exactly as long as declared.
	pub fn read(format: OctreeFormat, bytes: &[u8]) -> Result<(Header, &[u8]), DecodeError> {
		if bytes.len() < HEADER_SIZE {
			return Err(DecodeError::ShortHeader {
				len: bytes.len(),
				expected: HEADER_SIZE,
			});
		}

		let (mut head, pool) = bytes.split_at(HEADER_SIZE);

		let mut magic = [0u8; 4];
		io::Read::read_exact(&mut head, &mut magic)?;
		if magic != format.magic() {
			return Err(DecodeError::BadMagic {
				found: magic,
				expected: format.magic(),
			});
		}

		let version = head.read_u32::<LittleEndian>()?;
		if version != FORMAT_VERSION {
			return Err(DecodeError::UnsupportedVersion(version));
		}

		let min = read_vec3(&mut head)?;
		let max = read_vec3(&mut head)?;
		let bbox = Aabb { min, max };
		if !bbox.is_valid() {
			return Err(DecodeError::InvalidBoundingBox);
		}

		let levels = head.read_u32::<LittleEndian>()?;
		if !(MIN_LEVELS..=MAX_LEVELS).contains(&levels) {
			return Err(DecodeError::InvalidLevels(levels));
		}

		let node_count = head.read_u32::<LittleEndian>()?;
		let word_count = head.read_u64::<LittleEndian>()?;

		let declared = word_count
			.checked_mul(format.word_size() as u64)
			.ok_or(DecodeError::TruncatedPool {
				declared: u64::MAX,
				available: pool.len(),
			})?;
		if declared > pool.len() as u64 {
			return Err(DecodeError::TruncatedPool {
				declared,
				available: pool.len(),
			});
		}
		if declared < pool.len() as u64 {
			return Err(DecodeError::TrailingBytes(pool.len() - declared as usize));
		}

		Ok((
			Header {
				bbox,
				levels,
				node_count,
				word_count,
			},
			pool,
		))
	}

	/// Serialize the header for the given format.
	pub fn write<W: Write>(&self, format: OctreeFormat, writer: &mut W) -> io::Result<()> {
		writer.write_all(&format.magic())?;
		writer.write_u32::<LittleEndian>(FORMAT_VERSION)?;
		write_vec3(writer, self.bbox.min)?;
		write_vec3(writer, self.bbox.max)?;
		writer.write_u32::<LittleEndian>(self.levels)?;
		writer.write_u32::<LittleEndian>(self.node_count)?;
		writer.write_u64::<LittleEndian>(self.word_count)?;
		Ok(())
	}

	/// Voxels per side of the grid.
	#[inline]
	pub fn resolution(&self) -> u32 {
		1 << self.levels
	}

	/// Number of inner-node levels above the leaf bricks.
	#[inline]
	pub fn inner_levels(&self) -> u32 {
		self.levels - crate::constants::LEAF_LEVELS
	}
}

fn read_vec3(reader: &mut &[u8]) -> io::Result<Vec3> {
	let x = reader.read_f32::<LittleEndian>()?;
	let y = reader.read_f32::<LittleEndian>()?;
	let z = reader.read_f32::<LittleEndian>()?;
	Ok(Vec3::new(x, y, z))
}

fn write_vec3<W: Write>(writer: &mut W, v: Vec3) -> io::Result<()> {
	writer.write_f32::<LittleEndian>(v.x)?;
	writer.write_f32::<LittleEndian>(v.y)?;
	writer.write_f32::<LittleEndian>(v.z)?;
	Ok(())
}
