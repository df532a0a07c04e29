//! Octree-DAG encodings and the extension-keyed decoder registry.
//!
//! Three encodings are supported, each decoded by its own variant:
//!
//! | extension          | variant                       | word |
//! |--------------------|-------------------------------|------|
//! | `svdag`            | [`SvdagOctree`] (plain DAG)   | u32  |
//! | `ussvdag`          | [`UssvdagOctree`] (symmetric) | u32  |
//! | `ssvdag`, `esvdag` | [`SsvdagOctree`] (symmetric)  | u16  |
//!
//! The variant is chosen from the extension alone (ASCII case-insensitive);
//! file contents are never sniffed. See [`header`] for the shared header.

pub mod header;
mod ssvdag;
mod svdag;
mod ussvdag;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use glam::UVec3;
use smallvec::{smallvec, SmallVec};
use thiserror::Error;

pub use header::Header;
pub use ssvdag::SsvdagOctree;
pub use svdag::SvdagOctree;
pub use ussvdag::UssvdagOctree;

use crate::Aabb;

// =============================================================================
// OctreeFormat - extension registry
// =============================================================================

/// Encoding of an octree file, selected by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OctreeFormat {
	/// Plain sparse voxel DAG.
	Svdag,
	/// Symmetry-aware DAG with fixed 32-bit pointers.
	Ussvdag,
	/// Symmetry-aware DAG with variable-length 16-bit-word pointers.
	Ssvdag,
}

impl OctreeFormat {
	/// Every format, in registry order.
	pub const ALL: [OctreeFormat; 3] = [
		OctreeFormat::Svdag,
		OctreeFormat::Ussvdag,
		OctreeFormat::Ssvdag,
	];

	/// File extensions (lowercase, without the dot) mapped to this format.
	pub fn extensions(self) -> &'static [&'static str] {
		match self {
			OctreeFormat::Svdag => &["svdag"],
			OctreeFormat::Ussvdag => &["ussvdag"],
			OctreeFormat::Ssvdag => &["ssvdag", "esvdag"],
		}
	}

	/// Look up a format by extension, ignoring ASCII case.
	pub fn from_extension(ext: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|format| {
			format
				.extensions()
				.iter()
				.any(|known| known.eq_ignore_ascii_case(ext))
		})
	}

	/// Look up a format from a path's extension.
	pub fn from_path(path: &Path) -> Option<Self> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
	}

	/// Human-readable list of supported extensions, e.g. for diagnostics.
	pub fn supported_extensions() -> String {
		Self::ALL
			.iter()
			.flat_map(|format| format.extensions())
			.map(|ext| format!("'.{ext}'"))
			.collect::<Vec<_>>()
			.join(", ")
	}

	/// Four-byte magic at the start of the file.
	pub fn magic(self) -> [u8; 4] {
		match self {
			OctreeFormat::Svdag => *b"SVDG",
			OctreeFormat::Ussvdag => *b"USVD",
			OctreeFormat::Ssvdag => *b"SSVD",
		}
	}

	/// Size in bytes of one node pool word.
	pub fn word_size(self) -> usize {
		match self {
			OctreeFormat::Svdag | OctreeFormat::Ussvdag => 4,
			OctreeFormat::Ssvdag => 2,
		}
	}
}

impl fmt::Display for OctreeFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.extensions()[0])
	}
}

// =============================================================================
// Errors
// =============================================================================

/// Reasons a node pool cannot be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
	#[error("file is {len} bytes, shorter than the {expected}-byte header")]
	ShortHeader { len: usize, expected: usize },

	#[error("bad magic {found:?}, expected {expected:?}")]
	BadMagic { found: [u8; 4], expected: [u8; 4] },

	#[error("unsupported format version {0}")]
	UnsupportedVersion(u32),

	#[error("scene bounding box is not finite or has min > max")]
	InvalidBoundingBox,

	#[error("octree depth {0} outside supported range 3..=16")]
	InvalidLevels(u32),

	#[error("node pool declares {declared} bytes but only {available} remain")]
	TruncatedPool { declared: u64, available: usize },

	#[error("{0} trailing bytes after the node pool")]
	TrailingBytes(usize),

	#[error("node at word {offset} runs past the end of the pool")]
	NodeOverrun { offset: usize },

	#[error("node at word {offset} has reserved header bits set ({header:#x})")]
	ReservedBits { offset: usize, header: u32 },

	#[error("node at word {offset} points back to word {target}")]
	BackwardPointer { offset: usize, target: usize },

	#[error("node at word {offset} points to word {target}, outside the pool")]
	PointerOutOfBounds { offset: usize, target: usize },

	#[error("node at word {offset} is reachable at depths {first} and {second}")]
	InconsistentDepth {
		offset: usize,
		first: u32,
		second: u32,
	},

	#[error("header declares {declared} nodes but {reachable} are reachable")]
	NodeCountMismatch { declared: u32, reachable: usize },

	#[error("read error: {0}")]
	Io(#[from] std::io::Error),
}

// =============================================================================
// EncodedOctree - capability shared by every decoder
// =============================================================================

/// Result of descending the DAG to one voxel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
	/// The voxel is solid.
	Filled,
	/// The voxel lies in an empty aligned cell of side `2^size_log2`.
	Empty { size_log2: u32 },
}

/// A decoded octree-DAG: bounding box plus voxel sampling.
pub trait EncodedOctree: Sized {
	/// Format this decoder handles.
	const FORMAT: OctreeFormat;

	/// Decode a complete file image.
	fn decode(bytes: &[u8]) -> Result<Self, DecodeError>;

	/// Parsed file header.
	fn header(&self) -> &Header;

	/// Sample the voxel at grid coordinate `voxel` (each component < resolution).
	fn lookup(&self, voxel: UVec3) -> Lookup;

	/// Scene bounding box.
	fn scene_bbox(&self) -> Aabb {
		self.header().bbox
	}

	/// Octree depth.
	fn levels(&self) -> u32 {
		self.header().levels
	}

	/// Voxels per side.
	fn resolution(&self) -> u32 {
		self.header().resolution()
	}
}

// =============================================================================
// DecodedOctree - runtime-selected variant
// =============================================================================

/// The decoded octree of one file, tagged by the variant that produced it.
#[derive(Debug)]
pub enum DecodedOctree {
	Svdag(SvdagOctree),
	Ussvdag(UssvdagOctree),
	Ssvdag(SsvdagOctree),
}

impl DecodedOctree {
	/// Decode `bytes` with the decoder registered for `format`.
	pub fn decode(format: OctreeFormat, bytes: &[u8]) -> Result<Self, DecodeError> {
		let octree = match format {
			OctreeFormat::Svdag => DecodedOctree::Svdag(SvdagOctree::decode(bytes)?),
			OctreeFormat::Ussvdag => DecodedOctree::Ussvdag(UssvdagOctree::decode(bytes)?),
			OctreeFormat::Ssvdag => DecodedOctree::Ssvdag(SsvdagOctree::decode(bytes)?),
		};
		#[cfg(test)]
		live::acquired();
		Ok(octree)
	}

	/// Format of the decoder variant in use.
	pub fn format(&self) -> OctreeFormat {
		match self {
			DecodedOctree::Svdag(_) => OctreeFormat::Svdag,
			DecodedOctree::Ussvdag(_) => OctreeFormat::Ussvdag,
			DecodedOctree::Ssvdag(_) => OctreeFormat::Ssvdag,
		}
	}

	pub fn header(&self) -> &Header {
		match self {
			DecodedOctree::Svdag(o) => o.header(),
			DecodedOctree::Ussvdag(o) => o.header(),
			DecodedOctree::Ssvdag(o) => o.header(),
		}
	}

	#[inline]
	pub fn lookup(&self, voxel: UVec3) -> Lookup {
		match self {
			DecodedOctree::Svdag(o) => o.lookup(voxel),
			DecodedOctree::Ussvdag(o) => o.lookup(voxel),
			DecodedOctree::Ssvdag(o) => o.lookup(voxel),
		}
	}

	pub fn scene_bbox(&self) -> Aabb {
		self.header().bbox
	}

	pub fn levels(&self) -> u32 {
		self.header().levels
	}

	pub fn resolution(&self) -> u32 {
		self.header().resolution()
	}

	pub fn node_count(&self) -> u32 {
		self.header().node_count
	}

	/// Edge length of one voxel in scene units.
	pub fn voxel_size(&self) -> f32 {
		self.scene_bbox().max_extent() / self.resolution() as f32
	}
}

#[cfg(test)]
impl Drop for DecodedOctree {
	fn drop(&mut self) {
		live::released();
	}
}


// =============================================================================
// Structural validation shared by the decoders
// =============================================================================

/// Walk every node reachable from the root once and check pointer sanity.
///
/// `children_of(offset, out)` must bounds-check the inner node at `offset`
/// and push the word offsets of its children (mirror bits stripped).
pub(crate) fn validate_dag<F>(
	pool_len: usize,
	header: &Header,
	leaf_words: usize,
	mut children_of: F,
) -> Result<(), DecodeError>
where
	F: FnMut(usize, &mut SmallVec<[usize; 8]>) -> Result<(), DecodeError>,
{
	if pool_len == 0 {
		return Err(DecodeError::NodeOverrun { offset: 0 });
	}

	let inner_levels = header.inner_levels();
	let mut depth_of: HashMap<usize, u32> = HashMap::new();
	depth_of.insert(0, 0);
	let mut stack: SmallVec<[(usize, u32); 64]> = smallvec![(0, 0)];
	let mut children: SmallVec<[usize; 8]> = SmallVec::new();

	while let Some((offset, depth)) = stack.pop() {
		if depth == inner_levels {
			if offset + leaf_words > pool_len {
				return Err(DecodeError::NodeOverrun { offset });
			}
			continue;
		}

		children.clear();
		children_of(offset, &mut children)?;
		for &target in &children {
			if target <= offset {
				return Err(DecodeError::BackwardPointer { offset, target });
			}
			if target >= pool_len {
				return Err(DecodeError::PointerOutOfBounds { offset, target });
			}
			match depth_of.entry(target) {
				Entry::Occupied(seen) => {
					if *seen.get() != depth + 1 {
						return Err(DecodeError::InconsistentDepth {
							offset: target,
							first: *seen.get(),
							second: depth + 1,
						});
					}
				}
				Entry::Vacant(slot) => {
					slot.insert(depth + 1);
					stack.push((target, depth + 1));
				}
			}
		}
	}

	if depth_of.len() != header.node_count as usize {
		return Err(DecodeError::NodeCountMismatch {
			declared: header.node_count,
			reachable: depth_of.len(),
		});
	}
	Ok(())
}
