//! Encoders for the three octree-DAG formats.
//!
//! Produces byte images that the matching decoder in [`crate::format`]
//! accepts: `decode(encode(grid))` samples exactly like `grid`.
//!
//! ```ignore
//! let grid = VoxelGrid::from_fn(5, |v| v.y < 8);
//! let bytes = encode::encode(OctreeFormat::Ssvdag, &grid, bbox)?;
//! std::fs::write("floor.ssvdag", bytes)?;
//! ```

mod dag;
mod grid;

pub use grid::VoxelGrid;

use thiserror::Error;

use dag::{Dag, Node};

use crate::format::Header;
use crate::{Aabb, OctreeFormat};

/// Reasons a grid cannot be encoded.
#[derive(Debug, Error)]
pub enum EncodeError {
	#[error("scene bounding box is not finite or has min > max")]
	InvalidBoundingBox,

	#[error("pointer to word {offset} does not fit the {format} pointer encoding")]
	PointerOverflow { offset: u64, format: OctreeFormat },

	#[error("write error: {0}")]
	Io(#[from] std::io::Error),
}

/// Encode `grid` in `format` with the given scene box.
pub fn encode(format: OctreeFormat, grid: &VoxelGrid, bbox: Aabb) -> Result<Vec<u8>, EncodeError> {
	match format {
		OctreeFormat::Svdag => encode_svdag(grid, bbox),
		OctreeFormat::Ussvdag => encode_ussvdag(grid, bbox),
		OctreeFormat::Ssvdag => encode_ssvdag(grid, bbox),
	}
}

/// Encode as a plain DAG (`.svdag`).
pub fn encode_svdag(grid: &VoxelGrid, bbox: Aabb) -> Result<Vec<u8>, EncodeError> {
	let dag = dag::build(grid, false);
	let order = dag.breadth_first();
	let offsets = fixed_offsets(&dag, &order, 2);

	let mut pool: Vec<u32> = Vec::new();
	for &id in &order {
		match &dag.nodes[id as usize] {
			Node::Inner(children) => {
				pool.push(child_mask(children));
				for child in children.iter().flatten() {
					let offset = offsets[child.id as usize];
					let word = u32::try_from(offset).map_err(|_| EncodeError::PointerOverflow {
						offset,
						format: OctreeFormat::Svdag,
					})?;
					pool.push(word);
				}
			}
			Node::Leaf(bits) => {
				pool.push(*bits as u32);
				pool.push((*bits >> 32) as u32);
			}
		}
	}
	finish_u32(OctreeFormat::Svdag, grid, bbox, order.len(), &pool)
}

/// Encode as a symmetry-aware DAG with 32-bit pointers (`.ussvdag`).
pub fn encode_ussvdag(grid: &VoxelGrid, bbox: Aabb) -> Result<Vec<u8>, EncodeError> {
	let dag = dag::build(grid, true);
	let order = dag.breadth_first();
	let offsets = fixed_offsets(&dag, &order, 2);

	let mut pool: Vec<u32> = Vec::new();
	for &id in &order {
		match &dag.nodes[id as usize] {
			Node::Inner(children) => {
				pool.push(child_mask(children));
				for child in children.iter().flatten() {
					let offset = offsets[child.id as usize];
					if offset >= 1 << 29 {
						return Err(EncodeError::PointerOverflow {
							offset,
							format: OctreeFormat::Ussvdag,
						});
					}
					pool.push((offset as u32) << 3 | child.mirror as u32);
				}
			}
			Node::Leaf(bits) => {
				pool.push(*bits as u32);
				pool.push((*bits >> 32) as u32);
			}
		}
	}
	finish_u32(OctreeFormat::Ussvdag, grid, bbox, order.len(), &pool)
}

/// Encode as a symmetry-aware DAG with variable-length pointers (`.ssvdag`).
pub fn encode_ssvdag(grid: &VoxelGrid, bbox: Aabb) -> Result<Vec<u8>, EncodeError> {
	let dag = dag::build(grid, true);
	let order = dag.breadth_first();

	// Pointer lengths depend on offsets, which depend on pointer lengths:
	// start at one word each and grow until the layout is stable.
	let mut lens: Vec<[usize; 8]> = dag
		.nodes
		.iter()
		.map(|node| match node {
			Node::Inner(children) => children.map(|c| c.map_or(0, |_| 1)),
			Node::Leaf(_) => [0; 8],
		})
		.collect();
	let offsets = loop {
		let offsets = variable_offsets(&dag, &order, &lens);
		let mut grown = false;
		for &id in &order {
			if let Node::Inner(children) = &dag.nodes[id as usize] {
				for (octant, child) in children.iter().enumerate() {
					if let Some(child) = child {
						let value = offsets[child.id as usize] << 3 | child.mirror as u64;
						let needed = pointer_words(value).ok_or(EncodeError::PointerOverflow {
							offset: offsets[child.id as usize],
							format: OctreeFormat::Ssvdag,
						})?;
						if needed > lens[id as usize][octant] {
							lens[id as usize][octant] = needed;
							grown = true;
						}
					}
				}
			}
		}
		if !grown {
			break offsets;
		}
	};

	let mut pool: Vec<u16> = Vec::new();
	for &id in &order {
		match &dag.nodes[id as usize] {
			Node::Inner(children) => {
				let node_lens = lens[id as usize];
				let header = node_lens
					.iter()
					.enumerate()
					.fold(0u16, |acc, (octant, &len)| acc | (len as u16) << (2 * octant));
				pool.push(header);
				for (octant, child) in children.iter().enumerate() {
					if let Some(child) = child {
						let value = offsets[child.id as usize] << 3 | child.mirror as u64;
						for word in 0..node_lens[octant] {
							pool.push((value >> (16 * word)) as u16);
						}
					}
				}
			}
			Node::Leaf(bits) => {
				for word in 0..4 {
					pool.push((*bits >> (16 * word)) as u16);
				}
			}
		}
	}

	let mut out = begin(OctreeFormat::Ssvdag, grid, bbox, order.len(), pool.len())?;
	out.reserve(pool.len() * 2);
	for word in pool {
		out.extend_from_slice(&word.to_le_bytes());
	}
	Ok(out)
}

fn child_mask(children: &[Option<dag::ChildRef>; 8]) -> u32 {
	children
		.iter()
		.enumerate()
		.filter(|(_, child)| child.is_some())
		.fold(0, |mask, (octant, _)| mask | 1 << octant)
}

/// Word offsets for u32 layouts (inner node = 1 + children, leaf = `leaf_words`).
fn fixed_offsets(dag: &Dag, order: &[u32], leaf_words: u64) -> Vec<u64> {
	let mut offsets = vec![u64::MAX; dag.nodes.len()];
	let mut next = 0u64;
	for &id in order {
		offsets[id as usize] = next;
		next += match &dag.nodes[id as usize] {
			Node::Inner(children) => 1 + children.iter().flatten().count() as u64,
			Node::Leaf(_) => leaf_words,
		};
	}
	offsets
}

fn variable_offsets(dag: &Dag, order: &[u32], lens: &[[usize; 8]]) -> Vec<u64> {
	let mut offsets = vec![u64::MAX; dag.nodes.len()];
	let mut next = 0u64;
	for &id in order {
		offsets[id as usize] = next;
		next += match &dag.nodes[id as usize] {
			Node::Inner(_) => 1 + lens[id as usize].iter().sum::<usize>() as u64,
			Node::Leaf(_) => 4,
		};
	}
	offsets
}

/// Words needed to store a pointer value, or `None` past 48 bits.
fn pointer_words(value: u64) -> Option<usize> {
	match value {
		v if v < 1 << 16 => Some(1),
		v if v < 1 << 32 => Some(2),
		v if v < 1 << 48 => Some(3),
		_ => None,
	}
}

fn begin(
	format: OctreeFormat,
	grid: &VoxelGrid,
	bbox: Aabb,
	node_count: usize,
	word_count: usize,
) -> Result<Vec<u8>, EncodeError> {
	if !bbox.is_valid() {
		return Err(EncodeError::InvalidBoundingBox);
	}
	let header = Header {
		bbox,
		levels: grid.levels(),
		node_count: node_count as u32,
		word_count: word_count as u64,
	};
	let mut out = Vec::with_capacity(crate::constants::HEADER_SIZE);
	header.write(format, &mut out)?;
	Ok(out)
}

fn finish_u32(
	format: OctreeFormat,
	grid: &VoxelGrid,
	bbox: Aabb,
	node_count: usize,
	pool: &[u32],
) -> Result<Vec<u8>, EncodeError> {
	let mut out = begin(format, grid, bbox, node_count, pool.len())?;
	out.reserve(pool.len() * 4);
	for word in pool {
		out.extend_from_slice(&word.to_le_bytes());
	}
	Ok(out)
}

#[cfg(test)]
#[path = "encode_test.rs"]
mod encode_test;
