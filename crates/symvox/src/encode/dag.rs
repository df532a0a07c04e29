//! Bottom-up DAG construction with subtree deduplication.
//!
//! Identical subtrees are merged by hashing their node value (children are
//! already interned ids, so equality is structural). With `symmetric` set,
//! each subtree is first reduced to the smallest of its eight axis
//! reflections and referenced through the mirror bits that restore it.

use std::collections::HashMap;
use std::collections::VecDeque;

use glam::UVec3;

use super::VoxelGrid;
use crate::constants::{leaf_bit, mirror_leaf_coord, LEAF_LEVELS, LEAF_SIDE};

/// Reference to an interned node plus the reflection applied to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ChildRef {
	pub id: u32,
	pub mirror: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Node {
	Inner([Option<ChildRef>; 8]),
	Leaf(u64),
}

impl Node {
	/// The same subtree reflected along the axes in `mirror`.
	pub fn mirrored(&self, mirror: u8) -> Node {
		match self {
			Node::Inner(children) => Node::Inner(std::array::from_fn(|octant| {
				children[octant ^ mirror as usize].map(|child| ChildRef {
					id: child.id,
					mirror: child.mirror ^ mirror,
				})
			})),
			Node::Leaf(bits) => {
				let mut out = 0u64;
				for z in 0..LEAF_SIDE {
					for y in 0..LEAF_SIDE {
						for x in 0..LEAF_SIDE {
							if bits & (1 << leaf_bit(x, y, z)) != 0 {
								let (mx, my, mz) = mirror_leaf_coord(x, y, z, mirror as u32);
								out |= 1 << leaf_bit(mx, my, mz);
							}
						}
					}
				}
				Node::Leaf(out)
			}
		}
	}
}

/// Interned DAG; `nodes[root]` is the root inner node.
#[derive(Debug)]
pub(crate) struct Dag {
	pub nodes: Vec<Node>,
	pub root: u32,
}

impl Dag {
	/// Node ids reachable from the root in breadth-first discovery order.
	///
	/// Every child appears after its first parent, so offsets assigned in
	/// this order always point forward.
	pub fn breadth_first(&self) -> Vec<u32> {
		let mut seen = vec![false; self.nodes.len()];
		let mut order = Vec::with_capacity(self.nodes.len());
		let mut queue = VecDeque::from([self.root]);
		seen[self.root as usize] = true;
		while let Some(id) = queue.pop_front() {
			order.push(id);
			if let Node::Inner(children) = &self.nodes[id as usize] {
				for child in children.iter().flatten() {
					if !seen[child.id as usize] {
						seen[child.id as usize] = true;
						queue.push_back(child.id);
					}
				}
			}
		}
		order
	}
}

struct Builder<'a> {
	grid: &'a VoxelGrid,
	symmetric: bool,
	inner_levels: u32,
	nodes: Vec<Node>,
	index: HashMap<Node, u32>,
}

/// Build the DAG of `grid`. The root is always an inner node, even when the
/// grid is empty.
pub(crate) fn build(grid: &VoxelGrid, symmetric: bool) -> Dag {
	let mut builder = Builder {
		grid,
		symmetric,
		inner_levels: grid.levels() - LEAF_LEVELS,
		nodes: Vec::new(),
		index: HashMap::new(),
	};
	let children = builder.children(UVec3::ZERO, 0);
	// The root is never shared and is stored unreflected.
	let root = builder.nodes.len() as u32;
	builder.nodes.push(Node::Inner(children));
	Dag {
		nodes: builder.nodes,
		root,
	}
}

impl Builder<'_> {
	fn children(&mut self, origin: UVec3, depth: u32) -> [Option<ChildRef>; 8] {
		let half = 1u32 << (self.grid.levels() - 1 - depth);
		std::array::from_fn(|octant| {
			let offset = UVec3::new(
				(octant as u32 & 1) * half,
				((octant as u32 >> 1) & 1) * half,
				((octant as u32 >> 2) & 1) * half,
			);
			self.subtree(origin + offset, depth + 1)
		})
	}

	fn subtree(&mut self, origin: UVec3, depth: u32) -> Option<ChildRef> {
		if depth == self.inner_levels {
			let bits = self.leaf_bits(origin);
			return (bits != 0).then(|| self.intern(Node::Leaf(bits)));
		}
		let children = self.children(origin, depth);
		if children.iter().all(Option::is_none) {
			return None;
		}
		Some(self.intern(Node::Inner(children)))
	}

	fn leaf_bits(&self, origin: UVec3) -> u64 {
		let mut bits = 0u64;
		for z in 0..LEAF_SIDE {
			for y in 0..LEAF_SIDE {
				for x in 0..LEAF_SIDE {
					if self.grid.get(origin + UVec3::new(x, y, z)) {
						bits |= 1 << leaf_bit(x, y, z);
					}
				}
			}
		}
		bits
	}

	fn intern(&mut self, node: Node) -> ChildRef {
		if !self.symmetric {
			return ChildRef {
				id: self.id_of(node),
				mirror: 0,
			};
		}
		// canonical == node.mirrored(m)  <=>  node == canonical.mirrored(m)
		let (mirror, canonical) = (0..8u8)
			.map(|m| (m, node.mirrored(m)))
			.min_by(|a, b| a.1.cmp(&b.1))
			.unwrap_or((0, node));
		ChildRef {
			id: self.id_of(canonical),
			mirror,
		}
	}

	fn id_of(&mut self, node: Node) -> u32 {
		if let Some(&id) = self.index.get(&node) {
			return id;
		}
		let id = self.nodes.len() as u32;
		self.nodes.push(node.clone());
		self.index.insert(node, id);
		id
	}
}
