use glam::{UVec3, Vec3};

use super::dag::{build, ChildRef};
use super::*;
use crate::test_utils::{lopsided_grid, sphere_grid, unit_bbox};

#[test]
fn test_grid_set_get_and_count() {
	let mut grid = VoxelGrid::new(3);
	assert_eq!(grid.side(), 8);
	assert_eq!(grid.count(), 0);

	grid.set(UVec3::new(7, 0, 3), true);
	assert!(grid.get(UVec3::new(7, 0, 3)));
	assert_eq!(grid.count(), 1);

	// Out of range is ignored on write and empty on read
	grid.set(UVec3::new(8, 0, 0), true);
	assert!(!grid.get(UVec3::new(8, 0, 0)));
	assert_eq!(grid.count(), 1);

	grid.set(UVec3::new(7, 0, 3), false);
	assert_eq!(grid.count(), 0);
}

#[test]
fn test_fill_box_is_inclusive_and_clamped() {
	let mut grid = VoxelGrid::new(3);
	grid.fill_box(UVec3::new(6, 6, 6), UVec3::new(20, 20, 20));
	assert_eq!(grid.count(), 8);
}

#[test]
#[should_panic]
fn test_grid_rejects_unsupported_depth() {
	let _ = VoxelGrid::new(2);
}

#[test]
fn test_mirrored_is_an_involution() {
	let dag = build(&lopsided_grid(4), false);
	for node in &dag.nodes {
		for m in 0..8 {
			assert_eq!(&node.mirrored(m).mirrored(m), node);
		}
		// Composition is XOR
		assert_eq!(node.mirrored(1).mirrored(2), node.mirrored(3));
	}
}

#[test]
fn test_leaf_mirror_moves_bits() {
	let leaf = Node::Leaf(1);
	assert_eq!(leaf.mirrored(1), Node::Leaf(1 << 3));
	assert_eq!(leaf.mirrored(2), Node::Leaf(1 << 12));
	assert_eq!(leaf.mirrored(4), Node::Leaf(1 << 48));
	assert_eq!(leaf.mirrored(7), Node::Leaf(1 << 63));
}

#[test]
fn test_mirror_pair_shares_one_node() {
	// A single voxel in each bottom corner along X: the two root children
	// are X-reflections of each other.
	let mut grid = VoxelGrid::new(3);
	grid.set(UVec3::new(0, 0, 0), true);
	grid.set(UVec3::new(7, 0, 0), true);

	let plain = build(&grid, false);
	let Node::Inner(children) = &plain.nodes[plain.root as usize] else {
		panic!("root must be inner");
	};
	let (left, right) = (children[0].unwrap(), children[1].unwrap());
	assert_ne!(left.id, right.id);

	let symmetric = build(&grid, true);
	let Node::Inner(children) = &symmetric.nodes[symmetric.root as usize] else {
		panic!("root must be inner");
	};
	let (left, right) = (children[0].unwrap(), children[1].unwrap());
	assert_eq!(left.id, right.id);
	assert_eq!(left.mirror ^ right.mirror, 1);
	assert_eq!(symmetric.nodes.len(), 2);
}

#[test]
fn test_breadth_first_points_forward() {
	let dag = build(&sphere_grid(5), true);
	let order = dag.breadth_first();
	assert_eq!(order[0], dag.root);
	let position: std::collections::HashMap<u32, usize> =
		order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
	for &id in &order {
		if let Node::Inner(children) = &dag.nodes[id as usize] {
			for ChildRef { id: child, .. } in children.iter().flatten() {
				assert!(position[child] > position[&id]);
			}
		}
	}
}

#[test]
fn test_pointer_word_thresholds() {
	assert_eq!(pointer_words(0), Some(1));
	assert_eq!(pointer_words(0xffff), Some(1));
	assert_eq!(pointer_words(0x1_0000), Some(2));
	assert_eq!(pointer_words(0xffff_ffff), Some(2));
	assert_eq!(pointer_words(1 << 32), Some(3));
	assert_eq!(pointer_words(1 << 48), None);
}

#[test]
fn test_header_fields() {
	let grid = lopsided_grid(4);
	for format in OctreeFormat::ALL {
		let bytes = encode(format, &grid, unit_bbox()).unwrap();
		assert_eq!(&bytes[..4], &format.magic());
		let (header, pool) = Header::read(format, &bytes).unwrap();
		assert_eq!(header.levels, 4);
		assert_eq!(header.bbox, unit_bbox());
		assert_eq!(pool.len() as u64, header.word_count * format.word_size() as u64);
	}
}

#[test]
fn test_invalid_bbox_is_rejected() {
	let bbox = Aabb {
		min: Vec3::ONE,
		max: Vec3::ZERO,
	};
	let err = encode(OctreeFormat::Svdag, &lopsided_grid(3), bbox).unwrap_err();
	assert!(matches!(err, EncodeError::InvalidBoundingBox));
}
