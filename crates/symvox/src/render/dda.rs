//! Hierarchical DDA through the voxel grid.
//!
//! Marching happens in grid space (one unit per voxel, grid cube
//! `[0, resolution]^3`). Each step samples the octree; an empty answer names
//! the largest empty aligned cell around the sample, and the ray jumps
//! straight to that cell's exit face.

use glam::{IVec3, UVec3, Vec3};

use crate::constants::MAX_DDA_ITERATIONS;
use crate::{DecodedOctree, Lookup};

/// Mapping between world space and grid space for one octree.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GridFrame {
	pub origin: Vec3,
	pub voxel_size: f32,
	pub resolution: u32,
}

impl GridFrame {
	pub fn new(octree: &DecodedOctree) -> Self {
		Self {
			origin: octree.scene_bbox().min,
			voxel_size: octree.voxel_size(),
			resolution: octree.resolution(),
		}
	}

	#[inline]
	pub fn to_grid(&self, world: Vec3) -> Vec3 {
		(world - self.origin) / self.voxel_size
	}
}

/// First solid voxel along a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Hit {
	pub voxel: UVec3,
	/// Outward normal of the face the ray entered through.
	pub normal: IVec3,
	/// Ray parameter of the entry point.
	pub t: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct March {
	pub hit: Option<Hit>,
	pub iterations: u32,
}

impl March {
	const MISS: March = March {
		hit: None,
		iterations: 0,
	};
}

/// March `origin + dir * t` (grid space) for `t` in `[t_min, t_max]`.
pub(crate) fn march(octree: &DecodedOctree, resolution: u32, origin: Vec3, dir: Vec3, t_min: f32, t_max: f32) -> March {
	let Some((t_enter, t_exit, enter_axis)) = clip(resolution, origin, dir, t_min, t_max) else {
		return March::MISS;
	};

	let step = step_of(dir);
	let max_cell = resolution - 1;
	let p = origin + dir * t_enter;
	let mut voxel = p.floor().max(Vec3::ZERO).as_uvec3().min(UVec3::splat(max_cell));
	let normal = match enter_axis {
		Some(axis) => {
			// Entry face is exact, the float position may not be
			voxel[axis] = if step[axis] > 0.0 { 0 } else { max_cell };
			axis_normal(axis, step)
		}
		None => axis_normal(dominant_axis(dir), step),
	};

	traverse(octree, resolution, voxel, normal, origin, dir, t_enter, t_exit)
}

/// March from the face of voxel `cell` shared with its neighbour along
/// `normal`, towards `origin + dir * t_max`. `origin` lies on that face.
///
/// Starts in the neighbour cell without any positional offset, so the
/// voxel the ray leaves is never sampled.
pub(crate) fn march_from_face(
	octree: &DecodedOctree,
	resolution: u32,
	cell: UVec3,
	normal: IVec3,
	origin: Vec3,
	dir: Vec3,
	t_max: f32,
) -> March {
	let start = cell.as_ivec3() + normal;
	if start.min_element() < 0 || start.max_element() >= resolution as i32 {
		return March::MISS;
	}
	let Some((_, t_exit, _)) = clip(resolution, origin, dir, 0.0, t_max) else {
		return March::MISS;
	};
	traverse(octree, resolution, start.as_uvec3(), normal, origin, dir, 0.0, t_exit)
}

/// Clip a ray against the grid cube `[0, resolution]^3`, returning the
/// parameter range and the slab axis it entered through, if any.
fn clip(resolution: u32, origin: Vec3, dir: Vec3, t_min: f32, t_max: f32) -> Option<(f32, f32, Option<usize>)> {
	let size = resolution as f32;
	let mut t_enter = t_min;
	let mut t_exit = t_max;
	let mut enter_axis = None;
	for axis in 0..3 {
		let (o, d) = (origin[axis], dir[axis]);
		if d == 0.0 {
			if o < 0.0 || o > size {
				return None;
			}
			continue;
		}
		let (mut near, mut far) = ((0.0 - o) / d, (size - o) / d);
		if near > far {
			std::mem::swap(&mut near, &mut far);
		}
		if near > t_enter {
			t_enter = near;
			enter_axis = Some(axis);
		}
		t_exit = t_exit.min(far);
	}
	(t_enter < t_exit).then_some((t_enter, t_exit, enter_axis))
}

/// Cell walk in integer coordinates.
///
/// Every empty step moves `voxel` across the exit face of the empty cell on
/// the exit axis, so progress never depends on float resolution. The other
/// axes are re-derived from the exit point, kept inside the cell just left
/// and never moved against the ray.
#[allow(clippy::too_many_arguments)]
fn traverse(
	octree: &DecodedOctree,
	resolution: u32,
	mut voxel: UVec3,
	mut normal: IVec3,
	origin: Vec3,
	dir: Vec3,
	mut t: f32,
	t_exit: f32,
) -> March {
	let step = step_of(dir);

	let mut iterations = 0;
	while iterations < MAX_DDA_ITERATIONS {
		iterations += 1;

		let size_log2 = match octree.lookup(voxel) {
			Lookup::Filled => {
				return March {
					hit: Some(Hit { voxel, normal, t }),
					iterations,
				};
			}
			Lookup::Empty { size_log2 } => size_log2,
		};

		let cell_size = 1u32 << size_log2;
		let cell_min = (voxel >> size_log2) << size_log2;
		let cell_last = cell_min + (cell_size - 1);

		let mut t_next = f32::INFINITY;
		let mut exit_axis = None;
		for axis in 0..3 {
			let d = dir[axis];
			if d == 0.0 {
				continue;
			}
			let bound = if d > 0.0 { cell_min[axis] + cell_size } else { cell_min[axis] };
			let t_axis = (bound as f32 - origin[axis]) / d;
			if t_axis < t_next {
				t_next = t_axis;
				exit_axis = Some(axis);
			}
		}
		let Some(axis) = exit_axis else {
			break;
		};
		if t_next >= t_exit {
			break;
		}

		t = t.max(t_next);
		let p = origin + dir * t;
		let mut next = voxel;
		for other in 0..3 {
			if other == axis || step[other] == 0.0 {
				continue;
			}
			let cell = (p[other].floor().max(0.0) as u32).clamp(cell_min[other], cell_last[other]);
			next[other] = if step[other] > 0.0 {
				cell.max(voxel[other])
			} else {
				cell.min(voxel[other])
			};
		}
		if step[axis] > 0.0 {
			next[axis] = cell_min[axis] + cell_size;
			if next[axis] >= resolution {
				break;
			}
		} else {
			if cell_min[axis] == 0 {
				break;
			}
			next[axis] = cell_min[axis] - 1;
		}

		voxel = next;
		normal = axis_normal(axis, step);
	}

	March { hit: None, iterations }
}

/// Per-axis step direction: -1, 0 or 1.
#[inline]
fn step_of(dir: Vec3) -> Vec3 {
	dir.signum() * Vec3::select(dir.cmpeq(Vec3::ZERO), Vec3::ZERO, Vec3::ONE)
}

/// Axis with the largest absolute component.
#[inline]
fn dominant_axis(v: Vec3) -> usize {
	let a = v.abs();
	if a.x >= a.y && a.x >= a.z {
		0
	} else if a.y >= a.z {
		1
	} else {
		2
	}
}

/// Face normal when crossing into a cell along `axis`.
#[inline]
fn axis_normal(axis: usize, step: Vec3) -> IVec3 {
	let mut normal = IVec3::ZERO;
	normal[axis] = -(step[axis] as i32);
	normal
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::encode::VoxelGrid;
	use crate::test_utils::{corner_brick, roundtrip};
	use crate::OctreeFormat;

	fn single_voxel_scene() -> DecodedOctree {
		let mut grid = VoxelGrid::new(4);
		grid.set(UVec3::new(9, 3, 12), true);
		roundtrip(OctreeFormat::Ussvdag, &grid)
	}

	#[test]
	fn test_axis_ray_hits_voxel_face() {
		let octree = single_voxel_scene();
		let march = march(&octree, 16, Vec3::new(-5.0, 3.5, 12.5), Vec3::X, 0.0, 100.0);
		let hit = march.hit.unwrap();
		assert_eq!(hit.voxel, UVec3::new(9, 3, 12));
		assert_eq!(hit.normal, IVec3::NEG_X);
		assert!((hit.t - 14.0).abs() < 1e-3, "t = {}", hit.t);
	}

	#[test]
	fn test_empty_space_is_skipped() {
		let octree = single_voxel_scene();
		let march = march(&octree, 16, Vec3::new(-5.0, 3.5, 12.5), Vec3::X, 0.0, 100.0);
		// Far fewer steps than the 10 voxels crossed
		assert!(march.iterations < 10, "{} iterations", march.iterations);
	}

	#[test]
	fn test_ray_from_below_hits_bottom_face() {
		let octree = single_voxel_scene();
		let dir = Vec3::new(0.0, 1.0, 0.0);
		let hit = march(&octree, 16, Vec3::new(9.5, -2.0, 12.5), dir, 0.0, 100.0).hit.unwrap();
		assert_eq!(hit.normal, IVec3::NEG_Y);
		assert!((hit.t - 5.0).abs() < 1e-3);
	}

	#[test]
	fn test_misses() {
		let octree = single_voxel_scene();
		// Parallel to the grid, outside it
		assert_eq!(march(&octree, 16, Vec3::new(-1.0, 20.0, 0.0), Vec3::X, 0.0, 100.0), March::MISS);
		// Through the grid but past the voxel
		assert!(march(&octree, 16, Vec3::new(-5.0, 8.5, 8.5), Vec3::X, 0.0, 100.0).hit.is_none());
		// Clipped by t_max before reaching it
		assert!(march(&octree, 16, Vec3::new(-5.0, 3.5, 12.5), Vec3::X, 0.0, 10.0).hit.is_none());
	}

	#[test]
	fn test_ray_starting_inside_grid() {
		let octree = single_voxel_scene();
		let dir = Vec3::new(-1.0, 0.0, 0.0);
		let hit = march(&octree, 16, Vec3::new(15.5, 3.5, 12.5), dir, 0.0, 100.0).hit.unwrap();
		assert_eq!(hit.voxel, UVec3::new(9, 3, 12));
		assert_eq!(hit.normal, IVec3::X);
		assert!((hit.t - 5.5).abs() < 1e-3);
	}

	#[test]
	fn test_deep_octree_rays_reach_corner_brick() {
		for levels in [12, 14, 16] {
			for format in [OctreeFormat::Svdag, OctreeFormat::Ussvdag] {
				let octree = corner_brick(format, levels);
				let res = octree.resolution();
				let brick = res - 4;
				let edge = res as f32 - 1.5;

				for i in 0..150u32 {
					// Axis-aligned or tilted by under one voxel across the whole grid
					let (ty, tz) = ((i % 10) as f32 - 5.0, (i / 10 % 5) as f32 - 2.0);
					let dir = Vec3::new(1.0, ty * 3e-6, tz * 3e-6);
					let origin = Vec3::new(-5.3 - (i / 50) as f32 * 0.37, edge, edge);

					let march = march(&octree, res, origin, dir, 0.0, 1e9);
					let hit = march.hit.unwrap_or_else(|| {
						panic!("levels {levels} {format} ray {i} missed after {} iterations", march.iterations)
					});
					assert_eq!(hit.voxel.x, brick, "levels {levels} {format} ray {i}");
					assert!(hit.voxel.y >= brick && hit.voxel.z >= brick, "{:?}", hit.voxel);
					assert_eq!(hit.normal, IVec3::NEG_X);
					assert!(march.iterations <= 2 * levels, "{} iterations", march.iterations);
					assert!((hit.t - (brick as f32 - origin.x)).abs() <= 1e-3 * res as f32);
				}
			}
		}
	}

	#[test]
	fn test_deep_octree_diagonal_ray() {
		let octree = corner_brick(OctreeFormat::Ussvdag, 16);
		let res = octree.resolution();
		let dir = Vec3::new(1.0, 1.0, 1.0).normalize();
		let hit = march(&octree, res, Vec3::splat(-3.0), dir, 0.0, 1e9).hit.unwrap();
		assert!(hit.voxel.cmpge(UVec3::splat(res - 4)).all(), "{:?}", hit.voxel);
	}

	#[test]
	fn test_face_march_skips_the_starting_voxel() {
		let octree = single_voxel_scene();
		let face = Vec3::new(9.0, 3.5, 12.5);
		// Leaving the solid voxel through its -X face: nothing else is in the way
		let away = march_from_face(&octree, 16, UVec3::new(9, 3, 12), IVec3::NEG_X, face, Vec3::new(-6.0, 0.0, 0.0), 1.0);
		assert!(away.hit.is_none());
		// Leaving the empty neighbour towards the voxel hits it at once
		let back = march_from_face(&octree, 16, UVec3::new(8, 3, 12), IVec3::X, face, Vec3::new(4.0, 0.0, 0.0), 1.0);
		assert_eq!(back.hit.unwrap().voxel, UVec3::new(9, 3, 12));
		// Grid boundary
		let outside = march_from_face(&octree, 16, UVec3::new(0, 3, 12), IVec3::NEG_X, Vec3::new(0.0, 3.5, 12.5), Vec3::NEG_X, 1.0);
		assert_eq!(outside, March::MISS);
	}

	#[test]
	fn test_deep_face_march_reaches_brick() {
		let octree = corner_brick(OctreeFormat::Svdag, 16);
		let res = octree.resolution();
		let edge = res as f32 - 1.5;
		let cell = UVec3::new(1000, res - 2, res - 2);
		let face = Vec3::new(1001.0, edge, edge);
		let march = march_from_face(&octree, res, cell, IVec3::X, face, Vec3::new(res as f32, 0.0, 0.0), 1.0);
		assert_eq!(march.hit.unwrap().voxel, UVec3::new(res - 4, res - 2, res - 2));
	}

	#[test]
	fn test_grid_frame_to_grid() {
		let frame = GridFrame {
			origin: Vec3::new(-1.0, 0.0, 2.0),
			voxel_size: 0.25,
			resolution: 16,
		};
		let world = Vec3::new(0.5, 1.0, 2.75);
		assert_eq!(frame.to_grid(world), Vec3::new(6.0, 4.0, 3.0));
	}
}
