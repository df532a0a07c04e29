//! Pixel colour for each viewer mode.

use glam::{UVec3, Vec3};

use super::dda::{self, GridFrame, Hit};
use super::ViewerMode;
use crate::constants::{AMBIENT, HEAT_ITERATIONS};
use crate::DecodedOctree;

/// Voxel colour when random colours are off.
const BASE_COLOR: Vec3 = Vec3::new(0.82, 0.78, 0.70);

/// Everything the shading of one hit needs.
pub(crate) struct ShadeInput<'a> {
	pub octree: &'a DecodedOctree,
	pub frame: &'a GridFrame,
	pub hit: Hit,
	/// Ray parameter range of the primary ray.
	pub t_range: (f32, f32),
	pub iterations: u32,
	pub light: Vec3,
	pub random_colors: bool,
}

/// Linear colour of a hit plus whether a shadow ray was cast.
pub(crate) fn shade(mode: ViewerMode, input: &ShadeInput<'_>) -> (Vec3, bool) {
	match mode {
		ViewerMode::Depth => {
			let (t_min, t_max) = input.t_range;
			let depth = ((input.hit.t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
			(Vec3::splat(1.0 - depth), false)
		}
		ViewerMode::Normals => (input.hit.normal.as_vec3() * 0.5 + 0.5, false),
		ViewerMode::Iterations => (heat(input.iterations as f32 / HEAT_ITERATIONS as f32), false),
		ViewerMode::Shaded => {
			let base = if input.random_colors {
				voxel_color(input.hit.voxel)
			} else {
				BASE_COLOR
			};
			let normal = input.hit.normal.as_vec3();
			let face_centre = input.hit.voxel.as_vec3() + 0.5 + normal * 0.5;
			let to_light = input.frame.to_grid(input.light) - face_centre;
			let diffuse = normal.dot(to_light.normalize_or_zero()).max(0.0);

			if diffuse == 0.0 {
				return (base * AMBIENT, false);
			}
			let lit = !in_shadow(input, face_centre, to_light);
			let light = if lit { diffuse } else { 0.0 };
			(base * (AMBIENT + (1.0 - AMBIENT) * light), true)
		}
	}
}

/// True when any voxel lies between the hit face at `from` and
/// `from + to_light` (grid space).
fn in_shadow(input: &ShadeInput<'_>, from: Vec3, to_light: Vec3) -> bool {
	let hit = &input.hit;
	dda::march_from_face(
		input.octree,
		input.frame.resolution,
		hit.voxel,
		hit.normal,
		from,
		to_light,
		1.0,
	)
	.hit
	.is_some()
}

/// Blue-to-red ramp over `[0, 1]`.
pub(crate) fn heat(h: f32) -> Vec3 {
	let h = h.clamp(0.0, 1.0);
	Vec3::new(h, 1.0 - (2.0 * h - 1.0).abs(), 1.0 - h)
}

/// Stable pseudo-random colour per voxel coordinate.
pub(crate) fn voxel_color(voxel: UVec3) -> Vec3 {
	let mut h = voxel.x.wrapping_mul(0x8da6_b343) ^ voxel.y.wrapping_mul(0xd816_3841) ^ voxel.z.wrapping_mul(0xcb1a_b31f);
	h ^= h >> 15;
	h = h.wrapping_mul(0x2c1b_3c6d);
	h ^= h >> 12;
	let channel = |shift: u32| 0.25 + 0.75 * ((h >> shift) & 0xff) as f32 / 255.0;
	Vec3::new(channel(0), channel(8), channel(16))
}

/// Linear `[0, 1]` colour to RGBA8.
#[inline]
pub(crate) fn to_rgba8(color: Vec3) -> [u8; 4] {
	let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
	[c.x as u8, c.y as u8, c.z as u8, 255]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_heat_ramp_ends() {
		assert_eq!(heat(0.0), Vec3::new(0.0, 0.0, 1.0));
		assert_eq!(heat(1.0), Vec3::new(1.0, 0.0, 0.0));
		assert_eq!(heat(0.5), Vec3::new(0.5, 1.0, 0.5));
		assert_eq!(heat(7.0), heat(1.0));
	}

	#[test]
	fn test_voxel_color_is_stable_and_bright_enough() {
		let a = voxel_color(UVec3::new(1, 2, 3));
		assert_eq!(a, voxel_color(UVec3::new(1, 2, 3)));
		assert_ne!(a, voxel_color(UVec3::new(3, 2, 1)));
		assert!(a.min_element() >= 0.25 && a.max_element() <= 1.0);
	}

	#[test]
	fn test_to_rgba8_clamps() {
		assert_eq!(to_rgba8(Vec3::new(-1.0, 0.5, 2.0)), [0, 128, 255, 255]);
	}
}
