//! Per-frame rendering statistics.
//!
//! Collected only when statistics are toggled on for the renderer. Rows
//! accumulate their own [`RenderStats`] and are merged after the parallel
//! draw, so no shared counters are needed.

/// Counters for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
	/// Primary rays cast.
	pub rays: u64,
	/// Primary rays that hit a voxel.
	pub hits: u64,
	/// Shadow rays cast towards the light.
	pub shadow_rays: u64,
	/// Total DDA iterations over all primary rays.
	pub iterations: u64,
	/// Largest DDA iteration count of a single ray.
	pub max_iterations: u32,
	/// Wall time of the draw in microseconds.
	pub draw_time_us: u64,
}

impl RenderStats {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record one primary ray.
	#[inline]
	pub fn record_ray(&mut self, iterations: u32, hit: bool) {
		self.rays += 1;
		self.hits += hit as u64;
		self.iterations += iterations as u64;
		self.max_iterations = self.max_iterations.max(iterations);
	}

	/// Fold another set of counters into this one (timing is not summed).
	pub fn merge(&mut self, other: &RenderStats) {
		self.rays += other.rays;
		self.hits += other.hits;
		self.shadow_rays += other.shadow_rays;
		self.iterations += other.iterations;
		self.max_iterations = self.max_iterations.max(other.max_iterations);
	}

	/// Mean DDA iterations per primary ray.
	pub fn average_iterations(&self) -> f64 {
		if self.rays == 0 {
			0.0
		} else {
			self.iterations as f64 / self.rays as f64
		}
	}

	/// Fraction of primary rays that hit geometry.
	pub fn hit_ratio(&self) -> f64 {
		if self.rays == 0 {
			0.0
		} else {
			self.hits as f64 / self.rays as f64
		}
	}

	/// Reset all counters to zero.
	pub fn reset(&mut self) {
		*self = Self::default();
	}
}
