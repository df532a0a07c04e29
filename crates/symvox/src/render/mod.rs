//! Single-frame CPU renderer for decoded octrees.
//!
//! [`Renderer`] is configured step by step, then consumed by
//! [`Renderer::draw`], which returns the [`Snapshot`]. Drawing twice is not
//! expressible. [`configure_and_render`] runs the fixed snapshot sequence:
//!
//! 1. renderer + screen resolution
//! 2. headless context, made current (worker pool)
//! 3. camera
//! 4. `init` (framebuffer)
//! 5. mode flags, state resets, statistics, light
//! 6. clear colour
//! 7. draw

mod dda;
mod shade;

use glam::Vec3;
use rayon::prelude::*;
use thiserror::Error;
use web_time::Instant;

use crate::constants::{CLEAR_COLOR, SCREEN_HEIGHT, SCREEN_WIDTH, SNAPSHOT_VIEWER_MODE};
use crate::context::{ContextError, HeadlessContext};
use crate::{Camera, DecodedOctree, RenderStats};

use dda::GridFrame;
use shade::ShadeInput;

// =============================================================================
// Modes and settings
// =============================================================================

/// Top-level renderer mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RenderMode {
	/// Scene viewer; output depends on the [`ViewerMode`].
	#[default]
	Viewer,
	/// Silhouette: white where a ray hits, clear colour elsewhere.
	Coverage,
}

/// Output of [`RenderMode::Viewer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum ViewerMode {
	/// Grey ramp over the near/far range.
	#[default]
	Depth = 0,
	/// Face normal as RGB.
	Normals = 1,
	/// Heat ramp of DDA iterations per ray.
	Iterations = 2,
	/// Diffuse lighting from the point light with hard shadows.
	Shaded = 3,
}

impl TryFrom<u32> for ViewerMode {
	type Error = RenderError;

	fn try_from(value: u32) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(ViewerMode::Depth),
			1 => Ok(ViewerMode::Normals),
			2 => Ok(ViewerMode::Iterations),
			3 => Ok(ViewerMode::Shaded),
			other => Err(RenderError::InvalidViewerMode(other)),
		}
	}
}

/// Fixed renderer configuration of a snapshot run.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
	pub width: u32,
	pub height: u32,
	pub render_mode: RenderMode,
	/// Raw viewer sub-mode, validated by [`Renderer::set_viewer_render_mode`].
	pub viewer_mode: u32,
	pub random_colors: bool,
	pub collect_stats: bool,
	pub clear_color: [f32; 4],
	/// Worker threads of the render backend; 0 means one per core.
	pub worker_threads: usize,
}

impl Default for RenderSettings {
	fn default() -> Self {
		Self {
			width: SCREEN_WIDTH,
			height: SCREEN_HEIGHT,
			render_mode: RenderMode::Viewer,
			viewer_mode: SNAPSHOT_VIEWER_MODE,
			random_colors: true,
			collect_stats: true,
			clear_color: CLEAR_COLOR,
			worker_threads: 0,
		}
	}
}

#[derive(Debug, Error)]
pub enum RenderError {
	#[error(transparent)]
	Context(#[from] ContextError),

	#[error("viewer render mode {0} does not exist (expected 0..=3)")]
	InvalidViewerMode(u32),

	#[error("renderer used before {0}")]
	NotInitialized(&'static str),
}

// =============================================================================
// Snapshot
// =============================================================================

/// The single rendered frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
	pub width: u32,
	pub height: u32,
	/// Row-major RGBA8, row 0 at the top.
	pub pixels: Vec<[u8; 4]>,
	/// Present when statistics were enabled.
	pub stats: Option<RenderStats>,
}

impl Snapshot {
	#[inline]
	pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
		self.pixels[(y * self.width + x) as usize]
	}

	/// Copy into an RGB image, dropping alpha.
	pub fn to_rgb_image(&self) -> image::RgbImage {
		image::RgbImage::from_fn(self.width, self.height, |x, y| {
			let [r, g, b, _] = self.pixel(x, y);
			image::Rgb([r, g, b])
		})
	}
}

// =============================================================================
// Renderer
// =============================================================================

/// Ray-marching renderer bound to one decoded octree.
#[derive(Debug)]
pub struct Renderer<'a> {
	octree: &'a DecodedOctree,
	width: u32,
	height: u32,
	camera: Option<Camera>,
	render_mode: RenderMode,
	viewer_mode: ViewerMode,
	random_colors: bool,
	collect_stats: bool,
	light: Vec3,
	framebuffer: Option<Vec<[u8; 4]>>,
	stats: RenderStats,
}

impl<'a> Renderer<'a> {
	pub fn new(octree: &'a DecodedOctree) -> Self {
		Self {
			octree,
			width: SCREEN_WIDTH,
			height: SCREEN_HEIGHT,
			camera: None,
			render_mode: RenderMode::default(),
			viewer_mode: ViewerMode::default(),
			random_colors: false,
			collect_stats: false,
			light: Vec3::ZERO,
			framebuffer: None,
			stats: RenderStats::default(),
		}
	}

	pub fn set_screen_resolution(&mut self, width: u32, height: u32) {
		self.width = width;
		self.height = height;
	}

	pub fn set_camera(&mut self, camera: Camera) {
		self.camera = Some(camera);
	}

	/// Allocate the per-frame resources on a current context.
	pub fn init(&mut self, ctx: &HeadlessContext) -> Result<(), RenderError> {
		if !ctx.is_current() {
			return Err(ContextError::NotCurrent.into());
		}
		if (ctx.width(), ctx.height()) != (self.width, self.height) {
			return Err(ContextError::SurfaceInit {
				width: ctx.width(),
				height: ctx.height(),
				reason: "surface does not match the screen resolution",
			}
			.into());
		}
		let len = self.width as usize * self.height as usize;
		self.framebuffer = Some(ctx.allocate_framebuffer(len)?);
		tracing::debug!(width = self.width, height = self.height, "renderer initialised");
		Ok(())
	}

	pub fn select_render_mode(&mut self, mode: RenderMode) {
		self.render_mode = mode;
	}

	pub fn set_viewer_render_mode(&mut self, mode: u32) -> Result<(), RenderError> {
		self.viewer_mode = ViewerMode::try_from(mode)?;
		Ok(())
	}

	pub fn toggle_random_colors(&mut self) {
		self.random_colors = !self.random_colors;
	}

	pub fn toggle_rendering_stats(&mut self) {
		self.collect_stats = !self.collect_stats;
	}

	/// Discard accumulated statistics.
	pub fn clear_state(&mut self) {
		self.stats.reset();
	}

	/// Return the framebuffer to transparent black.
	pub fn reset_state(&mut self) {
		if let Some(pixels) = &mut self.framebuffer {
			pixels.fill([0; 4]);
		}
	}

	pub fn set_light_pos(&mut self, light: Vec3) {
		self.light = light;
	}

	/// Fill the colour buffer; components are clamped to `[0, 1]`.
	pub fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) -> Result<(), RenderError> {
		let pixels = self.framebuffer.as_mut().ok_or(RenderError::NotInitialized("init"))?;
		let rgb = shade::to_rgba8(Vec3::new(r, g, b));
		let alpha = (a.clamp(0.0, 1.0) * 255.0).round() as u8;
		pixels.fill([rgb[0], rgb[1], rgb[2], alpha]);
		Ok(())
	}

	pub fn viewer_mode(&self) -> ViewerMode {
		self.viewer_mode
	}

	pub fn render_mode(&self) -> RenderMode {
		self.render_mode
	}

	/// Render the frame on the context's worker pool.
	///
	/// Pixels whose ray misses the scene keep the clear colour.
	pub fn draw(self, ctx: &HeadlessContext) -> Result<Snapshot, RenderError> {
		let _span = tracing::info_span!("draw").entered();
		let camera = self.camera.ok_or(RenderError::NotInitialized("set_camera"))?;
		let mut pixels = self.framebuffer.ok_or(RenderError::NotInitialized("init"))?;

		let job = FrameJob {
			octree: self.octree,
			frame: GridFrame::new(self.octree),
			camera,
			width: self.width,
			height: self.height,
			render_mode: self.render_mode,
			viewer_mode: self.viewer_mode,
			random_colors: self.random_colors,
			light: self.light,
		};

		let start = Instant::now();
		let mut frame_stats = ctx.install(|| {
			pixels
				.par_chunks_mut(job.width as usize)
				.enumerate()
				.map(|(y, row)| job.render_row(y as u32, row))
				.reduce(RenderStats::default, |mut a, b| {
					a.merge(&b);
					a
				})
		})?;
		frame_stats.draw_time_us = start.elapsed().as_micros() as u64;

		let stats = self.collect_stats.then(|| {
			let mut stats = self.stats;
			stats.merge(&frame_stats);
			stats.draw_time_us = frame_stats.draw_time_us;
			tracing::info!(
				rays = stats.rays,
				hits = stats.hits,
				hit_ratio = stats.hit_ratio(),
				shadow_rays = stats.shadow_rays,
				avg_iterations = stats.average_iterations(),
				max_iterations = stats.max_iterations,
				draw_us = stats.draw_time_us,
				"frame rendered"
			);
			stats
		});

		Ok(Snapshot {
			width: self.width,
			height: self.height,
			pixels,
			stats,
		})
	}
}

/// Immutable per-frame state shared by the row workers.
struct FrameJob<'a> {
	octree: &'a DecodedOctree,
	frame: GridFrame,
	camera: Camera,
	width: u32,
	height: u32,
	render_mode: RenderMode,
	viewer_mode: ViewerMode,
	random_colors: bool,
	light: Vec3,
}

impl FrameJob<'_> {
	fn render_row(&self, y: u32, row: &mut [[u8; 4]]) -> RenderStats {
		let mut stats = RenderStats::default();
		let vs = self.frame.voxel_size;
		for (x, pixel) in row.iter_mut().enumerate() {
			let ray = self.camera.ray(x as u32, y, self.width, self.height);
			// Grid-space direction scaled so t stays in world units
			let march = dda::march(
				self.octree,
				self.frame.resolution,
				self.frame.to_grid(ray.origin),
				ray.direction / vs,
				ray.t_min,
				ray.t_max,
			);
			stats.record_ray(march.iterations, march.hit.is_some());

			let Some(hit) = march.hit else {
				continue;
			};
			let color = match self.render_mode {
				RenderMode::Coverage => Vec3::ONE,
				RenderMode::Viewer => {
					let input = ShadeInput {
						octree: self.octree,
						frame: &self.frame,
						hit,
						t_range: (ray.t_min, ray.t_max),
						iterations: march.iterations,
						light: self.light,
						random_colors: self.random_colors,
					};
					let (color, shadow_ray) = shade::shade(self.viewer_mode, &input);
					stats.shadow_rays += shadow_ray as u64;
					color
				}
			};
			*pixel = shade::to_rgba8(color);
		}
		stats
	}
}

/// Run the full snapshot render sequence for one octree and camera.
pub fn configure_and_render(
	octree: &DecodedOctree,
	camera: Camera,
	light: Vec3,
	settings: &RenderSettings,
) -> Result<Snapshot, RenderError> {
	let _span = tracing::info_span!("render").entered();

	let mut renderer = Renderer::new(octree);
	renderer.set_screen_resolution(settings.width, settings.height);

	let mut ctx = HeadlessContext::create(settings.width, settings.height)?.with_threads(settings.worker_threads);
	ctx.make_current()?;

	renderer.set_camera(camera);
	renderer.init(&ctx)?;

	renderer.select_render_mode(settings.render_mode);
	renderer.set_viewer_render_mode(settings.viewer_mode)?;
	if settings.random_colors {
		renderer.toggle_random_colors();
	}
	renderer.clear_state();
	renderer.reset_state();
	if settings.collect_stats {
		renderer.toggle_rendering_stats();
	}
	renderer.set_light_pos(light);

	let [r, g, b, a] = settings.clear_color;
	renderer.clear_color(r, g, b, a)?;

	renderer.draw(&ctx)
}
