//! Headless drawing surface and the worker pool that executes the renderer.
//!
//! Stands in for a window + graphics backend: [`HeadlessContext::create`]
//! validates the surface and [`HeadlessContext::make_current`] brings up the
//! backend, a dedicated rayon pool. Rendering runs inside
//! [`HeadlessContext::install`], so the global rayon pool is never touched.

use thiserror::Error;

/// Largest accepted surface side in pixels.
pub const MAX_SURFACE_SIDE: u32 = 16384;

#[derive(Debug, Error)]
pub enum ContextError {
	#[error("cannot create {width}x{height} surface: {reason}")]
	SurfaceInit {
		width: u32,
		height: u32,
		reason: &'static str,
	},

	#[error("cannot load render backend: {0}")]
	BackendLoad(#[from] rayon::ThreadPoolBuildError),

	#[error("render context is not current")]
	NotCurrent,
}

/// Offscreen render target plus its worker pool.
pub struct HeadlessContext {
	width: u32,
	height: u32,
	threads: usize,
	pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for HeadlessContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HeadlessContext")
			.field("width", &self.width)
			.field("height", &self.height)
			.field("threads", &self.threads)
			.field("current", &self.is_current())
			.finish()
	}
}

impl HeadlessContext {
	/// Validate and create a `width` x `height` surface.
	pub fn create(width: u32, height: u32) -> Result<Self, ContextError> {
		if width == 0 || height == 0 {
			return Err(ContextError::SurfaceInit {
				width,
				height,
				reason: "zero-sized surface",
			});
		}
		if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
			return Err(ContextError::SurfaceInit {
				width,
				height,
				reason: "surface larger than 16384 pixels per side",
			});
		}
		tracing::debug!(width, height, "surface created");
		Ok(Self {
			width,
			height,
			threads: 0,
			pool: None,
		})
	}

	/// Worker count for the backend; 0 lets rayon pick one per core.
	pub fn with_threads(mut self, threads: usize) -> Self {
		self.threads = threads;
		self
	}

	/// Load the backend: build the worker pool the renderer runs on.
	pub fn make_current(&mut self) -> Result<(), ContextError> {
		if self.pool.is_some() {
			return Ok(());
		}
		let pool = rayon::ThreadPoolBuilder::new()
			.num_threads(self.threads)
			.thread_name(|i| format!("svsnapshot-raster-{i}"))
			.build()?;
		tracing::debug!(threads = pool.current_num_threads(), "render backend loaded");
		self.pool = Some(pool);
		Ok(())
	}

	pub fn is_current(&self) -> bool {
		self.pool.is_some()
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	/// Worker threads of the loaded backend.
	pub fn worker_threads(&self) -> Option<usize> {
		self.pool.as_ref().map(rayon::ThreadPool::current_num_threads)
	}

	/// Run `op` on the backend pool.
	pub fn install<R, F>(&self, op: F) -> Result<R, ContextError>
	where
		F: FnOnce() -> R + Send,
		R: Send,
	{
		let pool = self.pool.as_ref().ok_or(ContextError::NotCurrent)?;
		Ok(pool.install(op))
	}

	/// Allocate a colour buffer of `len` pixels, failing instead of aborting
	/// when memory is short.
	pub(crate) fn allocate_framebuffer(&self, len: usize) -> Result<Vec<[u8; 4]>, ContextError> {
		let mut pixels = Vec::new();
		pixels
			.try_reserve_exact(len)
			.map_err(|_| ContextError::SurfaceInit {
				width: self.width,
				height: self.height,
				reason: "out of memory for the framebuffer",
			})?;
		pixels.resize(len, [0; 4]);
		Ok(pixels)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_zero_surface_is_rejected() {
		assert!(matches!(
			HeadlessContext::create(0, 720),
			Err(ContextError::SurfaceInit { width: 0, .. })
		));
		assert!(matches!(
			HeadlessContext::create(1280, 20000),
			Err(ContextError::SurfaceInit { height: 20000, .. })
		));
	}

	#[test]
	fn test_install_requires_current_context() {
		let mut ctx = HeadlessContext::create(4, 4).unwrap().with_threads(2);
		assert!(matches!(ctx.install(|| 1), Err(ContextError::NotCurrent)));

		ctx.make_current().unwrap();
		assert!(ctx.is_current());
		assert_eq!(ctx.worker_threads(), Some(2));
		let name = ctx.install(|| std::thread::current().name().map(str::to_owned)).unwrap();
		assert!(name.unwrap().starts_with("svsnapshot-raster-"));
	}

	#[test]
	fn test_framebuffer_allocation() {
		let ctx = HeadlessContext::create(3, 2).unwrap();
		assert_eq!(ctx.allocate_framebuffer(6).unwrap(), vec![[0u8; 4]; 6]);
	}
}
