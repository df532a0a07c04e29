//! Log output to stderr, filtered by `RUST_LOG` (default `warn`).

use tracing_subscriber::{prelude::*, EnvFilter, Registry};

const DEFAULT_FILTER: &str = "warn";

pub fn init() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
	let fmt_layer = tracing_subscriber::fmt::Layer::default()
		.with_writer(std::io::stderr)
		.with_target(false)
		.with_filter(filter);

	// Only fails when a global subscriber is already set
	let _ = Registry::default().with(fmt_layer).try_init();
}
