//! Stderr logging for the CLI. `RUST_LOG` overrides the verbosity flag.

use tracing_subscriber::EnvFilter;

/// Filter directives for `-v` counts.
///
/// Stdout carries the JSON envelope, so the quiet default only lets errors
/// through and silences the runtime's per-frame tracing.
pub fn default_filter(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "error,azguard_runtime=off",
		1 => "info,azguard_runtime=warn",
		2 => "debug,azguard_runtime=info",
		_ => "trace",
	}
}

pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(verbosity > 1)
		.compact()
		.init();
}
