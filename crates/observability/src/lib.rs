//! Tracing and logging (shared setup).

pub mod subscriber;

pub use subscriber::{LogFormat, TracingConfig};

/// Initialize process-wide tracing from `STOCKHOLD_LOG*` variables.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    subscriber::init(&TracingConfig::from_env());
}

/// Initialize tracing with an explicit configuration.
pub fn init_with(config: &TracingConfig) {
    subscriber::init(config);
}

/// Route tracing output through the test harness's captured writer.
pub fn init_for_tests() {
    subscriber::init_for_tests();
}
