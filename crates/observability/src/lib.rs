//! Process-wide tracing setup shared by the service binaries.

pub mod tracing;

pub use crate::tracing::{LogFormat, init_with};

/// Install the default subscriber: JSON lines, filter from `RUST_LOG`
/// (falling back to `info`).
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    init_with(LogFormat::from_env(), "info");
}
