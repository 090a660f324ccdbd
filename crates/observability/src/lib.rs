//! Tracing and logging setup shared by the binaries and test harnesses.

/// Initialize process-wide tracing with the `info` default filter.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogSettings::default());
}

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, LogSettings};
