//! Process-wide logging setup shared by the stockbridge binaries.

/// Initialize tracing for the process.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filter, output format).
pub mod tracing;
