//! Progress hooks for ingestion and the spatial join.
//!
//! Library code reports through [`ProgressCallback`]; the `pet_map` binary
//! plugs in terminal bars, tests and library callers use [`null_progress`].

use std::sync::Arc;

/// Receives progress from a long-running stage. Shared across threads
/// behind an [`Arc`].
pub trait ProgressCallback: Send + Sync {
    /// Announces how many units the stage will process.
    fn set_total(&self, total: u64);

    /// Records `delta` more units as done.
    fn inc(&self, delta: u64);

    /// Replaces the status text.
    fn set_message(&self, msg: String);

    /// Ends the stage with a summary line.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _: u64) {}

    fn inc(&self, _: u64) {}

    fn set_message(&self, _: String) {}

    fn finish(&self, _: String) {}
}

/// A [`NullProgress`] ready to pass where a callback is required.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
