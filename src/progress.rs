//! Progress-callback trait for per-item run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events as
//! the pipeline renders each barcode.
//!
//! # Example
//!
//! ```rust
//! use upc2pdf::{RunConfig, RunProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     rendered: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_item_rendered(&self, index: usize, total: usize, identifier: &str) {
//!         self.rendered.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {}", index + 1, total, identifier);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { rendered: AtomicUsize::new(0) });
//!
//! let config = RunConfig::builder()
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it works through the identifier column.
///
/// Implementations must be `Send + Sync`: the upload server runs each
/// request on the blocking thread pool and may share one config between
/// requests. All methods have default no-op implementations so callers only
/// override what they care about.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after normalisation, before any barcode is rendered.
    ///
    /// # Arguments
    /// * `total_identifiers` — identifiers that will be handed to the renderer
    fn on_run_start(&self, total_identifiers: usize) {
        let _ = total_identifiers;
    }

    /// Called after a barcode has been rendered and stored.
    ///
    /// # Arguments
    /// * `index`      — 0-based position among the identifiers
    /// * `total`      — identifiers handed to the renderer
    /// * `identifier` — the canonical digit string
    fn on_item_rendered(&self, index: usize, total: usize, identifier: &str) {
        let _ = (index, total, identifier);
    }

    /// Called for every row left out of the document.
    ///
    /// # Arguments
    /// * `row`    — 1-based spreadsheet row number
    /// * `reason` — human-readable description
    fn on_item_skipped(&self, row: usize, reason: &str) {
        let _ = (row, reason);
    }

    /// Called once after the PDF has been composed.
    ///
    /// # Arguments
    /// * `rendered` — barcodes placed in the document
    /// * `skipped`  — rows left out
    fn on_run_complete(&self, rendered: usize, skipped: usize) {
        let _ = (rendered, skipped);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        rendered: AtomicUsize,
        skipped: AtomicUsize,
        completed: AtomicUsize,
    }

    impl RunProgressCallback for TrackingCallback {
        fn on_run_start(&self, total_identifiers: usize) {
            self.started_total.store(total_identifiers, Ordering::SeqCst);
        }

        fn on_item_rendered(&self, _index: usize, _total: usize, _identifier: &str) {
            self.rendered.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_skipped(&self, _row: usize, _reason: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }

        fn on_run_complete(&self, rendered: usize, _skipped: usize) {
            self.completed.store(rendered, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(5);
        cb.on_item_rendered(0, 5, "012345678905");
        cb.on_item_skipped(14, "no digits");
        cb.on_run_complete(4, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_run_start(3);
        tracker.on_item_rendered(0, 3, "012345678905");
        tracker.on_item_rendered(1, 3, "614141000012");
        tracker.on_item_skipped(15, "14 digits");
        tracker.on_run_complete(2, 1);

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.rendered.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_run_start(10);
        cb.on_item_rendered(0, 10, "0000000000017");
    }
}
