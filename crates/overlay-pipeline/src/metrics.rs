//! Pipeline metrics.
//!
//! Only the `metrics` facade is used here; the embedding process decides
//! whether and how to export.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const MERGES_TOTAL: &str = "overlay_merges_total";
    pub const MERGE_DURATION_SECONDS: &str = "overlay_merge_duration_seconds";
    pub const OVERLAYS_TOTAL: &str = "overlay_overlays_total";
    pub const CLIPS_PROCESSED_TOTAL: &str = "overlay_clips_processed_total";
    pub const DOWNLOAD_DURATION_SECONDS: &str = "overlay_download_duration_seconds";
    pub const DOWNLOAD_BYTES_TOTAL: &str = "overlay_download_bytes_total";
    pub const BACKGROUND_REMOVALS_TOTAL: &str = "overlay_background_removals_total";
}

/// Record the outcome of a merge request.
pub fn record_merge(outcome: &'static str, stage: &'static str, duration_secs: f64) {
    counter!(names::MERGES_TOTAL, "outcome" => outcome, "stage" => stage).increment(1);
    histogram!(names::MERGE_DURATION_SECONDS, "outcome" => outcome).record(duration_secs);
}

/// Record a single overlay request.
pub fn record_overlay(outcome: &'static str) {
    counter!(names::OVERLAYS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_clips_processed(count: usize) {
    counter!(names::CLIPS_PROCESSED_TOTAL).increment(count as u64);
}

/// Record a completed download.
pub fn record_download(bytes: u64, duration_secs: f64) {
    counter!(names::DOWNLOAD_BYTES_TOTAL).increment(bytes);
    histogram!(names::DOWNLOAD_DURATION_SECONDS).record(duration_secs);
}

pub fn record_background_removal(outcome: &'static str) {
    counter!(names::BACKGROUND_REMOVALS_TOTAL, "outcome" => outcome).increment(1);
}
