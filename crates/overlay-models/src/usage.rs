//! Usage facts returned to the boundary layer for metering.

use serde::{Deserialize, Serialize};

/// Facts about one processed request. The core only reports these; persisting
/// them is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageFacts {
    pub endpoint: String,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub processing_time_ms: u64,
    pub template_used: String,
    pub has_custom_overrides: bool,
}
