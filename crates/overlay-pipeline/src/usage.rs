//! Usage recorder that writes facts to the log.

use async_trait::async_trait;
use tracing::info;

use overlay_models::UsageFacts;

use crate::collaborators::UsageRecorder;
use crate::error::PipelineResult;

/// Emits one structured log event per request.
#[derive(Debug, Clone, Default)]
pub struct LogUsageRecorder;

#[async_trait]
impl UsageRecorder for LogUsageRecorder {
    async fn record(&self, facts: &UsageFacts) -> PipelineResult<()> {
        info!(
            target: "usage",
            endpoint = %facts.endpoint,
            input_bytes = facts.input_bytes,
            output_bytes = facts.output_bytes,
            processing_time_ms = facts.processing_time_ms,
            template = %facts.template_used,
            has_custom_overrides = facts.has_custom_overrides,
            "Usage recorded"
        );
        Ok(())
    }
}
