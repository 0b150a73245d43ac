//! Single-asset overlay flow.

use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

use overlay_media::{apply_text_overlay, OverlayTarget, TempArtifact, STILL_CLIP_SECONDS};
use overlay_models::media::is_supported_extension;
use overlay_models::{MediaKind, OverlayRequest, UsageFacts};

use crate::error::{PipelineError, PipelineResult, Stage};
use crate::merge::ClipPipelineOrchestrator;
use crate::metrics;

/// Endpoint name reported in single overlay usage facts.
pub const OVERLAY_ENDPOINT: &str = "/overlay/url";

/// A finished single overlay. The caller owns `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOutcome {
    pub output: PathBuf,
    pub size: u64,
    pub kind: MediaKind,
    pub usage: UsageFacts,
}

/// Pick the render mode for a source/output pair.
fn overlay_target(source_kind: MediaKind, output_kind: MediaKind) -> OverlayTarget {
    match (source_kind, output_kind) {
        (_, MediaKind::Image) => OverlayTarget::Still,
        (MediaKind::Image, MediaKind::Video) => OverlayTarget::StillAsVideo {
            seconds: STILL_CLIP_SECONDS,
        },
        (MediaKind::Video, MediaKind::Video) => OverlayTarget::Video,
    }
}

impl ClipPipelineOrchestrator {
    /// Download one asset, overlay text on it, and hand back the result.
    pub async fn overlay(&self, request: &OverlayRequest) -> PipelineResult<OverlayOutcome> {
        let started = Instant::now();
        let result = self.run_overlay(request, started).await;

        match &result {
            Ok(outcome) => {
                metrics::record_overlay("success");
                info!(
                    output = %outcome.output.display(),
                    size = outcome.size,
                    kind = ?outcome.kind,
                    elapsed_ms = outcome.usage.processing_time_ms,
                    "Overlay complete"
                );
            }
            Err(e) => {
                metrics::record_overlay("failure");
                error!(stage = ?e.stage(), "Overlay failed: {}", e);
            }
        }

        result
    }

    async fn run_overlay(
        &self,
        request: &OverlayRequest,
        started: Instant,
    ) -> PipelineResult<OverlayOutcome> {
        self.validate_text(&request.url, &request.text)
            .map_err(PipelineError::validation)?;
        if let Some(overrides) = &request.overrides {
            overrides.validate().map_err(PipelineError::validation)?;
        }

        let style = self
            .styles
            .resolve(&request.template, request.overrides.as_ref())
            .await?;

        let downloaded = self.downloader.fetch(&request.url).await?;
        let input_bytes = downloaded.size;
        let source = TempArtifact::new(downloaded.path);

        if !is_supported_extension(source.path()) {
            let message = format!("unsupported file type: {}", source.path().display());
            source.discard().await;
            return Err(PipelineError::unsupported_media(None, message));
        }

        let source_ext = source
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let output_ext = request.output_format.extension(&source_ext).to_string();

        let source_kind = MediaKind::from_path(source.path());
        let output = TempArtifact::reserve(&self.config.work_dir, "overlay", &output_ext);
        let output_kind = MediaKind::from_path(output.path());

        let rendered = apply_text_overlay(
            self.engine.as_ref(),
            source.path(),
            output.path(),
            &request.text,
            &style,
            overlay_target(source_kind, output_kind),
        )
        .await;
        source.discard().await;

        let rendered = match rendered {
            Ok(rendered) => rendered,
            Err(e) => {
                output.discard().await;
                return Err(PipelineError::render(Stage::Overlaying, None, e));
            }
        };

        let has_custom_overrides = request.overrides.as_ref().is_some_and(|o| !o.is_empty());
        let usage = UsageFacts {
            endpoint: OVERLAY_ENDPOINT.to_string(),
            input_bytes,
            output_bytes: rendered.size,
            processing_time_ms: started.elapsed().as_millis() as u64,
            template_used: request.template.clone(),
            has_custom_overrides,
        };

        Ok(OverlayOutcome {
            output: output.into_path(),
            size: rendered.size,
            kind: output_kind,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_target() {
        assert_eq!(
            overlay_target(MediaKind::Image, MediaKind::Image),
            OverlayTarget::Still
        );
        assert_eq!(
            overlay_target(MediaKind::Video, MediaKind::Image),
            OverlayTarget::Still
        );
        assert_eq!(
            overlay_target(MediaKind::Video, MediaKind::Video),
            OverlayTarget::Video
        );
        assert!(matches!(
            overlay_target(MediaKind::Image, MediaKind::Video),
            OverlayTarget::StillAsVideo { .. }
        ));
    }
}
