//! Overlay worker binary.
//!
//! Runs one JSON job file: `overlay-worker <job.json>`.
//!
//! ```json
//! {"kind": "merge", "clips": [{"url": "...", "text": "..."}, ...]}
//! {"kind": "overlay", "url": "...", "text": "...", "output_format": "png"}
//! ```

use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use overlay_media::{check_ffmpeg, check_ffprobe, FfmpegEngine};
use overlay_models::{MergeRequest, OverlayRequest, UsageFacts};
use overlay_pipeline::{
    ClipPipelineOrchestrator, HttpDownloader, InMemoryTemplateStore, LocalDirObjectStore,
    LogUsageRecorder, ObjectStore, PipelineConfig, StyleResolver, UsageRecorder,
};

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Job {
    Merge(MergeRequest),
    Overlay(OverlayRequest),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        error!("Job failed: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run() -> anyhow::Result<()> {
    let job_path = std::env::args()
        .nth(1)
        .context("usage: overlay-worker <job.json>")?;

    info!("Starting overlay-worker");
    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    check_ffmpeg().context("ffmpeg is required")?;
    check_ffprobe().context("ffprobe is required")?;

    let raw = tokio::fs::read(&job_path)
        .await
        .with_context(|| format!("reading {job_path}"))?;
    let job: Job = serde_json::from_slice(&raw).with_context(|| format!("parsing {job_path}"))?;

    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .with_context(|| format!("creating {}", config.work_dir.display()))?;

    let fonts = config.font_catalog();
    if !fonts.all_present() {
        bail!("font files missing under {}", config.font_dir.display());
    }

    let templates = InMemoryTemplateStore::new(&fonts);
    if let Some(path) = &config.templates_file {
        templates.load_json(path).await?;
    }

    let downloader = HttpDownloader::new(
        &config.work_dir,
        config.max_download_bytes,
        config.download_timeout,
    )?;
    let engine = FfmpegEngine::new(config.render_config());
    let styles = StyleResolver::new(Arc::new(templates), fonts);
    let store = LocalDirObjectStore::new(&config.output_dir, config.public_base_url.clone());
    let recorder = LogUsageRecorder;

    let orchestrator = ClipPipelineOrchestrator::new(
        Arc::new(downloader),
        Arc::new(engine),
        styles,
        config,
    );

    let (output, usage) = match job {
        Job::Merge(request) => {
            let outcome = orchestrator.merge(&request).await?;
            info!(
                clips = outcome.clips_processed,
                duration = ?outcome.duration,
                "Merged clips"
            );
            (outcome.output, outcome.usage)
        }
        Job::Overlay(request) => {
            let outcome = orchestrator.overlay(&request).await?;
            (outcome.output, outcome.usage)
        }
    };

    publish(&store, &recorder, &output, &usage).await
}

/// Upload the output, record usage, and remove the local copy.
async fn publish(
    store: &dyn ObjectStore,
    recorder: &dyn UsageRecorder,
    output: &Path,
    usage: &UsageFacts,
) -> anyhow::Result<()> {
    let key = output
        .file_name()
        .and_then(|n| n.to_str())
        .context("output has no file name")?
        .to_string();

    let uploaded = store.upload(output, &key).await;
    overlay_media::artifact::remove_quietly(output).await;
    let url = uploaded?;

    recorder.record(usage).await?;

    match url {
        Some(url) => info!(key = %key, url = %url, "Output published"),
        None => info!(key = %key, "Output stored"),
    }
    println!("{key}");
    Ok(())
}
