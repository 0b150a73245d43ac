//! End-to-end merge through the real ffmpeg binaries.
//!
//! Skipped when ffmpeg, ffprobe or a usable TrueType font is missing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use overlay_media::{probe_media, FfmpegEngine};
use overlay_models::{ClipJob, FontCatalog, MergeRequest, OverlayRequest, OutputFormat, TrimMode};
use overlay_pipeline::{
    ClipPipelineOrchestrator, HttpDownloader, InMemoryTemplateStore, PipelineConfig,
    StyleResolver,
};

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
];

fn tools_available() -> bool {
    which::which("ffmpeg").is_ok() && which::which("ffprobe").is_ok()
}

fn system_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// Lay out one system font under every bundled asset name.
fn font_dir(root: &Path, font: &Path) -> PathBuf {
    let dir = root.join("fonts");
    std::fs::create_dir_all(&dir).unwrap();
    let catalog = FontCatalog::from_dir(&dir);
    for target in [&catalog.medium, &catalog.semibold, &catalog.regular, &catalog.bold] {
        std::fs::copy(font, target).unwrap();
    }
    dir
}

async fn generate_clip(path: &Path, seconds: u32, with_audio: bool) {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-f".into(),
        "lavfi".into(),
        "-i".into(),
        format!("testsrc=size=640x360:rate=30:duration={seconds}"),
    ];
    if with_audio {
        args.extend([
            "-f".into(),
            "lavfi".into(),
            "-i".into(),
            format!("sine=frequency=440:duration={seconds}"),
            "-c:a".into(),
            "aac".into(),
        ]);
    }
    args.extend([
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "ultrafast".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        path.to_string_lossy().to_string(),
    ]);

    let status = tokio::process::Command::new("ffmpeg")
        .args(&args)
        .status()
        .await
        .unwrap();
    assert!(status.success(), "failed to generate {}", path.display());
}

fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path).unwrap().to_string()
}

fn pipeline(root: &Path, fonts: PathBuf) -> ClipPipelineOrchestrator {
    let config = PipelineConfig {
        work_dir: root.join("work"),
        font_dir: fonts,
        ..Default::default()
    };
    std::fs::create_dir_all(&config.work_dir).unwrap();

    let catalog = config.font_catalog();
    let downloader = HttpDownloader::new(
        &config.work_dir,
        config.max_download_bytes,
        Duration::from_secs(30),
    )
    .unwrap();
    let styles = StyleResolver::new(Arc::new(InMemoryTemplateStore::new(&catalog)), catalog);
    let engine = FfmpegEngine::new(config.render_config());

    ClipPipelineOrchestrator::new(Arc::new(downloader), Arc::new(engine), styles, config)
}

#[tokio::test]
async fn test_merge_mixed_audio_clips() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let Some(font) = system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let root = tempfile::TempDir::new().unwrap();
    let fonts = font_dir(root.path(), &font);
    let sources = root.path().join("sources");
    std::fs::create_dir_all(&sources).unwrap();

    let clips = [(8, true), (4, false), (6, true)];
    let mut jobs = Vec::new();
    for (i, (seconds, audio)) in clips.iter().enumerate() {
        let path = sources.join(format!("clip{i}.mp4"));
        generate_clip(&path, *seconds, *audio).await;
        jobs.push(ClipJob::new(file_url(&path), format!("Clip {}", i + 1)));
    }

    let pipeline = pipeline(root.path(), fonts);
    let outcome = pipeline.merge(&MergeRequest::new(jobs)).await.unwrap();

    let meta = probe_media(&outcome.output).await;
    let duration = meta.duration.unwrap();
    assert!((duration - 18.0).abs() < 0.5, "merged duration {duration}");
    assert!(meta.has_audio);
    assert_eq!(meta.width, Some(640));

    // Only the merged file is left in the work directory
    let left: Vec<_> = std::fs::read_dir(pipeline.work_dir()).unwrap().collect();
    assert_eq!(left.len(), 1);
}

#[tokio::test]
async fn test_silent_second_clip_keeps_one_audio_track() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let Some(font) = system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let root = tempfile::TempDir::new().unwrap();
    let fonts = font_dir(root.path(), &font);
    let a = root.path().join("a.mp4");
    let b = root.path().join("b.mp4");
    generate_clip(&a, 10, true).await;
    generate_clip(&b, 8, false).await;

    let request = MergeRequest::new(vec![
        ClipJob::new(file_url(&a), "With sound"),
        ClipJob::new(file_url(&b), "Silent"),
    ]);
    let outcome = pipeline(root.path(), fonts).merge(&request).await.unwrap();

    let meta = probe_media(&outcome.output).await;
    let duration = meta.duration.unwrap();
    assert!((duration - 18.0).abs() < 0.5, "merged duration {duration}");
    assert!(meta.has_audio);
}

#[tokio::test]
async fn test_merge_with_first_clip_trim() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let Some(font) = system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let root = tempfile::TempDir::new().unwrap();
    let fonts = font_dir(root.path(), &font);
    let first = root.path().join("first.mp4");
    let second = root.path().join("second.mp4");
    generate_clip(&first, 6, true).await;
    generate_clip(&second, 2, true).await;

    let request = MergeRequest::new(vec![
        ClipJob::new(file_url(&first), "Intro"),
        ClipJob::new(file_url(&second), "Outro"),
    ])
    .with_first_clip_trim(3.0, TrimMode::Both);

    let outcome = pipeline(root.path(), fonts).merge(&request).await.unwrap();
    let duration = probe_media(&outcome.output).await.duration.unwrap();
    assert!((duration - 5.0).abs() < 0.5, "merged duration {duration}");
}

#[tokio::test]
async fn test_single_frame_overlay() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let Some(font) = system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let root = tempfile::TempDir::new().unwrap();
    let fonts = font_dir(root.path(), &font);
    let source = root.path().join("source.mp4");
    generate_clip(&source, 2, false).await;

    let mut request = OverlayRequest::new(file_url(&source), "It's 50% off: today only");
    request.output_format = OutputFormat::Png;

    let outcome = pipeline(root.path(), fonts).overlay(&request).await.unwrap();
    assert!(outcome.size > 0);
    assert_eq!(probe_media(&outcome.output).await.width, Some(640));
}
