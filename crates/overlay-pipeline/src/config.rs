//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use overlay_media::render::{DEFAULT_CONCAT_TIMEOUT, DEFAULT_OVERLAY_TIMEOUT};
use overlay_media::RenderConfig;
use overlay_models::fonts::DEFAULT_FONT_DIR;
use overlay_models::{EncodingConfig, FontCatalog};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for every request-scoped temporary file
    pub work_dir: PathBuf,
    /// Directory holding the bundled font files
    pub font_dir: PathBuf,
    /// Optional JSON file with additional style templates
    pub templates_file: Option<PathBuf>,
    /// Maximum clips in one merge request
    pub max_merge_clips: usize,
    /// Maximum overlay text length, in characters
    pub max_text_length: usize,
    /// Download size ceiling
    pub max_download_bytes: u64,
    /// Timeout for a single download
    pub download_timeout: Duration,
    /// Timeout for one overlay or trim render
    pub overlay_timeout: Duration,
    /// Timeout for the concatenation render
    pub concat_timeout: Duration,
    /// Concurrent background-removal calls
    pub max_background_parallel: usize,
    /// Output directory of the local object store (worker binary)
    pub output_dir: PathBuf,
    /// Public base URL prefixed to uploaded keys, if any
    pub public_base_url: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("overlay"),
            font_dir: PathBuf::from(DEFAULT_FONT_DIR),
            templates_file: None,
            max_merge_clips: 10,
            max_text_length: 500,
            max_download_bytes: 500 * 1024 * 1024, // 500 MiB
            download_timeout: Duration::from_secs(300),
            overlay_timeout: DEFAULT_OVERLAY_TIMEOUT,
            concat_timeout: DEFAULT_CONCAT_TIMEOUT,
            max_background_parallel: 3,
            output_dir: PathBuf::from("./output"),
            public_base_url: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            work_dir: std::env::var("OVERLAY_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            font_dir: std::env::var("OVERLAY_FONT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.font_dir),
            templates_file: std::env::var("OVERLAY_TEMPLATES_FILE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            max_merge_clips: env_parse("MAX_MERGE_CLIPS").unwrap_or(defaults.max_merge_clips),
            max_text_length: env_parse("MAX_TEXT_LENGTH").unwrap_or(defaults.max_text_length),
            max_download_bytes: env_parse("MAX_FILE_SIZE").unwrap_or(defaults.max_download_bytes),
            download_timeout: env_parse("DOWNLOAD_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.download_timeout),
            overlay_timeout: env_parse("OVERLAY_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.overlay_timeout),
            concat_timeout: env_parse("MERGE_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.concat_timeout),
            max_background_parallel: env_parse("REMBG_MAX_PARALLEL")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_background_parallel),
            output_dir: std::env::var("OVERLAY_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }

    /// Renderer settings derived from this config.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            encoding: EncodingConfig::default(),
            overlay_timeout: self.overlay_timeout,
            concat_timeout: self.concat_timeout,
            ..Default::default()
        }
    }

    pub fn font_catalog(&self) -> FontCatalog {
        FontCatalog::from_dir(&self.font_dir)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
