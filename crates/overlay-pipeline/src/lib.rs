//! Overlay and merge orchestration.
//!
//! Ties the media crate to its collaborators: downloads sources, resolves
//! styles, runs overlays, trims and concatenation, and guarantees that no
//! temporary file outlives its request.

pub mod background;
pub mod collaborators;
pub mod config;
pub mod download;
pub mod error;
pub mod merge;
pub mod metrics;
pub mod overlay;
pub mod storage;
pub mod style;
pub mod templates;
pub mod usage;

pub use background::{BackgroundOutcome, BackgroundRemover, MattingBackend, MattingSession, SessionCache};
pub use collaborators::{DownloadedFile, Downloader, ObjectStore, TemplateStore, UsageRecorder};
pub use config::PipelineConfig;
pub use download::HttpDownloader;
pub use error::{PipelineError, PipelineResult, Stage};
pub use merge::{ClipPipelineOrchestrator, MergeOutcome};
pub use overlay::OverlayOutcome;
pub use storage::LocalDirObjectStore;
pub use style::{apply_overrides, StyleResolver};
pub use templates::InMemoryTemplateStore;
pub use usage::LogUsageRecorder;
