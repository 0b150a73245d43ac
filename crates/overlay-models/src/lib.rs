//! Shared data models for the text overlay pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Style descriptors, templates and per-request overrides
//! - Merge and single-overlay requests
//! - Media metadata and encoding configuration
//! - Usage facts handed back to the boundary layer

pub mod color;
pub mod encoding;
pub mod fonts;
pub mod media;
pub mod overrides;
pub mod request;
pub mod style;
pub mod template;
pub mod usage;

// Re-export common types
pub use encoding::EncodingConfig;
pub use fonts::{FontCatalog, FontFamily};
pub use media::{MediaKind, MediaMetadata};
pub use overrides::OverrideSet;
pub use request::{ClipJob, MergeRequest, OutputContainer, OutputFormat, OverlayRequest, TrimMode};
pub use style::{Alignment, Position, StyleDescriptor};
pub use template::{StyleTemplate, DEFAULT_TEMPLATE_NAME};
pub use usage::UsageFacts;
