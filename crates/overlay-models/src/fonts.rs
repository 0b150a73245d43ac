//! Font asset catalog.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory holding the bundled font files.
pub const DEFAULT_FONT_DIR: &str = "/app/fonts";

/// Font weights below this threshold select the medium asset.
pub const SEMIBOLD_WEIGHT_THRESHOLD: u16 = 450;

/// Deprecated font selector kept for older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    Regular,
    Bold,
}

/// Paths of the font assets a style can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontCatalog {
    /// TikTok Sans Medium (weights 100-449)
    pub medium: PathBuf,
    /// TikTok Sans SemiBold (weights 450-900)
    pub semibold: PathBuf,
    /// Legacy Inter Regular
    pub regular: PathBuf,
    /// Legacy Inter Bold
    pub bold: PathBuf,
}

impl Default for FontCatalog {
    fn default() -> Self {
        Self::from_dir(DEFAULT_FONT_DIR)
    }
}

impl FontCatalog {
    /// Build a catalog rooted at `dir` using the bundled file names.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            medium: dir.join("TikTokSans-Medium.ttf"),
            semibold: dir.join("TikTokSans-SemiBold.ttf"),
            regular: dir.join("Inter-Regular.ttf"),
            bold: dir.join("Inter-Bold.ttf"),
        }
    }

    /// Font asset for a numeric weight.
    pub fn for_weight(&self, weight: u16) -> &Path {
        if weight < SEMIBOLD_WEIGHT_THRESHOLD {
            &self.medium
        } else {
            &self.semibold
        }
    }

    /// Font asset for the legacy family selector.
    pub fn for_family(&self, family: FontFamily) -> &Path {
        match family {
            FontFamily::Regular => &self.regular,
            FontFamily::Bold => &self.bold,
        }
    }

    /// Whether every asset exists on disk.
    pub fn all_present(&self) -> bool {
        [&self.medium, &self.semibold, &self.regular, &self.bold]
            .iter()
            .all(|p| p.exists())
    }
}
