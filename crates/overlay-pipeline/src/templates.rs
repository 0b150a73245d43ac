//! In-memory template store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;

use overlay_models::{FontCatalog, StyleTemplate};

use crate::collaborators::TemplateStore;
use crate::error::{PipelineError, PipelineResult};

/// Template store seeded with the built-in `default` template.
#[derive(Debug)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<String, StyleTemplate>>,
}

impl InMemoryTemplateStore {
    pub fn new(fonts: &FontCatalog) -> Self {
        let default = StyleTemplate::builtin_default(fonts);
        let mut templates = HashMap::new();
        templates.insert(default.name.clone(), default);
        Self {
            templates: RwLock::new(templates),
        }
    }

    /// Add or replace a template.
    pub async fn insert(&self, template: StyleTemplate) {
        self.templates
            .write()
            .await
            .insert(template.name.clone(), template);
    }

    /// Load extra templates from a JSON array of [`StyleTemplate`].
    ///
    /// Entries named like an existing template replace it.
    pub async fn load_json(&self, path: &Path) -> PipelineResult<usize> {
        let raw = tokio::fs::read(path).await?;
        let loaded: Vec<StyleTemplate> = serde_json::from_slice(&raw).map_err(|e| {
            PipelineError::validation(format!("Invalid templates file {}: {e}", path.display()))
        })?;

        let count = loaded.len();
        let mut templates = self.templates.write().await;
        for template in loaded {
            templates.insert(template.name.clone(), template);
        }
        info!(path = %path.display(), count, "Loaded style templates");
        Ok(count)
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn resolve(&self, name: &str) -> Option<StyleTemplate> {
        self.templates.read().await.get(name).cloned()
    }

    async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.templates.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
