use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Descriptive metadata for one model in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    pub name: String,
    pub description: String,
    pub task: String,
    pub source: String,
    pub size_mb: u64,
    pub license: String,
    pub status: String,
}

/// A partial update to a catalog entry. Only the populated fields are
/// applied; `model_id` itself is immutable.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ModelUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub task: Option<String>,
    pub source: Option<String>,
    pub size_mb: Option<u64>,
    pub license: Option<String>,
    pub status: Option<String>,
}

/// Thread-safe model catalog.
pub struct ModelCatalog {
    models: DashMap<String, ModelInfo>,
}

impl ModelCatalog {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            models: DashMap::new(),
        })
    }

    /// Registers a model. Re-registering an existing id is a logged no-op.
    pub fn register(&self, model: ModelInfo) {
        if self.models.contains_key(&model.model_id) {
            tracing::warn!("Model already registered: {}", model.model_id);
            return;
        }
        tracing::info!("Registered model: {} ({})", model.name, model.model_id);
        self.models.insert(model.model_id.clone(), model);
    }

    pub fn get(&self, model_id: &str) -> Option<ModelInfo> {
        self.models.get(model_id).map(|entry| entry.value().clone())
    }

    /// All models, sorted by id for stable listings.
    pub fn list(&self) -> Vec<ModelInfo> {
        let mut models: Vec<ModelInfo> = self
            .models
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        models.sort_by(|a, b| a.model_id.cmp(&b.model_id));
        models
    }

    /// Merges the populated fields of `update` into an existing entry.
    /// Returns whether the model was found.
    pub fn update(&self, model_id: &str, update: ModelUpdate) -> bool {
        match self.models.get_mut(model_id) {
            Some(mut model) => {
                if let Some(name) = update.name {
                    model.name = name;
                }
                if let Some(description) = update.description {
                    model.description = description;
                }
                if let Some(task) = update.task {
                    model.task = task;
                }
                if let Some(source) = update.source {
                    model.source = source;
                }
                if let Some(size_mb) = update.size_mb {
                    model.size_mb = size_mb;
                }
                if let Some(license) = update.license {
                    model.license = license;
                }
                if let Some(status) = update.status {
                    model.status = status;
                }
                tracing::info!("Updated model: {}", model_id);
                true
            }
            None => {
                tracing::warn!("Tried to update unknown model: {}", model_id);
                false
            }
        }
    }

    pub fn mark_unavailable(&self, model_id: &str) {
        match self.models.get_mut(model_id) {
            Some(mut model) => {
                model.status = "unavailable".to_string();
                tracing::info!("Marked model as unavailable: {}", model_id);
            }
            None => {
                tracing::warn!("Tried to mark unknown model unavailable: {}", model_id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
