//! Language → model registry
//!
//! Built once at startup and shared read-only (`Arc<ModelRegistry>`); there is
//! no way to mutate a registry after [`ModelRegistryBuilder::build`].

use super::{LabelMapping, SentimentClassifier};
use crate::error::WorkerError;
use senti_common::config::TomlConfig;
use std::collections::HashMap;

/// One language's classifier and label table
pub struct RegisteredModel {
    name: String,
    classifier: Box<dyn SentimentClassifier>,
    labels: LabelMapping,
}

impl RegisteredModel {
    pub fn new(
        name: impl Into<String>,
        classifier: impl SentimentClassifier + 'static,
        labels: LabelMapping,
    ) -> Self {
        Self {
            name: name.into(),
            classifier: Box::new(classifier),
            labels,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classifier(&self) -> &dyn SentimentClassifier {
        self.classifier.as_ref()
    }

    pub fn labels(&self) -> &LabelMapping {
        &self.labels
    }
}

impl std::fmt::Debug for RegisteredModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredModel")
            .field("name", &self.name)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

/// Immutable language code → model table
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, RegisteredModel>,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    pub fn get(&self, language_code: &str) -> Option<&RegisteredModel> {
        self.models.get(language_code)
    }

    pub fn supports(&self, language_code: &str) -> bool {
        self.models.contains_key(language_code)
    }

    /// Registered language codes, sorted
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.models.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[derive(Default)]
pub struct ModelRegistryBuilder {
    models: HashMap<String, RegisteredModel>,
}

impl ModelRegistryBuilder {
    /// Register a model; a later registration for the same language replaces the earlier one
    pub fn register(mut self, language_code: impl Into<String>, model: RegisteredModel) -> Self {
        self.models.insert(language_code.into(), model);
        self
    }

    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            models: self.models,
        }
    }
}

/// Download and load every configured model
///
/// Performs blocking network and file I/O; call from `spawn_blocking`.
#[cfg(feature = "candle")]
pub fn load_registry(
    config: &TomlConfig,
    hf_token: Option<String>,
) -> Result<ModelRegistry, WorkerError> {
    use super::roberta::{download_model, select_device, RobertaSentimentClassifier};
    use std::time::Instant;
    use tracing::info;

    let device = select_device();
    let mut builder = ModelRegistry::builder();

    for (language, model_config) in &config.models {
        let labels = LabelMapping::from_config(&model_config.labels)
            .map_err(|e| WorkerError::Config(format!("models.{language}: {e}")))?;

        let started = Instant::now();
        let files = download_model(&model_config.repo, hf_token.clone())?;
        let classifier = RobertaSentimentClassifier::load(
            &files,
            device.clone(),
            config.pipeline.max_sequence_length,
        )?;

        info!(
            language = %language,
            model = %model_config.repo,
            labels = ?classifier.labels(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model loaded"
        );

        builder = builder.register(
            language.clone(),
            RegisteredModel::new(model_config.repo.clone(), classifier, labels),
        );
    }

    Ok(builder.build())
}

/// Without an inference backend there is nothing to register
#[cfg(not(feature = "candle"))]
pub fn load_registry(
    _config: &TomlConfig,
    _hf_token: Option<String>,
) -> Result<ModelRegistry, WorkerError> {
    Err(WorkerError::Config(
        "senti-worker was built without an inference backend (enable the `candle` feature)"
            .to_string(),
    ))
}
