use std::sync::Arc;

use dejavu_core::config::GenerationConfig;
use dejavu_core::{
    create_classifier, AnswerGenerator, CompletionClient, CompletionSettings, DejavuConfig,
    DisabledGenerator, DuplicateClassifier,
};
use sqlx::PgPool;

/// Shared state for the IPC and HTTP servers.
///
/// The classifier is loaded exactly once, at process start; a missing model
/// or a feature-schema mismatch is fatal before any request is served.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: DejavuConfig,
    pub classifier: Arc<dyn DuplicateClassifier>,
    pub generator: Arc<dyn AnswerGenerator>,
}

impl AppState {
    pub fn new(pool: PgPool, config: DejavuConfig) -> anyhow::Result<Self> {
        let classifier: Arc<dyn DuplicateClassifier> =
            Arc::from(create_classifier(&config.classifier)?);
        tracing::info!(
            backend = classifier.name(),
            dimensions = classifier.dimensions(),
            "Duplicate classifier loaded"
        );

        let generator = build_generator(&config.generation);

        Ok(Self {
            pool,
            config,
            classifier,
            generator,
        })
    }
}

/// Build the completion client, degrading to the disabled generator when no
/// API key is available. Submissions then fall back to the placeholder
/// answer instead of failing.
pub fn build_generator(config: &GenerationConfig) -> Arc<dyn AnswerGenerator> {
    let settings = CompletionSettings::new(None, config);
    match CompletionClient::new(settings, config.base_url.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "Answer generation disabled");
            Arc::new(DisabledGenerator)
        }
    }
}
