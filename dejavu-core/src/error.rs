use thiserror::Error;

use crate::auth::AuthError;
use crate::classifier::ClassifierError;
use crate::features::FeatureError;
use crate::generation::GenerationError;

#[derive(Error, Debug)]
pub enum DejavuError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feature extraction error: {0}")]
    Feature(#[from] FeatureError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Other error: {0}")]
    Other(String),
}
