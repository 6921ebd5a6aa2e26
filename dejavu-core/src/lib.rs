pub mod auth;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod generation;
pub mod ipc;
pub mod models;

pub use classifier::{
    create_classifier, ClassifierError, DuplicateClassifier, Label, OnnxClassifier,
    ThresholdClassifier,
};
pub use config::DejavuConfig;
pub use error::DejavuError;
pub use features::{extract, FeatureError, FeatureVector, FEATURE_DIMENSIONS};
pub use generation::{
    AnswerGenerator, CompletionClient, CompletionSettings, DisabledGenerator, GenerationError,
};
pub use models::{SessionRecord, StoredQuestion, User, UserSession};
