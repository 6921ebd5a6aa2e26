//! Duplicate-question classifier backends.
//!
//! The trained artifact is consumed as an opaque `predict(vector) -> label`
//! function behind the `DuplicateClassifier` trait:
//! - **ONNX** — the production backend, a pre-trained binary classifier
//!   loaded once at process start via `ort`
//! - **Threshold** — a deterministic fuzzy-ratio rule for development and
//!   tests when no trained artifact is present
//!
//! The feature schema and the classifier weights are one versioned unit: a
//! width disagreement is a fatal configuration error, never silently
//! truncated or padded.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use thiserror::Error;

use crate::config::ClassifierConfig;
use crate::features::{FEATURE_DIMENSIONS, HANDCRAFTED_FEATURES};

/// Binary classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    NotDuplicate,
    Duplicate,
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Classifier model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Feature schema mismatch: classifier expects {expected} dimensions, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Unknown classifier backend: {0}")]
    UnknownBackend(String),

    #[error("ONNX inference error: {0}")]
    Inference(String),
}

/// Abstraction over binary duplicate classifiers.
///
/// Any implementation honoring this signature and the extractor's vector
/// schema may be substituted for the trained artifact.
pub trait DuplicateClassifier: Send + Sync {
    /// Classify a feature vector. The vector width must equal `dimensions()`.
    fn predict(&self, features: &[f32]) -> Result<Label, ClassifierError>;

    /// Expected input width.
    fn dimensions(&self) -> usize;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Create the configured backend. Validates the feature schema up front.
pub fn create_classifier(
    config: &ClassifierConfig,
) -> Result<Box<dyn DuplicateClassifier>, ClassifierError> {
    if config.feature_dimensions != FEATURE_DIMENSIONS {
        return Err(ClassifierError::SchemaMismatch {
            expected: config.feature_dimensions,
            actual: FEATURE_DIMENSIONS,
        });
    }

    match config.backend.as_str() {
        "onnx" => Ok(Box::new(OnnxClassifier::load(config)?)),
        "threshold" => Ok(Box::new(ThresholdClassifier::new(config.threshold))),
        other => Err(ClassifierError::UnknownBackend(other.to_string())),
    }
}

// ============================================================================
// OnnxClassifier
// ============================================================================

/// Pre-trained binary classifier loaded from a versioned ONNX artifact.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    dimensions: usize,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl OnnxClassifier {
    /// Load the ONNX artifact named by `config.model_path`.
    ///
    /// Returns `ClassifierError::ModelNotFound` if the file is missing.
    pub fn load(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let path = Path::new(&config.model_path);
        if !path.exists() {
            return Err(ClassifierError::ModelNotFound {
                path: config.model_path.clone(),
            });
        }

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            dimensions: config.feature_dimensions,
        })
    }
}

impl DuplicateClassifier for OnnxClassifier {
    fn predict(&self, features: &[f32]) -> Result<Label, ClassifierError> {
        if features.len() != self.dimensions {
            return Err(ClassifierError::SchemaMismatch {
                expected: self.dimensions,
                actual: features.len(),
            });
        }

        let mut session = self
            .session
            .lock()
            .map_err(|e| ClassifierError::Inference(format!("session lock poisoned: {e}")))?;

        let shape = vec![1i64, self.dimensions as i64];
        let input = Tensor::from_array((shape, features.to_vec()))
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        // skl2onnx-exported classifiers name their single input "float_input"
        let inputs = ort::inputs! {
            "float_input" => input,
        };

        let outputs = session
            .run(inputs)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        // The label output is int64 for exported sklearn classifiers; some
        // exports emit an f32 score instead, thresholded at 0.5.
        if let Ok((_, labels)) = outputs[0].try_extract_tensor::<i64>() {
            let raw = labels
                .first()
                .ok_or_else(|| ClassifierError::Inference("empty label tensor".to_string()))?;
            return Ok(if *raw == 1 { Label::Duplicate } else { Label::NotDuplicate });
        }

        let (_, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let score = scores
            .first()
            .ok_or_else(|| ClassifierError::Inference("empty score tensor".to_string()))?;

        Ok(if *score >= 0.5 { Label::Duplicate } else { Label::NotDuplicate })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

// ============================================================================
// ThresholdClassifier
// ============================================================================

/// Deterministic substitute backend: averages the three strongest fuzzy
/// ratios from the handcrafted block and thresholds the result.
///
/// Useful in development and tests; recall/precision differ from the trained
/// artifact and the two must not be assumed equivalent.
#[derive(Debug, Clone)]
pub struct ThresholdClassifier {
    threshold: f32,
}

impl ThresholdClassifier {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl DuplicateClassifier for ThresholdClassifier {
    fn predict(&self, features: &[f32]) -> Result<Label, ClassifierError> {
        if features.len() != FEATURE_DIMENSIONS {
            return Err(ClassifierError::SchemaMismatch {
                expected: FEATURE_DIMENSIONS,
                actual: features.len(),
            });
        }

        debug_assert!(HANDCRAFTED_FEATURES >= 12);
        // shared-token ratio, Levenshtein ratio, token-sort ratio
        let score = (features[3] + features[9] + features[11]) / 3.0;

        Ok(if score >= self.threshold {
            Label::Duplicate
        } else {
            Label::NotDuplicate
        })
    }

    fn dimensions(&self) -> usize {
        FEATURE_DIMENSIONS
    }

    fn name(&self) -> &str {
        "threshold"
    }
}

// ============================================================================
// TESTS
// ============================================================================
