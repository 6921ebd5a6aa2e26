//! Duplicate scan — classify a new question against every stored question.
//!
//! A linear pass: extract features for (new, candidate), ask the classifier,
//! keep the candidates labeled duplicate. Result ordering preserves candidate
//! ordering, which `fetch_candidates` pins to creation order. O(n) per
//! submission is the accepted scalability ceiling at this scale; an
//! embedding index would change recall/precision and needs its own
//! validation before it could replace this.

use dejavu_core::models::StoredQuestion;
use dejavu_core::{features, DejavuError, DuplicateClassifier, Label};
use sqlx::PgPool;

/// Snapshot all stored questions in creation order.
///
/// The explicit `ORDER BY created_at, id` makes the "first duplicate wins"
/// tie-break deterministic.
pub async fn fetch_candidates(pool: &PgPool) -> Result<Vec<StoredQuestion>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, user_id, question_text, is_duplicate, answer, created_at
        FROM questions
        ORDER BY created_at, id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Return the candidates the classifier labels as duplicates of
/// `new_question`, in candidate order.
pub fn find_duplicates(
    new_question: &str,
    candidates: &[StoredQuestion],
    classifier: &dyn DuplicateClassifier,
) -> Result<Vec<StoredQuestion>, DejavuError> {
    let mut duplicates = Vec::new();

    for candidate in candidates {
        let features = features::extract(new_question, &candidate.question_text)?;
        if classifier.predict(&features)? == Label::Duplicate {
            duplicates.push(candidate.clone());
        }
    }

    Ok(duplicates)
}
