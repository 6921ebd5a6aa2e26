//! Question submission pipeline: scan, resolve, persist.
//!
//! One submission triggers one duplicate scan over a creation-ordered
//! snapshot, at most one generation call, and exactly one inserted question
//! row carrying the outcome. The row is immutable after creation.

use dejavu_core::models::{StoredQuestion, UserSession};
use dejavu_core::{AnswerGenerator, DuplicateClassifier};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::subsystems::{resolve, scan};

#[derive(Debug, Serialize)]
pub struct AskOutcome {
    pub question_id: Uuid,
    pub answer: String,
    pub is_duplicate: bool,
    pub duplicates: Vec<StoredQuestion>,
}

/// Submit a question on behalf of a logged-in user.
pub async fn submit_question(
    pool: &PgPool,
    session: &UserSession,
    question: &str,
    classifier: &dyn DuplicateClassifier,
    generator: &dyn AnswerGenerator,
    max_tokens: u32,
) -> anyhow::Result<AskOutcome> {
    let question = question.trim();
    if question.is_empty() {
        anyhow::bail!("Question cannot be empty");
    }

    let candidates = scan::fetch_candidates(pool).await?;
    let duplicates = scan::find_duplicates(question, &candidates, classifier)?;
    let (answer, is_duplicate) =
        resolve::resolve(question, &duplicates, generator, max_tokens).await;

    let question_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO questions (id, user_id, question_text, is_duplicate, answer)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(question_id)
    .bind(session.user_id)
    .bind(question)
    .bind(is_duplicate)
    .bind(&answer)
    .execute(pool)
    .await?;

    tracing::info!(
        username = %session.username,
        question_id = %question_id,
        is_duplicate,
        matches = duplicates.len(),
        "Stored submitted question"
    );

    Ok(AskOutcome {
        question_id,
        answer,
        is_duplicate,
        duplicates,
    })
}
