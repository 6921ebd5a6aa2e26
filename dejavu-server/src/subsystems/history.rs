//! Per-user question history.

use dejavu_core::models::StoredQuestion;
use sqlx::PgPool;
use uuid::Uuid;

/// All questions a user has asked, in creation order.
pub async fn list_questions(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<StoredQuestion>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, user_id, question_text, is_duplicate, answer, created_at
        FROM questions
        WHERE user_id = $1
        ORDER BY created_at, id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
