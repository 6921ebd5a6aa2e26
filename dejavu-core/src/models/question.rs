use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A question as persisted at submission time.
///
/// `is_duplicate` and `answer` are set once, from the scan + resolution
/// outcome, and are immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredQuestion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question_text: String,
    pub is_duplicate: bool,
    pub answer: Option<String>,
    pub created_at: DateTime<Utc>,
}
