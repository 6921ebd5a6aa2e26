use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionRecord {
    pub token: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The logged-in user, resolved from a session token.
///
/// Passed explicitly into every operation that acts on behalf of a user —
/// there is no ambient "current user" state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub token: Uuid,
    pub user_id: Uuid,
    pub username: String,
}
