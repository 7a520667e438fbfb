use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An uploaded reference resume. `content` holds the normalized extracted text.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: i64,
    pub filename: String,
    pub mime: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
