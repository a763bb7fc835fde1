use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A calendar week of one user, keyed by its Monday.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Week {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub week_date: NaiveDate,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
