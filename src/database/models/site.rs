use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Site {
    pub id: Uuid,
    #[serde(rename = "siteName")]
    pub site_name: String,
    #[serde(rename = "currentPOB")]
    pub current_pob: i32,
    #[serde(rename = "maximumPOB")]
    pub maximum_pob: i32,
    #[serde(rename = "lastPOBUpdate")]
    pub last_pob_update: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}
