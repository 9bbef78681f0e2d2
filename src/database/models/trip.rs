use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    /// Passenger id as a plain string; not enforced as a foreign key
    pub passenger_id: String,
    pub origin: String,
    pub destination: String,
    /// Always `YYYY-MM-DD`
    pub trip_date: String,
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passenger_count: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
