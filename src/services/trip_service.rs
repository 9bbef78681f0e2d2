use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Trip;

/// A complete trip record as written by create and replace.
/// `trip_date` must already be normalized to `YYYY-MM-DD`.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub passenger_id: String,
    pub origin: String,
    pub destination: String,
    pub trip_date: String,
    pub confirmed: bool,
    pub passenger_count: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct TripChanges {
    pub passenger_id: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub trip_date: Option<String>,
    pub confirmed: Option<bool>,
    pub passenger_count: Option<i32>,
}

impl TripChanges {
    pub fn is_empty(&self) -> bool {
        self.passenger_id.is_none()
            && self.origin.is_none()
            && self.destination.is_none()
            && self.trip_date.is_none()
            && self.confirmed.is_none()
            && self.passenger_count.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TripFilter {
    pub trip_date: Option<String>,
    pub passenger_id: Option<String>,
}

/// Result of a floored decrement
#[derive(Debug)]
pub enum Decrement {
    Updated(Trip),
    /// Count was absent or already 1; nothing was written
    AtFloor,
}

pub struct TripService {
    pool: PgPool,
}

impl TripService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn list(&self, filter: &TripFilter) -> Result<Vec<Trip>, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, Trip>(
                r#"
                SELECT * FROM trips
                WHERE ($1::text IS NULL OR trip_date = $1)
                  AND ($2::text IS NULL OR passenger_id = $2)
                ORDER BY trip_date, created_at
                "#,
            )
            .bind(&filter.trip_date)
            .bind(&filter.passenger_id)
            .fetch_all(&self.pool),
        )
        .await
    }

    pub async fn get(&self, id: Uuid) -> Result<Trip, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, trip: NewTrip) -> Result<Trip, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, Trip>(
                r#"
                INSERT INTO trips (id, passenger_id, origin, destination, trip_date, confirmed, passenger_count)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&trip.passenger_id)
            .bind(&trip.origin)
            .bind(&trip.destination)
            .bind(&trip.trip_date)
            .bind(trip.confirmed)
            .bind(trip.passenger_count)
            .fetch_one(&self.pool),
        )
        .await
    }

    /// Overwrite every field. An absent passenger count is cleared.
    pub async fn replace(&self, id: Uuid, trip: NewTrip) -> Result<Trip, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, Trip>(
                r#"
                UPDATE trips
                SET passenger_id = $2,
                    origin = $3,
                    destination = $4,
                    trip_date = $5,
                    confirmed = $6,
                    passenger_count = $7,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&trip.passenger_id)
            .bind(&trip.origin)
            .bind(&trip.destination)
            .bind(&trip.trip_date)
            .bind(trip.confirmed)
            .bind(trip.passenger_count)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| not_found(id))
    }

    pub async fn patch(&self, id: Uuid, changes: TripChanges) -> Result<Trip, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, Trip>(
                r#"
                UPDATE trips
                SET passenger_id = COALESCE($2, passenger_id),
                    origin = COALESCE($3, origin),
                    destination = COALESCE($4, destination),
                    trip_date = COALESCE($5, trip_date),
                    confirmed = COALESCE($6, confirmed),
                    passenger_count = COALESCE($7, passenger_count),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&changes.passenger_id)
            .bind(&changes.origin)
            .bind(&changes.destination)
            .bind(&changes.trip_date)
            .bind(changes.confirmed)
            .bind(changes.passenger_count)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = DatabaseManager::run(sqlx::query("DELETE FROM trips WHERE id = $1").bind(id).execute(&self.pool))
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Atomic +1. A trip without a count is treated as carrying one passenger.
    pub async fn increment(&self, id: Uuid) -> Result<Trip, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, Trip>(
                r#"
                UPDATE trips
                SET passenger_count = COALESCE(passenger_count, 1) + 1, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| not_found(id))
    }

    /// Atomic -1, only applied while the count is above 1
    pub async fn decrement(&self, id: Uuid) -> Result<Decrement, DatabaseError> {
        let updated = DatabaseManager::run(
            sqlx::query_as::<_, Trip>(
                r#"
                UPDATE trips
                SET passenger_count = passenger_count - 1, updated_at = NOW()
                WHERE id = $1 AND passenger_count > 1
                RETURNING *
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        match updated {
            Some(trip) => Ok(Decrement::Updated(trip)),
            // Distinguish a missing trip from one sitting at the floor
            None => self.get(id).await.map(|_| Decrement::AtFloor),
        }
    }

    pub async fn set_count(&self, id: Uuid, count: i32) -> Result<Trip, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, Trip>(
                "UPDATE trips SET passenger_count = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
            )
            .bind(id)
            .bind(count)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("Trip {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_without_fields_are_empty() {
        assert!(TripChanges::default().is_empty());
        let changes = TripChanges {
            confirmed: Some(false),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
