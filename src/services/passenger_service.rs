use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Passenger;

#[derive(Debug, Clone)]
pub struct NewPassenger {
    pub first_name: String,
    pub last_name: String,
    pub job_role: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PassengerChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_role: Option<String>,
}

impl PassengerChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.job_role.is_none()
    }
}

pub struct PassengerService {
    pool: PgPool,
}

impl PassengerService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn list(&self) -> Result<Vec<Passenger>, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, Passenger>("SELECT * FROM passengers ORDER BY last_name, first_name")
                .fetch_all(&self.pool),
        )
        .await
    }

    pub async fn get(&self, id: Uuid) -> Result<Passenger, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, Passenger>("SELECT * FROM passengers WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, passenger: NewPassenger) -> Result<Passenger, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, Passenger>(
                r#"
                INSERT INTO passengers (id, first_name, last_name, job_role)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&passenger.first_name)
            .bind(&passenger.last_name)
            .bind(&passenger.job_role)
            .fetch_one(&self.pool),
        )
        .await
    }

    pub async fn update(&self, id: Uuid, changes: PassengerChanges) -> Result<Passenger, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, Passenger>(
                r#"
                UPDATE passengers
                SET first_name = COALESCE($2, first_name),
                    last_name = COALESCE($3, last_name),
                    job_role = COALESCE($4, job_role),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(&changes.job_role)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| not_found(id))
    }

    /// Delete a passenger and every trip referencing it in one transaction.
    /// Returns the number of trips removed.
    ///
    /// The passenger row is locked first, so concurrent deletes of the same
    /// passenger run one after the other and only one reports the trips.
    /// Dropping the transaction on any early return rolls it back.
    pub async fn delete_cascade(&self, id: Uuid) -> Result<u64, DatabaseError> {
        let pool = self.pool.clone();
        let deleted = DatabaseManager::run(async move {
            let mut tx = pool.begin().await?;

            let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM passengers WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                tx.rollback().await?;
                return Ok(None);
            }

            let trips = sqlx::query("DELETE FROM trips WHERE passenger_id = $1")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?
                .rows_affected();

            sqlx::query("DELETE FROM passengers WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(Some(trips))
        })
        .await?;

        match deleted {
            Some(trips) => {
                info!("Deleted passenger {} and {} associated trips", id, trips);
                Ok(trips)
            }
            None => Err(not_found(id)),
        }
    }
}

fn not_found(id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("Passenger {} not found", id))
}
