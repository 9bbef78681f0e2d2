use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Site;

/// Values written when the site does not exist yet
#[derive(Debug, Clone)]
pub struct SiteInsert {
    pub site_name: String,
    pub current_pob: i32,
    pub maximum_pob: i32,
    pub last_pob_update: Option<DateTime<Utc>>,
}

/// Values written over an existing site; `None` keeps the stored column.
/// The update timestamp moves whenever `current_pob` is written.
#[derive(Debug, Clone, Default)]
pub struct SiteUpdate {
    pub current_pob: Option<i32>,
    pub maximum_pob: Option<i32>,
}

impl SiteInsert {
    /// Insert shape derived from an update request: missing current POB
    /// starts at zero, missing maximum falls back to `default_maximum`.
    pub fn from_update(site_name: &str, update: &SiteUpdate, default_maximum: i32) -> Self {
        Self {
            site_name: site_name.to_string(),
            current_pob: update.current_pob.unwrap_or(0),
            maximum_pob: update.maximum_pob.unwrap_or(default_maximum),
            last_pob_update: update.current_pob.map(|_| Utc::now()),
        }
    }
}

#[derive(Debug)]
pub struct Initialized {
    pub created: u64,
    pub sites: Vec<Site>,
}

pub struct SiteService {
    pool: PgPool,
}

impl SiteService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn list(&self) -> Result<Vec<Site>, DatabaseError> {
        DatabaseManager::run(sqlx::query_as::<_, Site>("SELECT * FROM sites ORDER BY site_name").fetch_all(&self.pool))
            .await
    }

    pub async fn get_by_name(&self, site_name: &str) -> Result<Site, DatabaseError> {
        DatabaseManager::run(
            sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE site_name = $1")
                .bind(site_name)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Site {} not found", site_name)))
    }

    /// Insert the site if absent, otherwise apply `update` to it
    pub async fn upsert(&self, insert: SiteInsert, update: SiteUpdate) -> Result<Site, DatabaseError> {
        let site = DatabaseManager::run(
            sqlx::query_as::<_, Site>(
                r#"
                INSERT INTO sites (id, site_name, current_pob, maximum_pob, last_pob_update)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (site_name) DO UPDATE SET
                    current_pob = COALESCE($6::int, sites.current_pob),
                    maximum_pob = COALESCE($7::int, sites.maximum_pob),
                    last_pob_update = CASE WHEN $6::int IS NULL THEN sites.last_pob_update ELSE NOW() END,
                    updated_at = NOW()
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&insert.site_name)
            .bind(insert.current_pob)
            .bind(insert.maximum_pob)
            .bind(insert.last_pob_update)
            .bind(update.current_pob)
            .bind(update.maximum_pob)
            .fetch_one(&self.pool),
        )
        .await?;

        if site.current_pob > site.maximum_pob {
            warn!(
                "Site {} is over capacity: {} on board, maximum {}",
                site.site_name, site.current_pob, site.maximum_pob
            );
        }
        Ok(site)
    }

    /// Seed each name with zero occupancy. Existing sites are left untouched.
    pub async fn initialize(&self, site_names: &[String], default_maximum: i32) -> Result<Initialized, DatabaseError> {
        let ids: Vec<Uuid> = site_names.iter().map(|_| Uuid::new_v4()).collect();
        let result = DatabaseManager::run(
            sqlx::query(
                r#"
                INSERT INTO sites (id, site_name, current_pob, maximum_pob)
                SELECT seed.id, seed.site_name, 0, $3
                FROM UNNEST($1::uuid[], $2::text[]) AS seed(id, site_name)
                ON CONFLICT (site_name) DO NOTHING
                "#,
            )
            .bind(&ids)
            .bind(site_names)
            .bind(default_maximum)
            .execute(&self.pool),
        )
        .await?;

        let created = result.rows_affected();
        info!("Site initialization created {} of {} sites", created, site_names.len());

        Ok(Initialized {
            created,
            sites: self.list().await?,
        })
    }
}
