// handlers/public/sites.rs - Site occupancy (persons on board)

use axum::{extract::Path, Extension};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config;
use crate::database::models::Site;
use crate::error::ApiError;
use crate::handlers::actor;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::{SiteInsert, SiteService, SiteUpdate};
use crate::validation::{self, FieldError};

type Identity = Option<Extension<AuthUser>>;

#[derive(Debug, Default, Deserialize)]
pub struct PobRequest {
    #[serde(rename = "currentPOB")]
    pub current_pob: Option<Value>,
    #[serde(rename = "maximumPOB")]
    pub maximum_pob: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct InitializeResult {
    pub created: u64,
    pub sites: Vec<Site>,
}

impl PobRequest {
    fn into_update(self) -> Result<SiteUpdate, FieldError> {
        Ok(SiteUpdate {
            current_pob: self
                .current_pob
                .as_ref()
                .filter(|v| !v.is_null())
                .map(validation::current_pob)
                .transpose()?,
            maximum_pob: self
                .maximum_pob
                .as_ref()
                .filter(|v| !v.is_null())
                .map(validation::maximum_pob)
                .transpose()?,
        })
    }
}

fn site_name(raw: &str) -> Result<String, FieldError> {
    validation::required_text("siteName", Some(raw))
}

async fn upsert(site_name: String, update: SiteUpdate) -> Result<Site, ApiError> {
    let default_maximum = config::config().sites.default_maximum_pob;
    let insert = SiteInsert::from_update(&site_name, &update, default_maximum);
    Ok(SiteService::new().await?.upsert(insert, update).await?)
}

/// GET /api/sites
pub async fn list() -> ApiResult<Vec<Site>> {
    let sites = SiteService::new().await?.list().await?;
    Ok(ApiResponse::success(sites))
}

/// GET /api/sites/:siteName
pub async fn get(Path(name): Path<String>) -> ApiResult<Site> {
    let site = SiteService::new().await?.get_by_name(&site_name(&name)?).await?;
    Ok(ApiResponse::success(site))
}

/// PUT /api/sites/:siteName/pob - current POB required, maximum optional
pub async fn update_pob(
    user: Identity,
    Path(name): Path<String>,
    ApiJson(body): ApiJson<PobRequest>,
) -> ApiResult<Site> {
    let name = site_name(&name)?;
    let update = body.into_update()?;
    if update.current_pob.is_none() {
        return Err(ApiError::field_error("currentPOB", "currentPOB is required"));
    }

    let site = upsert(name, update).await?;
    info!(
        "POB for {} set to {}/{} by {}",
        site.site_name,
        site.current_pob,
        site.maximum_pob,
        actor(&user)
    );
    Ok(ApiResponse::success(site))
}

/// PUT /api/sites/:siteName - current and/or maximum POB
pub async fn update(
    user: Identity,
    Path(name): Path<String>,
    ApiJson(body): ApiJson<PobRequest>,
) -> ApiResult<Site> {
    let name = site_name(&name)?;
    let update = body.into_update()?;
    if update.current_pob.is_none() && update.maximum_pob.is_none() {
        return Err(ApiError::bad_request("currentPOB or maximumPOB is required"));
    }

    let site = upsert(name, update).await?;
    info!("Site {} updated by {}", site.site_name, actor(&user));
    Ok(ApiResponse::success(site))
}

/// POST /api/sites/initialize - seed the configured sites; safe to repeat
pub async fn initialize(user: Identity) -> ApiResult<InitializeResult> {
    let sites_config = &config::config().sites;
    let result = SiteService::new()
        .await?
        .initialize(&sites_config.known_sites, sites_config.default_maximum_pob)
        .await?;

    info!("Sites initialized by {} ({} created)", actor(&user), result.created);
    Ok(ApiResponse::success(InitializeResult {
        created: result.created,
        sites: result.sites,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pob(body: Value) -> Result<SiteUpdate, FieldError> {
        serde_json::from_value::<PobRequest>(body).unwrap().into_update()
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let update = pob(json!({ "currentPOB": "42", "maximumPOB": 120 })).unwrap();
        assert_eq!(update.current_pob, Some(42));
        assert_eq!(update.maximum_pob, Some(120));
    }

    #[test]
    fn bounds_are_enforced() {
        assert_eq!(pob(json!({ "currentPOB": -1 })).unwrap_err().field, "currentPOB");
        assert_eq!(pob(json!({ "maximumPOB": 0 })).unwrap_err().field, "maximumPOB");
        assert_eq!(pob(json!({ "currentPOB": 0 })).unwrap().current_pob, Some(0));
    }

    #[test]
    fn null_means_absent() {
        let update = pob(json!({ "currentPOB": null, "maximumPOB": 60 })).unwrap();
        assert!(update.current_pob.is_none());
        assert_eq!(update.maximum_pob, Some(60));
    }
}
