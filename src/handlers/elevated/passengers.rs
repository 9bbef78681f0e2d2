// handlers/elevated/passengers.rs - Passenger management (admin only)

use axum::{extract::Path, Extension};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::database::models::Passenger;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::{NewPassenger, PassengerChanges, PassengerService};
use crate::validation::{self, FieldError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_role: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedPassenger {
    pub id: Uuid,
    pub deleted_trips: u64,
    pub message: String,
}

impl PassengerRequest {
    fn into_new(self) -> Result<NewPassenger, FieldError> {
        Ok(NewPassenger {
            first_name: validation::required_text("firstName", self.first_name.as_deref())?,
            last_name: validation::required_text("lastName", self.last_name.as_deref())?,
            job_role: validation::optional_text("jobRole", self.job_role.as_deref())?,
        })
    }

    fn into_changes(self) -> Result<PassengerChanges, FieldError> {
        Ok(PassengerChanges {
            first_name: validation::text_if_present("firstName", self.first_name.as_deref())?,
            last_name: validation::text_if_present("lastName", self.last_name.as_deref())?,
            job_role: validation::optional_text("jobRole", self.job_role.as_deref())?,
        })
    }
}

/// POST /api/passengers
pub async fn create(
    Extension(admin): Extension<AuthUser>,
    ApiJson(body): ApiJson<PassengerRequest>,
) -> ApiResult<Passenger> {
    let passenger = PassengerService::new().await?.create(body.into_new()?).await?;

    info!("Passenger {} created by {}", passenger.id, admin.user.username);
    Ok(ApiResponse::created(passenger))
}

/// PUT /api/passengers/:id
pub async fn update(
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<PassengerRequest>,
) -> ApiResult<Passenger> {
    let id = validation::id("id", &id)?;
    let changes = body.into_changes()?;
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let passenger = PassengerService::new().await?.update(id, changes).await?;
    info!("Passenger {} updated by {}", passenger.id, admin.user.username);
    Ok(ApiResponse::success(passenger))
}

/// DELETE /api/passengers/:id - also removes every trip for the passenger
pub async fn delete(Extension(admin): Extension<AuthUser>, Path(id): Path<String>) -> ApiResult<DeletedPassenger> {
    let id = validation::id("id", &id)?;
    let deleted_trips = PassengerService::new().await?.delete_cascade(id).await?;

    info!("Passenger {} deleted by {}", id, admin.user.username);
    Ok(ApiResponse::success(DeletedPassenger {
        id,
        deleted_trips,
        message: format!("Passenger and {} associated trips deleted", deleted_trips),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_are_required_on_create() {
        let request: PassengerRequest = serde_json::from_value(json!({ "firstName": "Ana" })).unwrap();
        assert_eq!(request.into_new().unwrap_err().field, "lastName");
    }

    #[test]
    fn job_role_is_optional() {
        let request: PassengerRequest =
            serde_json::from_value(json!({ "firstName": " Ana ", "lastName": "Silva", "jobRole": "" })).unwrap();
        let passenger = request.into_new().unwrap();
        assert_eq!(passenger.first_name, "Ana");
        assert!(passenger.job_role.is_none());
    }
}
