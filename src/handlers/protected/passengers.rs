use axum::extract::Path;

use crate::database::models::Passenger;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::PassengerService;
use crate::validation;

/// GET /api/passengers
pub async fn list() -> ApiResult<Vec<Passenger>> {
    let passengers = PassengerService::new().await?.list().await?;
    Ok(ApiResponse::success(passengers))
}

/// GET /api/passengers/:id
pub async fn get(Path(id): Path<String>) -> ApiResult<Passenger> {
    let id = validation::id("id", &id)?;
    let passenger = PassengerService::new().await?.get(id).await?;
    Ok(ApiResponse::success(passenger))
}
