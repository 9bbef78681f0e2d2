// handlers/public/trips.rs - Trip CRUD and passenger-count operations
//
// Dates are normalized to `YYYY-MM-DD` on the way in, both for stored values
// and for the filters used to query them.

use axum::{
    extract::{Path, Query},
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::database::models::Trip;
use crate::error::ApiError;
use crate::handlers::actor;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::{Decrement, NewTrip, TripChanges, TripFilter, TripService};
use crate::validation::{self, FieldError};

type Identity = Option<Extension<AuthUser>>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub passenger_id: Option<Value>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub trip_date: Option<Value>,
    pub confirmed: Option<Value>,
    pub passenger_count: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripQuery {
    pub date: Option<String>,
    pub passenger_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountRequest {
    pub passenger_count: Option<Value>,
}

/// Passenger references are stored as strings; numeric ids are accepted
fn passenger_ref(value: Option<&Value>) -> Result<String, FieldError> {
    match value {
        Some(Value::String(s)) => validation::required_text("passengerId", Some(s.as_str())),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Null) | None => Err(FieldError::new("passengerId", "passengerId is required")),
        Some(_) => Err(FieldError::new("passengerId", "passengerId must be a string")),
    }
}

fn required_date(value: Option<&Value>) -> Result<String, FieldError> {
    match value {
        Some(v) if !v.is_null() => validation::trip_date(v),
        _ => Err(FieldError::new("tripDate", "tripDate is required")),
    }
}

impl TripRequest {
    /// Full record for create and replace
    fn into_new_trip(self) -> Result<NewTrip, FieldError> {
        Ok(NewTrip {
            passenger_id: passenger_ref(self.passenger_id.as_ref())?,
            origin: validation::required_text("origin", self.origin.as_deref())?,
            destination: validation::required_text("destination", self.destination.as_deref())?,
            trip_date: required_date(self.trip_date.as_ref())?,
            confirmed: self
                .confirmed
                .as_ref()
                .filter(|v| !v.is_null())
                .map(|v| validation::coerce_bool("confirmed", v))
                .transpose()?
                .unwrap_or(false),
            passenger_count: self
                .passenger_count
                .as_ref()
                .filter(|v| !v.is_null())
                .map(validation::passenger_count)
                .transpose()?,
        })
    }

    /// Only the supplied fields, each validated like on create
    fn into_changes(self) -> Result<TripChanges, FieldError> {
        let present = |v: &Option<Value>| v.as_ref().filter(|v| !v.is_null()).cloned();

        Ok(TripChanges {
            passenger_id: present(&self.passenger_id)
                .map(|v| passenger_ref(Some(&v)))
                .transpose()?,
            origin: validation::text_if_present("origin", self.origin.as_deref())?,
            destination: validation::text_if_present("destination", self.destination.as_deref())?,
            trip_date: present(&self.trip_date).map(|v| validation::trip_date(&v)).transpose()?,
            confirmed: present(&self.confirmed)
                .map(|v| validation::coerce_bool("confirmed", &v))
                .transpose()?,
            passenger_count: present(&self.passenger_count)
                .map(|v| validation::passenger_count(&v))
                .transpose()?,
        })
    }
}

/// GET /api/trips?date=&passengerId=
pub async fn list(Query(query): Query<TripQuery>) -> ApiResult<Vec<Trip>> {
    let filter = TripFilter {
        trip_date: validation::optional_text("date", query.date.as_deref())?
            .map(|d| validation::trip_date_str(&d))
            .transpose()?,
        passenger_id: validation::optional_text("passengerId", query.passenger_id.as_deref())?,
    };

    let trips = TripService::new().await?.list(&filter).await?;
    Ok(ApiResponse::success(trips))
}

/// GET /api/trips/date/:date
pub async fn by_date(Path(date): Path<String>) -> ApiResult<Vec<Trip>> {
    let filter = TripFilter {
        trip_date: Some(validation::trip_date_str(&date)?),
        ..Default::default()
    };
    let trips = TripService::new().await?.list(&filter).await?;
    Ok(ApiResponse::success(trips))
}

/// GET /api/trips/passenger/:passengerId
pub async fn by_passenger(Path(passenger_id): Path<String>) -> ApiResult<Vec<Trip>> {
    let filter = TripFilter {
        passenger_id: Some(validation::required_text("passengerId", Some(passenger_id.as_str()))?),
        ..Default::default()
    };
    let trips = TripService::new().await?.list(&filter).await?;
    Ok(ApiResponse::success(trips))
}

/// GET /api/trips/:id
pub async fn get(Path(id): Path<String>) -> ApiResult<Trip> {
    let id = validation::id("id", &id)?;
    let trip = TripService::new().await?.get(id).await?;
    Ok(ApiResponse::success(trip))
}

/// POST /api/trips
pub async fn create(user: Identity, ApiJson(body): ApiJson<TripRequest>) -> ApiResult<Trip> {
    let new_trip = body.into_new_trip()?;
    let trip = TripService::new().await?.create(new_trip).await?;

    info!(
        "Trip {} created by {} ({} -> {} on {})",
        trip.id,
        actor(&user),
        trip.origin,
        trip.destination,
        trip.trip_date
    );
    Ok(ApiResponse::created(trip))
}

/// PUT /api/trips/:id
pub async fn replace(
    user: Identity,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<TripRequest>,
) -> ApiResult<Trip> {
    let id = validation::id("id", &id)?;
    let trip = TripService::new().await?.replace(id, body.into_new_trip()?).await?;

    info!("Trip {} replaced by {}", trip.id, actor(&user));
    Ok(ApiResponse::success(trip))
}

/// PATCH /api/trips/:id
pub async fn patch(
    user: Identity,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<TripRequest>,
) -> ApiResult<Trip> {
    let id = validation::id("id", &id)?;
    let changes = body.into_changes()?;
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let trip = TripService::new().await?.patch(id, changes).await?;
    info!("Trip {} updated by {}", trip.id, actor(&user));
    Ok(ApiResponse::success(trip))
}

/// DELETE /api/trips/:id
pub async fn delete(user: Identity, Path(id): Path<String>) -> ApiResult<Value> {
    let id = validation::id("id", &id)?;
    TripService::new().await?.delete(id).await?;

    info!("Trip {} deleted by {}", id, actor(&user));
    Ok(ApiResponse::success(json!({ "message": "Trip deleted", "id": id })))
}

/// PATCH /api/trips/:id/count/increment
pub async fn count_increment(user: Identity, Path(id): Path<String>) -> ApiResult<Trip> {
    let id = validation::id("id", &id)?;
    let trip = TripService::new().await?.increment(id).await?;

    info!(
        "Trip {} passenger count raised to {:?} by {}",
        trip.id,
        trip.passenger_count,
        actor(&user)
    );
    Ok(ApiResponse::success(trip))
}

/// PATCH /api/trips/:id/count/decrement
pub async fn count_decrement(user: Identity, Path(id): Path<String>) -> ApiResult<Trip> {
    let id = validation::id("id", &id)?;

    match TripService::new().await?.decrement(id).await? {
        Decrement::Updated(trip) => {
            info!(
                "Trip {} passenger count lowered to {:?} by {}",
                trip.id,
                trip.passenger_count,
                actor(&user)
            );
            Ok(ApiResponse::success(trip))
        }
        Decrement::AtFloor => Err(ApiError::field_error(
            "passengerCount",
            "Passenger count cannot go below 1",
        )),
    }
}

/// PUT /api/trips/:id/count
pub async fn count_set(
    user: Identity,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CountRequest>,
) -> ApiResult<Trip> {
    let id = validation::id("id", &id)?;
    let count = match body.passenger_count.as_ref().filter(|v| !v.is_null()) {
        Some(value) => validation::passenger_count(value)?,
        None => return Err(ApiError::field_error("passengerCount", "passengerCount is required")),
    };

    let trip = TripService::new().await?.set_count(id, count).await?;
    info!("Trip {} passenger count set to {} by {}", trip.id, count, actor(&user));
    Ok(ApiResponse::success(trip))
}
