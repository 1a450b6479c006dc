use super::{paginated, PageParams};
use crate::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use klozbuy_core::services::locations;
use klozbuy_core::{LocationFilter, LocationUpdate, NewLocation};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyParams {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
}

pub async fn list_locations(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<LocationFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = params.page();
    let items = locations::list_locations(state.store(), page, &filter).await?;
    Ok(paginated(items, page))
}

pub async fn create_location(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewLocation>,
) -> ApiResult<impl IntoResponse> {
    let location = locations::create_location(state.store(), input).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn nearby(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(origin): ApiQuery<NearbyParams>,
) -> ApiResult<impl IntoResponse> {
    let page = params.page();
    let items =
        locations::nearby(state.store(), origin.lat, origin.lon, origin.radius_km, page).await?;
    Ok(paginated(items, page))
}

pub async fn get_location(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(locations::get_location(state.store(), id).await?))
}

pub async fn update_location(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<LocationUpdate>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(locations::update_location(state.store(), id, update).await?))
}

pub async fn delete_location(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    locations::delete_location(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
