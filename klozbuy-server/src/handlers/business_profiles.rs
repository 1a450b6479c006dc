use super::{json_ld, paginated, PageParams};
use crate::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use klozbuy_core::services::business_profiles;
use klozbuy_core::{BusinessProfileFilter, BusinessProfileUpdate, NewBusinessProfile};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct Verification {
    pub verified: bool,
}

pub async fn list_profiles(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<BusinessProfileFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = params.page();
    let items = business_profiles::list_profiles(state.store(), page, &filter).await?;
    Ok(paginated(items, page))
}

pub async fn create_profile(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewBusinessProfile>,
) -> ApiResult<impl IntoResponse> {
    let profile = business_profiles::create_profile(state.store(), input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(business_profiles::get_profile(state.store(), id).await?))
}

pub async fn get_profile_by_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        business_profiles::get_profile_by_user(state.store(), user_id).await?,
    ))
}

pub async fn update_profile(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<BusinessProfileUpdate>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        business_profiles::update_profile(state.store(), id, update).await?,
    ))
}

pub async fn set_verification(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<Verification>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        business_profiles::set_verified(state.store(), id, body.verified).await?,
    ))
}

pub async fn delete_profile(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    business_profiles::delete_profile(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn structured_data(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Response> {
    Ok(json_ld(business_profiles::structured_data(state.store(), id).await?))
}
