use super::{paginated, PageParams};
use crate::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use klozbuy_core::services::media;
use klozbuy_core::{MediaFilter, MediaUpdate, NewMedia};
use uuid::Uuid;

pub async fn list_media(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<MediaFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = params.page();
    let items = media::list_media(state.store(), page, &filter).await?;
    Ok(paginated(items, page))
}

pub async fn create_media(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewMedia>,
) -> ApiResult<impl IntoResponse> {
    let created = media::create_media(state.store(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_media(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(media::get_media(state.store(), id).await?))
}

pub async fn update_media(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<MediaUpdate>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(media::update_media(state.store(), id, update).await?))
}

pub async fn delete_media(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    media::delete_media(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
