use super::{json_ld, paginated, PageParams};
use crate::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::metrics::DomainMetrics;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use klozbuy_core::services::posts;
use klozbuy_core::{NewPost, PostFilter, PostUpdate};
use uuid::Uuid;

pub async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<PostFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = params.page();
    let items = posts::list_posts(state.store(), page, &filter).await?;
    Ok(paginated(items, page))
}

pub async fn create_post(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewPost>,
) -> ApiResult<impl IntoResponse> {
    let post = posts::create_post(state.store(), input).await?;
    DomainMetrics::post_created(post.post_type.as_str());
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(posts::get_post(state.store(), id).await?))
}

pub async fn update_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<PostUpdate>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(posts::update_post(state.store(), id, update).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    posts::delete_post(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn structured_data(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Response> {
    Ok(json_ld(posts::structured_data(state.store(), id).await?))
}
