use super::{paginated, PageParams};
use crate::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::metrics::DomainMetrics;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use klozbuy_core::services::{follows, posts, users};
use klozbuy_core::{NewUser, UserFilter, UserUpdate};
use uuid::Uuid;

pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = params.page();
    let items = users::list_users(state.store(), page, &filter).await?;
    Ok(paginated(items, page))
}

pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewUser>,
) -> ApiResult<impl IntoResponse> {
    let user = users::create_user(state.store(), input).await?;
    DomainMetrics::user_created();
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(users::get_user(state.store(), id).await?))
}

pub async fn get_user_by_username(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(users::get_user_by_username(state.store(), &username).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(users::update_user(state.store(), id, update).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    users::delete_user(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn followers(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let page = params.page();
    let items = follows::followers_of(state.store(), id, page).await?;
    Ok(paginated(items, page))
}

pub async fn following(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let page = params.page();
    let items = follows::following_of(state.store(), id, page).await?;
    Ok(paginated(items, page))
}

pub async fn feed(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let page = params.page();
    let items = posts::feed_for(state.store(), id, page).await?;
    Ok(paginated(items, page))
}
