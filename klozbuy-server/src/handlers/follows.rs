use super::{paginated, PageParams};
use crate::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::metrics::DomainMetrics;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use klozbuy_core::services::follows;
use klozbuy_core::{FollowFilter, NewFollow};
use serde_json::json;
use uuid::Uuid;

pub async fn list_follows(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<FollowFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = params.page();
    let items = follows::list_follows(state.store(), page, &filter).await?;
    Ok(paginated(items, page))
}

pub async fn create_follow(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewFollow>,
) -> ApiResult<impl IntoResponse> {
    let follow = follows::follow(state.store(), input).await?;
    DomainMetrics::follow_created();
    Ok((StatusCode::CREATED, Json(follow)))
}

pub async fn get_follow(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(follows::get_follow(state.store(), id).await?))
}

pub async fn delete_follow(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    follows::delete_follow(state.store(), id).await?;
    DomainMetrics::follow_removed();
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/follows?followerId=&followingId=`
pub async fn unfollow(
    State(state): State<AppState>,
    ApiQuery(pair): ApiQuery<NewFollow>,
) -> ApiResult<StatusCode> {
    follows::unfollow(state.store(), pair.follower_id, pair.following_id).await?;
    DomainMetrics::follow_removed();
    Ok(StatusCode::NO_CONTENT)
}

pub async fn follow_status(
    State(state): State<AppState>,
    ApiQuery(pair): ApiQuery<NewFollow>,
) -> ApiResult<impl IntoResponse> {
    let following = follows::is_following(state.store(), pair.follower_id, pair.following_id).await?;
    Ok(Json(json!({ "following": following })))
}
