use super::{paginated, PageParams};
use crate::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use klozbuy_core::services::mentions;
use klozbuy_core::{MentionFilter, NewPostMention};
use uuid::Uuid;

/// Filtering by only `postId` or only `userId` requires that entity to exist.
pub async fn list_mentions(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<MentionFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = params.page();
    let store = state.store();
    let items = match (filter.post_id, filter.user_id) {
        (Some(post_id), None) => mentions::mentions_for_post(store, post_id, page).await?,
        (None, Some(user_id)) => mentions::mentions_of_user(store, user_id, page).await?,
        _ => mentions::list_mentions(store, page, &filter).await?,
    };
    Ok(paginated(items, page))
}

pub async fn create_mention(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewPostMention>,
) -> ApiResult<impl IntoResponse> {
    let mention = mentions::create_mention(state.store(), input).await?;
    Ok((StatusCode::CREATED, Json(mention)))
}

pub async fn delete_mention(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    mentions::delete_mention(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
