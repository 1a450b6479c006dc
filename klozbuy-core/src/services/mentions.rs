use super::{require_post, require_user};
use crate::common::error::{KlozbuyError, Result};
use crate::common::pagination::Page;
use crate::domain::{MentionFilter, NewPostMention, PostMention};
use crate::storage::Storage;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

pub async fn create_mention(storage: &dyn Storage, input: NewPostMention) -> Result<PostMention> {
    let mention = PostMention::new(input.post_id, input.mentioned_user_id, Utc::now());
    storage.insert_mention(&mention).await?;
    info!(
        "Mentioned {} in post {}",
        mention.mentioned_user_id, mention.post_id
    );
    Ok(mention)
}

pub async fn mentions_for_post(
    storage: &dyn Storage,
    post_id: Uuid,
    page: Page,
) -> Result<Vec<PostMention>> {
    require_post(storage, post_id).await?;
    let filter = MentionFilter {
        post_id: Some(post_id),
        user_id: None,
    };
    storage.list_mentions(&filter, page).await
}

pub async fn mentions_of_user(
    storage: &dyn Storage,
    user_id: Uuid,
    page: Page,
) -> Result<Vec<PostMention>> {
    require_user(storage, user_id).await?;
    let filter = MentionFilter {
        post_id: None,
        user_id: Some(user_id),
    };
    storage.list_mentions(&filter, page).await
}

pub async fn list_mentions(
    storage: &dyn Storage,
    page: Page,
    filter: &MentionFilter,
) -> Result<Vec<PostMention>> {
    storage.list_mentions(filter, page).await
}

pub async fn delete_mention(storage: &dyn Storage, id: Uuid) -> Result<()> {
    if storage.delete_mention(id).await? {
        info!("Deleted mention {}", id);
        Ok(())
    } else {
        Err(KlozbuyError::not_found("post mention", id))
    }
}
