use super::require_user;
use crate::common::error::{KlozbuyError, Result};
use crate::common::pagination::Page;
use crate::domain::{Follow, FollowFilter, NewFollow, User};
use crate::storage::Storage;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

/// Create a follow edge. Both counters move in the same write.
pub async fn follow(storage: &dyn Storage, input: NewFollow) -> Result<Follow> {
    if input.follower_id == input.following_id {
        return Err(KlozbuyError::invalid(
            "followingId",
            "users cannot follow themselves",
        ));
    }
    let follow = Follow {
        id: Uuid::new_v4(),
        follower_id: input.follower_id,
        following_id: input.following_id,
        created_at: Utc::now(),
    };
    storage.insert_follow(&follow).await?;
    info!("{} followed {}", follow.follower_id, follow.following_id);
    Ok(follow)
}

pub async fn unfollow(storage: &dyn Storage, follower_id: Uuid, following_id: Uuid) -> Result<()> {
    let follow = storage
        .find_follow(follower_id, following_id)
        .await?
        .ok_or_else(|| KlozbuyError::not_found("follow", format!("{follower_id} -> {following_id}")))?;
    delete_follow(storage, follow.id).await
}

pub async fn delete_follow(storage: &dyn Storage, id: Uuid) -> Result<()> {
    if storage.delete_follow(id).await? {
        info!("Removed follow {}", id);
        Ok(())
    } else {
        Err(KlozbuyError::not_found("follow", id))
    }
}

pub async fn get_follow(storage: &dyn Storage, id: Uuid) -> Result<Follow> {
    storage
        .get_follow(id)
        .await?
        .ok_or_else(|| KlozbuyError::not_found("follow", id))
}

pub async fn list_follows(storage: &dyn Storage, page: Page, filter: &FollowFilter) -> Result<Vec<Follow>> {
    storage.list_follows(filter, page).await
}

pub async fn is_following(storage: &dyn Storage, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
    debug!("Checking whether {} follows {}", follower_id, following_id);
    Ok(storage.find_follow(follower_id, following_id).await?.is_some())
}

/// Users following `user_id`, most recent first.
pub async fn followers_of(storage: &dyn Storage, user_id: Uuid, page: Page) -> Result<Vec<User>> {
    require_user(storage, user_id).await?;
    storage.list_followers(user_id, page).await
}

/// Users `user_id` follows, most recent first.
pub async fn following_of(storage: &dyn Storage, user_id: Uuid, page: Page) -> Result<Vec<User>> {
    require_user(storage, user_id).await?;
    storage.list_following(user_id, page).await
}
