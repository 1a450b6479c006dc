use crate::common::error::Result;
use crate::common::pagination::Page;
use crate::domain::*;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence for every entity.
///
/// Each method is one logical write or read. Implementations apply a row
/// change and the counters it affects atomically, enforce uniqueness by
/// returning [`KlozbuyError::Conflict`](crate::common::error::KlozbuyError),
/// and apply the cascade/set-null rules on delete. Delete methods return
/// `false` when the row did not exist.
#[async_trait]
pub trait Storage: Send + Sync {
    // User operations
    async fn insert_user(&self, user: &User) -> Result<()>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_users_by_usernames(&self, usernames: &[String]) -> Result<Vec<User>>;
    async fn list_users(&self, filter: &UserFilter, page: Page) -> Result<Vec<User>>;
    async fn update_user(&self, user: &User) -> Result<()>;
    async fn delete_user(&self, id: Uuid) -> Result<bool>;

    // Post operations. Inserting a post bumps the author's post count and
    // stores the given mentions in the same write.
    async fn insert_post(&self, post: &Post, mentions: &[PostMention]) -> Result<()>;
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>>;
    async fn list_posts(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>>;
    async fn feed_for(&self, user_id: Uuid, page: Page) -> Result<Vec<Post>>;
    /// Mentions already present for the post are skipped.
    async fn update_post(&self, post: &Post, new_mentions: &[PostMention]) -> Result<()>;
    async fn delete_post(&self, id: Uuid) -> Result<bool>;

    // Follow operations
    async fn insert_follow(&self, follow: &Follow) -> Result<()>;
    async fn get_follow(&self, id: Uuid) -> Result<Option<Follow>>;
    async fn find_follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<Option<Follow>>;
    async fn list_follows(&self, filter: &FollowFilter, page: Page) -> Result<Vec<Follow>>;
    async fn list_followers(&self, user_id: Uuid, page: Page) -> Result<Vec<User>>;
    async fn list_following(&self, user_id: Uuid, page: Page) -> Result<Vec<User>>;
    async fn delete_follow(&self, id: Uuid) -> Result<bool>;

    // Location operations
    async fn insert_location(&self, location: &Location) -> Result<()>;
    async fn get_location(&self, id: Uuid) -> Result<Option<Location>>;
    async fn list_locations(&self, filter: &LocationFilter, page: Page) -> Result<Vec<Location>>;
    async fn locations_within(&self, bbox: BoundingBox) -> Result<Vec<Location>>;
    async fn update_location(&self, location: &Location) -> Result<()>;
    async fn delete_location(&self, id: Uuid) -> Result<bool>;

    // Media operations
    async fn insert_media(&self, media: &Media) -> Result<()>;
    async fn get_media(&self, id: Uuid) -> Result<Option<Media>>;
    async fn list_media(&self, filter: &MediaFilter, page: Page) -> Result<Vec<Media>>;
    async fn update_media(&self, media: &Media) -> Result<()>;
    async fn delete_media(&self, id: Uuid) -> Result<bool>;

    // Business profile operations
    async fn insert_business_profile(&self, profile: &BusinessProfile) -> Result<()>;
    async fn get_business_profile(&self, id: Uuid) -> Result<Option<BusinessProfile>>;
    async fn get_business_profile_by_user(&self, user_id: Uuid) -> Result<Option<BusinessProfile>>;
    async fn list_business_profiles(
        &self,
        filter: &BusinessProfileFilter,
        page: Page,
    ) -> Result<Vec<BusinessProfile>>;
    async fn update_business_profile(&self, profile: &BusinessProfile) -> Result<()>;
    async fn delete_business_profile(&self, id: Uuid) -> Result<bool>;

    // Post mention operations
    async fn insert_mention(&self, mention: &PostMention) -> Result<()>;
    async fn get_mention(&self, id: Uuid) -> Result<Option<PostMention>>;
    async fn list_mentions(&self, filter: &MentionFilter, page: Page) -> Result<Vec<PostMention>>;
    async fn delete_mention(&self, id: Uuid) -> Result<bool>;
}
