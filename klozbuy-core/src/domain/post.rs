use super::text_enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    PostType {
        General => "general",
        Product => "product",
        Service => "service",
        Event => "event",
    }
}

impl Default for PostType {
    fn default() -> Self {
        PostType::General
    }
}

pub const DEFAULT_CURRENCY: &str = "NGN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub post_type: PostType,
    pub title: Option<String>,
    pub content: String,
    /// Price in minor currency units (kobo for NGN).
    pub price: Option<i64>,
    pub currency: String,
    pub event_start: Option<DateTime<Utc>>,
    pub event_end: Option<DateTime<Utc>>,
    pub location_id: Option<Uuid>,
    pub hashtags: Vec<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub author_id: Uuid,
    pub post_type: Option<PostType>,
    pub title: Option<String>,
    pub content: String,
    pub price: Option<i64>,
    pub currency: Option<String>,
    pub event_start: Option<DateTime<Utc>>,
    pub event_end: Option<DateTime<Utc>>,
    pub location_id: Option<Uuid>,
}

/// Partial update. The post type is fixed at creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    /// `null` clears; the same holds for the event times and location.
    #[serde(default, deserialize_with = "super::nullable")]
    pub price: Option<Option<i64>>,
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub event_start: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub event_end: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub location_id: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    pub author_id: Option<Uuid>,
    pub post_type: Option<PostType>,
    pub hashtag: Option<String>,
    pub location_id: Option<Uuid>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        if self.author_id.is_some_and(|id| post.author_id != id) {
            return false;
        }
        if self.post_type.is_some_and(|t| post.post_type != t) {
            return false;
        }
        if self.location_id.is_some_and(|id| post.location_id != Some(id)) {
            return false;
        }
        match self.normalized_hashtag() {
            Some(tag) => post.hashtags.iter().any(|h| *h == tag),
            None => true,
        }
    }

    /// The hashtag filter lowercased and stripped of a leading `#`.
    pub fn normalized_hashtag(&self) -> Option<String> {
        self.hashtag
            .as_deref()
            .map(|t| t.trim().trim_start_matches('#').to_lowercase())
            .filter(|t| !t.is_empty())
    }
}
