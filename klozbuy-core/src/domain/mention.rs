use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMention {
    pub id: Uuid,
    pub post_id: Uuid,
    pub mentioned_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl PostMention {
    pub fn new(post_id: Uuid, mentioned_user_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            mentioned_user_id,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPostMention {
    pub post_id: Uuid,
    pub mentioned_user_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionFilter {
    pub post_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl MentionFilter {
    pub fn matches(&self, mention: &PostMention) -> bool {
        self.post_id.map_or(true, |id| mention.post_id == id)
            && self.user_id.map_or(true, |id| mention.mentioned_user_id == id)
    }
}
