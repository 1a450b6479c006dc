use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A directed edge: `follower_id` follows `following_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFollow {
    pub follower_id: Uuid,
    pub following_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowFilter {
    pub follower_id: Option<Uuid>,
    pub following_id: Option<Uuid>,
}

impl FollowFilter {
    pub fn matches(&self, follow: &Follow) -> bool {
        self.follower_id.map_or(true, |id| follow.follower_id == id)
            && self.following_id.map_or(true, |id| follow.following_id == id)
    }
}
