use super::text_enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    MediaType {
        Image => "image",
        Video => "video",
        Document => "document",
        Audio => "audio",
    }
}

pub const MAX_MEDIA_BYTES: i64 = 100 * 1024 * 1024;

/// Type-specific attributes; stored in one detail table per media type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum MediaDetails {
    Image {
        width: u32,
        height: u32,
        alt_text: Option<String>,
    },
    Video {
        duration_seconds: f64,
        width: Option<u32>,
        height: Option<u32>,
        thumbnail_url: Option<String>,
    },
    Document {
        page_count: Option<u32>,
    },
    Audio {
        duration_seconds: f64,
        bitrate_kbps: Option<u32>,
    },
}

impl MediaDetails {
    pub fn media_type(&self) -> MediaType {
        match self {
            MediaDetails::Image { .. } => MediaType::Image,
            MediaDetails::Video { .. } => MediaType::Video,
            MediaDetails::Document { .. } => MediaType::Document,
            MediaDetails::Audio { .. } => MediaType::Audio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub post_id: Option<Uuid>,
    pub media_type: MediaType,
    pub url: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub details: MediaDetails,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedia {
    pub owner_id: Uuid,
    pub post_id: Option<Uuid>,
    pub media_type: MediaType,
    pub url: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub details: MediaDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpdate {
    #[serde(default, deserialize_with = "super::nullable")]
    pub post_id: Option<Option<Uuid>>,
    pub file_name: Option<String>,
    pub details: Option<MediaDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFilter {
    pub owner_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub media_type: Option<MediaType>,
}

impl MediaFilter {
    pub fn matches(&self, media: &Media) -> bool {
        self.owner_id.map_or(true, |id| media.owner_id == id)
            && self.post_id.map_or(true, |id| media.post_id == Some(id))
            && self.media_type.map_or(true, |t| media.media_type == t)
    }
}
