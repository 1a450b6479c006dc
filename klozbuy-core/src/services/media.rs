use super::{require_post, require_user};
use crate::common::error::{KlozbuyError, Result};
use crate::common::pagination::Page;
use crate::domain::*;
use crate::storage::Storage;
use crate::validation::{is_http_url, Validator};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

const FILE_NAME_MAX: usize = 255;

fn mime_matches(media_type: MediaType, mime_type: &str) -> bool {
    let mime = mime_type.trim().to_ascii_lowercase();
    let Some((top, sub)) = mime.split_once('/') else {
        return false;
    };
    if sub.is_empty() {
        return false;
    }
    match media_type {
        MediaType::Image => top == "image",
        MediaType::Video => top == "video",
        MediaType::Audio => top == "audio",
        MediaType::Document => top == "application" || top == "text",
    }
}

fn check_details(v: &mut Validator, media_type: MediaType, details: &MediaDetails) {
    if details.media_type() != media_type {
        v.check(
            false,
            "details.kind",
            format!("must be '{media_type}' to match mediaType"),
        );
        return;
    }
    match details {
        MediaDetails::Image {
            width,
            height,
            alt_text,
        } => {
            v.check(*width > 0, "details.width", "must be greater than 0")
                .check(*height > 0, "details.height", "must be greater than 0")
                .optional_length("details.altText", alt_text.as_deref(), 300);
        }
        MediaDetails::Video {
            duration_seconds,
            width,
            height,
            thumbnail_url,
        } => {
            v.check(
                duration_seconds.is_finite() && *duration_seconds > 0.0,
                "details.durationSeconds",
                "must be greater than 0",
            )
            .check(width.map_or(true, |w| w > 0), "details.width", "must be greater than 0")
            .check(height.map_or(true, |h| h > 0), "details.height", "must be greater than 0")
            .optional_http_url("details.thumbnailUrl", thumbnail_url.as_deref());
        }
        MediaDetails::Document { page_count } => {
            v.check(
                page_count.map_or(true, |p| p > 0),
                "details.pageCount",
                "must be greater than 0",
            );
        }
        MediaDetails::Audio {
            duration_seconds,
            bitrate_kbps,
        } => {
            v.check(
                duration_seconds.is_finite() && *duration_seconds > 0.0,
                "details.durationSeconds",
                "must be greater than 0",
            )
            .check(
                bitrate_kbps.map_or(true, |b| b > 0),
                "details.bitrateKbps",
                "must be greater than 0",
            );
        }
    }
}

/// The post must exist and belong to the media owner.
async fn check_post_owner(storage: &dyn Storage, post_id: Uuid, owner_id: Uuid) -> Result<()> {
    let post = require_post(storage, post_id).await?;
    if post.author_id != owner_id {
        return Err(KlozbuyError::invalid(
            "postId",
            "media can only be attached to the owner's own posts",
        ));
    }
    Ok(())
}

pub async fn create_media(storage: &dyn Storage, input: NewMedia) -> Result<Media> {
    let mut v = Validator::new();
    v.check(is_http_url(&input.url), "url", "must be an http or https URL")
        .length("fileName", &input.file_name, 1, FILE_NAME_MAX)
        .check(
            mime_matches(input.media_type, &input.mime_type),
            "mimeType",
            format!("is not a valid {} type", input.media_type),
        )
        .check(
            input.size_bytes > 0 && input.size_bytes <= MAX_MEDIA_BYTES,
            "sizeBytes",
            "must be between 1 byte and 100 MiB",
        );
    check_details(&mut v, input.media_type, &input.details);
    v.finish()?;

    require_user(storage, input.owner_id).await?;
    if let Some(post_id) = input.post_id {
        check_post_owner(storage, post_id, input.owner_id).await?;
    }

    let media = Media {
        id: Uuid::new_v4(),
        owner_id: input.owner_id,
        post_id: input.post_id,
        media_type: input.media_type,
        url: input.url.trim().to_string(),
        file_name: input.file_name.trim().to_string(),
        mime_type: input.mime_type.trim().to_ascii_lowercase(),
        size_bytes: input.size_bytes,
        details: input.details,
        created_at: Utc::now(),
    };
    storage.insert_media(&media).await?;
    info!(
        "Created {} media {} for {}",
        media.media_type, media.id, media.owner_id
    );
    Ok(media)
}

pub async fn get_media(storage: &dyn Storage, id: Uuid) -> Result<Media> {
    debug!("Fetching media {}", id);
    storage
        .get_media(id)
        .await?
        .ok_or_else(|| KlozbuyError::not_found("media", id))
}

pub async fn list_media(storage: &dyn Storage, page: Page, filter: &MediaFilter) -> Result<Vec<Media>> {
    storage.list_media(filter, page).await
}

/// Media type and URL are fixed; details must keep matching the type.
pub async fn update_media(storage: &dyn Storage, id: Uuid, update: MediaUpdate) -> Result<Media> {
    let mut media = get_media(storage, id).await?;

    let mut v = Validator::new();
    if let Some(file_name) = update.file_name {
        v.length("fileName", &file_name, 1, FILE_NAME_MAX);
        media.file_name = file_name.trim().to_string();
    }
    if let Some(details) = update.details {
        check_details(&mut v, media.media_type, &details);
        media.details = details;
    }
    v.finish()?;

    match update.post_id {
        Some(Some(post_id)) => {
            check_post_owner(storage, post_id, media.owner_id).await?;
            media.post_id = Some(post_id);
        }
        Some(None) => media.post_id = None,
        None => {}
    }
    storage.update_media(&media).await?;
    info!("Updated media {}", media.id);
    Ok(media)
}

pub async fn delete_media(storage: &dyn Storage, id: Uuid) -> Result<()> {
    if storage.delete_media(id).await? {
        info!("Deleted media {}", id);
        Ok(())
    } else {
        Err(KlozbuyError::not_found("media", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{fixtures, posts};

    fn photo(owner_id: Uuid) -> NewMedia {
        NewMedia {
            owner_id,
            post_id: None,
            media_type: MediaType::Image,
            url: "https://cdn.klozbuy.ng/u/ada/ankara.jpg".to_string(),
            file_name: "ankara.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            size_bytes: 245_760,
            details: MediaDetails::Image {
                width: 1080,
                height: 1350,
                alt_text: Some("Ankara print".to_string()),
            },
        }
    }

    async fn post_by(storage: &dyn Storage, author_id: Uuid) -> Post {
        posts::create_post(
            storage,
            NewPost {
                author_id,
                content: "New stock".to_string(),
                ..NewPost::default()
            },
        )
        .await
        .expect("post")
    }

    fn fields(err: KlozbuyError) -> Vec<String> {
        match err {
            KlozbuyError::Validation(issues) => issues.into_iter().map(|i| i.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_and_attach_to_own_post() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let post = post_by(&storage, ada.id).await;
        let mut input = photo(ada.id);
        input.post_id = Some(post.id);
        let media = create_media(&storage, input).await.expect("create");
        assert_eq!(media.post_id, Some(post.id));

        let filter = MediaFilter {
            post_id: Some(post.id),
            ..MediaFilter::default()
        };
        let found = list_media(&storage, Page::default(), &filter).await.expect("list");
        assert_eq!(found, vec![media]);
    }

    #[tokio::test]
    async fn details_must_match_media_type() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let mut input = photo(ada.id);
        input.details = MediaDetails::Audio {
            duration_seconds: 30.0,
            bitrate_kbps: None,
        };
        let err = create_media(&storage, input).await.expect_err("mismatch");
        assert_eq!(fields(err), vec!["details.kind"]);
    }

    #[tokio::test]
    async fn mime_size_and_url_are_checked() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let mut input = photo(ada.id);
        input.mime_type = "video/mp4".to_string();
        input.size_bytes = MAX_MEDIA_BYTES + 1;
        input.url = "ftp://files/ankara.jpg".to_string();
        let err = create_media(&storage, input).await.expect_err("invalid");
        assert_eq!(fields(err), vec!["url", "mimeType", "sizeBytes"]);
    }

    #[test]
    fn documents_accept_application_and_text() {
        assert!(mime_matches(MediaType::Document, "application/pdf"));
        assert!(mime_matches(MediaType::Document, "text/csv"));
        assert!(!mime_matches(MediaType::Document, "image/png"));
        assert!(!mime_matches(MediaType::Image, "image/"));
    }

    #[tokio::test]
    async fn cannot_attach_to_someone_elses_post() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let bola = fixtures::user(&storage, "bola").await;
        let post = post_by(&storage, bola.id).await;
        let mut input = photo(ada.id);
        input.post_id = Some(post.id);
        let err = create_media(&storage, input).await.expect_err("foreign post");
        assert_eq!(fields(err), vec!["postId"]);
    }

    #[tokio::test]
    async fn deleting_the_post_detaches_media() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let post = post_by(&storage, ada.id).await;
        let media = create_media(&storage, photo(ada.id)).await.expect("create");
        let media = update_media(
            &storage,
            media.id,
            MediaUpdate {
                post_id: Some(Some(post.id)),
                ..MediaUpdate::default()
            },
        )
        .await
        .expect("attach");
        assert_eq!(media.post_id, Some(post.id));

        posts::delete_post(&storage, post.id).await.expect("delete post");
        let media = get_media(&storage, media.id).await.expect("media");
        assert_eq!(media.post_id, None);
    }

    #[tokio::test]
    async fn null_post_id_detaches_media() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let post = post_by(&storage, ada.id).await;
        let mut input = photo(ada.id);
        input.post_id = Some(post.id);
        let media = create_media(&storage, input).await.expect("create");

        let update: MediaUpdate =
            serde_json::from_value(serde_json::json!({ "fileName": "ankara-2.jpg" }))
                .expect("update json");
        let renamed = update_media(&storage, media.id, update).await.expect("rename");
        assert_eq!(renamed.post_id, Some(post.id));

        let update: MediaUpdate =
            serde_json::from_value(serde_json::json!({ "postId": null })).expect("update json");
        let detached = update_media(&storage, media.id, update).await.expect("detach");
        assert_eq!(detached.post_id, None);
        assert_eq!(get_media(&storage, media.id).await.expect("media").post_id, None);
    }

    #[tokio::test]
    async fn update_rejects_details_of_another_type() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let media = create_media(&storage, photo(ada.id)).await.expect("create");
        let err = update_media(
            &storage,
            media.id,
            MediaUpdate {
                details: Some(MediaDetails::Document { page_count: Some(3) }),
                ..MediaUpdate::default()
            },
        )
        .await
        .expect_err("mismatch");
        assert_eq!(fields(err), vec!["details.kind"]);

        delete_media(&storage, media.id).await.expect("delete");
        let err = delete_media(&storage, media.id).await.expect_err("gone");
        assert!(matches!(err, KlozbuyError::NotFound { entity: "media", .. }));
    }
}
