use super::{require_post, require_user};
use crate::common::error::{KlozbuyError, Result};
use crate::common::pagination::Page;
use crate::domain::*;
use crate::jsonld;
use crate::storage::Storage;
use crate::text::{extract_hashtags, extract_mentions};
use crate::validation::{clean, Validator};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

const TITLE_MAX: usize = 150;
const CONTENT_MAX: usize = 5000;

/// Fields the post type rules look at.
struct Offer<'a> {
    post_type: PostType,
    price: Option<i64>,
    currency: &'a str,
    event_start: Option<DateTime<Utc>>,
    event_end: Option<DateTime<Utc>>,
}

fn check_type_rules(v: &mut Validator, offer: &Offer<'_>) {
    v.currency("currency", offer.currency);
    if let Some(price) = offer.price {
        v.check(price >= 0, "price", "must not be negative");
    }
    match offer.post_type {
        PostType::Product => {
            v.check(offer.price.is_some(), "price", "is required for product posts");
        }
        PostType::Event => {
            v.check(
                offer.event_start.is_some(),
                "eventStart",
                "is required for event posts",
            );
        }
        PostType::General => {
            v.check(
                offer.price.is_none(),
                "price",
                "is only allowed on product, service and event posts",
            );
            v.check(
                offer.event_start.is_none() && offer.event_end.is_none(),
                "eventStart",
                "is only allowed on event posts",
            );
        }
        PostType::Service => {}
    }
    if let (Some(start), Some(end)) = (offer.event_start, offer.event_end) {
        v.check(end >= start, "eventEnd", "must not be before eventStart");
    }
}

/// Mentions for every `@username` in `content` that names a known user.
async fn resolve_mentions(
    storage: &dyn Storage,
    post_id: Uuid,
    content: &str,
    at: DateTime<Utc>,
) -> Result<Vec<PostMention>> {
    let usernames = extract_mentions(content);
    if usernames.is_empty() {
        return Ok(Vec::new());
    }
    let users = storage.get_users_by_usernames(&usernames).await?;
    Ok(users
        .iter()
        .map(|u| PostMention::new(post_id, u.id, at))
        .collect())
}

pub async fn create_post(storage: &dyn Storage, input: NewPost) -> Result<Post> {
    let post_type = input.post_type.unwrap_or_default();
    let title = clean(input.title);
    let currency = input
        .currency
        .map(|c| c.trim().to_string())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let mut v = Validator::new();
    v.length("content", &input.content, 1, CONTENT_MAX)
        .optional_length("title", title.as_deref(), TITLE_MAX);
    check_type_rules(
        &mut v,
        &Offer {
            post_type,
            price: input.price,
            currency: &currency,
            event_start: input.event_start,
            event_end: input.event_end,
        },
    );
    v.finish()?;

    require_user(storage, input.author_id).await?;

    let now = Utc::now();
    let content = input.content.trim().to_string();
    let post = Post {
        id: Uuid::new_v4(),
        author_id: input.author_id,
        post_type,
        title,
        hashtags: extract_hashtags(&content),
        price: input.price,
        currency,
        event_start: input.event_start,
        event_end: input.event_end,
        location_id: input.location_id,
        likes_count: 0,
        comments_count: 0,
        created_at: now,
        updated_at: now,
        content,
    };
    let mentions = resolve_mentions(storage, post.id, &post.content, now).await?;
    storage.insert_post(&post, &mentions).await?;

    info!(
        "Created {} post {} by {} ({} mentions)",
        post.post_type,
        post.id,
        post.author_id,
        mentions.len()
    );
    Ok(post)
}

pub async fn get_post(storage: &dyn Storage, id: Uuid) -> Result<Post> {
    debug!("Fetching post {}", id);
    require_post(storage, id).await
}

/// Newest first.
pub async fn list_posts(storage: &dyn Storage, page: Page, filter: &PostFilter) -> Result<Vec<Post>> {
    storage.list_posts(filter, page).await
}

/// Posts by accounts `user_id` follows, newest first.
pub async fn feed_for(storage: &dyn Storage, user_id: Uuid, page: Page) -> Result<Vec<Post>> {
    require_user(storage, user_id).await?;
    storage.feed_for(user_id, page).await
}

pub async fn update_post(storage: &dyn Storage, id: Uuid, update: PostUpdate) -> Result<Post> {
    let mut post = require_post(storage, id).await?;

    let mut v = Validator::new();
    if update.title.is_some() {
        post.title = clean(update.title);
        v.optional_length("title", post.title.as_deref(), TITLE_MAX);
    }
    let content_changed = match update.content {
        Some(content) if content.trim() != post.content => {
            v.length("content", &content, 1, CONTENT_MAX);
            post.content = content.trim().to_string();
            true
        }
        _ => false,
    };
    if let Some(price) = update.price {
        post.price = price;
    }
    if let Some(currency) = update.currency {
        post.currency = currency.trim().to_string();
    }
    if let Some(start) = update.event_start {
        post.event_start = start;
    }
    if let Some(end) = update.event_end {
        post.event_end = end;
    }
    if let Some(location_id) = update.location_id {
        post.location_id = location_id;
    }
    check_type_rules(
        &mut v,
        &Offer {
            post_type: post.post_type,
            price: post.price,
            currency: &post.currency,
            event_start: post.event_start,
            event_end: post.event_end,
        },
    );
    v.finish()?;

    let now = Utc::now();
    post.updated_at = now;
    let new_mentions = if content_changed {
        post.hashtags = extract_hashtags(&post.content);
        resolve_mentions(storage, post.id, &post.content, now).await?
    } else {
        Vec::new()
    };
    storage.update_post(&post, &new_mentions).await?;
    info!("Updated post {}", post.id);
    Ok(post)
}

pub async fn delete_post(storage: &dyn Storage, id: Uuid) -> Result<()> {
    if storage.delete_post(id).await? {
        info!("Deleted post {}", id);
        Ok(())
    } else {
        Err(KlozbuyError::not_found("post", id))
    }
}

/// JSON-LD for a post, typed by its post type.
pub async fn structured_data(storage: &dyn Storage, id: Uuid) -> Result<Value> {
    let post = require_post(storage, id).await?;
    let author = require_user(storage, post.author_id).await?;
    let business = storage.get_business_profile_by_user(author.id).await?;
    let location = match post.location_id {
        Some(location_id) => storage.get_location(location_id).await?,
        None => None,
    };
    jsonld::post_document(&post, &author, business.as_ref(), location.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{fixtures, follows, mentions};
    use chrono::Duration;

    fn new_post(author_id: Uuid, content: &str) -> NewPost {
        NewPost {
            author_id,
            content: content.to_string(),
            ..NewPost::default()
        }
    }

    fn issue_fields(err: KlozbuyError) -> Vec<String> {
        match err {
            KlozbuyError::Validation(issues) => issues.into_iter().map(|i| i.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_derives_hashtags_mentions_and_bumps_count() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let bola = fixtures::user(&storage, "bola").await;

        let post = create_post(
            &storage,
            new_post(ada.id, "Suya night at #Yaba with @Bola and @nobody #yaba"),
        )
        .await
        .expect("create");
        assert_eq!(post.post_type, PostType::General);
        assert_eq!(post.currency, "NGN");
        assert_eq!(post.hashtags, vec!["yaba"]);

        let found = mentions::mentions_for_post(&storage, post.id, Page::default())
            .await
            .expect("mentions");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].mentioned_user_id, bola.id);

        let ada = require_user(&storage, ada.id).await.expect("author");
        assert_eq!(ada.posts_count, 1);
    }

    #[tokio::test]
    async fn unknown_author_is_not_found() {
        let storage = fixtures::storage();
        let err = create_post(&storage, new_post(Uuid::new_v4(), "hello"))
            .await
            .expect_err("no author");
        assert!(matches!(err, KlozbuyError::NotFound { entity: "user", .. }));
    }

    #[tokio::test]
    async fn product_requires_price() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let mut input = new_post(ada.id, "Tokunbo fridge for sale");
        input.post_type = Some(PostType::Product);
        let err = create_post(&storage, input.clone()).await.expect_err("no price");
        assert_eq!(issue_fields(err), vec!["price"]);

        input.price = Some(8_500_000);
        let post = create_post(&storage, input).await.expect("priced");
        assert_eq!(post.price, Some(8_500_000));
    }

    #[tokio::test]
    async fn event_rules_are_checked() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let start = Utc::now() + Duration::days(3);

        let mut input = new_post(ada.id, "Owambe on Saturday");
        input.post_type = Some(PostType::Event);
        let err = create_post(&storage, input.clone()).await.expect_err("no start");
        assert_eq!(issue_fields(err), vec!["eventStart"]);

        input.event_start = Some(start);
        input.event_end = Some(start - Duration::hours(1));
        let err = create_post(&storage, input.clone()).await.expect_err("end first");
        assert_eq!(issue_fields(err), vec!["eventEnd"]);

        input.event_end = Some(start + Duration::hours(5));
        create_post(&storage, input).await.expect("valid event");
    }

    #[tokio::test]
    async fn general_posts_carry_no_price_or_dates() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let mut input = new_post(ada.id, "Good morning Surulere");
        input.price = Some(100);
        input.event_start = Some(Utc::now());
        input.currency = Some("naira".to_string());
        let err = create_post(&storage, input).await.expect_err("invalid");
        assert_eq!(issue_fields(err), vec!["currency", "price", "eventStart"]);
    }

    #[tokio::test]
    async fn update_keeps_type_and_rederives_tags() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let chidi = fixtures::user(&storage, "chidi").await;
        let post = create_post(&storage, new_post(ada.id, "Fresh #bread"))
            .await
            .expect("create");

        let updated = update_post(
            &storage,
            post.id,
            PostUpdate {
                content: Some("Fresh #agege bread, ask @chidi".to_string()),
                ..PostUpdate::default()
            },
        )
        .await
        .expect("update");
        assert_eq!(updated.post_type, PostType::General);
        assert_eq!(updated.hashtags, vec!["agege"]);
        assert!(updated.updated_at >= post.updated_at);

        let found = mentions::mentions_for_post(&storage, post.id, Page::default())
            .await
            .expect("mentions");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].mentioned_user_id, chidi.id);

        let err = update_post(
            &storage,
            post.id,
            PostUpdate {
                price: Some(Some(500)),
                ..PostUpdate::default()
            },
        )
        .await
        .expect_err("general with price");
        assert_eq!(issue_fields(err), vec!["price"]);
    }

    #[tokio::test]
    async fn null_clears_price_and_event_end() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let yaba = fixtures::location(&storage, "Yaba").await;
        let mut input = new_post(ada.id, "Braids at home");
        input.post_type = Some(PostType::Service);
        input.price = Some(500);
        input.location_id = Some(yaba.id);
        let service = create_post(&storage, input).await.expect("service");

        let update: PostUpdate =
            serde_json::from_value(serde_json::json!({ "price": null })).expect("update json");
        let updated = update_post(&storage, service.id, update).await.expect("clear price");
        assert_eq!(updated.price, None);
        assert_eq!(updated.location_id, Some(yaba.id));

        let update: PostUpdate =
            serde_json::from_value(serde_json::json!({ "locationId": null })).expect("update json");
        let updated = update_post(&storage, service.id, update).await.expect("clear location");
        assert_eq!(updated.location_id, None);

        let start = Utc::now() + Duration::days(3);
        let mut input = new_post(ada.id, "Owambe on Saturday");
        input.post_type = Some(PostType::Event);
        input.event_start = Some(start);
        input.event_end = Some(start + Duration::hours(6));
        let event = create_post(&storage, input).await.expect("event");

        let update: PostUpdate =
            serde_json::from_value(serde_json::json!({ "eventEnd": null })).expect("update json");
        let updated = update_post(&storage, event.id, update).await.expect("clear end");
        assert_eq!(updated.event_end, None);
        assert_eq!(updated.event_start, Some(start));

        // Event posts still need a start time.
        let update: PostUpdate =
            serde_json::from_value(serde_json::json!({ "eventStart": null })).expect("update json");
        let err = update_post(&storage, event.id, update).await.expect_err("start required");
        assert_eq!(issue_fields(err), vec!["eventStart"]);
    }

    #[test]
    fn absent_fields_are_kept_and_null_clears() {
        let update: PostUpdate =
            serde_json::from_value(serde_json::json!({ "title": "Sale", "price": null }))
                .expect("update json");
        assert_eq!(update.price, Some(None));
        assert_eq!(update.event_end, None);
        assert_eq!(update.location_id, None);

        let update: PostUpdate =
            serde_json::from_value(serde_json::json!({ "price": 1500 })).expect("update json");
        assert_eq!(update.price, Some(Some(1500)));
    }

    #[tokio::test]
    async fn hashtag_filter_ignores_sigil_and_case() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        create_post(&storage, new_post(ada.id, "#Jollof wars")).await.expect("one");
        create_post(&storage, new_post(ada.id, "plain post")).await.expect("two");
        let filter = PostFilter {
            hashtag: Some("#JOLLOF".to_string()),
            ..PostFilter::default()
        };
        let found = list_posts(&storage, Page::default(), &filter).await.expect("list");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content, "#Jollof wars");
    }

    #[tokio::test]
    async fn feed_shows_followed_authors_newest_first() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let bola = fixtures::user(&storage, "bola").await;
        let chidi = fixtures::user(&storage, "chidi").await;
        follows::follow(
            &storage,
            NewFollow {
                follower_id: ada.id,
                following_id: bola.id,
            },
        )
        .await
        .expect("follow");

        let older = create_post(&storage, new_post(bola.id, "first")).await.expect("older");
        create_post(&storage, new_post(chidi.id, "not followed")).await.expect("other");
        let newer = create_post(&storage, new_post(bola.id, "second")).await.expect("newer");

        let feed = feed_for(&storage, ada.id, Page::default()).await.expect("feed");
        let ids: Vec<_> = feed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn delete_cascades_and_missing_post_is_not_found() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        fixtures::user(&storage, "bola").await;
        let post = create_post(&storage, new_post(ada.id, "hi @bola")).await.expect("create");

        delete_post(&storage, post.id).await.expect("delete");
        let ada = require_user(&storage, ada.id).await.expect("author");
        assert_eq!(ada.posts_count, 0);
        let left = storage
            .list_mentions(&MentionFilter::default(), Page::default())
            .await
            .expect("mentions");
        assert!(left.is_empty());

        let err = delete_post(&storage, post.id).await.expect_err("gone");
        assert!(matches!(err, KlozbuyError::NotFound { entity: "post", .. }));
    }

    #[tokio::test]
    async fn structured_data_follows_post_type() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let mut input = new_post(ada.id, "Ankara fabric, 6 yards");
        input.post_type = Some(PostType::Product);
        input.price = Some(1_200_000);
        let post = create_post(&storage, input).await.expect("create");

        let doc = structured_data(&storage, post.id).await.expect("json-ld");
        assert_eq!(doc["@context"], "https://schema.org");
        assert_eq!(doc["@type"], "Product");
        assert_eq!(doc["offers"]["price"], "12000.00");
    }
}
