use super::require_user;
use crate::common::error::{KlozbuyError, Result};
use crate::common::pagination::Page;
use crate::domain::{NewUser, User, UserFilter, UserType, UserUpdate};
use crate::storage::Storage;
use crate::validation::{clean, Validator};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

const DISPLAY_NAME_MAX: usize = 80;
const BIO_MAX: usize = 500;
const PHONE_MAX: usize = 20;

pub async fn create_user(storage: &dyn Storage, input: NewUser) -> Result<User> {
    let username = input.username.trim().to_string();
    let email = input.email.trim().to_lowercase();
    let bio = clean(input.bio);
    let avatar_url = clean(input.avatar_url);
    let phone = clean(input.phone);

    Validator::new()
        .username("username", &username)
        .email("email", &email)
        .length("displayName", &input.display_name, 1, DISPLAY_NAME_MAX)
        .optional_length("bio", bio.as_deref(), BIO_MAX)
        .optional_http_url("avatarUrl", avatar_url.as_deref())
        .optional_length("phone", phone.as_deref(), PHONE_MAX)
        .finish()?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        username,
        email,
        display_name: input.display_name.trim().to_string(),
        bio,
        avatar_url,
        phone,
        user_type: input.user_type.unwrap_or_default(),
        location_id: input.location_id,
        followers_count: 0,
        following_count: 0,
        posts_count: 0,
        created_at: now,
        updated_at: now,
    };
    storage.insert_user(&user).await?;
    info!("Created {} user {} ({})", user.user_type, user.username, user.id);
    Ok(user)
}

pub async fn get_user(storage: &dyn Storage, id: Uuid) -> Result<User> {
    debug!("Fetching user {}", id);
    require_user(storage, id).await
}

pub async fn get_user_by_username(storage: &dyn Storage, username: &str) -> Result<User> {
    storage
        .get_user_by_username(username.trim())
        .await?
        .ok_or_else(|| KlozbuyError::not_found("user", username))
}

pub async fn list_users(storage: &dyn Storage, page: Page, filter: &UserFilter) -> Result<Vec<User>> {
    storage.list_users(filter, page).await
}

/// Partial update. Absent fields keep their stored value.
pub async fn update_user(storage: &dyn Storage, id: Uuid, update: UserUpdate) -> Result<User> {
    let mut user = require_user(storage, id).await?;

    let mut v = Validator::new();
    if let Some(username) = update.username {
        user.username = username.trim().to_string();
        v.username("username", &user.username);
    }
    if let Some(email) = update.email {
        user.email = email.trim().to_lowercase();
        v.email("email", &user.email);
    }
    if let Some(display_name) = update.display_name {
        v.length("displayName", &display_name, 1, DISPLAY_NAME_MAX);
        user.display_name = display_name.trim().to_string();
    }
    if update.bio.is_some() {
        user.bio = clean(update.bio);
        v.optional_length("bio", user.bio.as_deref(), BIO_MAX);
    }
    if update.avatar_url.is_some() {
        user.avatar_url = clean(update.avatar_url);
        v.optional_http_url("avatarUrl", user.avatar_url.as_deref());
    }
    if update.phone.is_some() {
        user.phone = clean(update.phone);
        v.optional_length("phone", user.phone.as_deref(), PHONE_MAX);
    }
    if let Some(location_id) = update.location_id {
        user.location_id = location_id;
    }
    if let Some(user_type) = update.user_type {
        if user_type == UserType::Individual && user.user_type == UserType::Business {
            let has_profile = storage.get_business_profile_by_user(id).await?.is_some();
            v.check(
                !has_profile,
                "userType",
                "delete the business profile before switching to an individual account",
            );
        }
        user.user_type = user_type;
    }
    v.finish()?;

    user.updated_at = Utc::now();
    storage.update_user(&user).await?;
    info!("Updated user {}", user.id);
    Ok(user)
}

pub async fn delete_user(storage: &dyn Storage, id: Uuid) -> Result<()> {
    if storage.delete_user(id).await? {
        info!("Deleted user {}", id);
        Ok(())
    } else {
        Err(KlozbuyError::not_found("user", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            display_name: "Ada Obi".to_string(),
            ..NewUser::default()
        }
    }

    #[tokio::test]
    async fn create_defaults_to_individual_with_zero_counters() {
        let storage = fixtures::storage();
        let user = create_user(&storage, new_user("ada_obi", " Ada@Example.NG "))
            .await
            .expect("create");
        assert_eq!(user.user_type, UserType::Individual);
        assert_eq!(user.email, "ada@example.ng");
        assert_eq!(
            (user.followers_count, user.following_count, user.posts_count),
            (0, 0, 0)
        );
        assert_eq!(get_user(&storage, user.id).await.expect("get"), user);
    }

    #[tokio::test]
    async fn invalid_fields_are_all_reported() {
        let storage = fixtures::storage();
        let mut input = new_user("a", "not-an-email");
        input.display_name = "  ".to_string();
        let err = create_user(&storage, input).await.expect_err("invalid");
        let KlozbuyError::Validation(issues) = err else {
            panic!("expected validation error, got {err:?}");
        };
        let fields: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["username", "email", "displayName"]);
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts_ignoring_case() {
        let storage = fixtures::storage();
        create_user(&storage, new_user("ada", "ada@example.ng"))
            .await
            .expect("first");
        let err = create_user(&storage, new_user("ADA", "other@example.ng"))
            .await
            .expect_err("username clash");
        assert!(matches!(err, KlozbuyError::Conflict(_)));
        let err = create_user(&storage, new_user("other", "ADA@example.ng"))
            .await
            .expect_err("email clash");
        assert!(matches!(err, KlozbuyError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_location_is_not_found() {
        let storage = fixtures::storage();
        let mut input = new_user("ada", "ada@example.ng");
        input.location_id = Some(Uuid::new_v4());
        let err = create_user(&storage, input).await.expect_err("missing location");
        assert!(matches!(err, KlozbuyError::NotFound { entity: "location", .. }));
    }

    #[tokio::test]
    async fn update_rechecks_uniqueness() {
        let storage = fixtures::storage();
        fixtures::user(&storage, "ada").await;
        let bola = fixtures::user(&storage, "bola").await;
        let err = update_user(
            &storage,
            bola.id,
            UserUpdate {
                username: Some("Ada".to_string()),
                ..UserUpdate::default()
            },
        )
        .await
        .expect_err("clash");
        assert!(matches!(err, KlozbuyError::Conflict(_)));

        let updated = update_user(
            &storage,
            bola.id,
            UserUpdate {
                bio: Some("Tailor in Yaba".to_string()),
                ..UserUpdate::default()
            },
        )
        .await
        .expect("update");
        assert_eq!(updated.username, "bola");
        assert_eq!(updated.bio.as_deref(), Some("Tailor in Yaba"));
    }

    #[tokio::test]
    async fn null_location_clears_it() {
        let storage = fixtures::storage();
        let yaba = fixtures::location(&storage, "Yaba").await;
        let mut input = new_user("ada", "ada@example.ng");
        input.location_id = Some(yaba.id);
        let ada = create_user(&storage, input).await.expect("create");

        let update: UserUpdate =
            serde_json::from_value(serde_json::json!({ "bio": "Baker" })).expect("update json");
        let kept = update_user(&storage, ada.id, update).await.expect("update");
        assert_eq!(kept.location_id, Some(yaba.id));

        let update: UserUpdate =
            serde_json::from_value(serde_json::json!({ "locationId": null })).expect("update json");
        let cleared = update_user(&storage, ada.id, update).await.expect("clear");
        assert_eq!(cleared.location_id, None);
    }

    #[tokio::test]
    async fn lookup_by_username_ignores_case() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada_obi").await;
        let found = get_user_by_username(&storage, "ADA_OBI").await.expect("found");
        assert_eq!(found.id, ada.id);
    }

    #[tokio::test]
    async fn search_matches_username_or_display_name() {
        let storage = fixtures::storage();
        fixtures::user(&storage, "chidi").await;
        fixtures::business(&storage, "mama_put").await;
        let filter = UserFilter {
            search: Some("PUT".to_string()),
            ..UserFilter::default()
        };
        let found = list_users(&storage, Page::default(), &filter).await.expect("list");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "mama_put");

        let filter = UserFilter {
            user_type: Some(UserType::Individual),
            ..UserFilter::default()
        };
        let found = list_users(&storage, Page::default(), &filter).await.expect("list");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "chidi");
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        delete_user(&storage, ada.id).await.expect("delete");
        let err = delete_user(&storage, ada.id).await.expect_err("gone");
        assert!(matches!(err, KlozbuyError::NotFound { .. }));
    }
}
