use super::traits::Storage;
use crate::common::error::{KlozbuyError, Result};
use crate::common::pagination::Page;
use crate::database::DatabaseManager;
use crate::domain::*;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{params, Connection, Row, Rows, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const USER_COLUMNS: &str = "u.id, u.username, u.email, u.display_name, u.bio, u.avatar_url, \
    u.phone, u.user_type, u.location_id, u.followers_count, u.following_count, u.posts_count, \
    u.created_at, u.updated_at";

const POST_COLUMNS: &str = "p.id, p.author_id, p.post_type, p.title, p.content, p.price, \
    p.currency, p.event_start, p.event_end, p.location_id, p.hashtags, p.likes_count, \
    p.comments_count, p.created_at, p.updated_at";

const FOLLOW_COLUMNS: &str = "f.id, f.follower_id, f.following_id, f.created_at";

const LOCATION_COLUMNS: &str = "l.id, l.name, l.address, l.city, l.state, l.country, \
    l.postal_code, l.latitude, l.longitude, l.created_at, l.updated_at";

const MEDIA_SELECT: &str = "SELECT m.id, m.owner_id, m.post_id, m.media_type, m.url, \
    m.file_name, m.mime_type, m.size_bytes, m.created_at, \
    i.width, i.height, i.alt_text, \
    v.duration_seconds, v.width, v.height, v.thumbnail_url, \
    d.page_count, \
    a.duration_seconds, a.bitrate_kbps \
    FROM media m \
    LEFT JOIN image_details i ON i.media_id = m.id \
    LEFT JOIN video_details v ON v.media_id = m.id \
    LEFT JOIN document_details d ON d.media_id = m.id \
    LEFT JOIN audio_details a ON a.media_id = m.id";

const BUSINESS_COLUMNS: &str = "b.id, b.user_id, b.business_name, b.category, b.description, \
    b.website, b.phone, b.email, b.opening_hours, b.location_id, b.verified, b.created_at, \
    b.updated_at";

const MENTION_COLUMNS: &str = "pm.id, pm.post_id, pm.mentioned_user_id, pm.created_at";

const DETAIL_TABLES: &[&str] = &[
    "image_details",
    "video_details",
    "document_details",
    "audio_details",
];

/// Database storage implementation using Turso/libSQL with a relational schema.
pub struct DatabaseStorage {
    db: Arc<DatabaseManager>,
}

impl DatabaseStorage {
    /// Connect and make sure the schema is in place.
    pub async fn connect(url: &str, auth_token: Option<&str>) -> Result<Self> {
        let db_manager = DatabaseManager::new(url, auth_token).await?;
        Self::from_manager(db_manager).await
    }

    pub async fn from_manager(db_manager: DatabaseManager) -> Result<Self> {
        db_manager.run_migrations().await?;
        Ok(Self {
            db: Arc::new(db_manager),
        })
    }

    async fn conn(&self) -> Result<Connection> {
        self.db.get_connection().await
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn db_err(context: &'static str) -> impl Fn(libsql::Error) -> KlozbuyError {
    move |e| KlozbuyError::Database {
        message: format!("Failed to {context}: {e}"),
    }
}

/// Like [`db_err`] but turns unique-constraint violations into conflicts.
fn write_err(context: &'static str) -> impl Fn(libsql::Error) -> KlozbuyError {
    move |e| {
        let message = e.to_string();
        if message.contains("UNIQUE constraint failed") {
            KlozbuyError::Conflict(conflict_message(&message).to_string())
        } else {
            KlozbuyError::Database {
                message: format!("Failed to {context}: {message}"),
            }
        }
    }
}

fn conflict_message(raw: &str) -> &'static str {
    if raw.contains("users.username") {
        "username is already taken"
    } else if raw.contains("users.email") {
        "email is already registered"
    } else if raw.contains("follows.") {
        "already following this user"
    } else if raw.contains("business_profiles.user_id") {
        "user already has a business profile"
    } else if raw.contains("post_mentions.") {
        "user is already mentioned in this post"
    } else {
        "record already exists"
    }
}

// ---------------------------------------------------------------------------
// Value conversion
// ---------------------------------------------------------------------------

fn ts(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn text(value: impl Into<String>) -> Value {
    Value::Text(value.into())
}

fn opt_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |v| Value::Text(v.to_string()))
}

fn opt_uuid(value: Option<Uuid>) -> Value {
    value.map_or(Value::Null, |v| Value::Text(v.to_string()))
}

fn opt_ts(value: Option<&DateTime<Utc>>) -> Value {
    value.map_or(Value::Null, |v| Value::Text(ts(v)))
}

fn opt_int(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

fn column_err(idx: i32, expected: &str, got: &Value) -> KlozbuyError {
    KlozbuyError::Database {
        message: format!("column {idx}: expected {expected}, got {got:?}"),
    }
}

fn col(row: &Row, idx: i32) -> Result<Value> {
    row.get_value(idx).map_err(db_err("read column"))
}

fn col_opt_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match col(row, idx)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(column_err(idx, "text", &other)),
    }
}

fn col_text(row: &Row, idx: i32) -> Result<String> {
    col_opt_text(row, idx)?.ok_or_else(|| column_err(idx, "text", &Value::Null))
}

fn col_opt_int(row: &Row, idx: i32) -> Result<Option<i64>> {
    match col(row, idx)? {
        Value::Null => Ok(None),
        Value::Integer(i) => Ok(Some(i)),
        other => Err(column_err(idx, "integer", &other)),
    }
}

fn col_int(row: &Row, idx: i32) -> Result<i64> {
    col_opt_int(row, idx)?.ok_or_else(|| column_err(idx, "integer", &Value::Null))
}

fn col_opt_u32(row: &Row, idx: i32) -> Result<Option<u32>> {
    col_opt_int(row, idx)?
        .map(|v| u32::try_from(v).map_err(|_| column_err(idx, "u32", &Value::Integer(v))))
        .transpose()
}

fn col_u32(row: &Row, idx: i32) -> Result<u32> {
    col_opt_u32(row, idx)?.ok_or_else(|| column_err(idx, "integer", &Value::Null))
}

fn col_opt_real(row: &Row, idx: i32) -> Result<Option<f64>> {
    match col(row, idx)? {
        Value::Null => Ok(None),
        Value::Real(r) => Ok(Some(r)),
        Value::Integer(i) => Ok(Some(i as f64)),
        other => Err(column_err(idx, "real", &other)),
    }
}

fn col_real(row: &Row, idx: i32) -> Result<f64> {
    col_opt_real(row, idx)?.ok_or_else(|| column_err(idx, "real", &Value::Null))
}

fn parse_uuid(idx: i32, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| KlozbuyError::Database {
        message: format!("column {idx}: invalid UUID '{raw}': {e}"),
    })
}

fn col_uuid(row: &Row, idx: i32) -> Result<Uuid> {
    parse_uuid(idx, &col_text(row, idx)?)
}

fn col_opt_uuid(row: &Row, idx: i32) -> Result<Option<Uuid>> {
    col_opt_text(row, idx)?
        .map(|raw| parse_uuid(idx, &raw))
        .transpose()
}

fn parse_ts(idx: i32, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| KlozbuyError::Database {
            message: format!("column {idx}: invalid timestamp '{raw}': {e}"),
        })
}

fn col_ts(row: &Row, idx: i32) -> Result<DateTime<Utc>> {
    parse_ts(idx, &col_text(row, idx)?)
}

fn col_opt_ts(row: &Row, idx: i32) -> Result<Option<DateTime<Utc>>> {
    col_opt_text(row, idx)?
        .map(|raw| parse_ts(idx, &raw))
        .transpose()
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: col_uuid(row, 0)?,
        username: col_text(row, 1)?,
        email: col_text(row, 2)?,
        display_name: col_text(row, 3)?,
        bio: col_opt_text(row, 4)?,
        avatar_url: col_opt_text(row, 5)?,
        phone: col_opt_text(row, 6)?,
        user_type: col_text(row, 7)?.parse()?,
        location_id: col_opt_uuid(row, 8)?,
        followers_count: col_int(row, 9)?,
        following_count: col_int(row, 10)?,
        posts_count: col_int(row, 11)?,
        created_at: col_ts(row, 12)?,
        updated_at: col_ts(row, 13)?,
    })
}

fn row_to_post(row: &Row) -> Result<Post> {
    Ok(Post {
        id: col_uuid(row, 0)?,
        author_id: col_uuid(row, 1)?,
        post_type: col_text(row, 2)?.parse()?,
        title: col_opt_text(row, 3)?,
        content: col_text(row, 4)?,
        price: col_opt_int(row, 5)?,
        currency: col_text(row, 6)?,
        event_start: col_opt_ts(row, 7)?,
        event_end: col_opt_ts(row, 8)?,
        location_id: col_opt_uuid(row, 9)?,
        hashtags: serde_json::from_str(&col_text(row, 10)?)?,
        likes_count: col_int(row, 11)?,
        comments_count: col_int(row, 12)?,
        created_at: col_ts(row, 13)?,
        updated_at: col_ts(row, 14)?,
    })
}

fn row_to_follow(row: &Row) -> Result<Follow> {
    Ok(Follow {
        id: col_uuid(row, 0)?,
        follower_id: col_uuid(row, 1)?,
        following_id: col_uuid(row, 2)?,
        created_at: col_ts(row, 3)?,
    })
}

fn row_to_location(row: &Row) -> Result<Location> {
    Ok(Location {
        id: col_uuid(row, 0)?,
        name: col_opt_text(row, 1)?,
        address: col_opt_text(row, 2)?,
        city: col_text(row, 3)?,
        state: col_opt_text(row, 4)?,
        country: col_text(row, 5)?,
        postal_code: col_opt_text(row, 6)?,
        latitude: col_real(row, 7)?,
        longitude: col_real(row, 8)?,
        created_at: col_ts(row, 9)?,
        updated_at: col_ts(row, 10)?,
    })
}

fn row_to_media(row: &Row) -> Result<Media> {
    let media_type: MediaType = col_text(row, 3)?.parse()?;
    let details = match media_type {
        MediaType::Image => MediaDetails::Image {
            width: col_u32(row, 9)?,
            height: col_u32(row, 10)?,
            alt_text: col_opt_text(row, 11)?,
        },
        MediaType::Video => MediaDetails::Video {
            duration_seconds: col_real(row, 12)?,
            width: col_opt_u32(row, 13)?,
            height: col_opt_u32(row, 14)?,
            thumbnail_url: col_opt_text(row, 15)?,
        },
        MediaType::Document => MediaDetails::Document {
            page_count: col_opt_u32(row, 16)?,
        },
        MediaType::Audio => MediaDetails::Audio {
            duration_seconds: col_real(row, 17)?,
            bitrate_kbps: col_opt_u32(row, 18)?,
        },
    };
    Ok(Media {
        id: col_uuid(row, 0)?,
        owner_id: col_uuid(row, 1)?,
        post_id: col_opt_uuid(row, 2)?,
        media_type,
        url: col_text(row, 4)?,
        file_name: col_text(row, 5)?,
        mime_type: col_text(row, 6)?,
        size_bytes: col_int(row, 7)?,
        details,
        created_at: col_ts(row, 8)?,
    })
}

fn row_to_business_profile(row: &Row) -> Result<BusinessProfile> {
    Ok(BusinessProfile {
        id: col_uuid(row, 0)?,
        user_id: col_uuid(row, 1)?,
        business_name: col_text(row, 2)?,
        category: col_text(row, 3)?,
        description: col_opt_text(row, 4)?,
        website: col_opt_text(row, 5)?,
        phone: col_opt_text(row, 6)?,
        email: col_opt_text(row, 7)?,
        opening_hours: serde_json::from_str(&col_text(row, 8)?)?,
        location_id: col_opt_uuid(row, 9)?,
        verified: col_int(row, 10)? != 0,
        created_at: col_ts(row, 11)?,
        updated_at: col_ts(row, 12)?,
    })
}

fn row_to_mention(row: &Row) -> Result<PostMention> {
    Ok(PostMention {
        id: col_uuid(row, 0)?,
        post_id: col_uuid(row, 1)?,
        mentioned_user_id: col_uuid(row, 2)?,
        created_at: col_ts(row, 3)?,
    })
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

async fn collect<T>(mut rows: Rows, map: fn(&Row) -> Result<T>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(db_err("read row"))? {
        out.push(map(&row)?);
    }
    Ok(out)
}

async fn first<T>(rows: Rows, map: fn(&Row) -> Result<T>) -> Result<Option<T>> {
    Ok(collect(rows, map).await?.into_iter().next())
}

async fn exists(conn: &Connection, table: &'static str, id: Uuid) -> Result<bool> {
    let mut rows = conn
        .query(
            &format!("SELECT 1 FROM {table} WHERE id = ?1"),
            params![id.to_string()],
        )
        .await
        .map_err(db_err("check row existence"))?;
    Ok(rows.next().await.map_err(db_err("read row"))?.is_some())
}

async fn require(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: Uuid,
) -> Result<()> {
    if exists(conn, table, id).await? {
        Ok(())
    } else {
        Err(KlozbuyError::not_found(entity, id))
    }
}

async fn require_location(conn: &Connection, id: Option<Uuid>) -> Result<()> {
    match id {
        Some(id) => require(conn, "locations", "location", id).await,
        None => Ok(()),
    }
}

/// Accumulates `AND`-joined conditions with positional parameters.
#[derive(Default)]
struct Conditions {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Conditions {
    fn push(&mut self, clause: &str, value: Value) {
        self.values.push(value);
        let placeholder = format!("?{}", self.values.len());
        self.clauses.push(clause.replace('?', &placeholder));
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// Append `LIMIT`/`OFFSET` and hand back the SQL suffix plus all values.
    fn with_page(mut self, order_by: &str, page: Page) -> (String, Vec<Value>) {
        let limit = self.values.len() + 1;
        let offset = self.values.len() + 2;
        self.values.push(Value::Integer(i64::from(page.limit)));
        self.values.push(Value::Integer(i64::from(page.offset)));
        (
            format!(
                "{} ORDER BY {order_by} LIMIT ?{limit} OFFSET ?{offset}",
                self.where_sql()
            ),
            self.values,
        )
    }
}

async fn insert_hashtags(conn: &Connection, post: &Post) -> Result<()> {
    for tag in &post.hashtags {
        conn.execute(
            "INSERT OR IGNORE INTO post_hashtags (post_id, tag) VALUES (?1, ?2)",
            params![post.id.to_string(), tag.as_str()],
        )
        .await
        .map_err(db_err("insert hashtag"))?;
    }
    Ok(())
}

async fn insert_mentions_ignoring_duplicates(
    conn: &Connection,
    mentions: &[PostMention],
) -> Result<()> {
    for mention in mentions {
        conn.execute(
            "INSERT OR IGNORE INTO post_mentions (id, post_id, mentioned_user_id, created_at) \
             SELECT ?1, ?2, ?3, ?4 WHERE EXISTS (SELECT 1 FROM users WHERE id = ?3)",
            params![
                mention.id.to_string(),
                mention.post_id.to_string(),
                mention.mentioned_user_id.to_string(),
                ts(&mention.created_at)
            ],
        )
        .await
        .map_err(db_err("insert mention"))?;
    }
    Ok(())
}

async fn insert_media_details(conn: &Connection, media_id: Uuid, details: &MediaDetails) -> Result<()> {
    let id = text(media_id.to_string());
    let (sql, values) = match details {
        MediaDetails::Image {
            width,
            height,
            alt_text,
        } => (
            "INSERT INTO image_details (media_id, width, height, alt_text) VALUES (?1, ?2, ?3, ?4)",
            vec![
                id,
                Value::Integer(i64::from(*width)),
                Value::Integer(i64::from(*height)),
                opt_text(alt_text.as_deref()),
            ],
        ),
        MediaDetails::Video {
            duration_seconds,
            width,
            height,
            thumbnail_url,
        } => (
            "INSERT INTO video_details (media_id, duration_seconds, width, height, thumbnail_url) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            vec![
                id,
                Value::Real(*duration_seconds),
                opt_int(width.map(i64::from)),
                opt_int(height.map(i64::from)),
                opt_text(thumbnail_url.as_deref()),
            ],
        ),
        MediaDetails::Document { page_count } => (
            "INSERT INTO document_details (media_id, page_count) VALUES (?1, ?2)",
            vec![id, opt_int(page_count.map(i64::from))],
        ),
        MediaDetails::Audio {
            duration_seconds,
            bitrate_kbps,
        } => (
            "INSERT INTO audio_details (media_id, duration_seconds, bitrate_kbps) VALUES (?1, ?2, ?3)",
            vec![
                id,
                Value::Real(*duration_seconds),
                opt_int(bitrate_kbps.map(i64::from)),
            ],
        ),
    };
    conn.execute(sql, values)
        .await
        .map_err(db_err("insert media details"))?;
    Ok(())
}

async fn delete_media_details(conn: &Connection, media_filter: &str, id: &str) -> Result<()> {
    for table in DETAIL_TABLES {
        conn.execute(
            &format!("DELETE FROM {table} WHERE media_id IN (SELECT id FROM media WHERE {media_filter})"),
            params![id],
        )
        .await
        .map_err(db_err("delete media details"))?;
    }
    Ok(())
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn().await?;
        require_location(&conn, user.location_id).await?;
        conn.execute(
            "INSERT INTO users (id, username, email, display_name, bio, avatar_url, phone, \
             user_type, location_id, followers_count, following_count, posts_count, created_at, \
             updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            vec![
                text(user.id.to_string()),
                text(user.username.as_str()),
                text(user.email.as_str()),
                text(user.display_name.as_str()),
                opt_text(user.bio.as_deref()),
                opt_text(user.avatar_url.as_deref()),
                opt_text(user.phone.as_deref()),
                text(user.user_type.as_str()),
                opt_uuid(user.location_id),
                Value::Integer(user.followers_count),
                Value::Integer(user.following_count),
                Value::Integer(user.posts_count),
                text(ts(&user.created_at)),
                text(ts(&user.updated_at)),
            ],
        )
        .await
        .map_err(write_err("insert user"))?;

        info!("Inserted user: {} with id {}", user.username, user.id);
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(db_err("query user"))?;
        first(rows, row_to_user).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1 COLLATE NOCASE"),
                params![username],
            )
            .await
            .map_err(db_err("query user by username"))?;
        first(rows, row_to_user).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.email = ?1 COLLATE NOCASE"),
                params![email],
            )
            .await
            .map_err(db_err("query user by email"))?;
        first(rows, row_to_user).await
    }

    async fn get_users_by_usernames(&self, usernames: &[String]) -> Result<Vec<User>> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn().await?;
        let placeholders = (1..=usernames.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let values: Vec<Value> = usernames.iter().map(|n| text(n.to_lowercase())).collect();
        let rows = conn
            .query(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users u WHERE lower(u.username) IN ({placeholders})"
                ),
                values,
            )
            .await
            .map_err(db_err("query users by username"))?;
        collect(rows, row_to_user).await
    }

    async fn list_users(&self, filter: &UserFilter, page: Page) -> Result<Vec<User>> {
        let conn = self.conn().await?;
        let mut conditions = Conditions::default();
        if let Some(user_type) = filter.user_type {
            conditions.push("u.user_type = ?", text(user_type.as_str()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            // Literal substring match; `_` is a username character.
            conditions.push(
                "(instr(lower(u.username), ?) > 0 OR instr(lower(u.display_name), ?) > 0)",
                text(search.to_lowercase()),
            );
        }
        let (suffix, values) = conditions.with_page("u.created_at ASC, u.rowid ASC", page);
        let rows = conn
            .query(&format!("SELECT {USER_COLUMNS} FROM users u{suffix}"), values)
            .await
            .map_err(db_err("list users"))?;
        collect(rows, row_to_user).await
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let conn = self.conn().await?;
        require_location(&conn, user.location_id).await?;
        let changed = conn
            .execute(
                "UPDATE users SET username = ?2, email = ?3, display_name = ?4, bio = ?5, \
                 avatar_url = ?6, phone = ?7, user_type = ?8, location_id = ?9, updated_at = ?10 \
                 WHERE id = ?1",
                vec![
                    text(user.id.to_string()),
                    text(user.username.as_str()),
                    text(user.email.as_str()),
                    text(user.display_name.as_str()),
                    opt_text(user.bio.as_deref()),
                    opt_text(user.avatar_url.as_deref()),
                    opt_text(user.phone.as_deref()),
                    text(user.user_type.as_str()),
                    opt_uuid(user.location_id),
                    text(ts(&user.updated_at)),
                ],
            )
            .await
            .map_err(write_err("update user"))?;
        if changed == 0 {
            return Err(KlozbuyError::not_found("user", user.id));
        }
        debug!("Updated user {}", user.id);
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err("begin transaction"))?;
        if !exists(&tx, "users", id).await? {
            return Ok(false);
        }
        let id = id.to_string();
        let statements = [
            // Counterparts of every follow edge lose one from their counters.
            "UPDATE users SET followers_count = followers_count - 1 \
             WHERE followers_count > 0 \
             AND id IN (SELECT following_id FROM follows WHERE follower_id = ?1)",
            "UPDATE users SET following_count = following_count - 1 \
             WHERE following_count > 0 \
             AND id IN (SELECT follower_id FROM follows WHERE following_id = ?1)",
            "DELETE FROM follows WHERE follower_id = ?1 OR following_id = ?1",
            "DELETE FROM post_mentions WHERE mentioned_user_id = ?1 \
             OR post_id IN (SELECT id FROM posts WHERE author_id = ?1)",
            "DELETE FROM post_hashtags WHERE post_id IN (SELECT id FROM posts WHERE author_id = ?1)",
            "UPDATE media SET post_id = NULL \
             WHERE post_id IN (SELECT id FROM posts WHERE author_id = ?1)",
        ];
        for sql in statements {
            tx.execute(sql, params![id.as_str()])
                .await
                .map_err(db_err("cascade user delete"))?;
        }
        delete_media_details(&tx, "owner_id = ?1", &id).await?;
        for sql in [
            "DELETE FROM media WHERE owner_id = ?1",
            "DELETE FROM posts WHERE author_id = ?1",
            "DELETE FROM business_profiles WHERE user_id = ?1",
            "DELETE FROM users WHERE id = ?1",
        ] {
            tx.execute(sql, params![id.as_str()])
                .await
                .map_err(db_err("delete user"))?;
        }
        tx.commit().await.map_err(db_err("commit user delete"))?;
        info!("Deleted user {}", id);
        Ok(true)
    }

    async fn insert_post(&self, post: &Post, mentions: &[PostMention]) -> Result<()> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err("begin transaction"))?;
        require(&tx, "users", "user", post.author_id).await?;
        require_location(&tx, post.location_id).await?;
        tx.execute(
            "INSERT INTO posts (id, author_id, post_type, title, content, price, currency, \
             event_start, event_end, location_id, hashtags, likes_count, comments_count, \
             created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            vec![
                text(post.id.to_string()),
                text(post.author_id.to_string()),
                text(post.post_type.as_str()),
                opt_text(post.title.as_deref()),
                text(post.content.as_str()),
                opt_int(post.price),
                text(post.currency.as_str()),
                opt_ts(post.event_start.as_ref()),
                opt_ts(post.event_end.as_ref()),
                opt_uuid(post.location_id),
                text(serde_json::to_string(&post.hashtags)?),
                Value::Integer(post.likes_count),
                Value::Integer(post.comments_count),
                text(ts(&post.created_at)),
                text(ts(&post.updated_at)),
            ],
        )
        .await
        .map_err(write_err("insert post"))?;
        insert_hashtags(&tx, post).await?;
        tx.execute(
            "UPDATE users SET posts_count = posts_count + 1 WHERE id = ?1",
            params![post.author_id.to_string()],
        )
        .await
        .map_err(db_err("bump posts count"))?;
        insert_mentions_ignoring_duplicates(&tx, mentions).await?;
        tx.commit().await.map_err(db_err("commit post insert"))?;

        info!("Inserted post {} by {}", post.id, post.author_id);
        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(db_err("query post"))?;
        first(rows, row_to_post).await
    }

    async fn list_posts(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>> {
        let conn = self.conn().await?;
        let mut conditions = Conditions::default();
        if let Some(author_id) = filter.author_id {
            conditions.push("p.author_id = ?", text(author_id.to_string()));
        }
        if let Some(post_type) = filter.post_type {
            conditions.push("p.post_type = ?", text(post_type.as_str()));
        }
        if let Some(location_id) = filter.location_id {
            conditions.push("p.location_id = ?", text(location_id.to_string()));
        }
        if let Some(tag) = filter.normalized_hashtag() {
            conditions.push(
                "EXISTS (SELECT 1 FROM post_hashtags h WHERE h.post_id = p.id AND h.tag = ?)",
                text(tag),
            );
        }
        let (suffix, values) = conditions.with_page("p.created_at DESC, p.rowid DESC", page);
        let rows = conn
            .query(&format!("SELECT {POST_COLUMNS} FROM posts p{suffix}"), values)
            .await
            .map_err(db_err("list posts"))?;
        collect(rows, row_to_post).await
    }

    async fn feed_for(&self, user_id: Uuid, page: Page) -> Result<Vec<Post>> {
        let conn = self.conn().await?;
        let mut conditions = Conditions::default();
        conditions.push(
            "p.author_id IN (SELECT following_id FROM follows WHERE follower_id = ?)",
            text(user_id.to_string()),
        );
        let (suffix, values) = conditions.with_page("p.created_at DESC, p.rowid DESC", page);
        let rows = conn
            .query(&format!("SELECT {POST_COLUMNS} FROM posts p{suffix}"), values)
            .await
            .map_err(db_err("load feed"))?;
        collect(rows, row_to_post).await
    }

    async fn update_post(&self, post: &Post, new_mentions: &[PostMention]) -> Result<()> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err("begin transaction"))?;
        require_location(&tx, post.location_id).await?;
        let changed = tx
            .execute(
                "UPDATE posts SET title = ?2, content = ?3, price = ?4, currency = ?5, \
                 event_start = ?6, event_end = ?7, location_id = ?8, hashtags = ?9, \
                 updated_at = ?10 WHERE id = ?1",
                vec![
                    text(post.id.to_string()),
                    opt_text(post.title.as_deref()),
                    text(post.content.as_str()),
                    opt_int(post.price),
                    text(post.currency.as_str()),
                    opt_ts(post.event_start.as_ref()),
                    opt_ts(post.event_end.as_ref()),
                    opt_uuid(post.location_id),
                    text(serde_json::to_string(&post.hashtags)?),
                    text(ts(&post.updated_at)),
                ],
            )
            .await
            .map_err(write_err("update post"))?;
        if changed == 0 {
            return Err(KlozbuyError::not_found("post", post.id));
        }
        tx.execute(
            "DELETE FROM post_hashtags WHERE post_id = ?1",
            params![post.id.to_string()],
        )
        .await
        .map_err(db_err("clear hashtags"))?;
        insert_hashtags(&tx, post).await?;
        insert_mentions_ignoring_duplicates(&tx, new_mentions).await?;
        tx.commit().await.map_err(db_err("commit post update"))?;
        debug!("Updated post {}", post.id);
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err("begin transaction"))?;
        let rows = tx
            .query(
                &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(db_err("query post"))?;
        let Some(post) = first(rows, row_to_post).await? else {
            return Ok(false);
        };
        let id = id.to_string();
        for sql in [
            "DELETE FROM post_mentions WHERE post_id = ?1",
            "DELETE FROM post_hashtags WHERE post_id = ?1",
            "UPDATE media SET post_id = NULL WHERE post_id = ?1",
            "DELETE FROM posts WHERE id = ?1",
        ] {
            tx.execute(sql, params![id.as_str()])
                .await
                .map_err(db_err("delete post"))?;
        }
        tx.execute(
            "UPDATE users SET posts_count = posts_count - 1 WHERE id = ?1 AND posts_count > 0",
            params![post.author_id.to_string()],
        )
        .await
        .map_err(db_err("decrement posts count"))?;
        tx.commit().await.map_err(db_err("commit post delete"))?;
        info!("Deleted post {}", id);
        Ok(true)
    }

    async fn insert_follow(&self, follow: &Follow) -> Result<()> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err("begin transaction"))?;
        require(&tx, "users", "user", follow.follower_id).await?;
        require(&tx, "users", "user", follow.following_id).await?;
        tx.execute(
            "INSERT INTO follows (id, follower_id, following_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                follow.id.to_string(),
                follow.follower_id.to_string(),
                follow.following_id.to_string(),
                ts(&follow.created_at)
            ],
        )
        .await
        .map_err(write_err("insert follow"))?;
        tx.execute(
            "UPDATE users SET following_count = following_count + 1 WHERE id = ?1",
            params![follow.follower_id.to_string()],
        )
        .await
        .map_err(db_err("bump following count"))?;
        tx.execute(
            "UPDATE users SET followers_count = followers_count + 1 WHERE id = ?1",
            params![follow.following_id.to_string()],
        )
        .await
        .map_err(db_err("bump followers count"))?;
        tx.commit().await.map_err(db_err("commit follow"))?;

        info!("{} now follows {}", follow.follower_id, follow.following_id);
        Ok(())
    }

    async fn get_follow(&self, id: Uuid) -> Result<Option<Follow>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {FOLLOW_COLUMNS} FROM follows f WHERE f.id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(db_err("query follow"))?;
        first(rows, row_to_follow).await
    }

    async fn find_follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<Option<Follow>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {FOLLOW_COLUMNS} FROM follows f \
                     WHERE f.follower_id = ?1 AND f.following_id = ?2"
                ),
                params![follower_id.to_string(), following_id.to_string()],
            )
            .await
            .map_err(db_err("query follow pair"))?;
        first(rows, row_to_follow).await
    }

    async fn list_follows(&self, filter: &FollowFilter, page: Page) -> Result<Vec<Follow>> {
        let conn = self.conn().await?;
        let mut conditions = Conditions::default();
        if let Some(id) = filter.follower_id {
            conditions.push("f.follower_id = ?", text(id.to_string()));
        }
        if let Some(id) = filter.following_id {
            conditions.push("f.following_id = ?", text(id.to_string()));
        }
        let (suffix, values) = conditions.with_page("f.created_at DESC, f.rowid DESC", page);
        let rows = conn
            .query(&format!("SELECT {FOLLOW_COLUMNS} FROM follows f{suffix}"), values)
            .await
            .map_err(db_err("list follows"))?;
        collect(rows, row_to_follow).await
    }

    async fn list_followers(&self, user_id: Uuid, page: Page) -> Result<Vec<User>> {
        let conn = self.conn().await?;
        let mut conditions = Conditions::default();
        conditions.push("f.following_id = ?", text(user_id.to_string()));
        let (suffix, values) = conditions.with_page("f.created_at DESC, f.rowid DESC", page);
        let rows = conn
            .query(
                &format!(
                    "SELECT {USER_COLUMNS} FROM follows f JOIN users u ON u.id = f.follower_id{suffix}"
                ),
                values,
            )
            .await
            .map_err(db_err("list followers"))?;
        collect(rows, row_to_user).await
    }

    async fn list_following(&self, user_id: Uuid, page: Page) -> Result<Vec<User>> {
        let conn = self.conn().await?;
        let mut conditions = Conditions::default();
        conditions.push("f.follower_id = ?", text(user_id.to_string()));
        let (suffix, values) = conditions.with_page("f.created_at DESC, f.rowid DESC", page);
        let rows = conn
            .query(
                &format!(
                    "SELECT {USER_COLUMNS} FROM follows f JOIN users u ON u.id = f.following_id{suffix}"
                ),
                values,
            )
            .await
            .map_err(db_err("list following"))?;
        collect(rows, row_to_user).await
    }

    async fn delete_follow(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err("begin transaction"))?;
        let rows = tx
            .query(
                &format!("SELECT {FOLLOW_COLUMNS} FROM follows f WHERE f.id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(db_err("query follow"))?;
        let Some(follow) = first(rows, row_to_follow).await? else {
            return Ok(false);
        };
        tx.execute("DELETE FROM follows WHERE id = ?1", params![id.to_string()])
            .await
            .map_err(db_err("delete follow"))?;
        tx.execute(
            "UPDATE users SET following_count = following_count - 1 \
             WHERE id = ?1 AND following_count > 0",
            params![follow.follower_id.to_string()],
        )
        .await
        .map_err(db_err("decrement following count"))?;
        tx.execute(
            "UPDATE users SET followers_count = followers_count - 1 \
             WHERE id = ?1 AND followers_count > 0",
            params![follow.following_id.to_string()],
        )
        .await
        .map_err(db_err("decrement followers count"))?;
        tx.commit().await.map_err(db_err("commit unfollow"))?;

        info!("{} unfollowed {}", follow.follower_id, follow.following_id);
        Ok(true)
    }

    async fn insert_location(&self, location: &Location) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO locations (id, name, address, city, state, country, postal_code, \
             latitude, longitude, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            vec![
                text(location.id.to_string()),
                opt_text(location.name.as_deref()),
                opt_text(location.address.as_deref()),
                text(location.city.as_str()),
                opt_text(location.state.as_deref()),
                text(location.country.as_str()),
                opt_text(location.postal_code.as_deref()),
                Value::Real(location.latitude),
                Value::Real(location.longitude),
                text(ts(&location.created_at)),
                text(ts(&location.updated_at)),
            ],
        )
        .await
        .map_err(write_err("insert location"))?;
        info!("Inserted location {} in {}", location.id, location.city);
        Ok(())
    }

    async fn get_location(&self, id: Uuid) -> Result<Option<Location>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {LOCATION_COLUMNS} FROM locations l WHERE l.id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(db_err("query location"))?;
        first(rows, row_to_location).await
    }

    async fn list_locations(&self, filter: &LocationFilter, page: Page) -> Result<Vec<Location>> {
        let conn = self.conn().await?;
        let mut conditions = Conditions::default();
        if let Some(city) = filter.city.as_deref() {
            conditions.push("l.city = ? COLLATE NOCASE", text(city.trim()));
        }
        if let Some(state) = filter.state.as_deref() {
            conditions.push("l.state = ? COLLATE NOCASE", text(state.trim()));
        }
        let (suffix, values) = conditions.with_page("l.created_at ASC, l.rowid ASC", page);
        let rows = conn
            .query(&format!("SELECT {LOCATION_COLUMNS} FROM locations l{suffix}"), values)
            .await
            .map_err(db_err("list locations"))?;
        collect(rows, row_to_location).await
    }

    async fn locations_within(&self, bbox: BoundingBox) -> Result<Vec<Location>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {LOCATION_COLUMNS} FROM locations l \
                     WHERE l.latitude BETWEEN ?1 AND ?2 AND l.longitude BETWEEN ?3 AND ?4"
                ),
                params![bbox.min_lat, bbox.max_lat, bbox.min_lon, bbox.max_lon],
            )
            .await
            .map_err(db_err("query locations in bounds"))?;
        collect(rows, row_to_location).await
    }

    async fn update_location(&self, location: &Location) -> Result<()> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE locations SET name = ?2, address = ?3, city = ?4, state = ?5, \
                 country = ?6, postal_code = ?7, latitude = ?8, longitude = ?9, updated_at = ?10 \
                 WHERE id = ?1",
                vec![
                    text(location.id.to_string()),
                    opt_text(location.name.as_deref()),
                    opt_text(location.address.as_deref()),
                    text(location.city.as_str()),
                    opt_text(location.state.as_deref()),
                    text(location.country.as_str()),
                    opt_text(location.postal_code.as_deref()),
                    Value::Real(location.latitude),
                    Value::Real(location.longitude),
                    text(ts(&location.updated_at)),
                ],
            )
            .await
            .map_err(db_err("update location"))?;
        if changed == 0 {
            return Err(KlozbuyError::not_found("location", location.id));
        }
        Ok(())
    }

    async fn delete_location(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err("begin transaction"))?;
        if !exists(&tx, "locations", id).await? {
            return Ok(false);
        }
        let id = id.to_string();
        for sql in [
            "UPDATE users SET location_id = NULL WHERE location_id = ?1",
            "UPDATE posts SET location_id = NULL WHERE location_id = ?1",
            "UPDATE business_profiles SET location_id = NULL WHERE location_id = ?1",
            "DELETE FROM locations WHERE id = ?1",
        ] {
            tx.execute(sql, params![id.as_str()])
                .await
                .map_err(db_err("delete location"))?;
        }
        tx.commit().await.map_err(db_err("commit location delete"))?;
        info!("Deleted location {}", id);
        Ok(true)
    }

    async fn insert_media(&self, media: &Media) -> Result<()> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err("begin transaction"))?;
        require(&tx, "users", "user", media.owner_id).await?;
        if let Some(post_id) = media.post_id {
            require(&tx, "posts", "post", post_id).await?;
        }
        tx.execute(
            "INSERT INTO media (id, owner_id, post_id, media_type, url, file_name, mime_type, \
             size_bytes, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            vec![
                text(media.id.to_string()),
                text(media.owner_id.to_string()),
                opt_uuid(media.post_id),
                text(media.media_type.as_str()),
                text(media.url.as_str()),
                text(media.file_name.as_str()),
                text(media.mime_type.as_str()),
                Value::Integer(media.size_bytes),
                text(ts(&media.created_at)),
            ],
        )
        .await
        .map_err(write_err("insert media"))?;
        insert_media_details(&tx, media.id, &media.details).await?;
        tx.commit().await.map_err(db_err("commit media insert"))?;
        info!("Inserted {} media {}", media.media_type, media.id);
        Ok(())
    }

    async fn get_media(&self, id: Uuid) -> Result<Option<Media>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(&format!("{MEDIA_SELECT} WHERE m.id = ?1"), params![id.to_string()])
            .await
            .map_err(db_err("query media"))?;
        first(rows, row_to_media).await
    }

    async fn list_media(&self, filter: &MediaFilter, page: Page) -> Result<Vec<Media>> {
        let conn = self.conn().await?;
        let mut conditions = Conditions::default();
        if let Some(id) = filter.owner_id {
            conditions.push("m.owner_id = ?", text(id.to_string()));
        }
        if let Some(id) = filter.post_id {
            conditions.push("m.post_id = ?", text(id.to_string()));
        }
        if let Some(media_type) = filter.media_type {
            conditions.push("m.media_type = ?", text(media_type.as_str()));
        }
        let (suffix, values) = conditions.with_page("m.created_at DESC, m.rowid DESC", page);
        let rows = conn
            .query(&format!("{MEDIA_SELECT}{suffix}"), values)
            .await
            .map_err(db_err("list media"))?;
        collect(rows, row_to_media).await
    }

    async fn update_media(&self, media: &Media) -> Result<()> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err("begin transaction"))?;
        if let Some(post_id) = media.post_id {
            require(&tx, "posts", "post", post_id).await?;
        }
        let changed = tx
            .execute(
                "UPDATE media SET post_id = ?2, file_name = ?3 WHERE id = ?1",
                vec![
                    text(media.id.to_string()),
                    opt_uuid(media.post_id),
                    text(media.file_name.as_str()),
                ],
            )
            .await
            .map_err(db_err("update media"))?;
        if changed == 0 {
            return Err(KlozbuyError::not_found("media", media.id));
        }
        delete_media_details(&tx, "id = ?1", &media.id.to_string()).await?;
        insert_media_details(&tx, media.id, &media.details).await?;
        tx.commit().await.map_err(db_err("commit media update"))?;
        Ok(())
    }

    async fn delete_media(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err("begin transaction"))?;
        let id = id.to_string();
        delete_media_details(&tx, "id = ?1", &id).await?;
        let removed = tx
            .execute("DELETE FROM media WHERE id = ?1", params![id.as_str()])
            .await
            .map_err(db_err("delete media"))?;
        tx.commit().await.map_err(db_err("commit media delete"))?;
        Ok(removed > 0)
    }

    async fn insert_business_profile(&self, profile: &BusinessProfile) -> Result<()> {
        let conn = self.conn().await?;
        require(&conn, "users", "user", profile.user_id).await?;
        require_location(&conn, profile.location_id).await?;
        conn.execute(
            "INSERT INTO business_profiles (id, user_id, business_name, category, description, \
             website, phone, email, opening_hours, location_id, verified, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            vec![
                text(profile.id.to_string()),
                text(profile.user_id.to_string()),
                text(profile.business_name.as_str()),
                text(profile.category.as_str()),
                opt_text(profile.description.as_deref()),
                opt_text(profile.website.as_deref()),
                opt_text(profile.phone.as_deref()),
                opt_text(profile.email.as_deref()),
                text(serde_json::to_string(&profile.opening_hours)?),
                opt_uuid(profile.location_id),
                Value::Integer(i64::from(profile.verified)),
                text(ts(&profile.created_at)),
                text(ts(&profile.updated_at)),
            ],
        )
        .await
        .map_err(write_err("insert business profile"))?;
        info!(
            "Inserted business profile: {} with id {}",
            profile.business_name, profile.id
        );
        Ok(())
    }

    async fn get_business_profile(&self, id: Uuid) -> Result<Option<BusinessProfile>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {BUSINESS_COLUMNS} FROM business_profiles b WHERE b.id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(db_err("query business profile"))?;
        first(rows, row_to_business_profile).await
    }

    async fn get_business_profile_by_user(&self, user_id: Uuid) -> Result<Option<BusinessProfile>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {BUSINESS_COLUMNS} FROM business_profiles b WHERE b.user_id = ?1"),
                params![user_id.to_string()],
            )
            .await
            .map_err(db_err("query business profile by user"))?;
        first(rows, row_to_business_profile).await
    }

    async fn list_business_profiles(
        &self,
        filter: &BusinessProfileFilter,
        page: Page,
    ) -> Result<Vec<BusinessProfile>> {
        let conn = self.conn().await?;
        let mut conditions = Conditions::default();
        if let Some(category) = filter.category.as_deref() {
            conditions.push("b.category = ? COLLATE NOCASE", text(category.trim()));
        }
        if let Some(verified) = filter.verified {
            conditions.push("b.verified = ?", Value::Integer(i64::from(verified)));
        }
        let (suffix, values) = conditions.with_page("b.created_at ASC, b.rowid ASC", page);
        let rows = conn
            .query(
                &format!("SELECT {BUSINESS_COLUMNS} FROM business_profiles b{suffix}"),
                values,
            )
            .await
            .map_err(db_err("list business profiles"))?;
        collect(rows, row_to_business_profile).await
    }

    async fn update_business_profile(&self, profile: &BusinessProfile) -> Result<()> {
        let conn = self.conn().await?;
        require_location(&conn, profile.location_id).await?;
        let changed = conn
            .execute(
                "UPDATE business_profiles SET business_name = ?2, category = ?3, \
                 description = ?4, website = ?5, phone = ?6, email = ?7, opening_hours = ?8, \
                 location_id = ?9, verified = ?10, updated_at = ?11 WHERE id = ?1",
                vec![
                    text(profile.id.to_string()),
                    text(profile.business_name.as_str()),
                    text(profile.category.as_str()),
                    opt_text(profile.description.as_deref()),
                    opt_text(profile.website.as_deref()),
                    opt_text(profile.phone.as_deref()),
                    opt_text(profile.email.as_deref()),
                    text(serde_json::to_string(&profile.opening_hours)?),
                    opt_uuid(profile.location_id),
                    Value::Integer(i64::from(profile.verified)),
                    text(ts(&profile.updated_at)),
                ],
            )
            .await
            .map_err(db_err("update business profile"))?;
        if changed == 0 {
            return Err(KlozbuyError::not_found("business profile", profile.id));
        }
        Ok(())
    }

    async fn delete_business_profile(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn().await?;
        let removed = conn
            .execute(
                "DELETE FROM business_profiles WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(db_err("delete business profile"))?;
        Ok(removed > 0)
    }

    async fn insert_mention(&self, mention: &PostMention) -> Result<()> {
        let conn = self.conn().await?;
        require(&conn, "posts", "post", mention.post_id).await?;
        require(&conn, "users", "user", mention.mentioned_user_id).await?;
        conn.execute(
            "INSERT INTO post_mentions (id, post_id, mentioned_user_id, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                mention.id.to_string(),
                mention.post_id.to_string(),
                mention.mentioned_user_id.to_string(),
                ts(&mention.created_at)
            ],
        )
        .await
        .map_err(write_err("insert mention"))?;
        Ok(())
    }

    async fn get_mention(&self, id: Uuid) -> Result<Option<PostMention>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {MENTION_COLUMNS} FROM post_mentions pm WHERE pm.id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(db_err("query mention"))?;
        first(rows, row_to_mention).await
    }

    async fn list_mentions(&self, filter: &MentionFilter, page: Page) -> Result<Vec<PostMention>> {
        let conn = self.conn().await?;
        let mut conditions = Conditions::default();
        if let Some(id) = filter.post_id {
            conditions.push("pm.post_id = ?", text(id.to_string()));
        }
        if let Some(id) = filter.user_id {
            conditions.push("pm.mentioned_user_id = ?", text(id.to_string()));
        }
        let (suffix, values) = conditions.with_page("pm.created_at ASC, pm.rowid ASC", page);
        let rows = conn
            .query(
                &format!("SELECT {MENTION_COLUMNS} FROM post_mentions pm{suffix}"),
                values,
            )
            .await
            .map_err(db_err("list mentions"))?;
        collect(rows, row_to_mention).await
    }

    async fn delete_mention(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn().await?;
        let removed = conn
            .execute("DELETE FROM post_mentions WHERE id = ?1", params![id.to_string()])
            .await
            .map_err(db_err("delete mention"))?;
        Ok(removed > 0)
    }
}
