use super::traits::Storage;
use crate::common::error::{KlozbuyError, Result};
use crate::common::pagination::Page;
use crate::domain::*;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    follows: Vec<Follow>,
    locations: Vec<Location>,
    media: Vec<Media>,
    business_profiles: Vec<BusinessProfile>,
    mentions: Vec<PostMention>,
}

impl Tables {
    fn user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    fn has_user(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn has_post(&self, id: Uuid) -> bool {
        self.posts.iter().any(|p| p.id == id)
    }

    fn has_location(&self, id: Uuid) -> bool {
        self.locations.iter().any(|l| l.id == id)
    }

    fn check_location(&self, id: Option<Uuid>) -> Result<()> {
        match id {
            Some(id) if !self.has_location(id) => Err(KlozbuyError::not_found("location", id)),
            _ => Ok(()),
        }
    }

    fn check_user_unique(&self, user: &User) -> Result<()> {
        for other in self.users.iter().filter(|u| u.id != user.id) {
            if other.username.eq_ignore_ascii_case(&user.username) {
                return Err(KlozbuyError::conflict("username is already taken"));
            }
            if other.email.eq_ignore_ascii_case(&user.email) {
                return Err(KlozbuyError::conflict("email is already registered"));
            }
        }
        Ok(())
    }

    /// Removes a follow edge and repairs both counters.
    fn remove_follow_at(&mut self, index: usize) {
        let follow = self.follows.remove(index);
        if let Some(follower) = self.user_mut(follow.follower_id) {
            decrement(&mut follower.following_count);
        }
        if let Some(following) = self.user_mut(follow.following_id) {
            decrement(&mut following.followers_count);
        }
    }

    fn add_mentions(&mut self, mentions: &[PostMention]) {
        for mention in mentions {
            let exists = self.mentions.iter().any(|m| {
                m.post_id == mention.post_id && m.mentioned_user_id == mention.mentioned_user_id
            });
            if !exists && self.has_user(mention.mentioned_user_id) {
                self.mentions.push(mention.clone());
            }
        }
    }

    fn remove_post_at(&mut self, index: usize) {
        let post = self.posts.remove(index);
        self.mentions.retain(|m| m.post_id != post.id);
        for media in self.media.iter_mut().filter(|m| m.post_id == Some(post.id)) {
            media.post_id = None;
        }
        if let Some(author) = self.user_mut(post.author_id) {
            decrement(&mut author.posts_count);
        }
    }
}

fn decrement(count: &mut i64) {
    if *count > 0 {
        *count -= 1;
    }
}

/// In-memory storage implementation for development/testing.
///
/// All tables sit behind one lock so a row change and its counters are
/// applied together.
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| KlozbuyError::Storage {
            message: "in-memory tables lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut t = self.tables()?;
        t.check_user_unique(user)?;
        t.check_location(user.location_id)?;
        t.users.push(user.clone());
        debug!("Created user: {} with id {}", user.username, user.id);
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let t = self.tables()?;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let t = self.tables()?;
        Ok(t
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let t = self.tables()?;
        Ok(t
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_users_by_usernames(&self, usernames: &[String]) -> Result<Vec<User>> {
        let t = self.tables()?;
        Ok(t
            .users
            .iter()
            .filter(|u| usernames.iter().any(|n| u.username.eq_ignore_ascii_case(n)))
            .cloned()
            .collect())
    }

    async fn list_users(&self, filter: &UserFilter, page: Page) -> Result<Vec<User>> {
        let t = self.tables()?;
        Ok(page.apply(t.users.iter().filter(|u| filter.matches(u)).cloned()))
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut t = self.tables()?;
        t.check_user_unique(user)?;
        t.check_location(user.location_id)?;
        let slot = t
            .user_mut(user.id)
            .ok_or_else(|| KlozbuyError::not_found("user", user.id))?;
        *slot = user.clone();
        debug!("Updated user {}", user.id);
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables()?;
        let Some(index) = t.users.iter().position(|u| u.id == id) else {
            return Ok(false);
        };

        while let Some(i) = t
            .follows
            .iter()
            .position(|f| f.follower_id == id || f.following_id == id)
        {
            t.remove_follow_at(i);
        }
        while let Some(i) = t.posts.iter().position(|p| p.author_id == id) {
            t.remove_post_at(i);
        }
        t.media.retain(|m| m.owner_id != id);
        t.mentions.retain(|m| m.mentioned_user_id != id);
        t.business_profiles.retain(|b| b.user_id != id);

        let index = t.users.iter().position(|u| u.id == id).unwrap_or(index);
        t.users.remove(index);
        debug!("Deleted user {}", id);
        Ok(true)
    }

    async fn insert_post(&self, post: &Post, mentions: &[PostMention]) -> Result<()> {
        let mut t = self.tables()?;
        t.check_location(post.location_id)?;
        let author = t
            .user_mut(post.author_id)
            .ok_or_else(|| KlozbuyError::not_found("user", post.author_id))?;
        author.posts_count += 1;
        t.posts.push(post.clone());
        t.add_mentions(mentions);
        debug!("Created post {} by {}", post.id, post.author_id);
        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        let t = self.tables()?;
        Ok(t.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_posts(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>> {
        let t = self.tables()?;
        Ok(page.apply(t.posts.iter().rev().filter(|p| filter.matches(p)).cloned()))
    }

    async fn feed_for(&self, user_id: Uuid, page: Page) -> Result<Vec<Post>> {
        let t = self.tables()?;
        let followed: Vec<Uuid> = t
            .follows
            .iter()
            .filter(|f| f.follower_id == user_id)
            .map(|f| f.following_id)
            .collect();
        Ok(page.apply(
            t.posts
                .iter()
                .rev()
                .filter(|p| followed.contains(&p.author_id))
                .cloned(),
        ))
    }

    async fn update_post(&self, post: &Post, new_mentions: &[PostMention]) -> Result<()> {
        let mut t = self.tables()?;
        t.check_location(post.location_id)?;
        let slot = t
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or_else(|| KlozbuyError::not_found("post", post.id))?;
        *slot = post.clone();
        t.add_mentions(new_mentions);
        debug!("Updated post {}", post.id);
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables()?;
        match t.posts.iter().position(|p| p.id == id) {
            Some(index) => {
                t.remove_post_at(index);
                debug!("Deleted post {}", id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_follow(&self, follow: &Follow) -> Result<()> {
        let mut t = self.tables()?;
        for id in [follow.follower_id, follow.following_id] {
            if !t.has_user(id) {
                return Err(KlozbuyError::not_found("user", id));
            }
        }
        let duplicate = t.follows.iter().any(|f| {
            f.follower_id == follow.follower_id && f.following_id == follow.following_id
        });
        if duplicate {
            return Err(KlozbuyError::conflict("already following this user"));
        }
        t.follows.push(follow.clone());
        if let Some(follower) = t.user_mut(follow.follower_id) {
            follower.following_count += 1;
        }
        if let Some(following) = t.user_mut(follow.following_id) {
            following.followers_count += 1;
        }
        debug!("{} now follows {}", follow.follower_id, follow.following_id);
        Ok(())
    }

    async fn get_follow(&self, id: Uuid) -> Result<Option<Follow>> {
        let t = self.tables()?;
        Ok(t.follows.iter().find(|f| f.id == id).cloned())
    }

    async fn find_follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<Option<Follow>> {
        let t = self.tables()?;
        Ok(t
            .follows
            .iter()
            .find(|f| f.follower_id == follower_id && f.following_id == following_id)
            .cloned())
    }

    async fn list_follows(&self, filter: &FollowFilter, page: Page) -> Result<Vec<Follow>> {
        let t = self.tables()?;
        Ok(page.apply(t.follows.iter().rev().filter(|f| filter.matches(f)).cloned()))
    }

    async fn list_followers(&self, user_id: Uuid, page: Page) -> Result<Vec<User>> {
        let t = self.tables()?;
        let ids = t
            .follows
            .iter()
            .rev()
            .filter(|f| f.following_id == user_id)
            .map(|f| f.follower_id);
        Ok(page.apply(ids.filter_map(|id| t.users.iter().find(|u| u.id == id).cloned())))
    }

    async fn list_following(&self, user_id: Uuid, page: Page) -> Result<Vec<User>> {
        let t = self.tables()?;
        let ids = t
            .follows
            .iter()
            .rev()
            .filter(|f| f.follower_id == user_id)
            .map(|f| f.following_id);
        Ok(page.apply(ids.filter_map(|id| t.users.iter().find(|u| u.id == id).cloned())))
    }

    async fn delete_follow(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables()?;
        match t.follows.iter().position(|f| f.id == id) {
            Some(index) => {
                t.remove_follow_at(index);
                debug!("Deleted follow {}", id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_location(&self, location: &Location) -> Result<()> {
        let mut t = self.tables()?;
        t.locations.push(location.clone());
        debug!("Created location {} in {}", location.id, location.city);
        Ok(())
    }

    async fn get_location(&self, id: Uuid) -> Result<Option<Location>> {
        let t = self.tables()?;
        Ok(t.locations.iter().find(|l| l.id == id).cloned())
    }

    async fn list_locations(&self, filter: &LocationFilter, page: Page) -> Result<Vec<Location>> {
        let t = self.tables()?;
        Ok(page.apply(t.locations.iter().filter(|l| filter.matches(l)).cloned()))
    }

    async fn locations_within(&self, bbox: BoundingBox) -> Result<Vec<Location>> {
        let t = self.tables()?;
        Ok(t
            .locations
            .iter()
            .filter(|l| bbox.contains(l.latitude, l.longitude))
            .cloned()
            .collect())
    }

    async fn update_location(&self, location: &Location) -> Result<()> {
        let mut t = self.tables()?;
        let slot = t
            .locations
            .iter_mut()
            .find(|l| l.id == location.id)
            .ok_or_else(|| KlozbuyError::not_found("location", location.id))?;
        *slot = location.clone();
        Ok(())
    }

    async fn delete_location(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables()?;
        let Some(index) = t.locations.iter().position(|l| l.id == id) else {
            return Ok(false);
        };
        t.locations.remove(index);
        for user in t.users.iter_mut().filter(|u| u.location_id == Some(id)) {
            user.location_id = None;
        }
        for post in t.posts.iter_mut().filter(|p| p.location_id == Some(id)) {
            post.location_id = None;
        }
        for profile in t
            .business_profiles
            .iter_mut()
            .filter(|b| b.location_id == Some(id))
        {
            profile.location_id = None;
        }
        debug!("Deleted location {}", id);
        Ok(true)
    }

    async fn insert_media(&self, media: &Media) -> Result<()> {
        let mut t = self.tables()?;
        if !t.has_user(media.owner_id) {
            return Err(KlozbuyError::not_found("user", media.owner_id));
        }
        if let Some(post_id) = media.post_id {
            if !t.has_post(post_id) {
                return Err(KlozbuyError::not_found("post", post_id));
            }
        }
        t.media.push(media.clone());
        debug!("Created {} media {}", media.media_type, media.id);
        Ok(())
    }

    async fn get_media(&self, id: Uuid) -> Result<Option<Media>> {
        let t = self.tables()?;
        Ok(t.media.iter().find(|m| m.id == id).cloned())
    }

    async fn list_media(&self, filter: &MediaFilter, page: Page) -> Result<Vec<Media>> {
        let t = self.tables()?;
        Ok(page.apply(t.media.iter().rev().filter(|m| filter.matches(m)).cloned()))
    }

    async fn update_media(&self, media: &Media) -> Result<()> {
        let mut t = self.tables()?;
        if let Some(post_id) = media.post_id {
            if !t.has_post(post_id) {
                return Err(KlozbuyError::not_found("post", post_id));
            }
        }
        let slot = t
            .media
            .iter_mut()
            .find(|m| m.id == media.id)
            .ok_or_else(|| KlozbuyError::not_found("media", media.id))?;
        *slot = media.clone();
        Ok(())
    }

    async fn delete_media(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables()?;
        let before = t.media.len();
        t.media.retain(|m| m.id != id);
        Ok(t.media.len() != before)
    }

    async fn insert_business_profile(&self, profile: &BusinessProfile) -> Result<()> {
        let mut t = self.tables()?;
        if !t.has_user(profile.user_id) {
            return Err(KlozbuyError::not_found("user", profile.user_id));
        }
        t.check_location(profile.location_id)?;
        if t.business_profiles.iter().any(|b| b.user_id == profile.user_id) {
            return Err(KlozbuyError::conflict(
                "user already has a business profile",
            ));
        }
        t.business_profiles.push(profile.clone());
        debug!(
            "Created business profile: {} with id {}",
            profile.business_name, profile.id
        );
        Ok(())
    }

    async fn get_business_profile(&self, id: Uuid) -> Result<Option<BusinessProfile>> {
        let t = self.tables()?;
        Ok(t.business_profiles.iter().find(|b| b.id == id).cloned())
    }

    async fn get_business_profile_by_user(&self, user_id: Uuid) -> Result<Option<BusinessProfile>> {
        let t = self.tables()?;
        Ok(t
            .business_profiles
            .iter()
            .find(|b| b.user_id == user_id)
            .cloned())
    }

    async fn list_business_profiles(
        &self,
        filter: &BusinessProfileFilter,
        page: Page,
    ) -> Result<Vec<BusinessProfile>> {
        let t = self.tables()?;
        Ok(page.apply(
            t.business_profiles
                .iter()
                .filter(|b| filter.matches(b))
                .cloned(),
        ))
    }

    async fn update_business_profile(&self, profile: &BusinessProfile) -> Result<()> {
        let mut t = self.tables()?;
        t.check_location(profile.location_id)?;
        let slot = t
            .business_profiles
            .iter_mut()
            .find(|b| b.id == profile.id)
            .ok_or_else(|| KlozbuyError::not_found("business profile", profile.id))?;
        *slot = profile.clone();
        Ok(())
    }

    async fn delete_business_profile(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables()?;
        let before = t.business_profiles.len();
        t.business_profiles.retain(|b| b.id != id);
        Ok(t.business_profiles.len() != before)
    }

    async fn insert_mention(&self, mention: &PostMention) -> Result<()> {
        let mut t = self.tables()?;
        if !t.has_post(mention.post_id) {
            return Err(KlozbuyError::not_found("post", mention.post_id));
        }
        if !t.has_user(mention.mentioned_user_id) {
            return Err(KlozbuyError::not_found("user", mention.mentioned_user_id));
        }
        let duplicate = t.mentions.iter().any(|m| {
            m.post_id == mention.post_id && m.mentioned_user_id == mention.mentioned_user_id
        });
        if duplicate {
            return Err(KlozbuyError::conflict(
                "user is already mentioned in this post",
            ));
        }
        t.mentions.push(mention.clone());
        Ok(())
    }

    async fn get_mention(&self, id: Uuid) -> Result<Option<PostMention>> {
        let t = self.tables()?;
        Ok(t.mentions.iter().find(|m| m.id == id).cloned())
    }

    async fn list_mentions(&self, filter: &MentionFilter, page: Page) -> Result<Vec<PostMention>> {
        let t = self.tables()?;
        Ok(page.apply(t.mentions.iter().filter(|m| filter.matches(m)).cloned()))
    }

    async fn delete_mention(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables()?;
        let before = t.mentions.len();
        t.mentions.retain(|m| m.id != id);
        Ok(t.mentions.len() != before)
    }
}
