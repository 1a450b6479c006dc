//! Application services: validate input, enforce the rules storage cannot,
//! then hand the write to a [`Storage`] backend.

pub mod business_profiles;
pub mod follows;
pub mod locations;
pub mod media;
pub mod mentions;
pub mod posts;
pub mod users;

use crate::common::error::{KlozbuyError, Result};
use crate::domain::{Post, User};
use crate::storage::Storage;
use uuid::Uuid;

pub(crate) async fn require_user(storage: &dyn Storage, id: Uuid) -> Result<User> {
    storage
        .get_user(id)
        .await?
        .ok_or_else(|| KlozbuyError::not_found("user", id))
}

pub(crate) async fn require_post(storage: &dyn Storage, id: Uuid) -> Result<Post> {
    storage
        .get_post(id)
        .await?
        .ok_or_else(|| KlozbuyError::not_found("post", id))
}
