pub mod common;
pub mod domain;
pub mod geo;
pub mod jsonld;
pub mod services;
pub mod storage;
pub mod text;
pub mod validation;

#[cfg(feature = "db")]
pub mod database;

pub use common::error::{Issue, KlozbuyError, Result};
pub use common::pagination::{Page, Paginated};
pub use domain::*;

// Re-export database manager when db feature is enabled
#[cfg(feature = "db")]
pub use database::DatabaseManager;
