//! HTTP handlers, one module per entity. Each parses the request, calls the
//! matching service and maps the result to a status code.

pub mod business_profiles;
pub mod follows;
pub mod health;
pub mod locations;
pub mod media;
pub mod post_mentions;
pub mod posts;
pub mod users;

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use klozbuy_core::{Page, Paginated};
use serde::{Deserialize, Serialize};

/// `?limit=&offset=` on every list endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}

pub fn paginated<T: Serialize>(items: Vec<T>, page: Page) -> Json<Paginated<T>> {
    Json(Paginated::new(items, page))
}

/// A JSON-LD document served as `application/ld+json`.
pub fn json_ld(document: serde_json::Value) -> Response {
    let mut response = Json(document).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/ld+json"),
    );
    response
}
