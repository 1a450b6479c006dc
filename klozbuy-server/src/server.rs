use crate::handlers::{
    business_profiles, follows, health, locations, media, post_mentions, posts, users,
};
use crate::metrics::track_requests;
use crate::state::AppState;
use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{delete, get, put};
use axum::Router;
use klozbuy_core::storage::Storage;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/by-username/:username",
            get(users::get_user_by_username),
        )
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/:id/followers", get(users::followers))
        .route("/users/:id/following", get(users::following))
        .route("/users/:id/feed", get(users::feed))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:id/structured-data", get(posts::structured_data))
        .route(
            "/follows",
            get(follows::list_follows)
                .post(follows::create_follow)
                .delete(follows::unfollow),
        )
        .route("/follows/status", get(follows::follow_status))
        .route(
            "/follows/:id",
            get(follows::get_follow).delete(follows::delete_follow),
        )
        .route(
            "/locations",
            get(locations::list_locations).post(locations::create_location),
        )
        .route("/locations/nearby", get(locations::nearby))
        .route(
            "/locations/:id",
            get(locations::get_location)
                .put(locations::update_location)
                .delete(locations::delete_location),
        )
        .route("/media", get(media::list_media).post(media::create_media))
        .route(
            "/media/:id",
            get(media::get_media)
                .put(media::update_media)
                .delete(media::delete_media),
        )
        .route(
            "/business-profiles",
            get(business_profiles::list_profiles).post(business_profiles::create_profile),
        )
        .route(
            "/business-profiles/by-user/:user_id",
            get(business_profiles::get_profile_by_user),
        )
        .route(
            "/business-profiles/:id",
            get(business_profiles::get_profile)
                .put(business_profiles::update_profile)
                .delete(business_profiles::delete_profile),
        )
        .route(
            "/business-profiles/:id/verification",
            put(business_profiles::set_verification),
        )
        .route(
            "/business-profiles/:id/structured-data",
            get(business_profiles::structured_data),
        )
        .route(
            "/post-mentions",
            get(post_mentions::list_mentions).post(post_mentions::create_mention),
        )
        .route("/post-mentions/:id", delete(post_mentions::delete_mention))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return cors.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

/// Create the HTTP server router
pub fn create_server(storage: Arc<dyn Storage>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::prometheus))
        .nest("/api", api_routes())
        .route_layer(middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(AppState::new(storage))
}

/// Start the HTTP server, stopping on Ctrl-C.
pub async fn start_server(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("HTTP server running on http://{}", addr);
    info!("Health check: http://{}/health", addr);
    info!("REST API:     http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
