use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use klozbuy_core::storage::InMemoryStorage;
use klozbuy_server::create_server;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    create_server(Arc::new(InMemoryStorage::new()), &[])
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

async fn create_user(app: &Router, username: &str) -> Result<Value> {
    let (status, user) = send(
        app,
        Method::POST,
        "/api/users",
        Some(json!({
            "username": username,
            "email": format!("{username}@example.ng"),
            "displayName": username.to_uppercase(),
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{user}");
    Ok(user)
}

fn id(value: &Value) -> &str {
    value["id"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn health_reports_service() -> Result<()> {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "klozbuy");
    Ok(())
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() -> Result<()> {
    let app = app();
    create_user(&app, "ada").await?;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({
            "username": "ADA",
            "email": "someone@example.ng",
            "displayName": "Another Ada",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap_or_default().contains("username"));
    Ok(())
}

#[tokio::test]
async fn follow_rules_and_counters() -> Result<()> {
    let app = app();
    let ada = create_user(&app, "ada").await?;
    let bola = create_user(&app, "bola").await?;
    let pair = json!({ "followerId": id(&ada), "followingId": id(&bola) });

    let (status, _) = send(&app, Method::POST, "/api/follows", Some(pair.clone())).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, Method::POST, "/api/follows", Some(pair)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/follows",
        Some(json!({ "followerId": id(&ada), "followingId": id(&ada) })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["issues"][0]["field"], "followingId");

    let (_, ada_now) = send(&app, Method::GET, &format!("/api/users/{}", id(&ada)), None).await?;
    let (_, bola_now) = send(&app, Method::GET, &format!("/api/users/{}", id(&bola)), None).await?;
    assert_eq!(ada_now["followingCount"], 1);
    assert_eq!(bola_now["followersCount"], 1);

    let query = format!("followerId={}&followingId={}", id(&ada), id(&bola));
    let (_, status_body) = send(&app, Method::GET, &format!("/api/follows/status?{query}"), None).await?;
    assert_eq!(status_body["following"], true);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/follows?{query}"), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &format!("/api/follows?{query}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, bola_now) = send(&app, Method::GET, &format!("/api/users/{}", id(&bola)), None).await?;
    assert_eq!(bola_now["followersCount"], 0);
    Ok(())
}

#[tokio::test]
async fn product_post_needs_a_price() -> Result<()> {
    let app = app();
    let shop = create_user(&app, "mama_put").await?;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/posts",
        Some(json!({
            "authorId": id(&shop),
            "postType": "product",
            "content": "Fresh jollof trays #lagos",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation failed");
    let fields: Vec<&str> = body["issues"]
        .as_array()
        .map(|issues| issues.iter().filter_map(|i| i["field"].as_str()).collect())
        .unwrap_or_default();
    assert!(fields.contains(&"price"), "{body}");

    let (status, post) = send(
        &app,
        Method::POST,
        "/api/posts",
        Some(json!({
            "authorId": id(&shop),
            "postType": "product",
            "content": "Fresh jollof trays #lagos",
            "price": 250000,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["hashtags"], json!(["lagos"]));
    assert_eq!(post["currency"], "NGN");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/posts/{}/structured-data", id(&post)))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/ld+json"
    );
    let doc: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await?)?;
    assert_eq!(doc["@type"], "Product");
    assert_eq!(doc["offers"]["price"], "2500.00");
    Ok(())
}

#[tokio::test]
async fn missing_resources_are_not_found() -> Result<()> {
    let app = app();
    let ghost = uuid::Uuid::new_v4();
    let (status, body) = send(&app, Method::DELETE, &format!("/api/posts/{ghost}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap_or_default().contains("not found"));

    let (status, _) = send(&app, Method::GET, "/api/users/by-username/nobody", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() -> Result<()> {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/users/not-a-uuid", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/users")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"username\": "))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/posts?limit=lots", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn lists_are_paginated() -> Result<()> {
    let app = app();
    for name in ["ada", "bola", "chidi"] {
        create_user(&app, name).await?;
    }
    let (status, body) = send(&app, Method::GET, "/api/users?limit=2&offset=1", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["offset"], 1);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(2));

    let (_, body) = send(&app, Method::GET, "/api/users?limit=1000", None).await?;
    assert_eq!(body["limit"], 100);
    Ok(())
}

#[tokio::test]
async fn nearby_orders_by_distance() -> Result<()> {
    let app = app();
    for (city, lat, lon) in [
        ("Ikeja", 6.6018, 3.3515),
        ("Yaba", 6.5095, 3.3711),
        ("Abuja", 9.0765, 7.3986),
    ] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/locations",
            Some(json!({ "city": city, "latitude": lat, "longitude": lon })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/locations/nearby?lat=6.4541&lon=3.3947&radiusKm=25",
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let cities: Vec<&str> = body["items"]
        .as_array()
        .map(|items| items.iter().filter_map(|l| l["city"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(cities, vec!["Yaba", "Ikeja"]);
    assert!(body["items"][0]["distanceKm"].as_f64() < body["items"][1]["distanceKm"].as_f64());

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/locations/nearby?lat=6.45&lon=3.39&radiusKm=900",
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["issues"][0]["field"], "radiusKm");
    Ok(())
}

#[tokio::test]
async fn business_profile_verification() -> Result<()> {
    let app = app();
    let (status, shop) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({
            "username": "fine_tailor",
            "email": "tailor@example.ng",
            "displayName": "Fine Tailor",
            "userType": "business",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, profile) = send(
        &app,
        Method::POST,
        "/api/business-profiles",
        Some(json!({
            "userId": id(&shop),
            "businessName": "Fine Tailor Ltd",
            "category": "Fashion",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{profile}");
    assert_eq!(profile["verified"], false);

    let (status, verified) = send(
        &app,
        Method::PUT,
        &format!("/api/business-profiles/{}/verification", id(&profile)),
        Some(json!({ "verified": true })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["verified"], true);

    let (status, by_user) = send(
        &app,
        Method::GET,
        &format!("/api/business-profiles/by-user/{}", id(&shop)),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_user["id"], profile["id"]);
    Ok(())
}

#[tokio::test]
async fn mentions_are_listed_by_user() -> Result<()> {
    let app = app();
    let ada = create_user(&app, "ada").await?;
    let bola = create_user(&app, "bola").await?;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/posts",
        Some(json!({ "authorId": id(&ada), "content": "Thanks @bola for the suya" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/post-mentions?userId={}", id(&bola)),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["items"][0]["mentionedUserId"], bola["id"]);
    Ok(())
}

#[tokio::test]
async fn null_clears_nullable_fields_on_update() -> Result<()> {
    let app = app();
    let tailor = create_user(&app, "fine_tailor").await?;
    let (status, post) = send(
        &app,
        Method::POST,
        "/api/posts",
        Some(json!({
            "authorId": id(&tailor),
            "postType": "service",
            "content": "Agbada sewing, any size",
            "price": 1500000,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{post}");

    let uri = format!("/api/posts/{}", id(&post));
    let (status, kept) = send(&app, Method::PUT, &uri, Some(json!({ "title": "Agbada" }))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kept["price"], 1500000);

    let (status, cleared) = send(&app, Method::PUT, &uri, Some(json!({ "price": null }))).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["price"].is_null());
    assert_eq!(cleared["title"], "Agbada");
    Ok(())
}
