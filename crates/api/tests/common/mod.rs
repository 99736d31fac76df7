#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use slotbook_api::auth::jwt::JwtConfig;
use slotbook_api::config::ServerConfig;
use slotbook_api::routes;
use slotbook_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults and overlap enforcement on.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_max_connections: 5,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
        },
        enforce_availability: true,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_with_config(pool, test_config())
}

pub fn build_app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Sign a bearer token for `user_id` with the test secret, valid for 15 minutes.
pub fn bearer_token(user_id: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + 15 * 60;
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &serde_json::json!({ "sub": user_id, "exp": exp }),
        &jsonwebtoken::EncodingKey::from_secret(test_config().jwt.secret.as_bytes()),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response {
    send_json_as(app, method, uri, body, None).await
}

pub async fn send_json_as(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    bearer: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn delete(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct Fixture {
    pub branch_id: i64,
    pub zone_a: i64,
    pub zone_b: i64,
    pub closed_zone: i64,
    pub category_id: i64,
    pub service_id: i64,
}

/// Seed a branch with two bookable zones, one closed zone and a service.
pub async fn seed(pool: &PgPool) -> Fixture {
    let (branch_id,): (i64,) =
        sqlx::query_as("INSERT INTO branches (name) VALUES ('Central') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();

    let mut zones = Vec::new();
    for (name, bookable) in [("Hall A", true), ("Hall B", true), ("Closed", false)] {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO zones (branch_id, name, is_booking_available)
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(branch_id)
        .bind(name)
        .bind(bookable)
        .fetch_one(pool)
        .await
        .unwrap();
        zones.push(id);
    }

    let (category_id,): (i64,) = sqlx::query_as(
        "INSERT INTO service_categories (branch_id, name) VALUES ($1, 'Hair') RETURNING id",
    )
    .bind(branch_id)
    .fetch_one(pool)
    .await
    .unwrap();

    let (service_id,): (i64,) = sqlx::query_as(
        "INSERT INTO services (category_id, branch_id, name) VALUES ($1, $2, 'Cut') RETURNING id",
    )
    .bind(category_id)
    .bind(branch_id)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO service_zones (service_id, zone_id) VALUES ($1, $2), ($1, $3)")
        .bind(service_id)
        .bind(zones[0])
        .bind(zones[1])
        .execute(pool)
        .await
        .unwrap();

    Fixture {
        branch_id,
        zone_a: zones[0],
        zone_b: zones[1],
        closed_zone: zones[2],
        category_id,
        service_id,
    }
}
