pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, request::Parts, HeaderValue},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::profile::handlers as profile;
use crate::query::handlers as query;
use crate::state::AppState;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/profile",
            get(profile::handle_get_profile)
                .post(profile::handle_create_profile)
                .put(profile::handle_replace_profile)
                .patch(profile::handle_patch_profile)
                .delete(profile::handle_delete_profile),
        )
        .route("/api/projects", get(query::handle_list_projects))
        .route("/api/skills/top", get(query::handle_top_skills))
        .route("/api/search", get(query::handle_search))
        .with_state(state)
}

/// Full application: API routes, optional static front end, and the
/// middleware stack.
pub fn build_app(state: AppState, config: &Config) -> Router {
    let mut app = build_router(state);

    if let Some(dir) = &config.client_dir {
        let index = dir.join("index.html");
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    app.layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
}

/// Host part of an origin such as `https://example.com:8080`, without port.
fn origin_host(origin: &str) -> Option<String> {
    let rest = origin.split_once("://").map(|(_, rest)| rest)?;
    let authority = rest.split('/').next()?;
    let host = authority.rsplit_once(':').map_or(authority, |(host, _)| host);
    (!host.is_empty()).then(|| host.to_lowercase())
}

/// Whether a browser origin may call the API.
///
/// Allowed when listed, when `*` is listed, or when it names the same host
/// the request was sent to (front end served from another port).
pub fn origin_allowed(allowed: &[String], origin: &str, request_host: Option<&str>) -> bool {
    if allowed.iter().any(|o| o == "*" || o == origin) {
        return true;
    }
    let request_host = request_host
        .map(|h| h.rsplit_once(':').map_or(h, |(host, _)| host).to_lowercase());
    match (origin_host(origin), request_host) {
        (Some(origin_host), Some(request_host)) => origin_host == request_host,
        _ => false,
    }
}

pub fn cors_layer(allowed: &[String]) -> CorsLayer {
    if allowed.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed = allowed.to_vec();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, parts: &Parts| {
                let Ok(origin) = origin.to_str() else {
                    return false;
                };
                let host = parts
                    .headers
                    .get(header::HOST)
                    .and_then(|h| h.to_str().ok());
                origin_allowed(&allowed, origin, host)
            },
        ))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::store::memory::MemoryProfileStore;

    fn app(store: MemoryProfileStore) -> Router {
        build_router(AppState::new(Arc::new(store)))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(MemoryProfileStore::new()), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_profile_lifecycle_over_http() {
        let app = app(MemoryProfileStore::new());
        let ada = json!({ "name": "Ada", "email": "ada@example.com" });

        let (status, body) = send(&app, Method::GET, "/api/profile", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Profile not found" }));

        let (status, body) = send(&app, Method::POST, "/api/profile", Some(ada.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["slug"], "me");

        let (status, _) = send(&app, Method::POST, "/api/profile", Some(ada)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, Method::PATCH, "/api/profile", Some(json!({ "name": "B" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "B");
        assert_eq!(body["email"], "ada@example.com");

        let (status, body) = send(&app, Method::DELETE, "/api/profile", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "deleted": 1 }));

        let (status, _) = send(&app, Method::DELETE, "/api/profile", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_put_validation_failure_is_bad_request() {
        let app = app(MemoryProfileStore::new());
        let (status, body) = send(&app, Method::PUT, "/api/profile", Some(json!({ "email": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = app(MemoryProfileStore::new());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/profile")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_soft_delete_over_http() {
        let app = app(MemoryProfileStore::new().denying_deletes());
        send(&app, Method::PUT, "/api/profile", Some(json!({ "name": "Ada", "email": "a@b.c" }))).await;

        let (status, body) = send(&app, Method::DELETE, "/api/profile", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 0);
        assert_eq!(body["softDeleted"], 1);

        let (status, _) = send(&app, Method::GET, "/api/profile", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_failed_soft_delete_is_forbidden() {
        let app = app(MemoryProfileStore::new().denying_deletes().denying_renames());
        send(&app, Method::PUT, "/api/profile", Some(json!({ "name": "Ada", "email": "a@b.c" }))).await;

        let (status, body) = send(&app, Method::DELETE, "/api/profile", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_derived_queries_over_http() {
        let app = app(MemoryProfileStore::new());
        let profile = json!({
            "name": "Ada",
            "email": "ada@example.com",
            "skills": ["Go", "go", "Rust"],
            "projects": [{ "title": "Indexer", "description": "Search Engine", "skills": ["RUST", "Go"] }]
        });
        send(&app, Method::PUT, "/api/profile", Some(profile)).await;

        let (status, body) = send(&app, Method::GET, "/api/skills/top", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{ "skill": "go", "count": 3 }, { "skill": "rust", "count": 2 }])
        );

        let (status, body) = send(&app, Method::GET, "/api/projects?skill=python", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = send(&app, Method::GET, "/api/projects?skill=rust", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["title"], "Indexer");

        let (status, _) = send(&app, Method::GET, "/api/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/api/search?q=", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::GET, "/api/search?q=engine", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["projects"][0]["title"], "Indexer");
        assert_eq!(body["skills"], json!([]));
        assert_eq!(body["work"], json!([]));
    }

    #[tokio::test]
    async fn test_bad_query_string_uses_json_error_body() {
        let app = app(MemoryProfileStore::new());
        for uri in ["/api/search?q=a&q=b", "/api/projects?skill=a&skill=b"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                response.headers().get(header::CONTENT_TYPE).unwrap(),
                "application/json"
            );
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert!(body["error"].as_str().unwrap().contains("query string"));
        }
    }

    #[test]
    fn test_origin_allowed() {
        let allowed = vec!["https://me.dev".to_string()];
        assert!(origin_allowed(&allowed, "https://me.dev", None));
        assert!(!origin_allowed(&allowed, "https://evil.dev", Some("api.me.dev")));
        assert!(origin_allowed(&allowed, "http://localhost:5173", Some("localhost:4000")));
        assert!(origin_allowed(&["*".to_string()], "https://any.dev", None));
    }
}
