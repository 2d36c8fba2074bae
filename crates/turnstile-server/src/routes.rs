//! Route definitions.

use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the router. API routes are nested under `prefix` when it is
/// non-empty; `/healthz` always stays at the root.
pub fn create_router(state: AppState, prefix: &str) -> Router {
    let api = Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/secure/ping", get(handlers::secure_ping))
        .route("/public/ping", get(handlers::public_ping))
        .route("/admin/test", get(handlers::admin_test))
        .with_state(state);

    let app = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(prefix, api)
    };

    app.route("/healthz", get(handlers::healthz))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompatConfig;
    use crate::models::{PingResponse, SessionResponse};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use chrono::{DateTime, TimeDelta};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use turnstile_core::{
        ManualClock, MemoryTokenStore, Role, SessionConfig, SessionManager, TokenStore,
    };

    struct TestApp {
        router: Router,
        clock: Arc<ManualClock>,
    }

    fn test_app_with(compat: CompatConfig, prefix: &str) -> TestApp {
        let config = SessionConfig {
            ttl: Duration::from_secs(30),
            admin_subject: "sergi".to_string(),
            ..SessionConfig::default()
        };
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new(config.ttl));
        let sessions = SessionManager::new(store, clock.clone(), config);
        TestApp {
            router: create_router(AppState::new(sessions, compat), prefix),
            clock,
        }
    }

    fn test_app() -> TestApp {
        test_app_with(CompatConfig::default(), "")
    }

    impl TestApp {
        async fn send(&self, req: Request<Body>) -> Response {
            self.router.clone().oneshot(req).await.unwrap()
        }

        async fn login(&self, username: &str) -> SessionResponse {
            let resp = self
                .send(json_post("/auth/login", json!({ "username": username, "password": "pw" })))
                .await;
            assert_eq!(resp.status(), StatusCode::OK);
            read_json(resp).await
        }
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(resp: Response) -> T {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn read_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app();
        let resp = app.send(get("/healthz")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_returns_session_with_role() {
        let app = test_app();

        let admin = app.login("sergi").await;
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.username, "sergi");
        assert_eq!(admin.expires_in, 30);
        assert_eq!(admin.time_generated, 1_700_000_000_000);

        let user = app.login("alice").await;
        assert_eq!(user.role, Role::User);
        assert_ne!(user.access_token, admin.access_token);
    }

    #[tokio::test]
    async fn login_without_password_still_succeeds() {
        let app = test_app();
        let resp = app.send(json_post("/auth/login", json!({ "username": "alice" }))).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn secure_ping_requires_live_token() {
        let app = test_app();
        let session = app.login("alice").await;

        let resp = app.send(get_with_token("/secure/ping", &session.access_token)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: PingResponse = read_json(resp).await;
        assert_eq!(body, PingResponse { ok: true, user: "alice".into() });

        app.clock.advance(TimeDelta::seconds(30));
        let expired = app.send(get_with_token("/secure/ping", &session.access_token)).await;
        let unknown = app.send(get_with_token("/secure/ping", "never-issued")).await;
        let missing = app.send(get("/secure/ping")).await;

        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        // Expired and unknown tokens are indistinguishable.
        assert_eq!(read_text(expired).await, read_text(unknown).await);
    }

    #[tokio::test]
    async fn refresh_swaps_tokens() {
        let app = test_app();
        let session = app.login("alice").await;

        app.clock.advance(TimeDelta::seconds(20));
        let resp = app
            .send(json_post("/auth/refresh", json!({ "access_token": session.access_token })))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let refreshed: SessionResponse = read_json(resp).await;
        assert_eq!(refreshed.role, Role::User);
        assert_eq!(refreshed.time_generated, session.time_generated + 20_000);

        app.clock.advance(TimeDelta::seconds(20));
        let old = app.send(get_with_token("/secure/ping", &session.access_token)).await;
        let new = app.send(get_with_token("/secure/ping", &refreshed.access_token)).await;
        assert_eq!(old.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(new.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn refresh_of_unknown_token_is_unauthorized() {
        let app = test_app();
        let resp = app
            .send(json_post("/auth/refresh", json!({ "access_token": "ghost" })))
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn public_ping_needs_no_token() {
        let app = test_app();
        let resp = app.send(get("/public/ping")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: PingResponse = read_json(resp).await;
        assert_eq!(body.user, "unknown");
    }

    #[tokio::test]
    async fn admin_test_uses_status_codes() {
        let app = test_app();
        let admin = app.login("sergi").await;
        let user = app.login("alice").await;

        // Role gating ignores expiry.
        app.clock.advance(TimeDelta::seconds(120));
        assert_eq!(
            app.send(get_with_token("/admin/test", &admin.access_token)).await.status(),
            StatusCode::OK
        );
        assert_eq!(
            app.send(get_with_token("/admin/test", &user.access_token)).await.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            app.send(get_with_token("/admin/test", "ghost")).await.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(app.send(get("/admin/test")).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_test_legacy_body_mode() {
        let app = test_app_with(
            CompatConfig {
                admin_status_in_body: true,
                ..CompatConfig::default()
            },
            "",
        );
        let admin = app.login("sergi").await;
        let user = app.login("alice").await;

        let ok = app.send(get_with_token("/admin/test", &admin.access_token)).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert!(read_text(ok).await.contains("HAS ACCEDIT COM ADMIN"));

        let rejected = app.send(get_with_token("/admin/test", &user.access_token)).await;
        assert_eq!(rejected.status(), StatusCode::OK);
        assert!(read_text(rejected).await.contains("NO ETS ADMIN"));
    }

    #[tokio::test]
    async fn legacy_client_flow_under_prefix() {
        let app = test_app_with(
            CompatConfig {
                admin_status_in_body: true,
                refresh_bare_token: true,
            },
            "/jwt",
        );
        let resp = app
            .send(json_post("/jwt/auth/login", json!({ "username": "sergi", "password": "pw" })))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let session: SessionResponse = read_json(resp).await;

        app.clock.advance(TimeDelta::seconds(31));
        let resp = app
            .send(json_post("/jwt/auth/refresh", json!({ "access_token": session.access_token })))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
        assert!(content_type.starts_with("text/plain"), "got {content_type}");
        let token = read_text(resp).await;
        assert_eq!(token.len(), 36);
        assert_ne!(token, session.access_token);

        // The body is usable verbatim as the next bearer token.
        let ping = app.send(get_with_token("/jwt/secure/ping", &token)).await;
        assert_eq!(ping.status(), StatusCode::OK);
        let admin = app.send(get_with_token("/jwt/admin/test", &token)).await;
        assert!(read_text(admin).await.contains("HAS ACCEDIT COM ADMIN"));
    }

    #[tokio::test]
    async fn bare_refresh_of_unknown_token_is_still_unauthorized() {
        let app = test_app_with(
            CompatConfig {
                refresh_bare_token: true,
                ..CompatConfig::default()
            },
            "",
        );
        let resp = app
            .send(json_post("/auth/refresh", json!({ "access_token": "ghost" })))
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn routes_honour_path_prefix() {
        let app = test_app_with(CompatConfig::default(), "/jwt");
        assert_eq!(app.send(get("/jwt/public/ping")).await.status(), StatusCode::OK);
        assert_eq!(app.send(get("/public/ping")).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(app.send(get("/healthz")).await.status(), StatusCode::OK);
    }
}
