use crate::error::ApiError;
use crate::models::{AdminResponse, LoginRequest, PingResponse, RefreshRequest, SessionResponse};
use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use turnstile_core::{AuthError, Role};

const LEGACY_ADMIN_ACCEPTED: &str = "STATUS CODE: 202 ACCEPTED\nHAS ACCEDIT COM ADMIN!";
const LEGACY_ADMIN_REJECTED: &str = "STATUS CODE: 401 UNAUTHORIZED / NO ETS ADMIN!";

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let sessions = state.sessions();
    let session = sessions.issuer.issue(&req.username, &req.password).await?;
    Ok(Json(SessionResponse::new(session, sessions.store().ttl())))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Response, ApiError> {
    let sessions = state.sessions();
    let session = sessions.refresher.refresh(&req.access_token).await?;

    if state.compat().refresh_bare_token {
        // `String` responds as text/plain.
        return Ok(session.token.into_response());
    }
    Ok(Json(SessionResponse::new(session, sessions.store().ttl())).into_response())
}

pub async fn secure_ping(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PingResponse>, ApiError> {
    let user = state
        .sessions()
        .validator
        .validate_now(authorization(&headers))
        .await?;
    Ok(Json(PingResponse { ok: true, user }))
}

pub async fn public_ping() -> Json<PingResponse> {
    Json(PingResponse {
        ok: true,
        user: "unknown".to_string(),
    })
}

pub async fn admin_test(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let verdict = state
        .sessions()
        .role_gate
        .require_admin(authorization(&headers))
        .await;

    if state.compat().admin_status_in_body {
        return match verdict {
            Ok(()) => LEGACY_ADMIN_ACCEPTED.into_response(),
            Err(AuthError::Infrastructure(e)) => ApiError::from(AuthError::Infrastructure(e)).into_response(),
            Err(_) => LEGACY_ADMIN_REJECTED.into_response(),
        };
    }

    match verdict {
        Ok(()) => Json(AdminResponse {
            ok: true,
            role: Role::Admin,
        })
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "turnstile-server" }))
}
