use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::auth::{Credentials, Session};
use crate::error::ApiError;
use crate::server::AppState;

pub const SESSION_COOKIE: &str = "edupanel_session";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/register", post(register))
}

/// A request carrying a live session token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub session: Session,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = presented_token(&parts.headers) else {
            tracing::warn!(path = %parts.uri.path(), "missing session token");
            return Err(ApiError::Unauthorized);
        };
        let Some(session) = state.sessions.lookup(&token).await else {
            tracing::warn!(path = %parts.uri.path(), "invalid or expired session token");
            return Err(ApiError::Unauthorized);
        };
        Ok(Self { token, session })
    }
}

/// `Authorization: Bearer <token>` wins over the session cookie.
pub fn presented_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    username: String,
    expires_at: DateTime<Utc>,
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(credentials) = body?;
    let username = credentials.username.unwrap_or_default();
    let password = credentials.password.unwrap_or_default();
    if username.trim().is_empty() || password.is_empty() {
        return Err(ApiError::invalid(
            "username",
            "Username and password are required",
        ));
    }

    let Some(user) = state.users.authenticate(&username, &password).await? else {
        tracing::warn!(username = %username.trim(), "login rejected");
        return Err(ApiError::Unauthorized);
    };
    let (token, session) = state.sessions.issue(&user).await;
    tracing::info!(username = %user.username, "login");

    let cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        state.sessions.ttl_secs()
    );
    let body = LoginResponse {
        token,
        username: session.username,
        expires_at: session.expires_at,
    };
    Ok(with_cookie(Json(body), &cookie))
}

async fn logout(State(state): State<AppState>, auth: AuthSession) -> Response {
    state.sessions.revoke(&auth.token).await;
    tracing::info!(username = %auth.session.username, "logout");
    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0");
    with_cookie(
        Json(serde_json::json!({ "message": "Logged out successfully" })),
        &cookie,
    )
}

/// Open while no user exists; afterwards only signed-in users may add users.
async fn register(
    State(state): State<AppState>,
    auth: Option<AuthSession>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if auth.is_none() && !state.users.is_empty().await? {
        return Err(ApiError::Unauthorized);
    }
    let Json(credentials) = body?;
    state.users.register(credentials).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "User registered successfully" })),
    ))
}

fn with_cookie(body: impl IntoResponse, cookie: &str) -> Response {
    let mut resp = body.into_response();
    if let Ok(value) = HeaderValue::from_str(cookie) {
        resp.headers_mut().insert(header::SET_COOKIE, value);
    }
    resp
}
