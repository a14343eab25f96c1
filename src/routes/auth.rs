//! Auth routes: Google OAuth flow, identity, logout.

use axum::extract::{FromRef, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::routes::ApiError;
use crate::services::{auth as auth_svc, notification, session};
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";
const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";

const LOGIN_PATH: &str = "/login";
const AFTER_LOGIN_PATH: &str = "/boards";

const MSG_CANCELLED: &str = "ログインがキャンセルされました。";
const MSG_NO_CODE: &str = "認証コードが取得できませんでした。";
const MSG_FAILED: &str = "ログインに失敗しました。もう一度お試しください。";
const MSG_NO_EMAIL: &str = "Emailが取得できませんでした。";

fn cookie<'a>(name: &'a str, value: String, secure: bool) -> Cookie<'a> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn expired_cookie(name: &str, secure: bool) -> Cookie<'_> {
    let mut c = cookie(name, String::new(), secure);
    c.set_max_age(Duration::ZERO);
    c
}

/// Redirect to the login page carrying a user-facing error message.
pub(crate) fn login_error_redirect(message: &str) -> Redirect {
    let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    Redirect::to(&format!("{LOGIN_PATH}?error={encoded}"))
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(ApiError::Unauthorized);
        }

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, token)
            .await
            .map_err(|e| ApiError::internal("session lookup failed", e))?
            .ok_or(ApiError::Unauthorized)?;

        Ok(Self { user, token: token.to_owned() })
    }
}

// =============================================================================
// LOGIN FLOW
// =============================================================================

/// `GET /auth/google`: redirect to the Google consent page.
pub async fn google_redirect(State(state): State<AppState>) -> Response {
    let Some(config) = &state.config.google else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Google OAuth not configured").into_response();
    };

    let oauth_state = session::generate_token();
    let url = match config.authorize_url(&oauth_state) {
        Ok(url) => url,
        Err(e) => return ApiError::internal("authorize url build failed", e).into_response(),
    };

    let mut state_cookie = cookie(OAUTH_STATE_COOKIE_NAME, oauth_state, state.config.cookie_secure);
    state_cookie.set_max_age(Duration::minutes(10));

    (CookieJar::new().add(state_cookie), Redirect::temporary(url.as_str())).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// `GET /auth/google/callback`: verify state, exchange the code, find or
/// create the user, start a session, redirect to the board list.
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let Some(config) = &state.config.google else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Google OAuth not configured").into_response();
    };
    let secure = state.config.cookie_secure;
    let expected_state = jar.get(OAUTH_STATE_COOKIE_NAME).map(|c| c.value().to_owned()).unwrap_or_default();
    let jar = jar.add(expired_cookie(OAUTH_STATE_COOKIE_NAME, secure));

    if let Some(error) = params.error.as_deref() {
        tracing::info!(%error, "google login cancelled");
        return (jar, login_error_redirect(MSG_CANCELLED)).into_response();
    }
    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        return (jar, login_error_redirect(MSG_NO_CODE)).into_response();
    };

    let Some(callback_state) = params.state.as_deref() else {
        return (jar, login_error_redirect(MSG_FAILED)).into_response();
    };
    if expected_state.is_empty() || expected_state != callback_state {
        tracing::warn!("google login state mismatch");
        return (jar, login_error_redirect(MSG_FAILED)).into_response();
    }

    let profile = match auth_svc::exchange_code(config, code).await {
        Ok(token) => auth_svc::fetch_google_user(&token).await,
        Err(e) => Err(e),
    };
    let profile = match profile {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "google login failed");
            return (jar, login_error_redirect(MSG_FAILED)).into_response();
        }
    };

    let user_id = match auth_svc::find_or_create_user(&state.pool, &profile).await {
        Ok(id) => id,
        Err(auth_svc::AuthError::MissingEmail) => {
            return (jar, login_error_redirect(MSG_NO_EMAIL)).into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "user lookup failed");
            return (jar, login_error_redirect(MSG_FAILED)).into_response();
        }
    };

    let token = match session::create_session(&state.pool, user_id, state.config.session_ttl_days).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            return (jar, login_error_redirect(MSG_FAILED)).into_response();
        }
    };

    tracing::info!(%user_id, "login succeeded");
    let jar = jar.add(cookie(COOKIE_NAME, token, secure));
    (jar, Redirect::to(AFTER_LOGIN_PATH)).into_response()
}

// =============================================================================
// IDENTITY
// =============================================================================

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub name: String,
    pub avatar: Option<String>,
    pub unread_count: i64,
}

/// `GET /api/me`: display name, avatar URL and unread badge count.
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<MeResponse>, ApiError> {
    let unread_count = notification::unread_count(&state.pool, auth.user.id)
        .await
        .map_err(|e| ApiError::internal("unread count failed", e))?;
    Ok(Json(MeResponse { name: auth.user.name, avatar: auth.user.avatar_url, unread_count }))
}

/// `POST /api/logout`: delete the session and clear the cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = session::delete_session(&state.pool, &auth.token).await {
        tracing::warn!(error = %e, "session delete failed");
    }
    let jar = CookieJar::new().add(expired_cookie(COOKIE_NAME, state.config.cookie_secure));
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
