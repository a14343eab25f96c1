//! Google OAuth service: authorize URL, code exchange, profile fetch, user linking.

use serde::Deserialize;
use sqlx::{PgPool, Row};
use url::Url;
use uuid::Uuid;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Display name for accounts whose Google profile has no name.
pub const FALLBACK_USER_NAME: &str = "ユーザー";

/// Google OAuth configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl GoogleConfig {
    /// Load from `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URI`.
    /// Returns `None` if any are missing (login will be disabled).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID").ok()?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET").ok()?;
        let redirect_uri = std::env::var("GOOGLE_REDIRECT_URI").ok()?;
        Some(Self { client_id, client_secret, redirect_uri })
    }

    /// Build the Google authorization URL carrying the CSRF `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the fixed authorize endpoint fails to parse.
    pub fn authorize_url(&self, state: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            GOOGLE_AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Subset of the OpenID userinfo document we use.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUser {
    /// Stable Google account id.
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("google token exchange failed: {0}")]
    TokenExchange(String),
    #[error("google api error: {0}")]
    GoogleApi(String),
    #[error("google account has no email")]
    MissingEmail,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Exchange an authorization code for an access token.
pub async fn exchange_code(config: &GoogleConfig, code: &str) -> Result<String, AuthError> {
    let client = reqwest::Client::new();
    let resp = client
        .post(GOOGLE_TOKEN_URL)
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;
    if !status.is_success() {
        return Err(AuthError::TokenExchange(format!("{status}: {body}")));
    }
    let token_resp: TokenResponse =
        serde_json::from_str(&body).map_err(|_| AuthError::TokenExchange(format!("unexpected response: {body}")))?;
    Ok(token_resp.access_token)
}

/// Fetch the authenticated Google user's profile.
pub async fn fetch_google_user(access_token: &str) -> Result<GoogleUser, AuthError> {
    let client = reqwest::Client::new();
    let resp = client
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| AuthError::GoogleApi(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(AuthError::GoogleApi(format!("{status}: {body}")));
    }

    resp.json::<GoogleUser>()
        .await
        .map_err(|e| AuthError::GoogleApi(e.to_string()))
}

/// Display name for a new account.
#[must_use]
pub fn display_name(profile: &GoogleUser) -> String {
    profile
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_USER_NAME)
        .to_owned()
}

/// Find the user by Google id or email, linking the Google id to an
/// email-matched account, or create a new user. Returns the user's UUID.
pub async fn find_or_create_user(pool: &PgPool, profile: &GoogleUser) -> Result<Uuid, AuthError> {
    let email = profile
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or(AuthError::MissingEmail)?;

    let existing = sqlx::query(
        r"SELECT id, google_id
          FROM users
          WHERE google_id = $1 OR email = $2
          ORDER BY (google_id = $1) DESC NULLS LAST
          LIMIT 1",
    )
    .bind(&profile.sub)
    .bind(email)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = existing {
        let id: Uuid = row.get("id");
        let google_id: Option<String> = row.get("google_id");
        if google_id.is_none() {
            sqlx::query("UPDATE users SET google_id = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(&profile.sub)
                .execute(pool)
                .await?;
            tracing::info!(user_id = %id, "linked google account to existing user");
        }
        return Ok(id);
    }

    let row = sqlx::query(
        r"INSERT INTO users (name, email, google_id, avatar_url)
          VALUES ($1, $2, $3, $4)
          RETURNING id",
    )
    .bind(display_name(profile))
    .bind(email)
    .bind(&profile.sub)
    .bind(&profile.picture)
    .fetch_one(pool)
    .await?;
    let id: Uuid = row.get("id");
    tracing::info!(user_id = %id, "created user from google login");
    Ok(id)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
