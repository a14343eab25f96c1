//! Profile service: display name and avatar reference.
//!
//! The avatar itself is replaced asynchronously by the avatar worker, so an
//! update returns the avatar URL that was current when the request ran.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::avatar::{self, AvatarError};
use crate::services::validation::{ValidationErrors, require_text};

pub const MAX_NAME_CHARS: usize = 255;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProfileView {
    pub name: String,
    #[sqlx(rename = "avatar_url")]
    pub avatar: Option<String>,
}

/// Validate a profile form: a required name and an optional image upload.
///
/// # Errors
///
/// Returns field errors for `name` and `avatar` together.
pub fn validate_profile(name: Option<&str>, avatar: Option<&[u8]>, max_avatar_bytes: usize) -> Result<String, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let name = name.unwrap_or_default();
    require_text(&mut errors, "name", "名前", name, MAX_NAME_CHARS);

    if let Some(bytes) = avatar {
        match avatar::check_upload(bytes, max_avatar_bytes) {
            Ok(_) => {}
            Err(AvatarError::TooLarge { max, .. }) => {
                errors.add("avatar", format!("アバターは{}KB以下のファイルを指定してください。", max / 1024));
            }
            Err(_) => errors.add("avatar", "アバターには画像ファイルを指定してください。"),
        }
    }

    errors.finish()?;
    Ok(name.trim().to_owned())
}

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<ProfileView, ProfileError> {
    sqlx::query_as::<_, ProfileView>("SELECT name, avatar_url FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ProfileError::NotFound(user_id))
}

/// Store a validated display name and return the profile.
pub async fn update_name(pool: &PgPool, user_id: Uuid, name: &str) -> Result<ProfileView, ProfileError> {
    sqlx::query_as::<_, ProfileView>(
        "UPDATE users SET name = $2, updated_at = now() WHERE id = $1 RETURNING name, avatar_url",
    )
    .bind(user_id)
    .bind(name)
    .fetch_optional(pool)
    .await?
    .ok_or(ProfileError::NotFound(user_id))
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
