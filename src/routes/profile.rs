//! Profile routes: show and update name/avatar.

use axum::extract::{Multipart, State};
use axum::response::Json;

use crate::routes::ApiError;
use crate::routes::auth::AuthUser;
use crate::services::avatar::{self, AvatarJob};
use crate::services::profile::{self, ProfileError, ProfileView};
use crate::state::AppState;

pub(crate) fn profile_error(err: ProfileError) -> ApiError {
    match err {
        ProfileError::NotFound(_) => ApiError::NotFound,
        ProfileError::Validation(errors) => ApiError::Validation(errors),
        ProfileError::Database(e) => ApiError::internal("profile query failed", e),
    }
}

#[derive(Debug, Default)]
struct ProfileForm {
    name: Option<String>,
    avatar: Option<Vec<u8>>,
}

async fn read_form(mut multipart: Multipart) -> Result<ProfileForm, ApiError> {
    let mut form = ProfileForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {e}")))?
    {
        match field.name() {
            Some("name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read name: {e}")))?;
                form.name = Some(text);
            }
            Some("avatar") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read avatar: {e}")))?;
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    form.avatar = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

/// `GET /api/profile`
pub async fn show_profile(State(state): State<AppState>, auth: AuthUser) -> Result<Json<ProfileView>, ApiError> {
    let view = profile::get_profile(&state.pool, auth.user.id).await.map_err(profile_error)?;
    Ok(Json(view))
}

/// `PUT /api/profile`: multipart `name` and optional `avatar`. The name is
/// saved immediately; an avatar is queued and the response still carries the
/// previous avatar URL.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<ProfileView>, ApiError> {
    let user_id = auth.user.id;
    let form = read_form(multipart).await?;
    let name = profile::validate_profile(form.name.as_deref(), form.avatar.as_deref(), state.config.avatar.max_bytes)?;

    if form.avatar.is_some() && state.avatar_tx.is_none() {
        return Err(ApiError::Unavailable("avatar processing unavailable"));
    }

    let view = profile::update_name(&state.pool, user_id, &name).await.map_err(profile_error)?;

    match (form.avatar, &state.avatar_tx) {
        (Some(bytes), Some(tx)) => {
            let temp_path = avatar::stage_upload(&state.config.tmp_dir(), user_id, &bytes)
                .await
                .map_err(|e| ApiError::internal("avatar staging failed", e))?;
            let job = AvatarJob { user_id, temp_path: temp_path.clone() };
            if let Err(e) = avatar::enqueue(tx, job) {
                if let Err(rm) = tokio::fs::remove_file(&temp_path).await {
                    tracing::warn!(%user_id, error = %rm, "failed to remove staged avatar");
                }
                tracing::warn!(%user_id, error = %e, "profile avatar not queued");
                return Err(ApiError::Unavailable("avatar processing busy"));
            }
            tracing::info!(%user_id, temp_path = %temp_path.display(), "profile avatar queued");
        }
        _ => tracing::info!(%user_id, "profile avatar skipped (no file)"),
    }

    Ok(Json(view))
}
