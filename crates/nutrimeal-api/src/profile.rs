use axum::{Extension, Json, extract::State};

use nutrimeal_types::api::{Claims, MessageResponse, ProfileResponse, ProfileUpdateRequest};

use crate::auth::AppState;
use crate::error::{ApiError, AppJson};
use crate::store::blocking;

/// GET /api/user/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user_id = claims.sub;
    let user = blocking(&state, move |db| db.get_user_by_id(user_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(ProfileResponse {
        name: user.username,
        email: user.email,
    }))
}

/// PUT /api/user/profile
///
/// Existing tokens keep carrying the old username until they expire.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<ProfileUpdateRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (Some(name), Some(email)) = (req.name, req.email) else {
        return Err(ApiError::invalid("Name and email are required"));
    };

    let user_id = claims.sub;
    blocking(&state, move |db| db.update_profile(user_id, &name, &email)).await?;
    Ok(Json(MessageResponse::new("Profile updated successfully")))
}
