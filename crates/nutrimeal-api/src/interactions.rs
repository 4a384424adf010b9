use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use nutrimeal_db::queries::ReactionOutcome;
use nutrimeal_types::api::{
    Claims, CommentRequest, CommentResponse, ReactionRequest, ReactionResponse,
};
use nutrimeal_types::models::{ReactionKind, RecipeStats};

use crate::auth::AppState;
use crate::error::{ApiError, AppJson, AppPath};
use crate::middleware::MaybeClaims;
use crate::store::blocking;

fn reaction_kind(req: ReactionRequest) -> Result<ReactionKind, ApiError> {
    req.kind
        .as_deref()
        .and_then(|k| k.parse().ok())
        .ok_or_else(|| ApiError::invalid("Invalid action type"))
}

/// GET /api/recipe/{id}/stats
///
/// Anonymous callers get the aggregate view only.
pub async fn get_stats(
    State(state): State<AppState>,
    AppPath(recipe_id): AppPath<Uuid>,
    MaybeClaims(claims): MaybeClaims,
) -> Result<Json<RecipeStats>, ApiError> {
    let caller = claims.map(|c| c.sub);
    let stats = blocking(&state, move |db| db.recipe_stats(recipe_id, caller)).await?;
    Ok(Json(stats))
}

/// POST /api/recipe/{id}/toggle-like
pub async fn set_reaction(
    State(state): State<AppState>,
    AppPath(recipe_id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = reaction_kind(req)?;
    let user_id = claims.sub;

    let outcome = blocking(&state, move |db| db.set_reaction(user_id, recipe_id, kind)).await?;

    let (status, message) = match outcome {
        ReactionOutcome::Created => (StatusCode::CREATED, format!("{} recorded", kind)),
        ReactionOutcome::Replaced => (StatusCode::OK, format!("Reaction changed to {}", kind)),
    };

    Ok((status, Json(ReactionResponse { changed: true, message })))
}

/// DELETE /api/recipe/{id}/toggle-like
pub async fn clear_reaction(
    State(state): State<AppState>,
    AppPath(recipe_id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = reaction_kind(req)?;
    let user_id = claims.sub;

    blocking(&state, move |db| db.clear_reaction(user_id, recipe_id, kind)).await?;

    Ok(Json(ReactionResponse {
        changed: true,
        message: format!("{} removed", kind),
    }))
}

/// POST /api/recipe/{id}/comment
pub async fn add_comment(
    State(state): State<AppState>,
    AppPath(recipe_id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let body = req.body.unwrap_or_default();
    if body.trim().is_empty() {
        return Err(ApiError::invalid("Comment cannot be empty"));
    }

    let user_id = claims.sub;
    let comment_id = blocking(&state, move |db| db.add_comment(user_id, recipe_id, &body)).await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            comment_id,
            message: "Comment added".into(),
        }),
    ))
}

