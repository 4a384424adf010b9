use axum::{
    Extension, Json,
    extract::State,
};
use uuid::Uuid;

use nutrimeal_types::api::{Claims, FavouriteRequest, MessageResponse};
use nutrimeal_types::models::Recipe;

use crate::auth::AppState;
use crate::error::{ApiError, AppJson, AppPath};
use crate::store::blocking;

/// POST /api/favourites
pub async fn add_favourite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<FavouriteRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let recipe_id = req
        .recipe_id
        .ok_or_else(|| ApiError::invalid("recipe_id is required"))?;
    let user_id = claims.sub;

    blocking(&state, move |db| db.add_favourite(user_id, recipe_id)).await?;
    Ok(Json(MessageResponse::new("Recipe added to favourites")))
}

/// DELETE /api/favourites/{recipe_id}
pub async fn remove_favourite(
    State(state): State<AppState>,
    AppPath(recipe_id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = claims.sub;
    blocking(&state, move |db| db.remove_favourite(user_id, recipe_id)).await?;
    Ok(Json(MessageResponse::new("Recipe removed from favourites")))
}

/// GET /api/favourites
pub async fn list_favourites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let user_id = claims.sub;
    let recipes = blocking(&state, move |db| db.list_favourites(user_id)).await?;
    Ok(Json(recipes))
}
