//! Moderation console. Every handler here sits behind `require_auth` and
//! `require_admin`.

use axum::{
    Extension, Json,
    extract::State,
};
use tracing::info;
use uuid::Uuid;

use nutrimeal_db::queries::StatusChange;
use nutrimeal_types::api::{AdminRecipeQuery, Claims, MessageResponse, StatusUpdateRequest};
use nutrimeal_types::models::{ContactQuery, Recipe, RecipeStatus, User};

use crate::auth::AppState;
use crate::error::{ApiError, AppJson, AppPath, AppQuery};
use crate::store::blocking;

// -- Recipes --

/// GET /api/admin/recipes?status=
pub async fn list_recipes(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AdminRecipeQuery>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<RecipeStatus>()
                .map_err(|_| ApiError::invalid("Invalid recipe status filter."))?,
        ),
    };

    let recipes = blocking(&state, move |db| db.list_recipes(status)).await?;
    Ok(Json(recipes))
}

/// GET /api/admin/recipe/{id}
pub async fn get_recipe(
    State(state): State<AppState>,
    AppPath(recipe_id): AppPath<Uuid>,
) -> Result<Json<Recipe>, ApiError> {
    blocking(&state, move |db| db.get_recipe(recipe_id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Recipe not found".into()))
}

/// PUT /api/admin/recipes/status/{id}
pub async fn set_status(
    State(state): State<AppState>,
    AppPath(recipe_id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<StatusUpdateRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let target: RecipeStatus = req
        .status
        .as_deref()
        .and_then(|s| s.parse().ok())
        .filter(RecipeStatus::is_terminal)
        .ok_or_else(|| ApiError::invalid("Status must be 'approved' or 'rejected'"))?;

    let change = blocking(&state, move |db| db.set_recipe_status(recipe_id, target)).await?;

    let message = match change {
        StatusChange::Changed => {
            info!("'{}' marked recipe {} {}", claims.username, recipe_id, target);
            format!("Recipe {}", target)
        }
        StatusChange::Unchanged => format!("Recipe already {}", target),
    };
    Ok(Json(MessageResponse::new(message)))
}

/// DELETE /api/admin/recipes/{id}
pub async fn delete_recipe(
    State(state): State<AppState>,
    AppPath(recipe_id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    blocking(&state, move |db| db.delete_recipe(recipe_id)).await?;
    info!("'{}' deleted recipe {}", claims.username, recipe_id);
    Ok(Json(MessageResponse::new("Recipe deleted")))
}

// -- Users --

/// GET /api/admin/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = blocking(&state, |db| db.list_users()).await?;
    Ok(Json(users))
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    let actor = claims.sub;
    blocking(&state, move |db| db.delete_user(actor, user_id)).await?;
    info!("'{}' deleted user {}", claims.username, user_id);
    Ok(Json(MessageResponse::new("User deleted")))
}

// -- Contact queries --

/// GET /api/admin/queries
pub async fn list_queries(State(state): State<AppState>) -> Result<Json<Vec<ContactQuery>>, ApiError> {
    let queries = blocking(&state, |db| db.list_queries()).await?;
    Ok(Json(queries))
}

/// DELETE /api/admin/queries/{id}
pub async fn resolve_query(
    State(state): State<AppState>,
    AppPath(query_id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    blocking(&state, move |db| db.resolve_query(query_id)).await?;
    Ok(Json(MessageResponse::new("Query resolved")))
}
