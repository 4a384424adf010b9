use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{self, AppState};
use crate::middleware::{require_admin, require_auth};
use crate::{admin, contact, favourites, interactions, mealplan, profile, recipes};

/// Assembles the full API. Callers add transport layers (CORS, tracing).
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/recipes/public", get(recipes::list_public))
        .route("/api/recipes", get(recipes::list_by_category))
        .route("/api/cuisine/{cuisine}", get(recipes::list_by_cuisine))
        .route("/api/recipe/{id}", get(recipes::get_recipe))
        .route("/api/recipe/{id}/stats", get(interactions::get_stats))
        .route("/api/recipe/by-name/{dish}", get(recipes::lookup_or_generate))
        .route("/api/search", get(recipes::search))
        .route("/api/recommendations", get(recipes::recommendations))
        .route("/api/contact", post(contact::submit_query));

    let user_routes = Router::new()
        .route("/api/recipes/upload", post(recipes::submit_recipe))
        .route(
            "/api/recipe/{id}/toggle-like",
            post(interactions::set_reaction).delete(interactions::clear_reaction),
        )
        .route("/api/recipe/{id}/comment", post(interactions::add_comment))
        .route(
            "/api/favourites",
            get(favourites::list_favourites).post(favourites::add_favourite),
        )
        .route("/api/favourites/{id}", delete(favourites::remove_favourite))
        .route(
            "/api/mealplan",
            get(mealplan::list_entries).post(mealplan::upsert_entry),
        )
        .route("/api/mealplan/{id}", delete(mealplan::remove_entry))
        .route("/api/mealplan/download", get(mealplan::download_csv))
        .route("/api/mealplan/pdf", get(mealplan::download_pdf))
        .route(
            "/api/user/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // require_auth is the outer layer so the claims exist when require_admin runs.
    let admin_routes = Router::new()
        .route("/api/admin/recipes", get(admin::list_recipes))
        .route("/api/admin/recipe/{id}", get(admin::get_recipe))
        .route("/api/admin/recipes/status/{id}", put(admin::set_status))
        .route("/api/admin/recipes/{id}", delete(admin::delete_recipe))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{id}", delete(admin::delete_user))
        .route("/api/admin/queries", get(admin::list_queries))
        .route("/api/admin/queries/{id}", delete(admin::resolve_query))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(state)
}
