use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use nutrimeal_db::models::NewRecipe;
use nutrimeal_types::api::{
    CategoryQuery, Claims, SearchQuery, SubmitRecipeRequest, SubmitRecipeResponse,
};
use nutrimeal_types::models::{Recipe, RecipeStatus, RecipeSummary};

use crate::auth::AppState;
use crate::error::{ApiError, AppJson, AppPath, AppQuery};
use crate::store::blocking;

const SEARCH_LIMIT: u32 = 10;
const RECOMMENDATION_COUNT: u32 = 5;

/// POST /api/recipes/upload
pub async fn submit_recipe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<SubmitRecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = NewRecipe {
        name: req.name.unwrap_or_default(),
        description: req.description,
        servings: req.servings,
        category: req.category,
        subcategory: req.subcategory,
        cuisine: req.cuisine,
        ingredients: req.ingredients.unwrap_or_default(),
        steps: req.steps.unwrap_or_default(),
        nutrition: req.nutrition.unwrap_or_default(),
        image_url: req.image_url,
    };

    let author = claims.sub;
    let recipe_id = blocking(&state, move |db| db.submit_recipe(author, &recipe)).await?;

    info!("'{}' submitted recipe {}", claims.username, recipe_id);
    Ok((
        StatusCode::CREATED,
        Json(SubmitRecipeResponse {
            recipe_id,
            message: "Recipe submitted for review".into(),
        }),
    ))
}

/// GET /api/recipes/public
pub async fn list_public(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = blocking(&state, |db| db.list_approved()).await?;
    Ok(Json(recipes))
}

/// GET /api/recipes?category=&subcategory=
pub async fn list_by_category(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CategoryQuery>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let category = present(query.category);
    let subcategory = present(query.subcategory);

    let recipes = blocking(&state, move |db| {
        db.list_by_category(category.as_deref(), subcategory.as_deref())
    })
    .await?;
    Ok(Json(recipes))
}

/// GET /api/cuisine/{cuisine}
pub async fn list_by_cuisine(
    State(state): State<AppState>,
    AppPath(cuisine): AppPath<String>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = blocking(&state, move |db| db.list_by_cuisine(&cuisine)).await?;
    Ok(Json(recipes))
}

/// GET /api/recipe/{id}
///
/// Recipes still in review (or rejected) are hidden from the public.
pub async fn get_recipe(
    State(state): State<AppState>,
    AppPath(recipe_id): AppPath<Uuid>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = blocking(&state, move |db| db.get_recipe(recipe_id)).await?;

    match recipe {
        Some(recipe) if recipe.status == RecipeStatus::Approved => Ok(Json(recipe)),
        _ => Err(ApiError::NotFound("Recipe not found".into())),
    }
}

/// GET /api/search?q=
pub async fn search(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> Result<Json<Vec<RecipeSummary>>, ApiError> {
    let Some(prefix) = present(query.q) else {
        return Ok(Json(Vec::new()));
    };

    let results = blocking(&state, move |db| db.search_by_prefix(&prefix, SEARCH_LIMIT)).await?;
    Ok(Json(results))
}

/// GET /api/recommendations
pub async fn recommendations(State(state): State<AppState>) -> Result<Json<Vec<RecipeSummary>>, ApiError> {
    let picks = blocking(&state, |db| db.random_approved(RECOMMENDATION_COUNT)).await?;
    Ok(Json(picks))
}

/// GET /api/recipe/by-name/{dish}
///
/// Returns the stored recipe for `dish`, generating and storing one for
/// review when none exists yet.
pub async fn lookup_or_generate(
    State(state): State<AppState>,
    AppPath(dish): AppPath<String>,
) -> Result<Json<Recipe>, ApiError> {
    let dish = dish.trim().to_string();
    if dish.is_empty() {
        return Err(ApiError::invalid("dish name is required"));
    }

    let lookup = dish.clone();
    if let Some(recipe) = blocking(&state, move |db| db.find_recipe_by_name(&lookup)).await? {
        return Ok(Json(recipe));
    }

    let generated = state.generator.generate(&dish).await;

    let recipe = blocking(&state, move |db| {
        let id = db.seed_recipe(&generated, RecipeStatus::Pending)?;
        db.get_recipe(id)
    })
    .await?
    .ok_or(ApiError::Internal)?;

    info!("Generated recipe '{}' queued for review", recipe.name);
    Ok(Json(recipe))
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
