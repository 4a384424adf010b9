use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Ingredient, Role, deserialize_servings};

// -- JWT Claims --

/// Session token claims. Shared by the token issuer and the request guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

// Request bodies keep required fields optional so that a missing field is
// reported as a validation error rather than a decode failure.

// -- Auth --

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user_id: Uuid,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub token: String,
}

// -- Profile --

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

// -- Recipes --

#[derive(Debug, Default, Deserialize)]
pub struct SubmitRecipeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "serving", deserialize_with = "deserialize_servings")]
    pub servings: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub ingredients: Option<Vec<Ingredient>>,
    #[serde(default, alias = "instructions")]
    pub steps: Option<Vec<String>>,
    #[serde(default)]
    pub nutrition: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRecipeResponse {
    pub recipe_id: Uuid,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

// -- Interactions --

#[derive(Debug, Default, Deserialize)]
pub struct ReactionRequest {
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionResponse {
    pub changed: bool,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    #[serde(default, alias = "content")]
    pub body: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub comment_id: Uuid,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct FavouriteRequest {
    #[serde(default)]
    pub recipe_id: Option<Uuid>,
}

// -- Meal plan --

#[derive(Debug, Default, Deserialize)]
pub struct MealPlanRequest {
    #[serde(default)]
    pub recipe_id: Option<Uuid>,
    #[serde(default, alias = "day")]
    pub day_of_week: Option<String>,
    #[serde(default, alias = "slot")]
    pub meal_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MealPlanResponse {
    pub entry_id: Uuid,
    pub message: String,
}

// -- Admin --

#[derive(Debug, Default, Deserialize)]
pub struct AdminRecipeQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: Option<String>,
}

// -- Contact --

#[derive(Debug, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponse {
    pub query_id: Uuid,
    pub message: String,
}

// -- Generic --

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
