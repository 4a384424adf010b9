//! Database row types. These map directly to SQLite rows and stay distinct
//! from the nutrimeal-types wire models; the `TryFrom` impls are the only
//! place stored text is parsed back into typed values.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use nutrimeal_types::models::{
    Comment, ContactQuery, Ingredient, Recipe, RecipeStatus, User,
};
use uuid::Uuid;

use crate::error::StoreError;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

pub struct RecipeRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub servings: Option<i64>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub cuisine: Option<String>,
    pub ingredients: String,
    pub steps: String,
    pub nutrition: String,
    pub image_url: Option<String>,
    pub status: String,
    pub submitted_by: Option<String>,
    pub created_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub recipe_id: String,
    pub user_id: String,
    pub username: String,
    pub body: String,
    pub created_at: String,
}

pub struct QueryRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: String,
    pub created_at: String,
}

/// Fields of a recipe about to be inserted.
#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub name: String,
    pub description: Option<String>,
    pub servings: Option<u32>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub cuisine: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    pub nutrition: BTreeMap<String, serde_json::Value>,
    pub image_url: Option<String>,
}

/// Timestamps are stored as fixed-width RFC 3339 so they sort lexically.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through the sqlite shell use datetime('now').
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| StoreError::Corrupt(format!("timestamp '{}': {}", raw, e)))
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id.parse()?,
            username: row.username,
            email: row.email,
            role: row.role.parse()?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = StoreError;

    fn try_from(row: RecipeRow) -> Result<Self, Self::Error> {
        let status: RecipeStatus = row.status.parse()?;
        let submitted_by = row
            .submitted_by
            .as_deref()
            .map(str::parse::<Uuid>)
            .transpose()?;

        Ok(Recipe {
            id: row.id.parse()?,
            name: row.name,
            description: row.description,
            servings: row.servings.and_then(|s| u32::try_from(s).ok()),
            category: row.category,
            subcategory: row.subcategory,
            cuisine: row.cuisine,
            ingredients: serde_json::from_str(&row.ingredients)?,
            steps: serde_json::from_str(&row.steps)?,
            nutrition: serde_json::from_str(&row.nutrition)?,
            image_url: row.image_url,
            status,
            submitted_by,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<CommentRow> for Comment {
    type Error = StoreError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(Comment {
            id: row.id.parse()?,
            recipe_id: row.recipe_id.parse()?,
            user_id: row.user_id.parse()?,
            username: row.username,
            body: row.body,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<QueryRow> for ContactQuery {
    type Error = StoreError;

    fn try_from(row: QueryRow) -> Result<Self, Self::Error> {
        Ok(ContactQuery {
            id: row.id.parse()?,
            name: row.name,
            email: row.email,
            message: row.message,
            status: row.status.parse()?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}
