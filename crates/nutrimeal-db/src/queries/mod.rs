mod contact;
mod interactions;
mod mealplan;
mod recipes;
mod users;

pub use interactions::ReactionOutcome;
pub use recipes::StatusChange;

use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::StoreError;

fn recipe_exists(conn: &Connection, recipe_id: Uuid) -> Result<bool, StoreError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM recipes WHERE id = ?1",
            [recipe_id.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Reactions, favourites, comments and stats only exist for recipes the
/// public can see.
fn approved_recipe_exists(conn: &Connection, recipe_id: Uuid) -> Result<bool, StoreError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM recipes WHERE id = ?1 AND status = 'approved'",
            [recipe_id.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Trims and rejects blank values, naming the offending field.
fn required(value: Option<&str>, field: &str) -> Result<String, StoreError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(StoreError::invalid(format!("{} is required", field))),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use nutrimeal_types::models::{Ingredient, RecipeStatus, Role};
    use uuid::Uuid;

    use crate::Database;
    use crate::models::NewRecipe;

    pub fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    pub fn user(db: &Database, name: &str) -> Uuid {
        db.create_user(name, &format!("{}@example.com", name), "hash", Role::User)
            .unwrap()
    }

    pub fn new_recipe(name: &str) -> NewRecipe {
        NewRecipe {
            name: name.to_string(),
            description: Some(format!("{} description", name)),
            servings: Some(2),
            category: Some("Dinner".into()),
            subcategory: Some("Veg".into()),
            cuisine: Some("Italian".into()),
            ingredients: vec![Ingredient::from_line("2 tomatoes")],
            steps: vec!["Cook".into()],
            ..Default::default()
        }
    }

    pub fn recipe(db: &Database, author: Uuid, name: &str) -> Uuid {
        db.submit_recipe(author, &new_recipe(name)).unwrap()
    }

    pub fn approved(db: &Database, author: Uuid, name: &str) -> Uuid {
        let id = recipe(db, author, name);
        db.set_recipe_status(id, RecipeStatus::Approved).unwrap();
        id
    }

    pub fn count(db: &Database, sql: &str, id: Uuid) -> i64 {
        db.with_conn(|conn| Ok(conn.query_row(sql, [id.to_string()], |r| r.get(0))?))
            .unwrap()
    }
}
