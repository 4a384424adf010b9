use nutrimeal_types::models::{Recipe, RecipeStatus, RecipeSummary};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::info;
use uuid::Uuid;

use crate::Database;
use crate::error::StoreError;
use crate::models::{NewRecipe, RecipeRow, now_timestamp};

const RECIPE_COLUMNS: &str = "id, name, description, servings, category, subcategory, cuisine, \
     ingredients, steps, nutrition, image_url, status, submitted_by, created_at";

/// Result of a moderation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Changed,
    /// The recipe already had the requested status.
    Unchanged,
}

impl Database {
    // -- Catalog --

    /// Stores a user submission. Submissions always start out pending.
    pub fn submit_recipe(&self, author: Uuid, recipe: &NewRecipe) -> Result<Uuid, StoreError> {
        validate_submission(recipe)?;
        self.insert_recipe(Some(author), recipe, RecipeStatus::Pending)
    }

    /// Stores a system-seeded recipe (no submitter). Only the name is required.
    pub fn seed_recipe(&self, recipe: &NewRecipe, status: RecipeStatus) -> Result<Uuid, StoreError> {
        if recipe.name.trim().is_empty() {
            return Err(StoreError::invalid("name is required"));
        }
        self.insert_recipe(None, recipe, status)
    }

    fn insert_recipe(
        &self,
        author: Option<Uuid>,
        recipe: &NewRecipe,
        status: RecipeStatus,
    ) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let ingredients = serde_json::to_string(&recipe.ingredients)?;
        let steps = serde_json::to_string(&recipe.steps)?;
        let nutrition = serde_json::to_string(&recipe.nutrition)?;

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO recipes (id, name, description, servings, category, subcategory, cuisine,
                                      ingredients, steps, nutrition, image_url, status, submitted_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    id.to_string(),
                    recipe.name.trim(),
                    recipe.description,
                    recipe.servings,
                    recipe.category,
                    recipe.subcategory,
                    recipe.cuisine,
                    ingredients,
                    steps,
                    nutrition,
                    recipe.image_url,
                    status.as_str(),
                    author.map(|a| a.to_string()),
                    now_timestamp(),
                ],
            )?;
            Ok(())
        })?;

        info!("Recipe '{}' stored as {} ({})", recipe.name.trim(), status, id);
        Ok(id)
    }

    pub fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1"),
                    [id.to_string()],
                    recipe_from_row,
                )
                .optional()?;
            row.map(Recipe::try_from).transpose()
        })
    }

    /// Exact-name lookup restricted to recipes the public may see:
    /// approved ones, plus system-seeded ones awaiting review.
    pub fn find_recipe_by_name(&self, name: &str) -> Result<Option<Recipe>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {RECIPE_COLUMNS} FROM recipes
                         WHERE name = ?1 COLLATE NOCASE
                           AND (status = 'approved' OR submitted_by IS NULL)
                         ORDER BY created_at DESC LIMIT 1"
                    ),
                    [name.trim()],
                    recipe_from_row,
                )
                .optional()?;
            row.map(Recipe::try_from).transpose()
        })
    }

    /// All recipes, newest first, optionally filtered by status.
    pub fn list_recipes(&self, status: Option<RecipeStatus>) -> Result<Vec<Recipe>, StoreError> {
        self.with_conn(|conn| match status {
            Some(status) => query_recipes(
                conn,
                &format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE status = ?1 ORDER BY created_at DESC"),
                &[status.as_str()],
            ),
            None => query_recipes(
                conn,
                &format!("SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY created_at DESC"),
                &[],
            ),
        })
    }

    pub fn list_approved(&self) -> Result<Vec<Recipe>, StoreError> {
        self.list_recipes(Some(RecipeStatus::Approved))
    }

    /// Approved recipes in a category (and subcategory), case-insensitive.
    /// With no category this is the whole public catalog.
    pub fn list_by_category(
        &self,
        category: Option<&str>,
        subcategory: Option<&str>,
    ) -> Result<Vec<Recipe>, StoreError> {
        self.with_conn(|conn| match (category, subcategory) {
            (Some(category), Some(subcategory)) => query_recipes(
                conn,
                &format!(
                    "SELECT {RECIPE_COLUMNS} FROM recipes
                     WHERE status = 'approved'
                       AND LOWER(category) = LOWER(?1) AND LOWER(subcategory) = LOWER(?2)
                     ORDER BY created_at DESC"
                ),
                &[category, subcategory],
            ),
            (Some(category), None) => query_recipes(
                conn,
                &format!(
                    "SELECT {RECIPE_COLUMNS} FROM recipes
                     WHERE status = 'approved' AND LOWER(category) = LOWER(?1)
                     ORDER BY created_at DESC"
                ),
                &[category],
            ),
            _ => query_recipes(
                conn,
                &format!(
                    "SELECT {RECIPE_COLUMNS} FROM recipes WHERE status = 'approved' ORDER BY created_at DESC"
                ),
                &[],
            ),
        })
    }

    pub fn list_by_cuisine(&self, cuisine: &str) -> Result<Vec<Recipe>, StoreError> {
        self.with_conn(|conn| {
            query_recipes(
                conn,
                &format!(
                    "SELECT {RECIPE_COLUMNS} FROM recipes
                     WHERE status = 'approved' AND LOWER(cuisine) = LOWER(?1)
                     ORDER BY created_at DESC"
                ),
                &[cuisine],
            )
        })
    }

    /// Approved recipes whose name starts with `prefix`, case-insensitive.
    pub fn search_by_prefix(&self, prefix: &str, limit: u32) -> Result<Vec<RecipeSummary>, StoreError> {
        let pattern = format!("{}%", escape_like(prefix.trim()));

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, image_url FROM recipes
                 WHERE status = 'approved' AND name LIKE ?1 ESCAPE '\\'
                 ORDER BY name COLLATE NOCASE
                 LIMIT ?2",
            )?;
            collect_summaries(stmt.query_map(params![pattern, limit], summary_from_row)?)
        })
    }

    pub fn random_approved(&self, limit: u32) -> Result<Vec<RecipeSummary>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, image_url FROM recipes
                 WHERE status = 'approved'
                 ORDER BY RANDOM()
                 LIMIT ?1",
            )?;
            collect_summaries(stmt.query_map([limit], summary_from_row)?)
        })
    }

    /// Moderation transition. Only `approved` and `rejected` are valid
    /// targets; both are terminal, so a decided recipe can only be re-set to
    /// the status it already has.
    pub fn set_recipe_status(&self, id: Uuid, target: RecipeStatus) -> Result<StatusChange, StoreError> {
        if !target.is_terminal() {
            return Err(StoreError::invalid("status must be 'approved' or 'rejected'"));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current: String = tx
                .query_row("SELECT status FROM recipes WHERE id = ?1", [id.to_string()], |r| r.get(0))
                .optional()?
                .ok_or(StoreError::NotFound("recipe"))?;
            let current: RecipeStatus = current.parse()?;

            if current == target {
                return Ok(StatusChange::Unchanged);
            }
            if current.is_terminal() {
                return Err(StoreError::conflict(format!(
                    "recipe is already {}",
                    current
                )));
            }

            tx.execute(
                "UPDATE recipes SET status = ?1 WHERE id = ?2",
                (target.as_str(), id.to_string()),
            )?;
            tx.commit()?;

            info!("Recipe {} moved {} -> {}", id, current, target);
            Ok(StatusChange::Changed)
        })
    }

    /// Deletes a recipe together with every reaction, favourite, comment and
    /// meal-plan entry that references it. All or nothing.
    pub fn delete_recipe(&self, id: Uuid) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let id_str = id.to_string();

            let mut children = 0;
            for table in ["reactions", "favourites", "comments", "meal_plan_entries"] {
                children += tx.execute(&format!("DELETE FROM {table} WHERE recipe_id = ?1"), [&id_str])?;
            }

            if tx.execute("DELETE FROM recipes WHERE id = ?1", [&id_str])? == 0 {
                return Err(StoreError::NotFound("recipe"));
            }

            tx.commit()?;
            info!("Recipe {} deleted with {} dependent rows", id, children);
            Ok(())
        })
    }
}

fn validate_submission(recipe: &NewRecipe) -> Result<(), StoreError> {
    let mut missing = Vec::new();

    if recipe.name.trim().is_empty() {
        missing.push("name");
    }
    if recipe.ingredients.iter().all(|i| i.item.trim().is_empty()) {
        missing.push("ingredients");
    }
    if recipe.steps.iter().all(|s| s.trim().is_empty()) {
        missing.push("steps");
    }
    if recipe.category.as_deref().is_none_or(|c| c.trim().is_empty()) {
        missing.push("category");
    }
    if recipe.servings.is_none() {
        missing.push("servings");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::invalid(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub(crate) fn recipe_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecipeRow> {
    Ok(RecipeRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        servings: row.get(3)?,
        category: row.get(4)?,
        subcategory: row.get(5)?,
        cuisine: row.get(6)?,
        ingredients: row.get(7)?,
        steps: row.get(8)?,
        nutrition: row.get(9)?,
        image_url: row.get(10)?,
        status: row.get(11)?,
        submitted_by: row.get(12)?,
        created_at: row.get(13)?,
    })
}

/// Column list with a table alias, for joins.
pub(crate) fn recipe_columns(alias: &str) -> String {
    RECIPE_COLUMNS
        .split(", ")
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn query_recipes(conn: &Connection, sql: &str, args: &[&str]) -> Result<Vec<Recipe>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(args), recipe_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(Recipe::try_from).collect()
}

fn summary_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, Option<String>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn collect_summaries<I>(rows: I) -> Result<Vec<RecipeSummary>, StoreError>
where
    I: Iterator<Item = rusqlite::Result<(String, String, Option<String>)>>,
{
    rows.map(|row| -> Result<RecipeSummary, StoreError> {
        let (id, name, image_url) = row?;
        Ok(RecipeSummary {
            id: id.parse()?,
            name,
            image_url,
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::*;
    use nutrimeal_types::models::{Day, MealSlot, ReactionKind};

    #[test]
    fn submission_starts_pending_and_appears_after_approval() {
        let db = db();
        let alice = user(&db, "alice");
        let id = recipe(&db, alice, "Pasta");

        let stored = db.get_recipe(id).unwrap().unwrap();
        assert_eq!(stored.status, RecipeStatus::Pending);
        assert_eq!(stored.submitted_by, Some(alice));
        assert!(db.list_approved().unwrap().iter().all(|r| r.id != id));

        assert_eq!(db.set_recipe_status(id, RecipeStatus::Approved).unwrap(), StatusChange::Changed);
        assert!(db.list_approved().unwrap().iter().any(|r| r.id == id));
    }

    #[test]
    fn missing_ingredients_are_rejected() {
        let db = db();
        let alice = user(&db, "alice");
        let mut recipe = new_recipe("Empty");
        recipe.ingredients.clear();

        match db.submit_recipe(alice, &recipe) {
            Err(StoreError::InvalidInput(msg)) => assert!(msg.contains("ingredients")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn blank_ingredients_count_as_missing() {
        let db = db();
        let alice = user(&db, "alice");

        for raw in [r#"[""]"#, r#"[{}]"#, r#"["   ", {"name": " "}]"#] {
            let mut recipe = new_recipe("Blank");
            recipe.ingredients = serde_json::from_str(raw).unwrap();

            match db.submit_recipe(alice, &recipe) {
                Err(StoreError::InvalidInput(msg)) => assert!(msg.contains("ingredients"), "{raw}"),
                other => panic!("expected InvalidInput for {raw}, got {:?}", other),
            }
        }
        assert_eq!(db.list_recipes(None).unwrap().len(), 0);
    }

    #[test]
    fn status_transitions() {
        let db = db();
        let alice = user(&db, "alice");
        let id = recipe(&db, alice, "Stew");

        assert!(matches!(
            db.set_recipe_status(id, RecipeStatus::Pending),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            db.set_recipe_status(Uuid::new_v4(), RecipeStatus::Approved),
            Err(StoreError::NotFound(_))
        ));

        db.set_recipe_status(id, RecipeStatus::Rejected).unwrap();
        assert_eq!(
            db.set_recipe_status(id, RecipeStatus::Rejected).unwrap(),
            StatusChange::Unchanged
        );
        assert!(matches!(
            db.set_recipe_status(id, RecipeStatus::Approved),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn delete_cascades_to_every_dependent_row() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let id = approved(&db, alice, "Curry");
        let keep = approved(&db, alice, "Salad");

        db.set_reaction(alice, id, ReactionKind::Like).unwrap();
        db.set_reaction(bob, id, ReactionKind::Dislike).unwrap();
        db.add_favourite(bob, id).unwrap();
        db.add_favourite(bob, keep).unwrap();
        db.add_comment(alice, id, "great").unwrap();
        db.assign_meal(bob, Day::Friday, MealSlot::Dinner, id).unwrap();

        db.delete_recipe(id).unwrap();

        assert!(db.get_recipe(id).unwrap().is_none());
        for table in ["reactions", "favourites", "comments", "meal_plan_entries"] {
            let sql = format!("SELECT COUNT(*) FROM {table} WHERE recipe_id = ?1");
            assert_eq!(count(&db, &sql, id), 0, "orphaned rows in {table}");
        }
        assert_eq!(db.list_favourites(bob).unwrap().len(), 1);

        assert!(matches!(db.delete_recipe(id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn prefix_search_only_sees_approved_names() {
        let db = db();
        let alice = user(&db, "alice");
        let tomato = recipe(&db, alice, "Tomato Soup");
        recipe(&db, alice, "Tomato Tart");
        let pasta = recipe(&db, alice, "Pasta al pomodoro");
        db.set_recipe_status(tomato, RecipeStatus::Approved).unwrap();
        db.set_recipe_status(pasta, RecipeStatus::Approved).unwrap();

        let hits = db.search_by_prefix("tom", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Tomato Soup");

        assert!(db.search_by_prefix("%", 10).unwrap().is_empty());
    }

    #[test]
    fn category_listing_is_case_insensitive_and_public_only() {
        let db = db();
        let alice = user(&db, "alice");
        let risotto = approved(&db, alice, "Risotto");
        recipe(&db, alice, "Lasagne");

        let dinner = db.list_by_category(Some("dinner"), Some("VEG")).unwrap();
        assert_eq!(dinner.len(), 1);
        assert_eq!(dinner[0].id, risotto);

        assert_eq!(db.list_by_cuisine("italian").unwrap().len(), 1);
        assert!(db.list_by_category(Some("Breakfast"), None).unwrap().is_empty());
    }

    #[test]
    fn seeded_recipes_are_found_by_name() {
        let db = db();
        let id = db
            .seed_recipe(&NewRecipe { name: "Dal".into(), ..Default::default() }, RecipeStatus::Pending)
            .unwrap();

        let found = db.find_recipe_by_name("dal").unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.submitted_by, None);
    }
}
