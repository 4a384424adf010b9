use nutrimeal_types::models::{Day, ExportRow, MealPlanEntry, MealSlot};
use uuid::Uuid;

use crate::Database;
use crate::error::StoreError;
use crate::models::now_timestamp;
use crate::queries::recipe_exists;

impl Database {
    // -- Meal plan --

    /// Puts `recipe_id` in the user's (day, slot) cell, replacing whatever
    /// was there. Returns the id of the cell's entry, which is stable across
    /// replacements.
    pub fn assign_meal(
        &self,
        user_id: Uuid,
        day: Day,
        slot: MealSlot,
        recipe_id: Uuid,
    ) -> Result<Uuid, StoreError> {
        self.with_conn_mut(|conn| {
            if !recipe_exists(conn, recipe_id)? {
                return Err(StoreError::invalid("recipe does not exist"));
            }

            let id: String = conn.query_row(
                "INSERT INTO meal_plan_entries (id, user_id, day_of_week, meal_type, recipe_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id, day_of_week, meal_type)
                 DO UPDATE SET recipe_id = excluded.recipe_id
                 RETURNING id",
                (
                    Uuid::new_v4().to_string(),
                    user_id.to_string(),
                    day.as_str(),
                    slot.as_str(),
                    recipe_id.to_string(),
                    now_timestamp(),
                ),
                |row| row.get(0),
            )?;

            Ok(id.parse()?)
        })
    }

    /// Removes one of the caller's entries. Entries owned by someone else
    /// are reported as not found.
    pub fn remove_meal(&self, entry_id: Uuid, user_id: Uuid) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM meal_plan_entries WHERE id = ?1 AND user_id = ?2",
                (entry_id.to_string(), user_id.to_string()),
            )?;
            if removed == 0 {
                return Err(StoreError::NotFound("meal plan entry"));
            }
            Ok(())
        })
    }

    /// Flat list of the user's entries; grouping is left to the caller.
    pub fn list_meals(&self, user_id: Uuid) -> Result<Vec<MealPlanEntry>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT mp.id, mp.day_of_week, mp.meal_type, r.id, r.name, r.image_url
                 FROM meal_plan_entries mp
                 JOIN recipes r ON mp.recipe_id = r.id
                 WHERE mp.user_id = ?1",
            )?;
            let rows = stmt
                .query_map([user_id.to_string()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut entries = rows
                .into_iter()
                .map(|(id, day, slot, recipe_id, recipe_name, image_url)| -> Result<MealPlanEntry, StoreError> {
                    Ok(MealPlanEntry {
                        id: id.parse()?,
                        day_of_week: day.parse()?,
                        meal_type: slot.parse()?,
                        recipe_id: recipe_id.parse()?,
                        recipe_name,
                        image_url,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            entries.sort_by_key(|e| (e.day_of_week, e.meal_type));
            Ok(entries)
        })
    }

    /// Export projection: Monday to Sunday, then Breakfast, Lunch, Dinner,
    /// Snacks within each day.
    pub fn export_meals(&self, user_id: Uuid) -> Result<Vec<ExportRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT mp.day_of_week, mp.meal_type, r.name, COALESCE(r.description, '')
                 FROM meal_plan_entries mp
                 JOIN recipes r ON mp.recipe_id = r.id
                 WHERE mp.user_id = ?1",
            )?;
            let rows = stmt
                .query_map([user_id.to_string()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut export = rows
                .into_iter()
                .map(|(day, slot, recipe_name, description)| -> Result<ExportRow, StoreError> {
                    Ok(ExportRow {
                        day: day.parse()?,
                        slot: slot.parse()?,
                        recipe_name,
                        description,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            export.sort_by_key(|r| (r.day, r.slot));
            Ok(export)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::*;

    #[test]
    fn reassigning_a_slot_overwrites_the_recipe() {
        let db = db();
        let alice = user(&db, "alice");
        let first = recipe(&db, alice, "Porridge");
        let second = recipe(&db, alice, "Pancakes");

        let a = db.assign_meal(alice, Day::Monday, MealSlot::Breakfast, first).unwrap();
        let b = db.assign_meal(alice, Day::Monday, MealSlot::Breakfast, second).unwrap();
        assert_eq!(a, b);

        let entries = db.list_meals(alice).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].recipe_id, second);
        assert_eq!(entries[0].recipe_name, "Pancakes");
    }

    #[test]
    fn slots_are_per_user() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let id = recipe(&db, alice, "Porridge");

        db.assign_meal(alice, Day::Monday, MealSlot::Breakfast, id).unwrap();
        db.assign_meal(bob, Day::Monday, MealSlot::Breakfast, id).unwrap();

        assert_eq!(db.list_meals(alice).unwrap().len(), 1);
        assert_eq!(db.list_meals(bob).unwrap().len(), 1);
    }

    #[test]
    fn assigning_a_missing_recipe_is_invalid() {
        let db = db();
        let alice = user(&db, "alice");
        assert!(matches!(
            db.assign_meal(alice, Day::Monday, MealSlot::Lunch, Uuid::new_v4()),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn only_the_owner_can_remove_an_entry() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let id = recipe(&db, alice, "Porridge");
        let entry = db.assign_meal(alice, Day::Tuesday, MealSlot::Lunch, id).unwrap();

        assert!(matches!(db.remove_meal(entry, bob), Err(StoreError::NotFound(_))));
        db.remove_meal(entry, alice).unwrap();
        assert!(db.list_meals(alice).unwrap().is_empty());
    }

    #[test]
    fn export_orders_by_day_then_slot() {
        let db = db();
        let alice = user(&db, "alice");
        let soup = recipe(&db, alice, "Soup");
        let eggs = recipe(&db, alice, "Eggs");

        db.assign_meal(alice, Day::Sunday, MealSlot::Breakfast, eggs).unwrap();
        db.assign_meal(alice, Day::Wednesday, MealSlot::Snacks, soup).unwrap();
        db.assign_meal(alice, Day::Wednesday, MealSlot::Breakfast, eggs).unwrap();
        db.assign_meal(alice, Day::Monday, MealSlot::Dinner, soup).unwrap();

        let order: Vec<_> = db
            .export_meals(alice)
            .unwrap()
            .into_iter()
            .map(|r| (r.day, r.slot))
            .collect();
        assert_eq!(
            order,
            vec![
                (Day::Monday, MealSlot::Dinner),
                (Day::Wednesday, MealSlot::Breakfast),
                (Day::Wednesday, MealSlot::Snacks),
                (Day::Sunday, MealSlot::Breakfast),
            ]
        );
    }
}
