use nutrimeal_types::models::{Role, User};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use tracing::info;
use uuid::Uuid;

use crate::Database;
use crate::error::StoreError;
use crate::models::{UserRow, now_timestamp};
use crate::queries::required;

const USER_COLUMNS: &str = "id, username, email, password, role, created_at";

impl Database {
    // -- Users --

    /// Inserts a user with an already-hashed credential.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Uuid, StoreError> {
        let username = required(Some(username), "username")?;
        let email = required(Some(email), "email")?;
        if password_hash.is_empty() {
            return Err(StoreError::invalid("password is required"));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let taken: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM users WHERE username = ?1 OR email = ?2",
                    (&username, &email),
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Err(StoreError::conflict("username or email already registered"));
            }

            let id = Uuid::new_v4();
            tx.execute(
                "INSERT INTO users (id, username, email, password, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (
                    id.to_string(),
                    &username,
                    &email,
                    password_hash,
                    role.as_str(),
                    now_timestamp(),
                ),
            )?;
            tx.commit()?;

            info!("Created {} account '{}'", role, username);
            Ok(id)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| {
            query_user(conn, &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"), username)
        })
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| {
            query_user(conn, &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"), &id.to_string())
        })
    }

    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
            ))?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter().map(User::try_from).collect()
        })
    }

    /// Changes the display name and email of `user_id`. Both must stay unique.
    pub fn update_profile(&self, user_id: Uuid, username: &str, email: &str) -> Result<(), StoreError> {
        let username = required(Some(username), "name")?;
        let email = required(Some(email), "email")?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let taken: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM users WHERE (username = ?1 OR email = ?2) AND id != ?3",
                    (&username, &email, user_id.to_string()),
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Err(StoreError::conflict("name or email already in use by another account"));
            }

            let updated = tx.execute(
                "UPDATE users SET username = ?1, email = ?2 WHERE id = ?3",
                (&username, &email, user_id.to_string()),
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound("user"));
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Deletes `target` and everything it owns, in one transaction.
    /// Recipes the user submitted stay in the catalog without a submitter.
    pub fn delete_user(&self, actor: Uuid, target: Uuid) -> Result<(), StoreError> {
        if actor == target {
            return Err(StoreError::Forbidden("you cannot delete your own account".into()));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let id = target.to_string();

            tx.execute("DELETE FROM reactions WHERE user_id = ?1", [&id])?;
            tx.execute("DELETE FROM favourites WHERE user_id = ?1", [&id])?;
            tx.execute("DELETE FROM comments WHERE user_id = ?1", [&id])?;
            tx.execute("DELETE FROM meal_plan_entries WHERE user_id = ?1", [&id])?;
            tx.execute("UPDATE recipes SET submitted_by = NULL WHERE submitted_by = ?1", [&id])?;

            // Dropping the transaction on this early return rolls the cascade back.
            if tx.execute("DELETE FROM users WHERE id = ?1", [&id])? == 0 {
                return Err(StoreError::NotFound("user"));
            }

            tx.commit()?;
            info!("User {} deleted by {}", target, actor);
            Ok(())
        })
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn query_user(conn: &Connection, sql: &str, key: &str) -> Result<Option<UserRow>, StoreError> {
    Ok(conn.query_row(sql, [key], user_from_row).optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::*;
    use nutrimeal_types::models::{Day, MealSlot, ReactionKind};

    #[test]
    fn duplicate_username_or_email_conflicts() {
        let db = db();
        db.create_user("alice", "a@x.com", "hash", Role::User).unwrap();

        let by_name = db.create_user("alice", "other@x.com", "hash", Role::User);
        assert!(matches!(by_name, Err(StoreError::Conflict(_))));

        let by_email = db.create_user("bob", "a@x.com", "hash", Role::User);
        assert!(matches!(by_email, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let db = db();
        let result = db.create_user("  ", "a@x.com", "hash", Role::User);
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn self_delete_is_forbidden() {
        let db = db();
        let admin = db.create_user("root", "root@x.com", "hash", Role::Admin).unwrap();
        assert!(matches!(db.delete_user(admin, admin), Err(StoreError::Forbidden(_))));
        assert!(db.get_user_by_id(admin).unwrap().is_some());
    }

    #[test]
    fn deleting_a_user_removes_their_rows() {
        let db = db();
        let admin = db.create_user("root", "root@x.com", "hash", Role::Admin).unwrap();
        let alice = user(&db, "alice");
        let recipe_id = approved(&db, alice, "Soup");

        db.add_favourite(alice, recipe_id).unwrap();
        db.add_comment(alice, recipe_id, "tasty").unwrap();

        db.delete_user(admin, alice).unwrap();

        assert!(db.get_user_by_id(alice).unwrap().is_none());
        assert_eq!(count(&db, "SELECT COUNT(*) FROM favourites WHERE user_id = ?1", alice), 0);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM comments WHERE user_id = ?1", alice), 0);

        let recipe = db.get_recipe(recipe_id).unwrap().unwrap();
        assert_eq!(recipe.submitted_by, None);

        assert!(matches!(db.delete_user(admin, alice), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn writes_by_a_deleted_account_are_not_found() {
        let db = db();
        let admin = db.create_user("root", "root@x.com", "hash", Role::Admin).unwrap();
        let alice = user(&db, "alice");
        let recipe_id = approved(&db, admin, "Soup");
        db.delete_user(admin, alice).unwrap();

        let gone = |r: Result<(), StoreError>| matches!(r, Err(StoreError::NotFound("account")));
        assert!(gone(db.set_reaction(alice, recipe_id, ReactionKind::Like).map(|_| ())));
        assert!(gone(db.add_favourite(alice, recipe_id)));
        assert!(gone(db.add_comment(alice, recipe_id, "hi").map(|_| ())));
        assert!(gone(db.submit_recipe(alice, &new_recipe("Stew")).map(|_| ())));
        assert!(gone(db.assign_meal(alice, Day::Monday, MealSlot::Lunch, recipe_id).map(|_| ())));
    }

    #[test]
    fn profile_update_rejects_taken_email() {
        let db = db();
        let alice = user(&db, "alice");
        user(&db, "bob");

        let result = db.update_profile(alice, "alice", "bob@example.com");
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        db.update_profile(alice, "alice2", "alice@example.com").unwrap();
        let row = db.get_user_by_id(alice).unwrap().unwrap();
        assert_eq!(row.username, "alice2");
    }
}
