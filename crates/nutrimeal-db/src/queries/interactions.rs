use nutrimeal_types::models::{Comment, ReactionKind, Recipe, RecipeStats};
use rusqlite::{OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use crate::Database;
use crate::error::StoreError;
use crate::models::{CommentRow, now_timestamp};
use crate::queries::approved_recipe_exists;
use crate::queries::recipes::{recipe_columns, recipe_from_row};

/// What `set_reaction` did to the (user, recipe) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    Created,
    /// A reaction of the other kind was swapped in place.
    Replaced,
}

impl Database {
    // -- Reactions --

    /// Records a like or dislike. Reacting with the kind already recorded is
    /// a conflict; callers clear it with `clear_reaction` instead.
    pub fn set_reaction(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        kind: ReactionKind,
    ) -> Result<ReactionOutcome, StoreError> {
        self.with_conn_mut(|conn| {
            // IMMEDIATE takes the write lock before the read below, so two
            // concurrent reactions for the same pair cannot both see "none".
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !approved_recipe_exists(&tx, recipe_id)? {
                return Err(StoreError::NotFound("recipe"));
            }

            let existing: Option<String> = tx
                .query_row(
                    "SELECT kind FROM reactions WHERE user_id = ?1 AND recipe_id = ?2",
                    (user_id.to_string(), recipe_id.to_string()),
                    |row| row.get(0),
                )
                .optional()?;

            let outcome = match existing {
                Some(current) if current.parse::<ReactionKind>()? == kind => {
                    return Err(StoreError::conflict(format!("{} already recorded", kind)));
                }
                Some(_) => {
                    tx.execute(
                        "UPDATE reactions SET kind = ?1, created_at = ?2 WHERE user_id = ?3 AND recipe_id = ?4",
                        (kind.as_str(), now_timestamp(), user_id.to_string(), recipe_id.to_string()),
                    )?;
                    ReactionOutcome::Replaced
                }
                None => {
                    tx.execute(
                        "INSERT INTO reactions (id, recipe_id, user_id, kind, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        (
                            Uuid::new_v4().to_string(),
                            recipe_id.to_string(),
                            user_id.to_string(),
                            kind.as_str(),
                            now_timestamp(),
                        ),
                    )?;
                    ReactionOutcome::Created
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
    }

    pub fn clear_reaction(&self, user_id: Uuid, recipe_id: Uuid, kind: ReactionKind) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM reactions WHERE user_id = ?1 AND recipe_id = ?2 AND kind = ?3",
                (user_id.to_string(), recipe_id.to_string(), kind.as_str()),
            )?;
            if removed == 0 {
                return Err(StoreError::NotFound("reaction"));
            }
            Ok(())
        })
    }

    // -- Favourites --

    /// Bookmarks a recipe. A second bookmark of the same recipe is a conflict.
    pub fn add_favourite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            if !approved_recipe_exists(conn, recipe_id)? {
                return Err(StoreError::NotFound("recipe"));
            }

            let inserted = conn.execute(
                "INSERT INTO favourites (id, recipe_id, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id, recipe_id) DO NOTHING",
                (
                    Uuid::new_v4().to_string(),
                    recipe_id.to_string(),
                    user_id.to_string(),
                    now_timestamp(),
                ),
            )?;
            if inserted == 0 {
                return Err(StoreError::conflict("recipe is already a favourite"));
            }
            Ok(())
        })
    }

    pub fn remove_favourite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM favourites WHERE user_id = ?1 AND recipe_id = ?2",
                (user_id.to_string(), recipe_id.to_string()),
            )?;
            if removed == 0 {
                return Err(StoreError::NotFound("favourite"));
            }
            Ok(())
        })
    }

    /// The user's bookmarked recipes, most recently bookmarked first.
    pub fn list_favourites(&self, user_id: Uuid) -> Result<Vec<Recipe>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM favourites f
                 JOIN recipes r ON f.recipe_id = r.id
                 WHERE f.user_id = ?1
                 ORDER BY f.created_at DESC, f.rowid DESC",
                recipe_columns("r")
            ))?;
            let rows = stmt
                .query_map([user_id.to_string()], recipe_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter().map(Recipe::try_from).collect()
        })
    }

    // -- Comments --

    pub fn add_comment(&self, user_id: Uuid, recipe_id: Uuid, body: &str) -> Result<Uuid, StoreError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(StoreError::invalid("comment cannot be empty"));
        }

        self.with_conn_mut(|conn| {
            if !approved_recipe_exists(conn, recipe_id)? {
                return Err(StoreError::NotFound("recipe"));
            }

            let id = Uuid::new_v4();
            conn.execute(
                "INSERT INTO comments (id, recipe_id, user_id, body, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    id.to_string(),
                    recipe_id.to_string(),
                    user_id.to_string(),
                    body,
                    now_timestamp(),
                ),
            )?;
            Ok(id)
        })
    }

    // -- Aggregates --

    /// Counts and comments for a recipe. Caller-specific fields are filled
    /// only when `caller` is given.
    pub fn recipe_stats(&self, recipe_id: Uuid, caller: Option<Uuid>) -> Result<RecipeStats, StoreError> {
        self.with_conn(|conn| {
            if !approved_recipe_exists(conn, recipe_id)? {
                return Err(StoreError::NotFound("recipe"));
            }
            let rid = recipe_id.to_string();

            let (like_count, dislike_count): (i64, i64) = conn.query_row(
                "SELECT COALESCE(SUM(kind = 'like'), 0), COALESCE(SUM(kind = 'dislike'), 0)
                 FROM reactions WHERE recipe_id = ?1",
                [&rid],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let (caller_reaction, caller_is_favorite) = match caller {
                Some(user_id) => {
                    let uid = user_id.to_string();
                    let reaction: Option<String> = conn
                        .query_row(
                            "SELECT kind FROM reactions WHERE user_id = ?1 AND recipe_id = ?2",
                            [&uid, &rid],
                            |row| row.get(0),
                        )
                        .optional()?;
                    let favourite: Option<i64> = conn
                        .query_row(
                            "SELECT 1 FROM favourites WHERE user_id = ?1 AND recipe_id = ?2",
                            [&uid, &rid],
                            |row| row.get(0),
                        )
                        .optional()?;

                    (
                        reaction.map(|k| k.parse::<ReactionKind>()).transpose()?,
                        Some(favourite.is_some()),
                    )
                }
                None => (None, None),
            };

            let mut stmt = conn.prepare(
                "SELECT c.id, c.recipe_id, c.user_id, u.username, c.body, c.created_at
                 FROM comments c
                 JOIN users u ON c.user_id = u.id
                 WHERE c.recipe_id = ?1
                 ORDER BY c.created_at DESC, c.rowid DESC",
            )?;
            let rows = stmt
                .query_map([&rid], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        recipe_id: row.get(1)?,
                        user_id: row.get(2)?,
                        username: row.get(3)?,
                        body: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            let comments = rows
                .into_iter()
                .map(Comment::try_from)
                .collect::<Result<Vec<_>, _>>()?;

            Ok(RecipeStats {
                like_count: like_count as u64,
                dislike_count: dislike_count as u64,
                caller_reaction,
                caller_is_favorite,
                comments,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::*;
    use nutrimeal_types::models::RecipeStatus;

    #[test]
    fn switching_reaction_replaces_instead_of_duplicating() {
        let db = db();
        let alice = user(&db, "alice");
        let id = approved(&db, alice, "Tacos");

        assert_eq!(db.set_reaction(alice, id, ReactionKind::Like).unwrap(), ReactionOutcome::Created);
        assert_eq!(
            db.set_reaction(alice, id, ReactionKind::Dislike).unwrap(),
            ReactionOutcome::Replaced
        );

        let stats = db.recipe_stats(id, Some(alice)).unwrap();
        assert_eq!(stats.like_count, 0);
        assert_eq!(stats.dislike_count, 1);
        assert_eq!(stats.caller_reaction, Some(ReactionKind::Dislike));
        assert_eq!(count(&db, "SELECT COUNT(*) FROM reactions WHERE recipe_id = ?1", id), 1);
    }

    #[test]
    fn repeating_the_same_reaction_conflicts() {
        let db = db();
        let alice = user(&db, "alice");
        let id = approved(&db, alice, "Tacos");

        db.set_reaction(alice, id, ReactionKind::Like).unwrap();
        assert!(matches!(
            db.set_reaction(alice, id, ReactionKind::Like),
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(db.recipe_stats(id, None).unwrap().like_count, 1);
    }

    #[test]
    fn racing_reactions_record_one_row() {
        let db = db();
        let alice = user(&db, "alice");
        let id = approved(&db, alice, "Tacos");
        let shared = &db;

        let outcomes: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = [ReactionKind::Like, ReactionKind::Dislike]
                .into_iter()
                .cycle()
                .take(8)
                .map(|kind| scope.spawn(move || shared.set_reaction(alice, id, kind)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let created = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(ReactionOutcome::Created)))
            .count();
        assert_eq!(created, 1);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM reactions WHERE recipe_id = ?1", id), 1);
    }

    #[test]
    fn unreviewed_recipes_reject_interactions() {
        let db = db();
        let alice = user(&db, "alice");
        let pending = recipe(&db, alice, "Draft");
        let rejected = recipe(&db, alice, "Nope");
        db.set_recipe_status(rejected, RecipeStatus::Rejected).unwrap();

        for id in [pending, rejected] {
            assert!(matches!(
                db.set_reaction(alice, id, ReactionKind::Like),
                Err(StoreError::NotFound("recipe"))
            ));
            assert!(matches!(db.add_favourite(alice, id), Err(StoreError::NotFound("recipe"))));
            assert!(matches!(db.add_comment(alice, id, "hm"), Err(StoreError::NotFound("recipe"))));
            assert!(matches!(db.recipe_stats(id, None), Err(StoreError::NotFound("recipe"))));
        }
    }

    #[test]
    fn reacting_to_a_missing_recipe_is_not_found() {
        let db = db();
        let alice = user(&db, "alice");
        assert!(matches!(
            db.set_reaction(alice, Uuid::new_v4(), ReactionKind::Like),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn clearing_requires_a_matching_reaction() {
        let db = db();
        let alice = user(&db, "alice");
        let id = approved(&db, alice, "Tacos");

        db.set_reaction(alice, id, ReactionKind::Like).unwrap();
        assert!(matches!(
            db.clear_reaction(alice, id, ReactionKind::Dislike),
            Err(StoreError::NotFound(_))
        ));
        db.clear_reaction(alice, id, ReactionKind::Like).unwrap();
        assert_eq!(db.recipe_stats(id, Some(alice)).unwrap().caller_reaction, None);
    }

    #[test]
    fn double_favourite_leaves_one_row() {
        let db = db();
        let alice = user(&db, "alice");
        let id = approved(&db, alice, "Ramen");

        db.add_favourite(alice, id).unwrap();
        assert!(matches!(db.add_favourite(alice, id), Err(StoreError::Conflict(_))));
        assert_eq!(count(&db, "SELECT COUNT(*) FROM favourites WHERE recipe_id = ?1", id), 1);

        let favourites = db.list_favourites(alice).unwrap();
        assert_eq!(favourites.len(), 1);
        assert_eq!(favourites[0].id, id);

        db.remove_favourite(alice, id).unwrap();
        assert!(matches!(db.remove_favourite(alice, id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn comments_are_trimmed_and_listed_newest_first() {
        let db = db();
        let alice = user(&db, "alice");
        let id = approved(&db, alice, "Pho");

        assert!(matches!(db.add_comment(alice, id, "   "), Err(StoreError::InvalidInput(_))));
        assert!(matches!(
            db.add_comment(alice, Uuid::new_v4(), "hi"),
            Err(StoreError::NotFound(_))
        ));

        db.add_comment(alice, id, " first ").unwrap();
        db.add_comment(alice, id, "second").unwrap();

        let stats = db.recipe_stats(id, None).unwrap();
        let bodies: Vec<_> = stats.comments.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["second", "first"]);
        assert_eq!(stats.comments[0].username, "alice");
        assert_eq!(stats.caller_is_favorite, None);
    }
}
