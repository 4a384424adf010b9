use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                role        TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                created_at  TEXT NOT NULL
            );

            CREATE TABLE recipes (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                description     TEXT,
                servings        INTEGER,
                category        TEXT,
                subcategory     TEXT,
                cuisine         TEXT,
                ingredients     TEXT NOT NULL DEFAULT '[]',
                steps           TEXT NOT NULL DEFAULT '[]',
                nutrition       TEXT NOT NULL DEFAULT '{}',
                image_url       TEXT,
                status          TEXT NOT NULL DEFAULT 'pending'
                                CHECK (status IN ('pending', 'approved', 'rejected')),
                submitted_by    TEXT REFERENCES users(id) ON DELETE SET NULL,
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_recipes_status ON recipes(status, created_at);
            CREATE INDEX idx_recipes_name ON recipes(name COLLATE NOCASE);

            CREATE TABLE reactions (
                id          TEXT PRIMARY KEY,
                recipe_id   TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                kind        TEXT NOT NULL CHECK (kind IN ('like', 'dislike')),
                created_at  TEXT NOT NULL,
                UNIQUE(user_id, recipe_id)
            );

            CREATE INDEX idx_reactions_recipe ON reactions(recipe_id);

            CREATE TABLE favourites (
                id          TEXT PRIMARY KEY,
                recipe_id   TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                UNIQUE(user_id, recipe_id)
            );

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                recipe_id   TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                body        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_recipe ON comments(recipe_id, created_at);

            CREATE TABLE meal_plan_entries (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                day_of_week TEXT NOT NULL,
                meal_type   TEXT NOT NULL,
                recipe_id   TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                UNIQUE(user_id, day_of_week, meal_type)
            );

            CREATE TABLE queries (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                email       TEXT NOT NULL,
                message     TEXT NOT NULL,
                status      TEXT NOT NULL DEFAULT 'new' CHECK (status IN ('new', 'resolved')),
                created_at  TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
