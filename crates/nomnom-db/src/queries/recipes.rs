use anyhow::Result;
use rusqlite::Row;

use super::{OptionalExt, classify_insert};
use crate::models::{InsertOutcome, RecipeRow, SavedRecipeRow};
use crate::{Database, timestamp_now};

impl Database {
    // -- Saved recipes --

    pub fn insert_saved_recipe(
        &self,
        id: &str,
        user_id: &str,
        title: &str,
        content: &str,
    ) -> Result<InsertOutcome> {
        let now = timestamp_now();
        self.with_conn_mut(|conn| {
            classify_insert(conn.execute(
                "INSERT INTO saved_recipes (id, user_id, title, content, saved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, user_id, title, content, &now),
            ))
        })
    }

    pub fn list_saved_recipes(&self, user_id: &str) -> Result<Vec<SavedRecipeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, content, saved_at
                 FROM saved_recipes
                 WHERE user_id = ?1
                 ORDER BY saved_at DESC, rowid DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(SavedRecipeRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        title: row.get(2)?,
                        content: row.get(3)?,
                        saved_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Ownership and existence are one predicate: false covers both a
    /// missing recipe and someone else's.
    pub fn delete_saved_recipe(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM saved_recipes WHERE id = ?1 AND user_id = ?2",
                (id, user_id),
            )?;
            Ok(removed > 0)
        })
    }

    // -- Recipe catalog --

    /// Insert-if-absent keyed on the recipe name.
    pub fn insert_recipe(
        &self,
        id: &str,
        name: &str,
        details: &str,
        image: Option<&str>,
    ) -> Result<InsertOutcome> {
        let now = timestamp_now();
        self.with_conn_mut(|conn| {
            classify_insert(conn.execute(
                "INSERT OR IGNORE INTO recipes (id, name, details, image, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, name, details, image, &now),
            ))
        })
    }

    pub fn list_recipes(&self) -> Result<Vec<RecipeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, details, image, created_at FROM recipes ORDER BY name",
            )?;
            let rows = stmt
                .query_map([], map_recipe)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_recipe(&self, id: &str) -> Result<Option<RecipeRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, details, image, created_at FROM recipes WHERE id = ?1",
                [id],
                map_recipe,
            )
            .optional()
        })
    }

    // -- Swipes --

    /// Append a swipe event. Repeated swipes on one recipe accumulate.
    pub fn insert_swipe(
        &self,
        id: &str,
        user_id: &str,
        recipe_id: &str,
        liked: bool,
    ) -> Result<InsertOutcome> {
        let now = timestamp_now();
        self.with_conn_mut(|conn| {
            classify_insert(conn.execute(
                "INSERT INTO swipes (id, user_id, recipe_id, liked, swiped_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, user_id, recipe_id, liked, &now),
            ))
        })
    }

    /// Number of swipes `user_id` made on `day` (`YYYY-MM-DD`, UTC).
    pub fn swipe_count_on(&self, user_id: &str, day: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM swipes WHERE user_id = ?1 AND substr(swiped_at, 1, 10) = ?2",
                (user_id, day),
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Catalog recipes the user swiped right on, most recently liked first.
    pub fn liked_dishes(&self, user_id: &str) -> Result<Vec<RecipeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.name, r.details, r.image, r.created_at
                 FROM recipes r
                 JOIN swipes s ON s.recipe_id = r.id
                 WHERE s.user_id = ?1 AND s.liked = 1
                 GROUP BY r.id
                 ORDER BY MAX(s.swiped_at) DESC, r.name",
            )?;
            let rows = stmt
                .query_map([user_id], map_recipe)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn map_recipe(row: &Row<'_>) -> rusqlite::Result<RecipeRow> {
    Ok(RecipeRow {
        id: row.get(0)?,
        name: row.get(1)?,
        details: row.get(2)?,
        image: row.get(3)?,
        created_at: row.get(4)?,
    })
}
