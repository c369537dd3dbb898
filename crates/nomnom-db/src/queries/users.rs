use anyhow::Result;
use rusqlite::{Connection, Row};

use super::{OptionalExt, classify_insert};
use crate::models::{InsertOutcome, ProfileRow, UserRow};
use crate::{Database, timestamp_now};

const USER_COLUMNS: &str = "id, username, email, password_hash, profile_picture, created_at";

impl Database {
    /// Insert a user. `Exists` means the username or the email is taken.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<InsertOutcome> {
        let now = timestamp_now();
        self.with_conn_mut(|conn| {
            classify_insert(conn.execute(
                "INSERT INTO users (id, username, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, username, email, password_hash, &now),
            ))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// User projection with like/comment totals across all of their posts.
    pub fn get_profile(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT u.id, u.username, u.email, u.profile_picture, u.created_at,
                    (SELECT COUNT(*) FROM posts p WHERE p.owner_id = u.id),
                    (SELECT COUNT(*) FROM likes l JOIN posts p ON l.post_id = p.id
                        WHERE p.owner_id = u.id),
                    (SELECT COUNT(*) FROM comments c JOIN posts p ON c.post_id = p.id
                        WHERE p.owner_id = u.id)
                 FROM users u
                 WHERE u.id = ?1",
                [id],
                |row| {
                    Ok(ProfileRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        profile_picture: row.get(3)?,
                        created_at: row.get(4)?,
                        post_count: row.get(5)?,
                        total_likes: row.get(6)?,
                        total_comments: row.get(7)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Returns false when no such user exists.
    pub fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password_hash = ?2 WHERE id = ?1",
                (id, password_hash),
            )?;
            Ok(changed > 0)
        })
    }

    /// Returns false when no such user exists.
    pub fn set_profile_picture(&self, id: &str, picture: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET profile_picture = ?2 WHERE id = ?1",
                (id, picture),
            )?;
            Ok(changed > 0)
        })
    }

    /// Delete a user and, through the schema's cascades, everything they own
    /// or wrote. Returns the image paths that were referenced by the deleted
    /// rows, or `None` when the user did not exist.
    pub fn delete_user(&self, id: &str) -> Result<Option<Vec<String>>> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;

            let mut images: Vec<String> = {
                let mut stmt = tx.prepare("SELECT image FROM posts WHERE owner_id = ?1")?;
                stmt.query_map([id], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };

            let picture: Option<Option<String>> = tx
                .query_row(
                    "SELECT profile_picture FROM users WHERE id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(picture) = picture else {
                return Ok(None);
            };
            images.extend(picture);

            tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(Some(images))
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"))?;
    stmt.query_row([value], map_user).optional()
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        profile_picture: row.get(4)?,
        created_at: row.get(5)?,
    })
}
