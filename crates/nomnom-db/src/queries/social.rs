use anyhow::Result;

use super::classify_insert;
use crate::models::{CommentRow, InsertOutcome};
use crate::{Database, timestamp_now};

impl Database {
    // -- Likes --

    /// Insert-if-absent. A repeated like is `Exists`, a like on a missing
    /// post is `MissingParent`.
    pub fn like_post(&self, id: &str, post_id: &str, user_id: &str) -> Result<InsertOutcome> {
        let now = timestamp_now();
        self.with_conn_mut(|conn| {
            classify_insert(conn.execute(
                "INSERT OR IGNORE INTO likes (id, post_id, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                (id, post_id, user_id, &now),
            ))
        })
    }

    /// Delete-if-present. Returns whether a like was removed.
    pub fn unlike_post(&self, post_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
                (post_id, user_id),
            )?;
            Ok(removed > 0)
        })
    }

    pub fn liked_post_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT post_id FROM likes WHERE user_id = ?1 ORDER BY created_at")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    // -- Comments --

    /// `MissingParent` means the post (or the author) does not exist.
    pub fn insert_comment(
        &self,
        id: &str,
        post_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<InsertOutcome> {
        let now = timestamp_now();
        self.with_conn_mut(|conn| {
            classify_insert(conn.execute(
                "INSERT INTO comments (id, post_id, user_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, post_id, user_id, content, &now),
            ))
        })
    }

    /// Comments on a post oldest-first, joined with their authors.
    pub fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.post_id, c.user_id, u.username, u.profile_picture,
                        c.content, c.created_at
                 FROM comments c
                 JOIN users u ON u.id = c.user_id
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at ASC, c.rowid ASC",
            )?;

            let rows = stmt
                .query_map([post_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        user_id: row.get(2)?,
                        username: row.get(3)?,
                        profile_picture: row.get(4)?,
                        content: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Delete a comment only if `user_id` wrote it.
    pub fn delete_comment(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM comments WHERE id = ?1 AND user_id = ?2",
                (id, user_id),
            )?;
            Ok(removed > 0)
        })
    }
}
