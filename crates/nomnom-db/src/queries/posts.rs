use anyhow::Result;
use rusqlite::Row;

use super::{OptionalExt, classify_insert};
use crate::models::{InsertOutcome, PostRow};
use crate::{Database, timestamp_now};

// Owner join and derived counts in one statement; counts are never stored.
const POST_SELECT: &str = "SELECT p.id, p.owner_id, u.username, u.profile_picture, p.image,
        p.caption, p.created_at,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id),
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)
     FROM posts p
     JOIN users u ON u.id = p.owner_id";

impl Database {
    /// `MissingParent` means the owner no longer exists.
    pub fn insert_post(
        &self,
        id: &str,
        owner_id: &str,
        image: &str,
        caption: &str,
    ) -> Result<InsertOutcome> {
        let now = timestamp_now();
        self.with_conn_mut(|conn| {
            classify_insert(conn.execute(
                "INSERT INTO posts (id, owner_id, image, caption, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, owner_id, image, caption, &now),
            ))
        })
    }

    /// All posts newest-first, or only `owner_id`'s when given.
    pub fn list_posts(&self, owner_id: Option<&str>) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let rows = match owner_id {
                Some(owner) => {
                    let mut stmt = conn.prepare(&format!(
                        "{POST_SELECT} WHERE p.owner_id = ?1
                         ORDER BY p.created_at DESC, p.rowid DESC"
                    ))?;
                    stmt.query_map([owner], map_post)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "{POST_SELECT} ORDER BY p.created_at DESC, p.rowid DESC"
                    ))?;
                    stmt.query_map([], map_post)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            conn.query_row(&format!("{POST_SELECT} WHERE p.id = ?1"), [id], map_post)
                .optional()
        })
    }

    /// Delete a post only if `owner_id` owns it. The ownership predicate is
    /// part of the `DELETE`, so there is no window between check and write.
    /// Returns the deleted post's image path. Likes and comments go with it
    /// through the schema's cascades.
    pub fn delete_post(&self, id: &str, owner_id: &str) -> Result<Option<String>> {
        self.with_conn_mut(|conn| {
            conn.query_row(
                "DELETE FROM posts WHERE id = ?1 AND owner_id = ?2 RETURNING image",
                (id, owner_id),
                |row| row.get(0),
            )
            .optional()
        })
    }
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        owner_username: row.get(2)?,
        owner_picture: row.get(3)?,
        image: row.get(4)?,
        caption: row.get(5)?,
        created_at: row.get(6)?,
        like_count: row.get(7)?,
        comment_count: row.get(8)?,
    })
}
