//! Row-to-wire conversions.

use anyhow::anyhow;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use nomnom_db::models::{CommentRow, PostRow, RecipeRow, SavedRecipeRow};
use nomnom_types::api::{CommentResponse, PostResponse, RecipeResponse, SavedRecipeResponse};

use crate::error::{ApiError, ApiResult};
use crate::storage::absolute_url;

/// Stored ids are always UUIDs; anything else is corruption.
pub fn parse_id(raw: &str) -> ApiResult<Uuid> {
    raw.parse()
        .map_err(|e| ApiError::Internal(anyhow!("corrupt id '{}': {}", raw, e)))
}

/// Lenient id parse for list rendering: a corrupt row is logged, not fatal.
fn id_or_default(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') format, for rows written by hand.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub fn picture_url(base: &str, picture: Option<&str>) -> Option<String> {
    picture.map(|p| absolute_url(base, p))
}

pub fn post_response(row: PostRow, base: &str) -> PostResponse {
    PostResponse {
        id: id_or_default(&row.id, "post id"),
        owner_id: id_or_default(&row.owner_id, "owner id"),
        username: row.owner_username,
        profile_picture: picture_url(base, row.owner_picture.as_deref()),
        image: absolute_url(base, &row.image),
        caption: row.caption,
        created_at: parse_timestamp(&row.created_at),
        like_count: row.like_count,
        comment_count: row.comment_count,
    }
}

pub fn comment_response(row: CommentRow, base: &str) -> CommentResponse {
    CommentResponse {
        id: id_or_default(&row.id, "comment id"),
        post_id: id_or_default(&row.post_id, "post id"),
        user_id: id_or_default(&row.user_id, "user id"),
        username: row.username,
        profile_picture: picture_url(base, row.profile_picture.as_deref()),
        content: row.content,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub fn saved_recipe_response(row: SavedRecipeRow) -> SavedRecipeResponse {
    SavedRecipeResponse {
        id: id_or_default(&row.id, "saved recipe id"),
        title: row.title,
        content: row.content,
        saved_at: parse_timestamp(&row.saved_at),
    }
}

pub fn recipe_response(row: RecipeRow, base: &str) -> RecipeResponse {
    RecipeResponse {
        id: id_or_default(&row.id, "recipe id"),
        name: row.name,
        details: row.details,
        image: picture_url(base, row.image.as_deref()),
        created_at: parse_timestamp(&row.created_at),
    }
}
