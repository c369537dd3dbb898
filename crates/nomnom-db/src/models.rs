/// Database row types. These map directly to SQLite rows.
/// Distinct from nomnom-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_picture: Option<String>,
    pub created_at: String,
}

/// A user plus aggregate counts computed over their posts.
pub struct ProfileRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub created_at: String,
    pub post_count: i64,
    pub total_likes: i64,
    pub total_comments: i64,
}

/// A post joined with its owner and derived like/comment counts.
pub struct PostRow {
    pub id: String,
    pub owner_id: String,
    pub owner_username: String,
    pub owner_picture: Option<String>,
    pub image: String,
    pub caption: String,
    pub created_at: String,
    pub like_count: i64,
    pub comment_count: i64,
}

/// A comment joined with its author.
pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub username: String,
    pub profile_picture: Option<String>,
    pub content: String,
    pub created_at: String,
}

pub struct SavedRecipeRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub saved_at: String,
}

pub struct RecipeRow {
    pub id: String,
    pub name: String,
    pub details: String,
    pub image: Option<String>,
    pub created_at: String,
}

/// Result of an insert that may trip a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Created,
    /// A unique constraint already held the value; nothing was written.
    Exists,
    /// A referenced parent row does not exist; nothing was written.
    MissingParent,
}
