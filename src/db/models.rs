use serde::{Deserialize, Serialize};

/// A row in the `posts` table. Top-level posts have `parent_id = None`;
/// replies carry the id of the post they answer. Replies never have replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub username: String,
    pub content: String,
    pub image_path: Option<String>,
    pub parent_id: Option<i64>,
    pub timestamp: String,
}

impl Post {
    /// Maps a row selected as (id, username, content, image_path, parent_id, timestamp).
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Post {
            id: row.get(0)?,
            username: row.get(1)?,
            content: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            image_path: row.get(3)?,
            parent_id: row.get(4)?,
            timestamp: row.get(5)?,
        })
    }
}
