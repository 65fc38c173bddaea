//! Mutation operations: create a top-level post, create a reply, toggle a like.
//!
//! Posts are append-only. Nothing here updates or deletes a post, and the
//! shared-code gate for top-level posts lives in the route layer (the gate is
//! a presentation concern: a wrong code re-renders the feed with an error
//! banner, it is not an error of the storage layer).

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::AppResult;

pub const USERNAME_MAX_CHARS: usize = 16;
pub const POST_CONTENT_MAX_CHARS: usize = 400;
pub const REPLY_CONTENT_MAX_CHARS: usize = 200;

/// Shown when the post form leaves the name empty.
pub const DEFAULT_USERNAME: &str = "Amico";
/// Replies carry no identity; every reply is signed this way.
pub const REPLY_USERNAME: &str = "Tu";

/// Trims and truncates to a character budget (not bytes, so multi-byte
/// names survive the cut).
fn shape(raw: &str, max_chars: usize) -> String {
    raw.trim().chars().take(max_chars).collect()
}

/// Inserts a top-level post and returns its id. The caller has already
/// checked the shared code. Empty usernames fall back to the default;
/// content may legitimately be empty.
pub fn create_post(conn: &Connection, username: &str, content: &str) -> AppResult<i64> {
    let username = match shape(username, USERNAME_MAX_CHARS) {
        name if name.is_empty() => DEFAULT_USERNAME.to_string(),
        name => name,
    };
    let content = shape(content, POST_CONTENT_MAX_CHARS);

    conn.execute(
        "INSERT INTO posts (username, content, image_path, parent_id) VALUES (?1, ?2, NULL, NULL)",
        params![username, content],
    )?;
    Ok(conn.last_insert_rowid())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    Created(i64),
    /// Empty content, or the target is itself a reply. Nothing was written.
    Rejected,
}

/// Inserts a reply under `post_id` and returns its id.
///
/// Replies to replies are rejected: nesting depth is capped at one level as
/// an explicit invariant, not just by never querying grandchildren. An id
/// that matches no row at all is still accepted (the original behavior), so
/// an orphan reply is possible.
pub fn create_reply(conn: &Connection, post_id: i64, content: &str) -> AppResult<ReplyOutcome> {
    let content = shape(content, REPLY_CONTENT_MAX_CHARS);
    if content.is_empty() {
        return Ok(ReplyOutcome::Rejected);
    }

    let parent_of_target: Option<Option<i64>> = conn
        .query_row(
            "SELECT parent_id FROM posts WHERE id = ?1",
            params![post_id],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(Some(_)) = parent_of_target {
        return Ok(ReplyOutcome::Rejected);
    }

    conn.execute(
        "INSERT INTO posts (username, content, image_path, parent_id) VALUES (?1, ?2, NULL, ?3)",
        params![REPLY_USERNAME, content, post_id],
    )?;
    Ok(ReplyOutcome::Created(conn.last_insert_rowid()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub liked: bool,
    /// Fresh row count for the post, read after the toggle. This is the
    /// authoritative count regardless of what any browser cookie claims.
    pub count: i64,
}

/// Flips the like state for (post, fingerprint): delete the row if present,
/// insert it otherwise. The composite primary key keeps a racing double
/// insert from producing two rows.
pub fn toggle_like(conn: &Connection, post_id: i64, fingerprint: &str) -> AppResult<LikeOutcome> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM likes WHERE post_id = ?1 AND ip_hash = ?2",
        params![post_id, fingerprint],
        |row| row.get(0),
    )?;

    let liked = if exists {
        conn.execute(
            "DELETE FROM likes WHERE post_id = ?1 AND ip_hash = ?2",
            params![post_id, fingerprint],
        )?;
        false
    } else {
        conn.execute(
            "INSERT INTO likes (post_id, ip_hash) VALUES (?1, ?2)",
            params![post_id, fingerprint],
        )?;
        true
    };

    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
        params![post_id],
        |row| row.get(0),
    )?;

    Ok(LikeOutcome { liked, count })
}

#[cfg(test)]
pub(crate) fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    for (name, sql) in crate::db::MIGRATIONS {
        conn.execute_batch(sql)
            .unwrap_or_else(|e| panic!("migration {} failed: {}", name, e));
    }
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_post_shapes_inputs() {
        let conn = test_conn();
        let id = create_post(&conn, "  Mario Rossi di Fiuggi  ", "  Ciao  ").unwrap();

        let (username, content, parent): (String, String, Option<i64>) = conn
            .query_row(
                "SELECT username, content, parent_id FROM posts WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(username, "Mario Rossi di F");
        assert_eq!(username.chars().count(), USERNAME_MAX_CHARS);
        assert_eq!(content, "Ciao");
        assert_eq!(parent, None);
    }

    #[test]
    fn empty_username_becomes_default() {
        let conn = test_conn();
        let id = create_post(&conn, "   ", "contenuto").unwrap();
        let username: String = conn
            .query_row(
                "SELECT username FROM posts WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(username, DEFAULT_USERNAME);
    }

    #[test]
    fn long_content_is_truncated_on_char_boundaries() {
        let conn = test_conn();
        let long = "è".repeat(500);
        let id = create_post(&conn, "Mario", &long).unwrap();
        let content: String = conn
            .query_row(
                "SELECT content FROM posts WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(content.chars().count(), POST_CONTENT_MAX_CHARS);
    }

    #[test]
    fn reply_is_created_under_parent() {
        let conn = test_conn();
        let parent = create_post(&conn, "Mario", "Ciao").unwrap();
        let outcome = create_reply(&conn, parent, "Benvenuto!").unwrap();

        let ReplyOutcome::Created(reply_id) = outcome else {
            panic!("expected a created reply, got {:?}", outcome);
        };
        let (username, parent_id): (String, Option<i64>) = conn
            .query_row(
                "SELECT username, parent_id FROM posts WHERE id = ?1",
                params![reply_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(username, REPLY_USERNAME);
        assert_eq!(parent_id, Some(parent));
    }

    #[test]
    fn empty_reply_is_rejected_without_write() {
        let conn = test_conn();
        let parent = create_post(&conn, "Mario", "Ciao").unwrap();
        assert_eq!(create_reply(&conn, parent, "   ").unwrap(), ReplyOutcome::Rejected);

        let rows: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM posts WHERE parent_id = ?1",
                params![parent],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn reply_to_reply_is_rejected() {
        let conn = test_conn();
        let parent = create_post(&conn, "Mario", "Ciao").unwrap();
        let ReplyOutcome::Created(reply_id) = create_reply(&conn, parent, "prima").unwrap() else {
            panic!("reply should be created");
        };
        assert_eq!(
            create_reply(&conn, reply_id, "troppo profondo").unwrap(),
            ReplyOutcome::Rejected
        );
    }

    #[test]
    fn orphan_reply_is_accepted() {
        let conn = test_conn();
        let outcome = create_reply(&conn, 9999, "nel vuoto").unwrap();
        assert!(matches!(outcome, ReplyOutcome::Created(_)));
    }

    #[test]
    fn toggle_like_alternates_and_counts() {
        let conn = test_conn();
        let id = create_post(&conn, "Mario", "Ciao").unwrap();

        let first = toggle_like(&conn, id, "fp-aaa").unwrap();
        assert_eq!(first, LikeOutcome { liked: true, count: 1 });

        let other = toggle_like(&conn, id, "fp-bbb").unwrap();
        assert_eq!(other, LikeOutcome { liked: true, count: 2 });

        let second = toggle_like(&conn, id, "fp-aaa").unwrap();
        assert_eq!(second, LikeOutcome { liked: false, count: 1 });
    }

    #[test]
    fn double_toggle_restores_original_state() {
        let conn = test_conn();
        let id = create_post(&conn, "Mario", "Ciao").unwrap();

        toggle_like(&conn, id, "fp-ccc").unwrap();
        let after = toggle_like(&conn, id, "fp-ccc").unwrap();
        assert_eq!(after, LikeOutcome { liked: false, count: 0 });

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM likes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }
}
