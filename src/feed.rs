//! Feed assembly: the ordered structure the page renders.
//!
//! Top-level posts come out newest first, each carrying its replies oldest
//! first. Like counts are live COUNT(*)s against the likes table; the
//! per-post "liked by me" flag instead comes from the browser's `liked_<id>`
//! cookies. The two can disagree after a cookie wipe and that is accepted:
//! the database owns the number, the browser owns the heart.
//!
//! The whole history is fetched on every read. Fine for a private group,
//! a known limit at any real scale.

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::db::models::Post;
use crate::error::AppResult;
use crate::extractors::LikedCookies;

/// A post annotated for rendering.
#[derive(Debug, Clone)]
pub struct PostView {
    pub id: i64,
    pub username: String,
    /// Uppercased first character of the username, for the avatar badge.
    pub initial: String,
    pub content: String,
    /// Human-friendly relative age ("pochi secondi fa", "ieri", ...).
    pub when: String,
    pub like_count: i64,
    pub is_liked: bool,
}

/// A top-level post with its replies, in render order.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub post: PostView,
    pub replies: Vec<PostView>,
}

const POST_COLUMNS: &str = "p.id, p.username, p.content, p.image_path, p.parent_id, p.timestamp, \
     (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id)";

pub fn assemble_feed(conn: &Connection, liked: &LikedCookies) -> AppResult<Vec<FeedItem>> {
    let now = Utc::now().naive_utc();

    let mut top_level = conn.prepare(&format!(
        "SELECT {POST_COLUMNS} FROM posts p \
         WHERE p.parent_id IS NULL \
         ORDER BY p.timestamp DESC, p.id DESC"
    ))?;
    let mut replies_for = conn.prepare(&format!(
        "SELECT {POST_COLUMNS} FROM posts p \
         WHERE p.parent_id = ?1 \
         ORDER BY p.timestamp ASC, p.id ASC"
    ))?;

    let posts = top_level
        .query_map([], row_to_counted_post)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut feed = Vec::with_capacity(posts.len());
    for (post, like_count) in posts {
        let replies = replies_for
            .query_map(params![post.id], row_to_counted_post)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(reply, count)| PostView::new(reply, count, liked, now))
            .collect();

        feed.push(FeedItem {
            post: PostView::new(post, like_count, liked, now),
            replies,
        });
    }
    Ok(feed)
}

fn row_to_counted_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Post, i64)> {
    Ok((Post::from_row(row)?, row.get(6)?))
}

impl PostView {
    fn new(post: Post, like_count: i64, liked: &LikedCookies, now: NaiveDateTime) -> Self {
        let initial = post
            .username
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_string());

        PostView {
            id: post.id,
            initial,
            when: relative_time(&post.timestamp, now),
            username: post.username,
            content: post.content,
            like_count,
            is_liked: liked.is_liked(post.id),
        }
    }
}

/// Formats a stored timestamp relative to `now`. Unparseable values are shown
/// as-is rather than failing the page.
pub fn relative_time(timestamp: &str, now: NaiveDateTime) -> String {
    let parsed = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S"));
    let Ok(then) = parsed else {
        return timestamp.to_string();
    };

    let seconds = (now - then).num_seconds().max(0);
    let days = seconds / 86_400;
    match (days, seconds) {
        (0, s) if s < 60 => "pochi secondi fa".to_string(),
        (0, s) if s < 3_600 => match s / 60 {
            1 => "1 minuto fa".to_string(),
            m => format!("{} minuti fa", m),
        },
        (0, s) => match s / 3_600 {
            1 => "1 ora fa".to_string(),
            h => format!("{} ore fa", h),
        },
        (1, _) => "ieri".to_string(),
        _ => then.format("%d %b").to_string(),
    }
}
