use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::extractors::ClientFingerprint;
use crate::posts::{create_reply, toggle_like, ReplyOutcome};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reply", post(reply))
        .route("/like/{post_id}", post(like))
}

#[derive(Deserialize)]
struct ReplyRequest {
    post_id: Option<i64>,
    content: Option<String>,
}

#[derive(Serialize)]
struct ReplyResponse {
    success: bool,
}

/// Creates a reply under a post. There is no shared-code gate here: replies
/// are open while top-level posts are gated, and that asymmetry is intended.
async fn reply(
    State(state): State<AppState>,
    Json(request): Json<ReplyRequest>,
) -> AppResult<Response> {
    let rejected = || {
        (
            StatusCode::BAD_REQUEST,
            Json(ReplyResponse { success: false }),
        )
            .into_response()
    };

    let Some(post_id) = request.post_id else {
        return Ok(rejected());
    };
    let Some(content) = request.content else {
        return Ok(rejected());
    };

    let conn = state.db.get()?;
    match create_reply(&conn, post_id, &content)? {
        ReplyOutcome::Created(id) => {
            tracing::info!("reply {} created under post {}", id, post_id);
            Ok(Json(ReplyResponse { success: true }).into_response())
        }
        ReplyOutcome::Rejected => Ok(rejected()),
    }
}

#[derive(Serialize)]
struct LikeResponse {
    success: bool,
    liked: bool,
    count: i64,
}

/// Toggles the caller's like on a post. The returned count is always the
/// fresh row count, whatever the caller's cookies say.
async fn like(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    fingerprint: ClientFingerprint,
) -> AppResult<Json<LikeResponse>> {
    let conn = state.db.get()?;
    let outcome = toggle_like(&conn, post_id, &fingerprint.0)?;
    tracing::debug!(
        "like toggled on post {}: liked={} count={}",
        post_id,
        outcome.liked,
        outcome.count
    );

    Ok(Json(LikeResponse {
        success: true,
        liked: outcome.liked,
        count: outcome.count,
    }))
}
