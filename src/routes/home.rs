use askama::Template;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{Datelike, Utc};

use crate::error::{AppError, AppResult};
use crate::extractors::{LikedCookies, Theme};
use crate::feed::{assemble_feed, FeedItem};
use crate::posts;
use crate::state::AppState;

/// Interval at which the page pings the server to keep it warm.
const PING_INTERVAL_SECS: u64 = 30;

#[derive(Template)]
#[template(path = "pages/feed.html")]
pub struct FeedTemplate {
    pub theme_attr: &'static str,
    pub wrong_code: bool,
    pub items: Vec<FeedItem>,
    pub year: i32,
    pub ping_interval_secs: u64,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Liveness target for the page's keep-alive timer.
pub async fn ping() -> StatusCode {
    StatusCode::OK
}

pub async fn index(
    State(state): State<AppState>,
    theme: Theme,
    liked: LikedCookies,
) -> AppResult<Response> {
    render_feed(&state, theme, &liked, false)
}

/// Handles the post form. A wrong shared code is a normal control path: the
/// submission is discarded and the feed re-renders with the error banner.
pub async fn submit(
    State(state): State<AppState>,
    theme: Theme,
    liked: LikedCookies,
    mut form: Multipart,
) -> AppResult<Response> {
    let mut username = String::new();
    let mut content = String::new();
    let mut code = String::new();

    while let Some(field) = form
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("username") => username = read_text(field).await?,
            Some("content") => content = read_text(field).await?,
            Some("code") => code = read_text(field).await?,
            // The form offers a file picker but no upload path is wired up;
            // drain the part and move on.
            Some("image") => {
                let _ = field.bytes().await;
            }
            _ => {}
        }
    }

    if code != state.config.board.join_code {
        tracing::debug!("post rejected: wrong shared code");
        return render_feed(&state, theme, &liked, true);
    }

    let conn = state.db.get()?;
    let id = posts::create_post(&conn, &username, &content)?;
    tracing::info!("post {} created", id);

    render_feed(&state, theme, &liked, false)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

fn render_feed(
    state: &AppState,
    theme: Theme,
    liked: &LikedCookies,
    wrong_code: bool,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let items = assemble_feed(&conn, liked)?;

    Ok(Html(FeedTemplate {
        theme_attr: theme.attr_value(),
        wrong_code,
        items,
        year: Utc::now().year(),
        ping_interval_secs: PING_INTERVAL_SECS,
    })
    .into_response())
}
