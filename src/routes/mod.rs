pub mod home;
pub mod interactions;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index).post(home::submit))
        .route("/ping", get(home::ping))
        .merge(interactions::router())
}
