pub mod assets;
pub mod comments;
pub mod dashboard;
pub mod error;
pub mod guard;
pub mod health;
pub mod likes;
pub mod middleware;
pub mod playlists;
pub mod response;
pub mod state;
pub mod storage;
pub mod subscriptions;
pub mod tokens;
pub mod tweets;
pub mod users;
pub mod videos;

use axum::Router;

use crate::state::AppState;

/// Everything mounted under `/api/v1`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/healthcheck", health::routes())
        .nest("/assets", assets::routes())
        .nest("/users", users::routes(state.clone()))
        .nest("/videos", videos::routes(state.clone()))
        .nest("/comments", comments::routes(state.clone()))
        .nest("/likes", likes::routes(state.clone()))
        .nest("/subscriptions", subscriptions::routes(state.clone()))
        .nest("/playlists", playlists::routes(state.clone()))
        .nest("/tweets", tweets::routes(state.clone()))
        .nest("/dashboard", dashboard::routes(state.clone()))
        .with_state(state)
}
