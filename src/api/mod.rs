//! Read-side JSON endpoints. Writes go through the relay socket.

mod blogs;
mod groups;
mod messages;

use axum::{debug_handler, extract::State, routing::get, Json, Router};
use tower_sessions::Session;

use crate::{auth::require_user, relay::Relay, AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(blogs::list_blogs))
        .route("/blogs/{id}/comments", get(blogs::list_comments))
        .route("/groups", get(groups::list_groups))
        .route("/groups/{id}/messages", get(groups::group_history))
        .route("/messages/{peer}", get(messages::private_history))
        .route("/online", get(online))
}

#[debug_handler(state = AppState)]
async fn online(State(relay): State<Relay>, session: Session) -> AppResult<Json<Vec<String>>> {
    require_user(&session).await?;
    Ok(Json(relay.registry().online_users()))
}
