use std::sync::Arc;

use axum::{debug_handler, extract::{Path, State}, Json};
use tower_sessions::Session;

use crate::{auth::require_user, models::PrivateMessageRecord, store::Store, AppResult};

/// Conversation between the logged-in user and `peer`.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn private_history(
    Path(peer): Path<String>,
    State(store): State<Arc<dyn Store>>,
    session: Session,
) -> AppResult<Json<Vec<PrivateMessageRecord>>> {
    let username = require_user(&session).await?;
    Ok(Json(store.private_history(&username, &peer).await?))
}
