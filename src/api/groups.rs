use std::sync::Arc;

use axum::{debug_handler, extract::{Path, State}, Json};
use tower_sessions::Session;

use crate::{auth::require_user, models::{Group, GroupMessageRecord}, store::Store, AppResult};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn list_groups(
    State(store): State<Arc<dyn Store>>,
    session: Session,
) -> AppResult<Json<Vec<Group>>> {
    require_user(&session).await?;
    Ok(Json(store.list_groups().await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn group_history(
    Path(group_id): Path<i64>,
    State(store): State<Arc<dyn Store>>,
    session: Session,
) -> AppResult<Json<Vec<GroupMessageRecord>>> {
    require_user(&session).await?;
    Ok(Json(store.group_history(group_id).await?))
}
