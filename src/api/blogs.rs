use std::sync::Arc;

use axum::{debug_handler, extract::{Path, State}, Json};
use tower_sessions::Session;

use crate::{auth::require_user, models::{BlogPost, Comment}, store::Store, AppResult};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn list_blogs(
    State(store): State<Arc<dyn Store>>,
    session: Session,
) -> AppResult<Json<Vec<BlogPost>>> {
    require_user(&session).await?;
    Ok(Json(store.list_blogs().await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn list_comments(
    Path(blog_id): Path<i64>,
    State(store): State<Arc<dyn Store>>,
    session: Session,
) -> AppResult<Json<Vec<Comment>>> {
    require_user(&session).await?;
    Ok(Json(store.list_comments(blog_id).await?))
}
