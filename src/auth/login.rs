use std::sync::Arc;

use axum::{debug_handler, extract::State, http::StatusCode, Json};
use tower_sessions::Session;

use crate::{session::USERNAME, store::Store, AppError, AppJson, AppResult};

use super::{require_user, verify_password, Account, Credentials};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login(
    State(store): State<Arc<dyn Store>>,
    session: Session,
    AppJson(Credentials { username, password }): AppJson<Credentials>,
) -> AppResult<Json<Account>> {
    let username = username.trim().to_owned();
    let Some(stored) = store.password_hash(&username).await? else {
        return Err(AppError::new(StatusCode::UNAUTHORIZED, "invalid username or password"));
    };

    if !verify_password(&password, &stored) {
        tracing::debug!(username = %username, "login rejected");
        return Err(AppError::new(StatusCode::UNAUTHORIZED, "invalid username or password"));
    }

    session.cycle_id().await?;
    session.insert(USERNAME, &username).await?;
    tracing::info!(username = %username, "logged in");

    Ok(Json(Account { username }))
}

#[debug_handler]
pub(crate) async fn me(session: Session) -> AppResult<Json<Account>> {
    Ok(Json(Account { username: require_user(&session).await? }))
}
