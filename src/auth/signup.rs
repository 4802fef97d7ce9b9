use std::sync::Arc;

use axum::{debug_handler, extract::State, http::StatusCode, Json};

use crate::{store::Store, AppError, AppJson, AppResult};

use super::{hash_password, Account, Credentials};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn signup(
    State(store): State<Arc<dyn Store>>,
    AppJson(Credentials { username, password }): AppJson<Credentials>,
) -> AppResult<(StatusCode, Json<Account>)> {
    let username = username.trim().to_owned();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::new(StatusCode::BAD_REQUEST, "username and password are required"));
    }

    let user = store.create_user(&username, &hash_password(&password)).await?;
    tracing::info!(username = %user.username, "account created");

    Ok((StatusCode::CREATED, Json(Account { username: user.username })))
}
