use axum::{routing::{get, post}, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

mod login;
mod logout;
mod password;
mod signup;

pub use password::{hash_password, verify_password};

use crate::{session::USERNAME, AppError, AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup::signup))
        .route("/login", post(login::login))
        .route("/logout", post(logout::logout))
        .route("/api/me", get(login::me))
}

#[derive(Debug, Deserialize)]
pub(crate) struct Credentials {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Account {
    pub(crate) username: String,
}

/// The logged-in username, or 401.
pub async fn require_user(session: &Session) -> AppResult<String> {
    session
        .get::<String>(USERNAME)
        .await?
        .ok_or_else(AppError::unauthorized)
}
