use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub inner: anyhow::Error,
}

/// `Json` whose body errors come back as `{"error": ..}` like every other
/// failure.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl AppError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            inner: anyhow::Error::msg(msg.into()),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "login required")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = ?self.inner, "request failed");
            "internal server error".to_owned()
        } else {
            self.inner.to_string()
        };

        (
            self.status,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let inner = err.into();
        let status = match inner.downcast_ref::<StoreError>() {
            Some(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Some(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            _ if inner.is::<JsonRejection>() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, inner }
    }
}
