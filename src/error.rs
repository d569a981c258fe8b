use rocket::http::Status;
use rocket::serde::json::Json;
use serde::Serialize;

/// Errors surfaced by the store, probes, and job layers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("authentication failed")]
    Auth,
    #[error("not found")]
    NotFound,
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::Validation(_) => Status::BadRequest,
            AppError::Auth => Status::Unauthorized,
            AppError::NotFound => Status::NotFound,
            AppError::Store(_) => Status::InternalServerError,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Auth => "UNAUTHORIZED",
            AppError::NotFound => "NOT_FOUND",
            AppError::Store(_) => "INTERNAL_ERROR",
        }
    }

    pub fn into_response(self) -> (Status, Json<ErrorBody>) {
        let status = self.status();
        let code = self.code().to_string();
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
                code,
            }),
        )
    }
}

pub type ApiResult<T> = Result<T, (Status, Json<ErrorBody>)>;

pub fn api_err<T>(e: AppError) -> ApiResult<T> {
    Err(e.into_response())
}
