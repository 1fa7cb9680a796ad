use thiserror::Error;
use tonic::Status;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed identifier: '{0}'")]
    MalformedIdentifier(String),

    #[error("Malformed filter value for '{field}': {reason}")]
    MalformedFilterValue { field: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn malformed_filter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedFilterValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Client-side errors map to 4xx-equivalent statuses; everything else is a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_)
                | AppError::InvalidInput(_)
                | AppError::MalformedIdentifier(_)
                | AppError::MalformedFilterValue { .. }
        )
    }
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        if !err.is_client_error() {
            tracing::error!("{}", err);
        }
        match err {
            AppError::Database(e) => Status::internal(format!("Database error: {}", e)),
            AppError::NotFound(msg) => Status::not_found(msg),
            AppError::InvalidInput(msg) => Status::invalid_argument(msg),
            e @ AppError::MalformedIdentifier(_) => Status::invalid_argument(e.to_string()),
            e @ AppError::MalformedFilterValue { .. } => Status::invalid_argument(e.to_string()),
            AppError::Serialization(e) => Status::internal(format!("Serialization error: {}", e)),
            AppError::Internal(msg) => Status::internal(msg),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
