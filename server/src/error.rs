use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to fetch submissions: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Submission store returned status \"{0}\"")]
    UpstreamStatus(String),

    #[error("Malformed submissions envelope")]
    MalformedEnvelope,

    #[error("This email has already joined the waitlist")]
    DuplicateEmail,

    #[error("Unknown session")]
    UnknownSession,

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Fetch { .. }
            | AppError::UpstreamStatus { .. }
            | AppError::MalformedEnvelope => StatusCode::BAD_GATEWAY,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::UnknownSession => StatusCode::NOT_FOUND,
            AppError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
