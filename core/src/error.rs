use serde::{Deserialize, Serialize};

/// Coarse status codes surfaced to the coordinator at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AlreadyExists,
    NotFound,
    FailedPrecondition,
    Aborted,
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::FailedPrecondition => "FAILED_PRECONDITION",
            ErrorCode::Aborted => "ABORTED",
            ErrorCode::Internal => "INTERNAL",
        };
        write!(f, "{}", s)
    }
}

pub trait WorkerError: std::error::Error {
    fn error_code(&self) -> ErrorCode;
}
