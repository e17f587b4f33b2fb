use std::fmt::{self, Display};

use thiserror::Error;
use warp::{http::StatusCode, reject::Reject};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("You don't have permission to perform this action")]
    PermissionDenied,

    #[error("Authentication credentials were not provided")]
    Unauthorized,

    #[error("Invalid session; {0}")]
    InvalidSession(String),

    #[error("{0} is empty")]
    EmptyResult(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Cryptography failed: {0}")]
    Crypto(String),
}

impl ApiError {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_owned(),
            message: message.to_owned(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(what.to_owned())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::AlreadyExists(_) | Self::EmptyResult(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::Unauthorized | Self::InvalidSession(_) => StatusCode::UNAUTHORIZED,
            Self::Query(_) | Self::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Reject for ApiError {}

impl From<sqlx::Error> for ApiError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => {
                let what = e.constraint().unwrap_or("Record").to_owned();
                if e.is_unique_violation() {
                    Self::AlreadyExists(what)
                } else if e.is_check_violation() {
                    Self::Validation {
                        field: what,
                        message: e.message().to_owned(),
                    }
                } else if e.is_foreign_key_violation() {
                    Self::NotFound(what)
                } else {
                    log::error!("> Database error: {e}");
                    Self::Query(format!("{e}"))
                }
            }
            sqlx::Error::RowNotFound => Self::NotFound("Row".to_owned()),
            sqlx::Error::PoolTimedOut => Self::Query("Pool timed out".to_owned()),
            sqlx::Error::PoolClosed => Self::Query("Pool closed".to_owned()),
            e => {
                log::error!("> Query error: {e}");
                Self::Query(format!("{e}"))
            }
        }
    }
}

impl From<sqlx::migrate::MigrateError> for ApiError {
    fn from(value: sqlx::migrate::MigrateError) -> Self {
        Self::Query(format!("{value}"))
    }
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::Crypto(format!("{value}"))
    }
}

/// Malformed value in a request form.
#[derive(Debug)]
pub struct TypeError {
    field: String,
    info: String,
}

impl TypeError {
    pub fn new(field: &str, info: &str) -> Self {
        Self {
            field: field.to_owned(),
            info: info.to_owned(),
        }
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.field, self.info)
    }
}

impl std::error::Error for TypeError {}

impl From<TypeError> for ApiError {
    fn from(value: TypeError) -> Self {
        Self::Validation {
            field: value.field,
            message: value.info,
        }
    }
}
