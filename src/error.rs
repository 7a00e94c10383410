//! Types d'erreurs partagés par les services, le module d'auth et les routes.
//!
//! Les violations de contraintes viennent de la base (unique, FK, not null,
//! check); on les reconnaît via le `ErrorKind` de sqlx pour pouvoir répondre
//! autre chose qu'un 500.

use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::{DbErr, RuntimeErr};
use sqlx::error::ErrorKind;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintViolation::Unique => "unique",
            ConstraintViolation::ForeignKey => "foreign key",
            ConstraintViolation::NotNull => "not-null",
            ConstraintViolation::Check => "check",
        };
        f.write_str(name)
    }
}

/// Retrouve le type de contrainte violée dans une erreur SeaORM.
pub fn constraint_violation(err: &DbErr) -> Option<ConstraintViolation> {
    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return None,
    };
    let RuntimeErr::SqlxError(sqlx_err) = runtime else {
        return None;
    };

    match sqlx_err.as_database_error()?.kind() {
        ErrorKind::UniqueViolation => Some(ConstraintViolation::Unique),
        ErrorKind::ForeignKeyViolation => Some(ConstraintViolation::ForeignKey),
        ErrorKind::NotNullViolation => Some(ConstraintViolation::NotNull),
        ErrorKind::CheckViolation => Some(ConstraintViolation::Check),
        _ => None,
    }
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("{kind} constraint violated: {message}")]
    Constraint {
        kind: ConstraintViolation,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(DbErr),
}

impl DataError {
    pub fn violation(&self) -> Option<ConstraintViolation> {
        match self {
            DataError::Constraint { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<DbErr> for DataError {
    fn from(err: DbErr) -> Self {
        if let Some(kind) = constraint_violation(&err) {
            return DataError::Constraint {
                kind,
                message: err.to_string(),
            };
        }
        match err {
            // before_save des modèles renvoie Custom pour les champs invalides
            DbErr::Custom(message) => DataError::Validation(message),
            DbErr::RecordNotFound(what) => DataError::NotFound(what),
            other => DataError::Database(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Session expired")]
    SessionExpired,

    #[error("Token expired")]
    TokenExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Password hashing error: {0}")]
    Password(String),

    #[error(transparent)]
    Data(#[from] DataError),
}

impl From<DbErr> for AuthError {
    fn from(err: DbErr) -> Self {
        AuthError::Data(err.into())
    }
}

/// Erreur renvoyée par les handlers HTTP
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("Not a member of this clinic")]
    Forbidden,

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => match e {
                AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::SessionExpired
                | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::Data(d) => data_status(d),
            },
            ApiError::Data(d) => data_status(d),
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        match self {
            ApiError::Validation(errors) => HttpResponse::build(status).json(serde_json::json!({
                "error": "Validation failed",
                "fields": errors
            })),
            // Pas de détail SQL côté client
            _ if status.is_server_error() => HttpResponse::build(status).json(serde_json::json!({
                "error": "Internal server error"
            })),
            _ => HttpResponse::build(status).json(serde_json::json!({
                "error": self.to_string()
            })),
        }
    }
}

fn data_status(err: &DataError) -> StatusCode {
    match err {
        DataError::Constraint { kind, .. } => match kind {
            ConstraintViolation::Unique | ConstraintViolation::ForeignKey => StatusCode::CONFLICT,
            ConstraintViolation::NotNull | ConstraintViolation::Check => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        },
        DataError::NotFound(_) => StatusCode::NOT_FOUND,
        DataError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DataError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
