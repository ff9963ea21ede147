//! MySQL access for members, plan intervals, payments and check-ins.
//!
//! Every date handed to the engine leaves this module as a `NaiveDate` in the
//! gym calendar; payment instants stay UTC until a caller maps them.

pub mod attendance;
pub mod members;
pub mod memberships;
pub mod payments;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::utils::query_spec::QueryError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Map constraint violations reported by MySQL onto typed outcomes.
    pub(crate) fn classify(e: sqlx::Error, what: &'static str) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(what);
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::NotFound("member");
            }
            if db_err.is_check_violation() {
                return StoreError::Validation(format!("invalid {}", what));
            }
        }
        tracing::error!(error = %e, what, "Database error");
        StoreError::Database(e)
    }
}

impl From<QueryError> for StoreError {
    fn from(e: QueryError) -> Self {
        StoreError::Validation(e.to_string())
    }
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            StoreError::Duplicate(_) => StatusCode::CONFLICT,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            StoreError::Database(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(StoreError::Duplicate("phone").status_code(), StatusCode::CONFLICT);
        assert_eq!(StoreError::NotFound("member").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            StoreError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StoreError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_hide_database_details() {
        assert_eq!(StoreError::Duplicate("phone").to_string(), "phone already exists");
        let resp = StoreError::Database(sqlx::Error::PoolTimedOut).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn non_database_errors_pass_through_classification() {
        let e = StoreError::classify(sqlx::Error::RowNotFound, "member");
        assert!(matches!(e, StoreError::Database(sqlx::Error::RowNotFound)));
    }
}
