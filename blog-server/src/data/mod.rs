pub mod comment_repository;
pub mod follow_repository;
pub mod media_repository;
pub mod post_repository;
pub mod profile_repository;
pub mod stats_repository;
pub mod user_repository;
pub mod vote_repository;

use tracing::{error, warn};

use crate::domain::error::DomainError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

pub(crate) fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(FOREIGN_KEY_VIOLATION)
}

/// Logs a database failure and maps it to a domain error. Races against
/// concurrent transactions become `Conflict` so callers can retry.
pub(crate) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| {
        let code = sqlstate(&e);
        match code.as_deref() {
            Some(UNIQUE_VIOLATION | SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
                warn!(error = %e, "{}: lost a race", context);
                DomainError::Conflict(context.to_string())
            }
            _ => {
                error!(error = %e, "{}", context);
                DomainError::Internal(format!("database error: {}", e))
            }
        }
    }
}
