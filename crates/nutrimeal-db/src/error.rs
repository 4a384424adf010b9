use nutrimeal_types::models::ParseEnumError;
use rusqlite::{ErrorCode, ffi};
use thiserror::Error;
use tracing::error;

/// Failures of a store operation, already classified for the caller.
/// Raw driver errors never leave this crate.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Transient(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidInput(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        StoreError::Conflict(msg.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, _) = &e {
            match failure.code {
                ErrorCode::ConstraintViolation => {
                    return match failure.extended_code {
                        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                            StoreError::Conflict("record already exists".into())
                        }
                        // Only user references can dangle: recipe ids are checked first.
                        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => StoreError::NotFound("account"),
                        _ => StoreError::InvalidInput("value rejected by the store".into()),
                    };
                }
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    return StoreError::Transient("database busy".into());
                }
                _ => {}
            }
        }

        error!("SQLite error: {}", e);
        StoreError::Transient("database error".into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

impl From<ParseEnumError> for StoreError {
    fn from(e: ParseEnumError) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

impl From<uuid::Error> for StoreError {
    fn from(e: uuid::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(extended_code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(extended_code), None)
    }

    #[test]
    fn constraint_failures_are_classified_by_kind() {
        assert!(matches!(
            StoreError::from(constraint(ffi::SQLITE_CONSTRAINT_UNIQUE)),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            StoreError::from(constraint(ffi::SQLITE_CONSTRAINT_PRIMARYKEY)),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            StoreError::from(constraint(ffi::SQLITE_CONSTRAINT_FOREIGNKEY)),
            StoreError::NotFound("account")
        ));
        assert!(matches!(
            StoreError::from(constraint(ffi::SQLITE_CONSTRAINT_CHECK)),
            StoreError::InvalidInput(_)
        ));
        assert!(matches!(
            StoreError::from(constraint(ffi::SQLITE_BUSY)),
            StoreError::Transient(_)
        ));
    }
}
