//! Conversions from external infrastructure errors into domain errors.

use fieldline_domain::FieldlineError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub FieldlineError);

impl From<InfraError> for FieldlineError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<FieldlineError> for InfraError {
    fn from(value: FieldlineError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and
/// within this module.
trait IntoFieldlineError {
    fn into_fieldline(self) -> FieldlineError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → FieldlineError */
/* -------------------------------------------------------------------------- */

impl IntoFieldlineError for SqlError {
    fn into_fieldline(self) -> FieldlineError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        FieldlineError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        FieldlineError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        FieldlineError::Conflict("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        FieldlineError::Database("foreign key constraint violation".into())
                    }
                    _ => FieldlineError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                FieldlineError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                FieldlineError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                FieldlineError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                FieldlineError::Database("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidQuery => FieldlineError::Database("invalid SQL query".into()),
            other => FieldlineError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_fieldline())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → FieldlineError */
/* -------------------------------------------------------------------------- */

impl IntoFieldlineError for r2d2::Error {
    fn into_fieldline(self) -> FieldlineError {
        FieldlineError::Database(format!("connection pool error: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_fieldline())
    }
}

/// Map a rusqlite error straight into the domain error.
pub fn map_sql_error(err: SqlError) -> FieldlineError {
    FieldlineError::from(InfraError::from(err))
}

/// Map a pool error straight into the domain error.
pub fn map_pool_error(err: r2d2::Error) -> FieldlineError {
    FieldlineError::from(InfraError::from(err))
}

/// Map a blocking-task join error into the domain error.
pub fn map_join_error(err: tokio::task::JoinError) -> FieldlineError {
    if err.is_cancelled() {
        FieldlineError::Internal("blocking repository task cancelled".into())
    } else {
        FieldlineError::Internal(format!("blocking repository task failed: {err}"))
    }
}
