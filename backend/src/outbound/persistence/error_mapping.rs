//! Shared Diesel and pool error mapping for the repository adapters.

use tracing::debug;

use crate::domain::ports::StoreError;

use super::pool::PoolError;

/// Map pool failures into the store taxonomy. A checkout timeout stays a
/// timeout; everything else is a connection failure.
pub(crate) fn map_pool_error(error: PoolError) -> StoreError {
    match error {
        PoolError::CheckoutTimeout => StoreError::timeout("pool checkout timed out"),
        PoolError::Checkout { message } | PoolError::Build { message } => {
            StoreError::connection(message)
        }
    }
}

/// Map common Diesel error variants into the store taxonomy.
///
/// Full driver messages go to the debug log only; the returned variants
/// carry generic text so nothing sensitive rides an error into a response.
pub(crate) fn map_diesel_error(error: diesel::result::Error) -> StoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            StoreError::connection("database connection closed")
        }
        DieselError::DatabaseError(_, _) => StoreError::query("database error"),
        DieselError::NotFound => StoreError::query("record not found"),
        _ => StoreError::query("database error"),
    }
}

/// True when the error is a unique-constraint violation, used by the user
/// repository to translate duplicate emails.
pub(crate) fn is_unique_violation(error: &diesel::result::Error) -> bool {
    matches!(
        error,
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _
        )
    )
}
