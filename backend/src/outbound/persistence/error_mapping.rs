//! Translation of pool and Diesel failures into `TrackerStoreError`.
//!
//! Only the broad category survives the translation; driver messages are
//! logged at `debug` and replaced by fixed text so that SQL and constraint
//! details never reach an API response.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::TrackerStoreError;

use super::pool::PoolError;

/// Pool failures mean the database is unreachable.
pub(super) fn map_pool_error(error: PoolError) -> TrackerStoreError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    TrackerStoreError::connection(message)
}

/// Lost connections become connection errors; everything else is a query
/// failure.
pub(super) fn map_diesel_error(error: DieselError) -> TrackerStoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => {
            TrackerStoreError::connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            TrackerStoreError::query("concurrent transaction conflict")
        }
        DieselError::NotFound => TrackerStoreError::query("record not found"),
        _ => TrackerStoreError::query("database error"),
    }
}
