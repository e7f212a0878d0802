//! Shared Diesel error mapping for the marketplace repositories.
//!
//! Each repository owns a port error enum with `connection` and `query`
//! constructors; these helpers translate pool and Diesel failures into them
//! and carry domain refusals out of a transaction so it rolls back.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error.
pub(crate) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map Diesel failures into query or connection errors.
///
/// Database messages are logged at debug level and replaced with a generic
/// description so SQL details never reach callers.
pub(crate) fn map_diesel_error<E>(
    error: DieselError,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => query("database query error".to_owned()),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            query("concurrent update conflict".to_owned())
        }
        _ => query("database error".to_owned()),
    }
}

pub(crate) fn is_unique_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

pub(crate) fn is_foreign_key_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}

/// Failure inside a transaction closure.
///
/// `Refused` carries a domain decision (insufficient funds, an illegal
/// transition) that must abort the transaction without being mistaken for
/// a database fault.
#[derive(Debug)]
pub(crate) enum TxError<E> {
    Diesel(DieselError),
    Refused(E),
}

impl<E> From<DieselError> for TxError<E> {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

impl<E> TxError<E> {
    /// Collapse into the port error, mapping Diesel failures with `diesel`.
    pub(crate) fn into_port_error(self, diesel: impl FnOnce(DieselError) -> E) -> E {
        match self {
            Self::Diesel(error) => diesel(error),
            Self::Refused(error) => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum PortFailure {
        Query(String),
        Connection(String),
    }

    #[rstest]
    fn not_found_maps_to_query() {
        let mapped = map_diesel_error(DieselError::NotFound, PortFailure::Query, PortFailure::Connection);
        assert_eq!(mapped, PortFailure::Query("record not found".to_owned()));
    }

    #[rstest]
    fn pool_checkout_maps_to_connection() {
        let mapped = map_pool_error(PoolError::checkout("timed out"), PortFailure::Connection);
        assert_eq!(mapped, PortFailure::Connection("timed out".to_owned()));
    }

    #[rstest]
    fn refusal_survives_transaction_mapping() {
        let refused: TxError<PortFailure> = TxError::Refused(PortFailure::Query("short".to_owned()));
        let mapped = refused.into_port_error(|_| PortFailure::Connection("unused".to_owned()));
        assert_eq!(mapped, PortFailure::Query("short".to_owned()));

        let failed: TxError<PortFailure> = DieselError::RollbackTransaction.into();
        let mapped = failed.into_port_error(|err| map_diesel_error(err, PortFailure::Query, PortFailure::Connection));
        assert_eq!(mapped, PortFailure::Query("database error".to_owned()));
    }
}
