//! Personal ledger is a record-keeping service for household finances.
//!
//! This library provides a JSON REST API over a SQLite database for users,
//! addresses, balances, investments, earnings, jewelry, person-to-person
//! transactions and retirement records. Transactions between people can be
//! summarized into one net figure per pair of people and currency.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod address;
mod app_state;
mod balance;
mod crud;
mod database_id;
mod db;
mod earning;
mod endpoints;
mod investment;
mod jewelry;
mod logging;
mod money;
mod person_transaction;
mod retirement;
mod routing;
mod text;
mod user;

#[cfg(test)]
mod test_utils;

pub use address::{Address, AddressForm};
pub use app_state::{AppState, DbState};
pub use balance::{Balance, BalanceForm, CurrencyTotal};
pub use database_id::DatabaseId;
pub use db::{create as create_record, initialize as initialize_db};
pub use earning::{Earning, EarningForm};
pub use investment::{Investment, InvestmentForm};
pub use jewelry::{Jewelry, JewelryForm};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::Currency;
pub use person_transaction::{
    NetSummary, NetSummaryView, PersonTransaction, PersonTransactionForm, Transfer,
    TransferDetail, TransferStatus, summarize,
};
pub use retirement::{Retirement401k, Retirement401kForm, Ssn, SsnRecord, SsnRecordForm};
pub use routing::build_router;
pub use user::{User, UserForm, UserId};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required text field was empty after trimming whitespace.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// The currency code is not three ASCII letters.
    #[error("\"{0}\" is not a valid currency code, expected three letters such as \"USD\"")]
    InvalidCurrency(String),

    /// An amount that must be strictly positive was zero or negative.
    #[error("{0} must be greater than zero")]
    NonPositiveAmount(&'static str),

    /// A sum or difference of amounts does not fit in a decimal.
    #[error("{0} is too large")]
    AmountOverflow(&'static str),

    /// A person transaction named the same user as source and destination.
    #[error("the source and destination of a transaction must be different people")]
    SameParty,

    /// The social security number does not have nine digits.
    ///
    /// The offending value is deliberately not included so it never ends up
    /// in logs or responses.
    #[error("a social security number must have exactly nine digits")]
    InvalidSsn,

    /// The short name is already used by another user.
    #[error("the short name \"{0}\" is already taken")]
    DuplicateShortName(String),

    /// A query was given a user ID that does not exist.
    #[error("the referenced user does not exist")]
    InvalidForeignKey,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a record that does not exist.
    #[error("tried to update a {0} that is not in the database")]
    UpdateMissing(&'static str),

    /// Tried to delete a record that does not exist.
    #[error("tried to delete a {0} that is not in the database")]
    DeleteMissing(&'static str),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 787 => {
                Error::InvalidForeignKey
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyField(_)
            | Error::InvalidCurrency(_)
            | Error::NonPositiveAmount(_)
            | Error::AmountOverflow(_)
            | Error::SameParty
            | Error::InvalidSsn
            | Error::DuplicateShortName(_)
            | Error::InvalidForeignKey => StatusCode::BAD_REQUEST,
            Error::NotFound | Error::UpdateMissing(_) | Error::DeleteMissing(_) => {
                StatusCode::NOT_FOUND
            }
            Error::DatabaseLockError | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Any errors that are not handled above are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use serde_json::Value;

    use crate::Error;

    async fn into_status_and_body(error: Error) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("could not read response body");

        (status, serde_json::from_slice(&bytes).expect("body is not JSON"))
    }

    #[tokio::test]
    async fn validation_errors_are_bad_requests_with_message() {
        let (status, body) = into_status_and_body(Error::EmptyField("short_name")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "short_name cannot be empty");
    }

    #[tokio::test]
    async fn amount_overflow_is_a_bad_request() {
        let (status, body) = into_status_and_body(Error::AmountOverflow("net_amount")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "net_amount is too large");
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let (status, _) = into_status_and_body(Error::DeleteMissing("address")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sql_errors_are_hidden_from_the_client() {
        let (status, body) =
            into_status_and_body(Error::SqlError(rusqlite::Error::InvalidQuery)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            !body["error"].as_str().unwrap().contains("SQL"),
            "internal details leaked: {body}"
        );
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
