//! Implements a struct that holds the state of the REST server.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{Error, db::initialize};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// A directory of prebuilt frontend files to serve for non-API routes.
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, static_dir: Option<PathBuf>) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            static_dir,
        })
    }
}

/// The state needed by route handlers that only read and write records.
#[derive(Debug, Clone)]
pub struct DbState {
    /// The database connection for managing records.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl DbState {
    /// Lock the database connection for the duration of a request.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLockError] if the mutex has been poisoned.
    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

impl FromRef<AppState> for DbState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
