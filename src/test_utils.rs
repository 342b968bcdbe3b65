#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    app_state::DbState,
    db::{create, initialize},
    user::{User, UserForm},
};

#[track_caller]
pub(crate) fn must_create_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("could not create in-memory SQLite database");
    initialize(&connection).expect("could not initialize test DB");

    connection
}

#[track_caller]
pub(crate) fn must_create_test_state() -> DbState {
    DbState {
        db_connection: Arc::new(Mutex::new(must_create_test_connection())),
    }
}

pub(crate) fn user_form(short_name: &str) -> UserForm {
    UserForm {
        first_name: format!("{short_name} first"),
        last_name: format!("{short_name} last"),
        short_name: short_name.to_owned(),
        email: None,
        phone: None,
    }
}

#[track_caller]
pub(crate) fn must_create_user(short_name: &str, connection: &Connection) -> User {
    create(user_form(short_name), connection).expect("could not create test user")
}
