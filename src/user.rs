//! Users are the people whose finances are recorded, and the parties of
//! person-to-person transactions.

use std::collections::HashMap;

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::DatabaseId,
    db::{CreateTable, MapRow, Record},
    text::{optional, required},
};

/// Database identifier for a user.
pub type UserId = DatabaseId;

/// A person tracked by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// A unique display alias, e.g. "Mom" or "Raj".
    pub short_name: String,
    /// An optional contact email address.
    pub email: Option<String>,
    /// An optional contact phone number.
    pub phone: Option<String>,
}

/// The data for creating or updating a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserForm {
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// A unique display alias.
    pub short_name: String,
    /// An optional contact email address.
    pub email: Option<String>,
    /// An optional contact phone number.
    pub phone: Option<String>,
}

struct ValidUser {
    first_name: String,
    last_name: String,
    short_name: String,
    email: Option<String>,
    phone: Option<String>,
}

impl TryFrom<UserForm> for ValidUser {
    type Error = Error;

    fn try_from(form: UserForm) -> Result<Self, Self::Error> {
        Ok(Self {
            first_name: form.first_name.trim().to_owned(),
            last_name: form.last_name.trim().to_owned(),
            short_name: required("short_name", &form.short_name)?,
            email: optional(form.email.as_deref()),
            phone: optional(form.phone.as_deref()),
        })
    }
}

impl CreateTable for User {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                short_name TEXT NOT NULL UNIQUE,
                email TEXT,
                phone TEXT
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for User {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            first_name: row.get(offset + 1)?,
            last_name: row.get(offset + 2)?,
            short_name: row.get(offset + 3)?,
            email: row.get(offset + 4)?,
            phone: row.get(offset + 5)?,
        })
    }
}

impl Record for User {
    const KIND: &'static str = "user";
    const TABLE: &'static str = "user";
    const SELECT: &'static str =
        "SELECT user.id, user.first_name, user.last_name, user.short_name, user.email, user.phone FROM user";

    type Form = UserForm;

    fn insert(form: UserForm, connection: &Connection) -> Result<DatabaseId, Error> {
        let user = ValidUser::try_from(form)?;

        connection
            .execute(
                "INSERT INTO user (first_name, last_name, short_name, email, phone)
                VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.first_name,
                    user.last_name,
                    user.short_name,
                    user.email,
                    user.phone
                ],
            )
            .map_err(|error| map_duplicate_short_name(error, &user.short_name))?;

        Ok(connection.last_insert_rowid())
    }

    fn update(id: DatabaseId, form: UserForm, connection: &Connection) -> Result<usize, Error> {
        let user = ValidUser::try_from(form)?;

        connection
            .execute(
                "UPDATE user
                SET \
                    first_name = ?1, \
                    last_name = ?2, \
                    short_name = ?3, \
                    email = ?4, \
                    phone = ?5 \
                WHERE id = ?6",
                params![
                    user.first_name,
                    user.last_name,
                    user.short_name,
                    user.email,
                    user.phone,
                    id
                ],
            )
            .map_err(|error| map_duplicate_short_name(error, &user.short_name))
    }
}

fn map_duplicate_short_name(error: rusqlite::Error, short_name: &str) -> Error {
    match error {
        // Code 2067 occurs when a UNIQUE constraint failed.
        rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
            if sql_error.extended_code == 2067 && desc.contains("user.short_name") =>
        {
            Error::DuplicateShortName(short_name.to_owned())
        }
        error => error.into(),
    }
}

/// Get the short name of every user keyed by user ID.
///
/// This is the party directory used to label transactions for display.
pub fn get_short_names(connection: &Connection) -> Result<HashMap<UserId, String>, Error> {
    connection
        .prepare("SELECT id, short_name FROM user")?
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .map(|maybe_entry| maybe_entry.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        db::{create, select_by_id, update},
        test_utils::{must_create_test_connection, user_form},
        user::{User, UserForm, get_short_names},
    };

    #[test]
    fn create_trims_fields() {
        let connection = must_create_test_connection();

        let user: User = create(
            UserForm {
                first_name: " Anjali ".to_owned(),
                last_name: "Rao\n".to_owned(),
                short_name: "  Anju ".to_owned(),
                email: Some(" anju@example.com ".to_owned()),
                phone: Some("   ".to_owned()),
            },
            &connection,
        )
        .unwrap();

        assert_eq!(
            user,
            User {
                id: user.id,
                first_name: "Anjali".to_owned(),
                last_name: "Rao".to_owned(),
                short_name: "Anju".to_owned(),
                email: Some("anju@example.com".to_owned()),
                phone: None,
            }
        );
    }

    #[test]
    fn create_fails_on_empty_short_name() {
        let connection = must_create_test_connection();

        let result = create::<User>(user_form(" "), &connection);

        assert_eq!(result, Err(Error::EmptyField("short_name")));
    }

    #[test]
    fn create_fails_on_duplicate_short_name() {
        let connection = must_create_test_connection();
        create::<User>(user_form("Dad"), &connection).unwrap();

        let result = create::<User>(user_form("Dad"), &connection);

        assert_eq!(result, Err(Error::DuplicateShortName("Dad".to_owned())));
    }

    #[test]
    fn update_overwrites_fields() {
        let connection = must_create_test_connection();
        let user: User = create(user_form("Dad"), &connection).unwrap();

        let updated: User = update(user.id, user_form("Papa"), &connection).unwrap();

        assert_eq!(updated.short_name, "Papa");
        assert_eq!(select_by_id::<User>(user.id, &connection).unwrap(), updated);
    }

    #[test]
    fn update_fails_on_taking_another_users_short_name() {
        let connection = must_create_test_connection();
        create::<User>(user_form("Dad"), &connection).unwrap();
        let mom: User = create(user_form("Mom"), &connection).unwrap();

        let result = update::<User>(mom.id, user_form("Dad"), &connection);

        assert_eq!(result, Err(Error::DuplicateShortName("Dad".to_owned())));
    }

    #[test]
    fn get_short_names_maps_ids() {
        let connection = must_create_test_connection();
        let dad: User = create(user_form("Dad"), &connection).unwrap();
        let mom: User = create(user_form("Mom"), &connection).unwrap();

        let names = get_short_names(&connection).unwrap();

        assert_eq!(names.len(), 2);
        assert_eq!(names[&dad.id], "Dad");
        assert_eq!(names[&mom.id], "Mom");
    }
}
