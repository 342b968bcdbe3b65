//! Postal addresses belonging to users.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::DatabaseId,
    db::{CreateTable, MapRow, Record},
    text::required,
    user::UserId,
};

/// A postal address of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// The ID of the address.
    pub id: DatabaseId,
    /// The user who lives at the address.
    pub user_id: UserId,
    /// Street number and name, including any unit number.
    pub street: String,
    /// The city or town.
    pub city: String,
    /// The state, province or region.
    pub state: String,
    /// The postal or ZIP code.
    pub postal_code: String,
    /// The country.
    pub country: String,
    /// Whether this is the user's main address.
    pub is_primary: bool,
    /// The short name of the user, empty if the user could not be found.
    pub user_short_name: String,
}

/// The data for creating or updating an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressForm {
    /// The user who lives at the address.
    pub user_id: UserId,
    /// Street number and name.
    pub street: String,
    /// The city or town.
    pub city: String,
    /// The state, province or region.
    #[serde(default)]
    pub state: String,
    /// The postal or ZIP code.
    #[serde(default)]
    pub postal_code: String,
    /// The country.
    pub country: String,
    /// Whether this is the user's main address.
    #[serde(default)]
    pub is_primary: bool,
}

impl AddressForm {
    fn validate(self) -> Result<Self, Error> {
        Ok(Self {
            user_id: self.user_id,
            street: required("street", &self.street)?,
            city: required("city", &self.city)?,
            state: self.state.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
            country: required("country", &self.country)?,
            is_primary: self.is_primary,
        })
    }
}

impl CreateTable for Address {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS address (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                street TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                postal_code TEXT NOT NULL,
                country TEXT NOT NULL,
                is_primary INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Address {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            user_id: row.get(offset + 1)?,
            street: row.get(offset + 2)?,
            city: row.get(offset + 3)?,
            state: row.get(offset + 4)?,
            postal_code: row.get(offset + 5)?,
            country: row.get(offset + 6)?,
            is_primary: row.get(offset + 7)?,
            user_short_name: row.get(offset + 8)?,
        })
    }
}

impl Record for Address {
    const KIND: &'static str = "address";
    const TABLE: &'static str = "address";
    const SELECT: &'static str = "SELECT address.id, address.user_id, address.street, address.city, \
        address.state, address.postal_code, address.country, address.is_primary, \
        COALESCE(user.short_name, '') \
        FROM address LEFT JOIN user ON user.id = address.user_id";

    type Form = AddressForm;

    fn insert(form: AddressForm, connection: &Connection) -> Result<DatabaseId, Error> {
        let form = form.validate()?;

        connection.execute(
            "INSERT INTO address (user_id, street, city, state, postal_code, country, is_primary)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.user_id,
                form.street,
                form.city,
                form.state,
                form.postal_code,
                form.country,
                form.is_primary
            ],
        )?;

        Ok(connection.last_insert_rowid())
    }

    fn update(id: DatabaseId, form: AddressForm, connection: &Connection) -> Result<usize, Error> {
        let form = form.validate()?;

        connection
            .execute(
                "UPDATE address
                SET \
                    user_id = ?1, \
                    street = ?2, \
                    city = ?3, \
                    state = ?4, \
                    postal_code = ?5, \
                    country = ?6, \
                    is_primary = ?7 \
                WHERE id = ?8",
                params![
                    form.user_id,
                    form.street,
                    form.city,
                    form.state,
                    form.postal_code,
                    form.country,
                    form.is_primary,
                    id
                ],
            )
            .map_err(Error::from)
    }
}
