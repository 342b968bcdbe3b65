/*! This module defines and implements traits for interacting with the application's database. */

use rusqlite::{Connection, Row, Transaction as SqlTransaction, params};

use crate::{
    Error, address::Address, balance::Balance, database_id::DatabaseId, earning::Earning,
    investment::Investment, jewelry::Jewelry, person_transaction::PersonTransaction,
    retirement::{Retirement401k, SsnRecord},
    user::User,
};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create a table for the model.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a concrete rust type.
pub trait MapRow {
    /// The type produced from a row.
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// **Note:** This function expects that the row object contains the columns in the order
    /// of [Record::SELECT].
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the corresponding rust type, or if an invalid column index was used.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type, reading from column `offset` onwards.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the corresponding rust type, or if an invalid column index was used.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// A table-backed record with the standard list/get/create/update/delete operations.
pub trait Record: CreateTable + MapRow<ReturnType = Self> + Sized {
    /// The name of the record used in error messages, e.g. "address".
    const KIND: &'static str;

    /// The name of the table the record is stored in.
    const TABLE: &'static str;

    /// A `SELECT ... FROM ...` statement without a `WHERE` clause that yields
    /// the columns read by [MapRow::map_row].
    const SELECT: &'static str;

    /// The input accepted when creating or updating the record.
    type Form;

    /// Validate `form` and insert it, returning the ID of the new row.
    ///
    /// # Errors
    /// Returns an error if the form is invalid or there is an SQL error.
    fn insert(form: Self::Form, connection: &Connection) -> Result<DatabaseId, Error>;

    /// Validate `form` and overwrite the row with `id`, returning the number of rows changed.
    ///
    /// # Errors
    /// Returns an error if the form is invalid or there is an SQL error.
    fn update(id: DatabaseId, form: Self::Form, connection: &Connection)
    -> Result<usize, Error>;
}

/// Create all the application tables.
///
/// # Errors
/// Returns an error if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    User::create_table(&transaction)?;
    Address::create_table(&transaction)?;
    Balance::create_table(&transaction)?;
    Investment::create_table(&transaction)?;
    Earning::create_table(&transaction)?;
    Jewelry::create_table(&transaction)?;
    PersonTransaction::create_table(&transaction)?;
    Retirement401k::create_table(&transaction)?;
    SsnRecord::create_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Retrieve every record of type `R` ordered by ID.
pub fn select_all<R: Record>(connection: &Connection) -> Result<Vec<R>, Error> {
    connection
        .prepare(&format!("{} ORDER BY {}.id ASC", R::SELECT, R::TABLE))?
        .query_map([], R::map_row)?
        .map(|maybe_record| maybe_record.map_err(Error::from))
        .collect()
}

/// Retrieve a single record of type `R` by ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no record with `id`.
pub fn select_by_id<R: Record>(id: DatabaseId, connection: &Connection) -> Result<R, Error> {
    connection
        .query_one(
            &format!("{} WHERE {}.id = ?1", R::SELECT, R::TABLE),
            params![id],
            R::map_row,
        )
        .map_err(Error::from)
}

/// Insert a record built from `form` and return it as stored.
pub fn create<R: Record>(form: R::Form, connection: &Connection) -> Result<R, Error> {
    let id = R::insert(form, connection)?;

    select_by_id(id, connection)
}

/// Overwrite the record with `id` and return it as stored.
///
/// # Errors
/// Returns [Error::UpdateMissing] if there is no record with `id`.
pub fn update<R: Record>(id: DatabaseId, form: R::Form, connection: &Connection) -> Result<R, Error> {
    let rows_affected = R::update(id, form, connection)?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing(R::KIND));
    }

    select_by_id(id, connection)
}

/// Delete the record of type `R` with `id`.
///
/// # Errors
/// Returns [Error::DeleteMissing] if there is no record with `id`.
pub fn delete<R: Record>(id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        &format!("DELETE FROM {} WHERE id = ?1", R::TABLE),
        params![id],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissing(R::KIND));
    }

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), initialize(&connection));
    }

    #[test]
    fn can_initialize_twice() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        assert_eq!(Ok(()), initialize(&connection));
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let enabled: i64 = connection
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();

        assert_eq!(enabled, 1);
    }
}
