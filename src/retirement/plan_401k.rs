//! Yearly 401k plan contributions from employees and their employers.

use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::DatabaseId,
    db::{CreateTable, MapRow, Record},
    money::{Currency, checked_sum, derived_value_error, get_decimal, to_sql_text},
    text::required,
    user::UserId,
};

/// One year of contributions to a 401k plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retirement401k {
    /// The ID of the record.
    pub id: DatabaseId,
    /// The plan holder.
    pub user_id: UserId,
    /// The employer sponsoring the plan.
    pub employer: String,
    /// The calendar year of the contributions.
    pub year: i32,
    /// What the employee paid in.
    pub employee_contribution: Decimal,
    /// What the employer paid in.
    pub employer_match: Decimal,
    /// The currency of the contributions.
    pub currency: Currency,
    /// `employee_contribution + employer_match`.
    pub total_contribution: Decimal,
    /// The short name of the user, empty if the user could not be found.
    pub user_short_name: String,
}

/// The data for creating or updating a 401k record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retirement401kForm {
    /// The plan holder.
    pub user_id: UserId,
    /// The employer sponsoring the plan.
    pub employer: String,
    /// The calendar year of the contributions.
    pub year: i32,
    /// What the employee paid in.
    pub employee_contribution: Decimal,
    /// What the employer paid in.
    #[serde(default)]
    pub employer_match: Decimal,
    /// A three letter currency code.
    pub currency: String,
}

struct ValidContributions {
    employer: String,
    currency: Currency,
}

fn validate(form: &Retirement401kForm) -> Result<ValidContributions, Error> {
    checked_sum(
        "total_contribution",
        form.employee_contribution,
        form.employer_match,
    )?;

    Ok(ValidContributions {
        employer: required("employer", &form.employer)?,
        currency: Currency::new(&form.currency)?,
    })
}

impl CreateTable for Retirement401k {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS retirement_401k (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                employer TEXT NOT NULL,
                year INTEGER NOT NULL,
                employee_contribution TEXT NOT NULL,
                employer_match TEXT NOT NULL,
                currency TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Retirement401k {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        let employee_contribution = get_decimal(row, offset + 4)?;
        let employer_match = get_decimal(row, offset + 5)?;
        let total_contribution =
            checked_sum("total_contribution", employee_contribution, employer_match)
                .map_err(|error| derived_value_error(offset + 5, error))?;

        Ok(Self {
            id: row.get(offset)?,
            user_id: row.get(offset + 1)?,
            employer: row.get(offset + 2)?,
            year: row.get(offset + 3)?,
            employee_contribution,
            employer_match,
            currency: row.get(offset + 6)?,
            total_contribution,
            user_short_name: row.get(offset + 7)?,
        })
    }
}

impl Record for Retirement401k {
    const KIND: &'static str = "401k record";
    const TABLE: &'static str = "retirement_401k";
    const SELECT: &'static str = "SELECT retirement_401k.id, retirement_401k.user_id, \
        retirement_401k.employer, retirement_401k.year, retirement_401k.employee_contribution, \
        retirement_401k.employer_match, retirement_401k.currency, COALESCE(user.short_name, '') \
        FROM retirement_401k LEFT JOIN user ON user.id = retirement_401k.user_id";

    type Form = Retirement401kForm;

    fn insert(form: Retirement401kForm, connection: &Connection) -> Result<DatabaseId, Error> {
        let contributions = validate(&form)?;

        connection.execute(
            "INSERT INTO retirement_401k (user_id, employer, year, employee_contribution, employer_match, currency)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                form.user_id,
                contributions.employer,
                form.year,
                to_sql_text(form.employee_contribution),
                to_sql_text(form.employer_match),
                contributions.currency
            ],
        )?;

        Ok(connection.last_insert_rowid())
    }

    fn update(
        id: DatabaseId,
        form: Retirement401kForm,
        connection: &Connection,
    ) -> Result<usize, Error> {
        let contributions = validate(&form)?;

        connection
            .execute(
                "UPDATE retirement_401k
                SET \
                    user_id = ?1, \
                    employer = ?2, \
                    year = ?3, \
                    employee_contribution = ?4, \
                    employer_match = ?5, \
                    currency = ?6 \
                WHERE id = ?7",
                params![
                    form.user_id,
                    contributions.employer,
                    form.year,
                    to_sql_text(form.employee_contribution),
                    to_sql_text(form.employer_match),
                    contributions.currency,
                    id
                ],
            )
            .map_err(Error::from)
    }
}
