//! Investments such as stocks, mutual funds and fixed deposits.

use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    db::{CreateTable, MapRow, Record},
    money::{Currency, checked_difference, derived_value_error, get_decimal, to_sql_text},
    text::required,
    user::UserId,
};

/// An investment held by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    /// The ID of the investment.
    pub id: DatabaseId,
    /// The user who holds the investment.
    pub user_id: UserId,
    /// The name of the investment, e.g. the fund or ticker.
    pub name: String,
    /// The type of investment, e.g. "stock" or "mutual fund".
    pub kind: String,
    /// How much money was put in.
    pub invested_amount: Decimal,
    /// What the investment is worth now.
    pub current_value: Decimal,
    /// The currency of the amounts.
    pub currency: Currency,
    /// When the investment was made.
    pub start_date: Date,
    /// `current_value - invested_amount`.
    pub gain: Decimal,
    /// The short name of the user, empty if the user could not be found.
    pub user_short_name: String,
}

/// The data for creating or updating an investment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentForm {
    /// The user who holds the investment.
    pub user_id: UserId,
    /// The name of the investment.
    pub name: String,
    /// The type of investment.
    #[serde(default)]
    pub kind: String,
    /// How much money was put in.
    pub invested_amount: Decimal,
    /// What the investment is worth now.
    pub current_value: Decimal,
    /// A three letter currency code.
    pub currency: String,
    /// When the investment was made.
    pub start_date: Date,
}

struct ValidInvestment {
    name: String,
    kind: String,
    currency: Currency,
}

fn validate(form: &InvestmentForm) -> Result<ValidInvestment, Error> {
    checked_difference("gain", form.current_value, form.invested_amount)?;

    Ok(ValidInvestment {
        name: required("name", &form.name)?,
        kind: form.kind.trim().to_owned(),
        currency: Currency::new(&form.currency)?,
    })
}

impl CreateTable for Investment {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS investment (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                invested_amount TEXT NOT NULL,
                current_value TEXT NOT NULL,
                currency TEXT NOT NULL,
                start_date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Investment {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        let invested_amount = get_decimal(row, offset + 4)?;
        let current_value = get_decimal(row, offset + 5)?;
        let gain = checked_difference("gain", current_value, invested_amount)
            .map_err(|error| derived_value_error(offset + 5, error))?;

        Ok(Self {
            id: row.get(offset)?,
            user_id: row.get(offset + 1)?,
            name: row.get(offset + 2)?,
            kind: row.get(offset + 3)?,
            invested_amount,
            current_value,
            currency: row.get(offset + 6)?,
            start_date: row.get(offset + 7)?,
            gain,
            user_short_name: row.get(offset + 8)?,
        })
    }
}

impl Record for Investment {
    const KIND: &'static str = "investment";
    const TABLE: &'static str = "investment";
    const SELECT: &'static str = "SELECT investment.id, investment.user_id, investment.name, \
        investment.kind, investment.invested_amount, investment.current_value, \
        investment.currency, investment.start_date, COALESCE(user.short_name, '') \
        FROM investment LEFT JOIN user ON user.id = investment.user_id";

    type Form = InvestmentForm;

    fn insert(form: InvestmentForm, connection: &Connection) -> Result<DatabaseId, Error> {
        let investment = validate(&form)?;

        connection.execute(
            "INSERT INTO investment (user_id, name, kind, invested_amount, current_value, currency, start_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.user_id,
                investment.name,
                investment.kind,
                to_sql_text(form.invested_amount),
                to_sql_text(form.current_value),
                investment.currency,
                form.start_date
            ],
        )?;

        Ok(connection.last_insert_rowid())
    }

    fn update(
        id: DatabaseId,
        form: InvestmentForm,
        connection: &Connection,
    ) -> Result<usize, Error> {
        let investment = validate(&form)?;

        connection
            .execute(
                "UPDATE investment
                SET \
                    user_id = ?1, \
                    name = ?2, \
                    kind = ?3, \
                    invested_amount = ?4, \
                    current_value = ?5, \
                    currency = ?6, \
                    start_date = ?7 \
                WHERE id = ?8",
                params![
                    form.user_id,
                    investment.name,
                    investment.kind,
                    to_sql_text(form.invested_amount),
                    to_sql_text(form.current_value),
                    investment.currency,
                    form.start_date,
                    id
                ],
            )
            .map_err(Error::from)
    }
}
