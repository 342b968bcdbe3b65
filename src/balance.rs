//! Bank and cash balances, and their totals per currency.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    app_state::DbState,
    database_id::DatabaseId,
    db::{CreateTable, MapRow, Record},
    money::{Currency, checked_sum, get_decimal, to_sql_text},
    text::required,
    user::UserId,
};

/// The amount of money held in an account on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// The ID of the balance.
    pub id: DatabaseId,
    /// The user who owns the account.
    pub user_id: UserId,
    /// The bank or institution holding the money.
    pub institution: String,
    /// The name or number of the account.
    pub account_name: String,
    /// The balance. Negative for debts such as credit cards.
    pub amount: Decimal,
    /// The currency of `amount`.
    pub currency: Currency,
    /// When the balance was checked.
    pub as_of: Date,
    /// The short name of the user, empty if the user could not be found.
    pub user_short_name: String,
}

/// The data for creating or updating a balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceForm {
    /// The user who owns the account.
    pub user_id: UserId,
    /// The bank or institution holding the money.
    pub institution: String,
    /// The name or number of the account.
    pub account_name: String,
    /// The balance.
    pub amount: Decimal,
    /// A three letter currency code.
    pub currency: String,
    /// When the balance was checked.
    pub as_of: Date,
}

impl CreateTable for Balance {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS balance (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                institution TEXT NOT NULL,
                account_name TEXT NOT NULL,
                amount TEXT NOT NULL,
                currency TEXT NOT NULL,
                as_of TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Balance {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            user_id: row.get(offset + 1)?,
            institution: row.get(offset + 2)?,
            account_name: row.get(offset + 3)?,
            amount: get_decimal(row, offset + 4)?,
            currency: row.get(offset + 5)?,
            as_of: row.get(offset + 6)?,
            user_short_name: row.get(offset + 7)?,
        })
    }
}

impl Record for Balance {
    const KIND: &'static str = "balance";
    const TABLE: &'static str = "balance";
    const SELECT: &'static str = "SELECT balance.id, balance.user_id, balance.institution, \
        balance.account_name, balance.amount, balance.currency, balance.as_of, \
        COALESCE(user.short_name, '') \
        FROM balance LEFT JOIN user ON user.id = balance.user_id";

    type Form = BalanceForm;

    fn insert(form: BalanceForm, connection: &Connection) -> Result<DatabaseId, Error> {
        let institution = required("institution", &form.institution)?;
        let account_name = required("account_name", &form.account_name)?;
        let currency = Currency::new(&form.currency)?;

        connection.execute(
            "INSERT INTO balance (user_id, institution, account_name, amount, currency, as_of)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                form.user_id,
                institution,
                account_name,
                to_sql_text(form.amount),
                currency,
                form.as_of
            ],
        )?;

        Ok(connection.last_insert_rowid())
    }

    fn update(id: DatabaseId, form: BalanceForm, connection: &Connection) -> Result<usize, Error> {
        let institution = required("institution", &form.institution)?;
        let account_name = required("account_name", &form.account_name)?;
        let currency = Currency::new(&form.currency)?;

        connection
            .execute(
                "UPDATE balance
                SET \
                    user_id = ?1, \
                    institution = ?2, \
                    account_name = ?3, \
                    amount = ?4, \
                    currency = ?5, \
                    as_of = ?6 \
                WHERE id = ?7",
                params![
                    form.user_id,
                    institution,
                    account_name,
                    to_sql_text(form.amount),
                    currency,
                    form.as_of,
                    id
                ],
            )
            .map_err(Error::from)
    }
}

/// The sum of all balances in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyTotal {
    /// The currency of the total.
    pub currency: Currency,
    /// The sum of the balances.
    pub total: Decimal,
}

/// Get the total balance across all accounts for each currency, ordered by currency code.
///
/// Amounts are summed as decimals in Rust rather than with SQL `SUM`, which
/// would convert the TEXT amounts to floating point.
///
/// # Errors
/// Returns [Error] if the SQL query fails or a stored amount is not a number,
/// or [Error::AmountOverflow] if a total does not fit in a decimal.
pub fn get_balance_totals(connection: &Connection) -> Result<Vec<CurrencyTotal>, Error> {
    let amounts: Vec<(Currency, Decimal)> = connection
        .prepare("SELECT currency, amount FROM balance")?
        .query_map([], |row| Ok((row.get(0)?, get_decimal(row, 1)?)))?
        .collect::<Result<_, _>>()?;

    let totals = amounts.into_iter().try_fold(
        BTreeMap::<Currency, Decimal>::new(),
        |mut totals, (currency, amount)| -> Result<_, Error> {
            let total = totals.entry(currency).or_insert(Decimal::ZERO);
            *total = checked_sum("total", *total, amount)?;
            Ok(totals)
        },
    )?;

    Ok(totals
        .into_iter()
        .map(|(currency, total): (Currency, Decimal)| CurrencyTotal {
            currency,
            total: total.normalize(),
        })
        .collect())
}

/// A route handler that responds with the balance totals per currency.
pub async fn get_balance_totals_endpoint(
    State(state): State<DbState>,
) -> Result<Json<Vec<CurrencyTotal>>, Error> {
    let connection = state.lock()?;

    get_balance_totals(&connection).map(Json)
}
