//! Income received by users such as salary, rent or interest.

use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    db::{CreateTable, MapRow, Record},
    money::{Currency, get_decimal, require_positive, to_sql_text},
    text::{optional, required},
    user::UserId,
};

/// A payment received by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Earning {
    /// The ID of the earning.
    pub id: DatabaseId,
    /// The user who received the money.
    pub user_id: UserId,
    /// Where the money came from, e.g. an employer or tenant.
    pub source: String,
    /// The amount received.
    pub amount: Decimal,
    /// The currency of `amount`.
    pub currency: Currency,
    /// When the money was received.
    pub received_on: Date,
    /// Free text notes.
    pub notes: Option<String>,
    /// The short name of the user, empty if the user could not be found.
    pub user_short_name: String,
}

/// The data for creating or updating an earning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningForm {
    /// The user who received the money.
    pub user_id: UserId,
    /// Where the money came from.
    pub source: String,
    /// The amount received, must be greater than zero.
    pub amount: Decimal,
    /// A three letter currency code.
    pub currency: String,
    /// When the money was received.
    pub received_on: Date,
    /// Free text notes.
    pub notes: Option<String>,
}

struct ValidEarning {
    source: String,
    amount: Decimal,
    currency: Currency,
    notes: Option<String>,
}

fn validate(form: &EarningForm) -> Result<ValidEarning, Error> {
    Ok(ValidEarning {
        source: required("source", &form.source)?,
        amount: require_positive("amount", form.amount)?,
        currency: Currency::new(&form.currency)?,
        notes: optional(form.notes.as_deref()),
    })
}

impl CreateTable for Earning {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS earning (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                source TEXT NOT NULL,
                amount TEXT NOT NULL,
                currency TEXT NOT NULL,
                received_on TEXT NOT NULL,
                notes TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Earning {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            user_id: row.get(offset + 1)?,
            source: row.get(offset + 2)?,
            amount: get_decimal(row, offset + 3)?,
            currency: row.get(offset + 4)?,
            received_on: row.get(offset + 5)?,
            notes: row.get(offset + 6)?,
            user_short_name: row.get(offset + 7)?,
        })
    }
}

impl Record for Earning {
    const KIND: &'static str = "earning";
    const TABLE: &'static str = "earning";
    const SELECT: &'static str = "SELECT earning.id, earning.user_id, earning.source, \
        earning.amount, earning.currency, earning.received_on, earning.notes, \
        COALESCE(user.short_name, '') \
        FROM earning LEFT JOIN user ON user.id = earning.user_id";

    type Form = EarningForm;

    fn insert(form: EarningForm, connection: &Connection) -> Result<DatabaseId, Error> {
        let earning = validate(&form)?;

        connection.execute(
            "INSERT INTO earning (user_id, source, amount, currency, received_on, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                form.user_id,
                earning.source,
                to_sql_text(earning.amount),
                earning.currency,
                form.received_on,
                earning.notes
            ],
        )?;

        Ok(connection.last_insert_rowid())
    }

    fn update(id: DatabaseId, form: EarningForm, connection: &Connection) -> Result<usize, Error> {
        let earning = validate(&form)?;

        connection
            .execute(
                "UPDATE earning
                SET \
                    user_id = ?1, \
                    source = ?2, \
                    amount = ?3, \
                    currency = ?4, \
                    received_on = ?5, \
                    notes = ?6 \
                WHERE id = ?7",
                params![
                    form.user_id,
                    earning.source,
                    to_sql_text(earning.amount),
                    earning.currency,
                    form.received_on,
                    earning.notes,
                    id
                ],
            )
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        db::create,
        earning::{Earning, EarningForm},
        test_utils::{must_create_test_connection, must_create_user},
    };

    #[test]
    fn create_stores_earning() {
        let connection = must_create_test_connection();
        let user = must_create_user("Dad", &connection);

        let earning: Earning = create(
            EarningForm {
                user_id: user.id,
                source: " Acme Corp".to_owned(),
                amount: dec!(4200.00),
                currency: "USD".to_owned(),
                received_on: date!(2025 - 01 - 31),
                notes: Some("  ".to_owned()),
            },
            &connection,
        )
        .unwrap();

        assert_eq!(earning.source, "Acme Corp");
        assert_eq!(earning.amount, dec!(4200));
        assert_eq!(earning.notes, None);
        assert_eq!(earning.user_short_name, "Dad");
    }

    #[test]
    fn create_fails_on_negative_amount() {
        let connection = must_create_test_connection();
        let user = must_create_user("Dad", &connection);

        let result = create::<Earning>(
            EarningForm {
                user_id: user.id,
                source: "Acme Corp".to_owned(),
                amount: dec!(-1),
                currency: "USD".to_owned(),
                received_on: date!(2025 - 01 - 31),
                notes: None,
            },
            &connection,
        );

        assert_eq!(result, Err(Error::NonPositiveAmount("amount")));
    }
}
