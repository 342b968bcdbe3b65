//! The person transaction record and queries over it.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    db::{CreateTable, MapRow, Record},
    money::{Currency, get_decimal, require_positive, to_sql_text},
    person_transaction::summary::Transfer,
    user::UserId,
};

/// Whether the money has actually changed hands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// The transfer is planned for the schedule date.
    #[default]
    Pending,
    /// The money has been paid.
    Completed,
    /// The transfer will not happen.
    Cancelled,
}

impl TransferStatus {
    fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Completed => "completed",
            TransferStatus::Cancelled => "cancelled",
        }
    }
}

impl Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransferStatus::Pending),
            "completed" => Ok(TransferStatus::Completed),
            "cancelled" => Ok(TransferStatus::Cancelled),
            other => Err(format!("unknown transfer status \"{other}\"")),
        }
    }
}

impl ToSql for TransferStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransferStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A directional transfer of money from one person to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonTransaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The person paying.
    pub source_id: UserId,
    /// The person being paid.
    pub destination_id: UserId,
    /// The currency of `amount`.
    pub currency: Currency,
    /// How much is paid, always positive.
    pub amount: Decimal,
    /// Why the money was paid, e.g. "loan" or "rent share".
    pub purpose: String,
    /// When the transfer is or was due.
    pub schedule_date: Date,
    /// Whether the money has changed hands.
    pub status: TransferStatus,
    /// The short name of the payer, empty if the user could not be found.
    pub source_short_name: String,
    /// The short name of the payee, empty if the user could not be found.
    pub destination_short_name: String,
}

/// The data for creating or updating a person transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonTransactionForm {
    /// The person paying.
    pub source_id: UserId,
    /// The person being paid.
    pub destination_id: UserId,
    /// A three letter currency code.
    pub currency: String,
    /// How much is paid, must be greater than zero.
    pub amount: Decimal,
    /// Why the money was paid.
    #[serde(default)]
    pub purpose: String,
    /// When the transfer is or was due.
    pub schedule_date: Date,
    /// Whether the money has changed hands, defaults to pending.
    #[serde(default)]
    pub status: TransferStatus,
}

struct ValidTransfer {
    currency: Currency,
    amount: Decimal,
    purpose: String,
}

fn validate(form: &PersonTransactionForm) -> Result<ValidTransfer, Error> {
    if form.source_id == form.destination_id {
        return Err(Error::SameParty);
    }

    Ok(ValidTransfer {
        currency: Currency::new(&form.currency)?,
        amount: require_positive("amount", form.amount)?,
        purpose: form.purpose.trim().to_owned(),
    })
}

impl CreateTable for PersonTransaction {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute_batch(
            "CREATE TABLE IF NOT EXISTS person_transaction (
                id INTEGER PRIMARY KEY,
                source_id INTEGER NOT NULL,
                destination_id INTEGER NOT NULL,
                currency TEXT NOT NULL,
                amount TEXT NOT NULL,
                purpose TEXT NOT NULL,
                schedule_date TEXT NOT NULL,
                status TEXT NOT NULL,
                FOREIGN KEY(source_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(destination_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_person_transaction_parties
                ON person_transaction(source_id, destination_id, currency);",
        )?;

        Ok(())
    }
}

impl MapRow for PersonTransaction {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            source_id: row.get(offset + 1)?,
            destination_id: row.get(offset + 2)?,
            currency: row.get(offset + 3)?,
            amount: get_decimal(row, offset + 4)?,
            purpose: row.get(offset + 5)?,
            schedule_date: row.get(offset + 6)?,
            status: row.get(offset + 7)?,
            source_short_name: row.get(offset + 8)?,
            destination_short_name: row.get(offset + 9)?,
        })
    }
}

impl Record for PersonTransaction {
    const KIND: &'static str = "person transaction";
    const TABLE: &'static str = "person_transaction";
    const SELECT: &'static str = "SELECT person_transaction.id, person_transaction.source_id, \
        person_transaction.destination_id, person_transaction.currency, \
        person_transaction.amount, person_transaction.purpose, \
        person_transaction.schedule_date, person_transaction.status, \
        COALESCE(source.short_name, ''), COALESCE(destination.short_name, '') \
        FROM person_transaction \
        LEFT JOIN user AS source ON source.id = person_transaction.source_id \
        LEFT JOIN user AS destination ON destination.id = person_transaction.destination_id";

    type Form = PersonTransactionForm;

    fn insert(form: PersonTransactionForm, connection: &Connection) -> Result<DatabaseId, Error> {
        let transfer = validate(&form)?;

        connection.execute(
            "INSERT INTO person_transaction
                (source_id, destination_id, currency, amount, purpose, schedule_date, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.source_id,
                form.destination_id,
                transfer.currency,
                to_sql_text(transfer.amount),
                transfer.purpose,
                form.schedule_date,
                form.status
            ],
        )?;

        Ok(connection.last_insert_rowid())
    }

    fn update(
        id: DatabaseId,
        form: PersonTransactionForm,
        connection: &Connection,
    ) -> Result<usize, Error> {
        let transfer = validate(&form)?;

        connection
            .execute(
                "UPDATE person_transaction
                SET \
                    source_id = ?1, \
                    destination_id = ?2, \
                    currency = ?3, \
                    amount = ?4, \
                    purpose = ?5, \
                    schedule_date = ?6, \
                    status = ?7 \
                WHERE id = ?8",
                params![
                    form.source_id,
                    form.destination_id,
                    transfer.currency,
                    to_sql_text(transfer.amount),
                    transfer.purpose,
                    form.schedule_date,
                    form.status,
                    id
                ],
            )
            .map_err(Error::from)
    }
}

/// Restricts person transactions to those involving particular people or a currency.
///
/// Setting both parties selects the transfers between them in either direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairFilter {
    /// Only include transfers paid or received by this person.
    pub party_a: Option<UserId>,
    /// Only include transfers paid or received by this person.
    pub party_b: Option<UserId>,
    /// Only include transfers in this currency.
    pub currency: Option<String>,
}

impl PairFilter {
    /// The currency to filter by, trimmed and upper cased, or `None` if blank.
    ///
    /// The code is not validated, an unknown code simply matches nothing.
    fn currency(&self) -> Option<String> {
        self.currency
            .as_deref()
            .map(str::trim)
            .filter(|currency| !currency.is_empty())
            .map(str::to_ascii_uppercase)
    }
}

const FILTER_CLAUSE: &str = "WHERE (?1 IS NULL OR person_transaction.source_id = ?1 OR person_transaction.destination_id = ?1) \
    AND (?2 IS NULL OR person_transaction.source_id = ?2 OR person_transaction.destination_id = ?2) \
    AND (?3 IS NULL OR person_transaction.currency = ?3)";

/// Retrieve the person transactions matching `filter` ordered by ID.
pub fn get_person_transactions(
    filter: &PairFilter,
    connection: &Connection,
) -> Result<Vec<PersonTransaction>, Error> {
    connection
        .prepare(&format!(
            "{} {FILTER_CLAUSE} ORDER BY person_transaction.id ASC",
            PersonTransaction::SELECT
        ))?
        .query_map(
            params![filter.party_a, filter.party_b, filter.currency()],
            PersonTransaction::map_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Load the transfers matching `filter` in the order they were recorded.
///
/// This is the input to [summarize](crate::person_transaction::summarize).
pub fn get_transfers(filter: &PairFilter, connection: &Connection) -> Result<Vec<Transfer>, Error> {
    connection
        .prepare(&format!(
            "SELECT source_id, destination_id, currency, amount, purpose, schedule_date, status \
            FROM person_transaction {FILTER_CLAUSE} ORDER BY id ASC"
        ))?
        .query_map(
            params![filter.party_a, filter.party_b, filter.currency()],
            |row| {
                Ok(Transfer {
                    source_id: row.get(0)?,
                    destination_id: row.get(1)?,
                    currency: row.get(2)?,
                    amount: get_decimal(row, 3)?,
                    purpose: row.get(4)?,
                    schedule_date: row.get(5)?,
                    status: row.get(6)?,
                })
            },
        )?
        .map(|maybe_transfer| maybe_transfer.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        db::create,
        money::Currency,
        person_transaction::model::{
            PairFilter, PersonTransaction, PersonTransactionForm, TransferStatus,
            get_person_transactions, get_transfers,
        },
        test_utils::{must_create_test_connection, must_create_user},
        user::UserId,
    };

    fn transfer_form(
        source_id: UserId,
        destination_id: UserId,
        amount: rust_decimal::Decimal,
        currency: &str,
    ) -> PersonTransactionForm {
        PersonTransactionForm {
            source_id,
            destination_id,
            currency: currency.to_owned(),
            amount,
            purpose: " loan ".to_owned(),
            schedule_date: date!(2025 - 02 - 01),
            status: TransferStatus::Pending,
        }
    }

    #[test]
    fn create_joins_both_short_names() {
        let connection = must_create_test_connection();
        let raj = must_create_user("Raj", &connection);
        let mom = must_create_user("Mom", &connection);

        let transaction: PersonTransaction =
            create(transfer_form(raj.id, mom.id, dec!(100), "usd"), &connection).unwrap();

        assert_eq!(transaction.source_short_name, "Raj");
        assert_eq!(transaction.destination_short_name, "Mom");
        assert_eq!(transaction.currency, Currency::new_unchecked("USD"));
        assert_eq!(transaction.purpose, "loan");
        assert_eq!(transaction.status, TransferStatus::Pending);
    }

    #[test]
    fn create_fails_on_same_party() {
        let connection = must_create_test_connection();
        let raj = must_create_user("Raj", &connection);

        let result =
            create::<PersonTransaction>(transfer_form(raj.id, raj.id, dec!(1), "USD"), &connection);

        assert_eq!(result, Err(Error::SameParty));
    }

    #[test]
    fn create_fails_on_zero_amount() {
        let connection = must_create_test_connection();
        let raj = must_create_user("Raj", &connection);
        let mom = must_create_user("Mom", &connection);

        let result =
            create::<PersonTransaction>(transfer_form(raj.id, mom.id, dec!(0), "USD"), &connection);

        assert_eq!(result, Err(Error::NonPositiveAmount("amount")));
    }

    #[test]
    fn create_fails_on_unknown_destination() {
        let connection = must_create_test_connection();
        let raj = must_create_user("Raj", &connection);

        let result =
            create::<PersonTransaction>(transfer_form(raj.id, 99, dec!(1), "USD"), &connection);

        assert_eq!(result, Err(Error::InvalidForeignKey));
    }

    #[test]
    fn status_round_trips_through_database() {
        let connection = must_create_test_connection();
        let raj = must_create_user("Raj", &connection);
        let mom = must_create_user("Mom", &connection);

        let transaction: PersonTransaction = create(
            PersonTransactionForm {
                status: TransferStatus::Cancelled,
                ..transfer_form(raj.id, mom.id, dec!(5), "USD")
            },
            &connection,
        )
        .unwrap();

        assert_eq!(transaction.status, TransferStatus::Cancelled);
    }

    #[test]
    fn pair_filter_matches_both_directions_and_currency() {
        let connection = must_create_test_connection();
        let raj = must_create_user("Raj", &connection);
        let mom = must_create_user("Mom", &connection);
        let dad = must_create_user("Dad", &connection);
        for form in [
            transfer_form(raj.id, mom.id, dec!(100), "USD"),
            transfer_form(mom.id, raj.id, dec!(40), "USD"),
            transfer_form(raj.id, mom.id, dec!(7), "INR"),
            transfer_form(raj.id, dad.id, dec!(9), "USD"),
        ] {
            create::<PersonTransaction>(form, &connection).unwrap();
        }
        let filter = PairFilter {
            party_a: Some(mom.id),
            party_b: Some(raj.id),
            currency: Some(" usd ".to_owned()),
        };

        let transactions = get_person_transactions(&filter, &connection).unwrap();
        let transfers = get_transfers(&filter, &connection).unwrap();

        let amounts: Vec<_> = transactions.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, [dec!(100), dec!(40)]);
        let amounts: Vec<_> = transfers.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, [dec!(100), dec!(40)]);
    }

    #[test]
    fn single_party_filter_matches_any_transfer_involving_them() {
        let connection = must_create_test_connection();
        let raj = must_create_user("Raj", &connection);
        let mom = must_create_user("Mom", &connection);
        let dad = must_create_user("Dad", &connection);
        for form in [
            transfer_form(raj.id, mom.id, dec!(1), "USD"),
            transfer_form(dad.id, raj.id, dec!(2), "USD"),
            transfer_form(mom.id, dad.id, dec!(3), "USD"),
        ] {
            create::<PersonTransaction>(form, &connection).unwrap();
        }
        let filter = PairFilter {
            party_a: Some(raj.id),
            ..Default::default()
        };

        let transfers = get_transfers(&filter, &connection).unwrap();

        let amounts: Vec<_> = transfers.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, [dec!(1), dec!(2)]);
    }

    #[test]
    fn empty_filter_matches_everything() {
        let connection = must_create_test_connection();
        let raj = must_create_user("Raj", &connection);
        let mom = must_create_user("Mom", &connection);
        create::<PersonTransaction>(transfer_form(raj.id, mom.id, dec!(1), "USD"), &connection)
            .unwrap();
        create::<PersonTransaction>(transfer_form(mom.id, raj.id, dec!(2), "INR"), &connection)
            .unwrap();

        let transfers = get_transfers(&PairFilter::default(), &connection).unwrap();

        assert_eq!(transfers.len(), 2);
    }
}
