//! Social Security numbers and yearly Social Security statement entries.

use std::fmt::{Debug, Display};

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::{
    Error,
    database_id::DatabaseId,
    db::{CreateTable, MapRow, Record},
    money::{Currency, get_decimal, to_sql_text},
    user::UserId,
};

/// A nine digit US social security number.
///
/// The number is only ever displayed, logged or serialized in masked form,
/// e.g. `***-**-6789`.
#[derive(Clone, PartialEq, Eq)]
pub struct Ssn(String);

impl Ssn {
    /// Parse a social security number, ignoring dashes and spaces.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidSsn] if the number does not have exactly nine digits.
    pub fn new(raw: &str) -> Result<Self, Error> {
        let digits: String = raw
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect();

        if digits.len() == 9 && digits.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(digits))
        } else {
            Err(Error::InvalidSsn)
        }
    }

    /// The number with all but the last four digits hidden.
    pub fn masked(&self) -> String {
        let last_four = self.0.get(self.0.len().saturating_sub(4)..).unwrap_or_default();

        format!("***-**-{last_four}")
    }
}

impl Display for Ssn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl Debug for Ssn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ssn({})", self.masked())
    }
}

impl Serialize for Ssn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.masked())
    }
}

impl ToSql for Ssn {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.0.as_str().into())
    }
}

impl FromSql for Ssn {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(|digits| Self(digits.to_owned()))
    }
}

/// A yearly Social Security statement entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SsnRecord {
    /// The ID of the record.
    pub id: DatabaseId,
    /// The person the statement is for.
    pub user_id: UserId,
    /// The person's social security number.
    pub ssn: Ssn,
    /// The calendar year of the statement entry.
    pub year: i32,
    /// Earnings taxed for Social Security in `year`.
    pub taxed_earnings: Decimal,
    /// The estimated monthly benefit at full retirement age.
    pub estimated_monthly_benefit: Decimal,
    /// The currency of the amounts.
    pub currency: Currency,
    /// The short name of the user, empty if the user could not be found.
    pub user_short_name: String,
}

/// The data for creating or updating a Social Security statement entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SsnRecordForm {
    /// The person the statement is for.
    pub user_id: UserId,
    /// The social security number, dashes optional.
    pub ssn: String,
    /// The calendar year of the statement entry.
    pub year: i32,
    /// Earnings taxed for Social Security in `year`.
    pub taxed_earnings: Decimal,
    /// The estimated monthly benefit at full retirement age.
    #[serde(default)]
    pub estimated_monthly_benefit: Decimal,
    /// A three letter currency code.
    pub currency: String,
}

impl CreateTable for SsnRecord {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS retirement_ssn (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                ssn TEXT NOT NULL,
                year INTEGER NOT NULL,
                taxed_earnings TEXT NOT NULL,
                estimated_monthly_benefit TEXT NOT NULL,
                currency TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SsnRecord {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            user_id: row.get(offset + 1)?,
            ssn: row.get(offset + 2)?,
            year: row.get(offset + 3)?,
            taxed_earnings: get_decimal(row, offset + 4)?,
            estimated_monthly_benefit: get_decimal(row, offset + 5)?,
            currency: row.get(offset + 6)?,
            user_short_name: row.get(offset + 7)?,
        })
    }
}

impl Record for SsnRecord {
    const KIND: &'static str = "social security record";
    const TABLE: &'static str = "retirement_ssn";
    const SELECT: &'static str = "SELECT retirement_ssn.id, retirement_ssn.user_id, \
        retirement_ssn.ssn, retirement_ssn.year, retirement_ssn.taxed_earnings, \
        retirement_ssn.estimated_monthly_benefit, retirement_ssn.currency, \
        COALESCE(user.short_name, '') \
        FROM retirement_ssn LEFT JOIN user ON user.id = retirement_ssn.user_id";

    type Form = SsnRecordForm;

    fn insert(form: SsnRecordForm, connection: &Connection) -> Result<DatabaseId, Error> {
        let ssn = Ssn::new(&form.ssn)?;
        let currency = Currency::new(&form.currency)?;

        connection.execute(
            "INSERT INTO retirement_ssn (user_id, ssn, year, taxed_earnings, estimated_monthly_benefit, currency)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                form.user_id,
                ssn,
                form.year,
                to_sql_text(form.taxed_earnings),
                to_sql_text(form.estimated_monthly_benefit),
                currency
            ],
        )?;

        Ok(connection.last_insert_rowid())
    }

    fn update(id: DatabaseId, form: SsnRecordForm, connection: &Connection) -> Result<usize, Error> {
        let ssn = Ssn::new(&form.ssn)?;
        let currency = Currency::new(&form.currency)?;

        connection
            .execute(
                "UPDATE retirement_ssn
                SET \
                    user_id = ?1, \
                    ssn = ?2, \
                    year = ?3, \
                    taxed_earnings = ?4, \
                    estimated_monthly_benefit = ?5, \
                    currency = ?6 \
                WHERE id = ?7",
                params![
                    form.user_id,
                    ssn,
                    form.year,
                    to_sql_text(form.taxed_earnings),
                    to_sql_text(form.estimated_monthly_benefit),
                    currency,
                    id
                ],
            )
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod ssn_tests {
    use crate::{Error, retirement::Ssn};

    #[test]
    fn new_accepts_dashes_and_spaces() {
        assert_eq!(Ssn::new(" 123-45-6789 "), Ssn::new("123456789"));
        assert!(Ssn::new("123 45 6789").is_ok());
    }

    #[test]
    fn new_fails_on_wrong_digit_count() {
        assert_eq!(Ssn::new("12345678"), Err(Error::InvalidSsn));
        assert_eq!(Ssn::new("1234567890"), Err(Error::InvalidSsn));
        assert_eq!(Ssn::new("12345678x"), Err(Error::InvalidSsn));
    }

    #[test]
    fn display_and_debug_are_masked() {
        let ssn = Ssn::new("123-45-6789").unwrap();

        assert_eq!(ssn.to_string(), "***-**-6789");
        assert!(!format!("{ssn:?}").contains("12345"));
    }

    #[test]
    fn serializes_masked() {
        let ssn = Ssn::new("123-45-6789").unwrap();

        assert_eq!(serde_json::to_string(&ssn).unwrap(), "\"***-**-6789\"");
    }
}

#[cfg(test)]
mod record_tests {
    use rust_decimal_macros::dec;

    use crate::{
        db::{create, select_by_id},
        retirement::{Ssn, SsnRecord, SsnRecordForm},
        test_utils::{must_create_test_connection, must_create_user},
    };

    #[test]
    fn stores_full_number_and_serializes_masked() {
        let connection = must_create_test_connection();
        let user = must_create_user("Dad", &connection);

        let record: SsnRecord = create(
            SsnRecordForm {
                user_id: user.id,
                ssn: "123-45-6789".to_owned(),
                year: 2023,
                taxed_earnings: dec!(160200),
                estimated_monthly_benefit: dec!(3100),
                currency: "USD".to_owned(),
            },
            &connection,
        )
        .unwrap();

        let stored: SsnRecord = select_by_id(record.id, &connection).unwrap();
        assert_eq!(stored.ssn, Ssn::new("123456789").unwrap());
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["ssn"], "***-**-6789");
        assert_eq!(json["user_short_name"], "Dad");
    }
}
