//! Currency codes and decimal amounts stored in SQLite.
//!
//! Amounts are stored as TEXT so that no precision is lost to SQLite's
//! floating point `REAL` type.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Row,
    types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A validated, upper case, three letter currency code such as "USD".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Create a currency code from user input.
    ///
    /// Surrounding whitespace is removed and the code is upper cased.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidCurrency] if the code is not three ASCII letters.
    pub fn new(code: &str) -> Result<Self, Error> {
        let code = code.trim();

        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(Error::InvalidCurrency(code.to_owned()))
        }
    }

    /// Create a currency code without validation.
    ///
    /// The caller should ensure that the code is three upper case ASCII letters.
    pub fn new_unchecked(code: &str) -> Self {
        Self(code.to_owned())
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for Currency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.0.as_str().into())
    }
}

impl FromSql for Currency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(Currency::new_unchecked)
    }
}

/// Read a decimal amount stored as TEXT from column `index` of `row`.
///
/// # Errors
/// Returns an error if the column is missing or does not hold a decimal number.
pub fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let raw: String = row.get(index)?;

    Decimal::from_str(&raw)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

/// Convert `amount` to the TEXT form it is stored in.
pub fn to_sql_text(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Reject zero and negative amounts for the field called `field`.
pub fn require_positive(field: &'static str, amount: Decimal) -> Result<Decimal, Error> {
    if amount > Decimal::ZERO {
        Ok(amount)
    } else {
        Err(Error::NonPositiveAmount(field))
    }
}

/// Add `left` and `right`, naming the result `field` if it overflows.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the sum does not fit in a [Decimal].
pub fn checked_sum(field: &'static str, left: Decimal, right: Decimal) -> Result<Decimal, Error> {
    left.checked_add(right).ok_or(Error::AmountOverflow(field))
}

/// Subtract `right` from `left`, naming the result `field` if it overflows.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the difference does not fit in a [Decimal].
pub fn checked_difference(
    field: &'static str,
    left: Decimal,
    right: Decimal,
) -> Result<Decimal, Error> {
    left.checked_sub(right).ok_or(Error::AmountOverflow(field))
}

/// Wrap an error from deriving a value out of column `index` for use inside a row mapper.
pub fn derived_value_error(index: usize, error: Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
}

#[cfg(test)]
mod currency_tests {
    use crate::{Error, money::Currency};

    #[test]
    fn new_trims_and_upper_cases() {
        assert_eq!(Currency::new(" usd\n"), Ok(Currency::new_unchecked("USD")));
    }

    #[test]
    fn new_fails_on_empty_string() {
        assert_eq!(Currency::new(""), Err(Error::InvalidCurrency(String::new())));
    }

    #[test]
    fn new_fails_on_wrong_length() {
        assert!(Currency::new("US").is_err());
        assert!(Currency::new("USDT").is_err());
    }

    #[test]
    fn new_fails_on_non_letters() {
        assert!(Currency::new("U$D").is_err());
    }

    #[test]
    fn deserialize_validates() {
        let currency: Result<Currency, _> = serde_json::from_str("\"inr\"");
        assert_eq!(currency.unwrap(), Currency::new_unchecked("INR"));

        let currency: Result<Currency, _> = serde_json::from_str("\"rupees\"");
        assert!(currency.is_err());
    }
}

#[cfg(test)]
mod decimal_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;

    use rust_decimal::Decimal;

    use crate::{
        Error,
        money::{checked_difference, checked_sum, get_decimal, require_positive, to_sql_text},
    };

    #[test]
    fn round_trips_through_text_column() {
        let connection = Connection::open_in_memory().unwrap();

        let got = connection
            .query_row("SELECT ?1", [to_sql_text(dec!(1234.50))], |row| {
                get_decimal(row, 0)
            })
            .unwrap();

        assert_eq!(got, dec!(1234.5));
    }

    #[test]
    fn get_decimal_fails_on_garbage() {
        let connection = Connection::open_in_memory().unwrap();

        let got = connection.query_row("SELECT 'twelve'", [], |row| get_decimal(row, 0));

        assert!(got.is_err());
    }

    #[test]
    fn require_positive_rejects_zero() {
        assert_eq!(
            require_positive("amount", dec!(0)),
            Err(Error::NonPositiveAmount("amount"))
        );
        assert_eq!(require_positive("amount", dec!(0.01)), Ok(dec!(0.01)));
    }

    #[test]
    fn checked_sum_reports_overflow() {
        assert_eq!(checked_sum("total", dec!(1.5), dec!(2)), Ok(dec!(3.5)));
        assert_eq!(
            checked_sum("total", Decimal::MAX, Decimal::MAX),
            Err(Error::AmountOverflow("total"))
        );
    }

    #[test]
    fn checked_difference_reports_overflow() {
        assert_eq!(checked_difference("gain", dec!(1), dec!(3)), Ok(dec!(-2)));
        assert_eq!(
            checked_difference("gain", Decimal::MIN, Decimal::MAX),
            Err(Error::AmountOverflow("gain"))
        );
    }
}
