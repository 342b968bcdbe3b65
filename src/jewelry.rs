//! Jewelry and precious metal holdings.

use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    db::{CreateTable, MapRow, Record},
    money::{Currency, get_decimal, require_positive, to_sql_text},
    text::required,
    user::UserId,
};

/// A piece of jewelry owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jewelry {
    /// The ID of the piece.
    pub id: DatabaseId,
    /// The user who owns the piece.
    pub user_id: UserId,
    /// What the piece is, e.g. "necklace".
    pub item: String,
    /// The metal, e.g. "22k gold".
    pub metal: String,
    /// The weight of the piece in grams.
    pub weight_grams: Decimal,
    /// What was paid for the piece.
    pub purchase_price: Decimal,
    /// The currency of `purchase_price`.
    pub currency: Currency,
    /// When the piece was bought.
    pub purchased_on: Date,
    /// The short name of the user, empty if the user could not be found.
    pub user_short_name: String,
}

/// The data for creating or updating a piece of jewelry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JewelryForm {
    /// The user who owns the piece.
    pub user_id: UserId,
    /// What the piece is.
    pub item: String,
    /// The metal.
    #[serde(default)]
    pub metal: String,
    /// The weight in grams, must be greater than zero.
    pub weight_grams: Decimal,
    /// What was paid for the piece.
    pub purchase_price: Decimal,
    /// A three letter currency code.
    pub currency: String,
    /// When the piece was bought.
    pub purchased_on: Date,
}

impl CreateTable for Jewelry {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS jewelry (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                item TEXT NOT NULL,
                metal TEXT NOT NULL,
                weight_grams TEXT NOT NULL,
                purchase_price TEXT NOT NULL,
                currency TEXT NOT NULL,
                purchased_on TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Jewelry {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            user_id: row.get(offset + 1)?,
            item: row.get(offset + 2)?,
            metal: row.get(offset + 3)?,
            weight_grams: get_decimal(row, offset + 4)?,
            purchase_price: get_decimal(row, offset + 5)?,
            currency: row.get(offset + 6)?,
            purchased_on: row.get(offset + 7)?,
            user_short_name: row.get(offset + 8)?,
        })
    }
}

impl Record for Jewelry {
    const KIND: &'static str = "jewelry";
    const TABLE: &'static str = "jewelry";
    const SELECT: &'static str = "SELECT jewelry.id, jewelry.user_id, jewelry.item, \
        jewelry.metal, jewelry.weight_grams, jewelry.purchase_price, jewelry.currency, \
        jewelry.purchased_on, COALESCE(user.short_name, '') \
        FROM jewelry LEFT JOIN user ON user.id = jewelry.user_id";

    type Form = JewelryForm;

    fn insert(form: JewelryForm, connection: &Connection) -> Result<DatabaseId, Error> {
        let item = required("item", &form.item)?;
        let weight_grams = require_positive("weight_grams", form.weight_grams)?;
        let currency = Currency::new(&form.currency)?;

        connection.execute(
            "INSERT INTO jewelry (user_id, item, metal, weight_grams, purchase_price, currency, purchased_on)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.user_id,
                item,
                form.metal.trim(),
                to_sql_text(weight_grams),
                to_sql_text(form.purchase_price),
                currency,
                form.purchased_on
            ],
        )?;

        Ok(connection.last_insert_rowid())
    }

    fn update(id: DatabaseId, form: JewelryForm, connection: &Connection) -> Result<usize, Error> {
        let item = required("item", &form.item)?;
        let weight_grams = require_positive("weight_grams", form.weight_grams)?;
        let currency = Currency::new(&form.currency)?;

        connection
            .execute(
                "UPDATE jewelry
                SET \
                    user_id = ?1, \
                    item = ?2, \
                    metal = ?3, \
                    weight_grams = ?4, \
                    purchase_price = ?5, \
                    currency = ?6, \
                    purchased_on = ?7 \
                WHERE id = ?8",
                params![
                    form.user_id,
                    item,
                    form.metal.trim(),
                    to_sql_text(weight_grams),
                    to_sql_text(form.purchase_price),
                    currency,
                    form.purchased_on,
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
        jewelry::{Jewelry, JewelryForm},
        test_utils::{must_create_test_connection, must_create_user},
        user::UserId,
    };

    fn jewelry_form(user_id: UserId) -> JewelryForm {
        JewelryForm {
            user_id,
            item: "Bangle".to_owned(),
            metal: "22k gold ".to_owned(),
            weight_grams: dec!(11.664),
            purchase_price: dec!(65000),
            currency: "INR".to_owned(),
            purchased_on: date!(2019 - 10 - 25),
        }
    }

    #[test]
    fn create_keeps_fractional_weight() {
        let connection = must_create_test_connection();
        let user = must_create_user("Nani", &connection);

        let jewelry: Jewelry = create(jewelry_form(user.id), &connection).unwrap();

        assert_eq!(jewelry.weight_grams, dec!(11.664));
        assert_eq!(jewelry.metal, "22k gold");
        assert_eq!(jewelry.user_short_name, "Nani");
    }

    #[test]
    fn create_fails_on_zero_weight() {
        let connection = must_create_test_connection();
        let user = must_create_user("Nani", &connection);
        let form = JewelryForm {
            weight_grams: dec!(0),
            ..jewelry_form(user.id)
        };

        let result = create::<Jewelry>(form, &connection);

        assert_eq!(result, Err(Error::NonPositiveAmount("weight_grams")));
    }
}
