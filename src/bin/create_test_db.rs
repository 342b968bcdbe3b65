use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal_macros::dec;
use time::macros::date;

use personal_ledger::{
    Address, AddressForm, Balance, BalanceForm, Earning, EarningForm, Investment,
    InvestmentForm, Jewelry, JewelryForm, PersonTransaction, PersonTransactionForm,
    Retirement401k, Retirement401kForm, SsnRecord, SsnRecordForm, TransferStatus, User,
    UserForm, create_record, initialize_db,
};

/// A utility for creating a test database for the REST API server of personal_ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test users...");
    let raj = create_user("Raj", "Raj", "Kumar", &conn)?;
    let mom = create_user("Mom", "Lakshmi", "Kumar", &conn)?;
    let dad = create_user("Dad", "Suresh", "Kumar", &conn)?;

    println!("Creating test records...");
    create_record::<Address>(
        AddressForm {
            user_id: raj.id,
            street: "12 Elm Street".to_owned(),
            city: "Springfield".to_owned(),
            state: "IL".to_owned(),
            postal_code: "62704".to_owned(),
            country: "USA".to_owned(),
            is_primary: true,
        },
        &conn,
    )?;

    for (user_id, institution, amount, currency) in [
        (raj.id, "Chase", dec!(5230.18), "USD"),
        (mom.id, "SBI", dec!(184000), "INR"),
        (dad.id, "HDFC", dec!(92500.50), "INR"),
    ] {
        create_record::<Balance>(
            BalanceForm {
                user_id,
                institution: institution.to_owned(),
                account_name: "Savings".to_owned(),
                amount,
                currency: currency.to_owned(),
                as_of: date!(2025 - 06 - 30),
            },
            &conn,
        )?;
    }

    create_record::<Investment>(
        InvestmentForm {
            user_id: raj.id,
            name: "Total Market Index".to_owned(),
            kind: "mutual fund".to_owned(),
            invested_amount: dec!(10000),
            current_value: dec!(12450.75),
            currency: "USD".to_owned(),
            start_date: date!(2021 - 01 - 15),
        },
        &conn,
    )?;

    create_record::<Earning>(
        EarningForm {
            user_id: raj.id,
            source: "Salary".to_owned(),
            amount: dec!(6200),
            currency: "USD".to_owned(),
            received_on: date!(2025 - 06 - 01),
            notes: Some("June pay".to_owned()),
        },
        &conn,
    )?;

    create_record::<Jewelry>(
        JewelryForm {
            user_id: mom.id,
            item: "Necklace".to_owned(),
            metal: "gold".to_owned(),
            weight_grams: dec!(24.5),
            purchase_price: dec!(120000),
            currency: "INR".to_owned(),
            purchased_on: date!(2019 - 11 - 02),
        },
        &conn,
    )?;

    create_record::<Retirement401k>(
        Retirement401kForm {
            user_id: raj.id,
            employer: "Initech".to_owned(),
            year: 2024,
            employee_contribution: dec!(23000),
            employer_match: dec!(6900),
            currency: "USD".to_owned(),
        },
        &conn,
    )?;

    create_record::<SsnRecord>(
        SsnRecordForm {
            user_id: raj.id,
            ssn: "123-45-6789".to_owned(),
            year: 2024,
            taxed_earnings: dec!(74400),
            estimated_monthly_benefit: dec!(2150),
            currency: "USD".to_owned(),
        },
        &conn,
    )?;

    println!("Creating test person transactions...");
    for (source_id, destination_id, amount, purpose, status) in [
        (raj.id, mom.id, dec!(500), "Rent share", TransferStatus::Completed),
        (mom.id, raj.id, dec!(120), "Groceries", TransferStatus::Completed),
        (raj.id, dad.id, dec!(75), "Phone bill", TransferStatus::Pending),
        (dad.id, raj.id, dec!(75), "Phone bill refund", TransferStatus::Cancelled),
    ] {
        create_record::<PersonTransaction>(
            PersonTransactionForm {
                source_id,
                destination_id,
                currency: "USD".to_owned(),
                amount,
                purpose: purpose.to_owned(),
                schedule_date: date!(2025 - 05 - 20),
                status,
            },
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}

fn create_user(
    short_name: &str,
    first_name: &str,
    last_name: &str,
    conn: &Connection,
) -> Result<User, personal_ledger::Error> {
    create_record(
        UserForm {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            short_name: short_name.to_owned(),
            email: None,
            phone: None,
        },
        conn,
    )
}
