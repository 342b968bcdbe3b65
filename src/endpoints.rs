//! The API endpoints URIs.
//!
//! Paths with a parameter, e.g., '/api/users/{user_id}', use axum's path parameter syntax.

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route to access users.
pub const USERS: &str = "/api/users";
/// The route to access a single user.
pub const USER: &str = "/api/users/{user_id}";
/// The route to access addresses.
pub const ADDRESSES: &str = "/api/addresses";
/// The route to access a single address.
pub const ADDRESS: &str = "/api/addresses/{address_id}";
/// The route to access balances.
pub const BALANCES: &str = "/api/balances";
/// The route to access a single balance.
pub const BALANCE: &str = "/api/balances/{balance_id}";
/// The route to get the balance totals per currency.
pub const BALANCE_TOTALS: &str = "/api/balances/totals";
/// The route to access investments.
pub const INVESTMENTS: &str = "/api/investments";
/// The route to access a single investment.
pub const INVESTMENT: &str = "/api/investments/{investment_id}";
/// The route to access earnings.
pub const EARNINGS: &str = "/api/earnings";
/// The route to access a single earning.
pub const EARNING: &str = "/api/earnings/{earning_id}";
/// The route to access jewelry.
pub const JEWELRY: &str = "/api/jewelry";
/// The route to access a single piece of jewelry.
pub const JEWELRY_ITEM: &str = "/api/jewelry/{jewelry_id}";
/// The route to access person-to-person transactions.
pub const PERSON_TRANSACTIONS: &str = "/api/person_transactions";
/// The route to access a single person-to-person transaction.
pub const PERSON_TRANSACTION: &str = "/api/person_transactions/{transaction_id}";
/// The route to get the net amounts owed between people.
pub const PERSON_TRANSACTION_SUMMARY: &str = "/api/person_transactions/summary";
/// The route to access 401k records.
pub const RETIREMENT_401K: &str = "/api/retirement/401k";
/// The route to access a single 401k record.
pub const RETIREMENT_401K_ITEM: &str = "/api/retirement/401k/{record_id}";
/// The route to access Social Security records.
pub const RETIREMENT_SSN: &str = "/api/retirement/ssn";
/// The route to access a single Social Security record.
pub const RETIREMENT_SSN_ITEM: &str = "/api/retirement/ssn/{record_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
