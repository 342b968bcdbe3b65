//! Route handlers for listing and summarizing person transactions.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    Error,
    app_state::DbState,
    person_transaction::{
        model::{PairFilter, PersonTransaction, get_person_transactions, get_transfers},
        summary::{NetSummaryView, summarize},
    },
    user::get_short_names,
};

/// A route handler that responds with the person transactions matching the query filter.
pub async fn list_person_transactions_endpoint(
    State(state): State<DbState>,
    Query(filter): Query<PairFilter>,
) -> Result<Json<Vec<PersonTransaction>>, Error> {
    let connection = state.lock()?;

    get_person_transactions(&filter, &connection).map(Json)
}

/// A route handler that responds with the net amount owed between each pair
/// of people per currency, for the transfers matching the query filter.
pub async fn summary_endpoint(
    State(state): State<DbState>,
    Query(filter): Query<PairFilter>,
) -> Result<Json<Vec<NetSummaryView>>, Error> {
    let (transfers, short_names) = {
        let connection = state.lock()?;
        (
            get_transfers(&filter, &connection)?,
            get_short_names(&connection)?,
        )
    };

    tracing::debug!(
        "Summarizing {} transfers for {filter:?}",
        transfers.len()
    );

    let summaries = summarize(&transfers)?
        .into_iter()
        .map(|summary| summary.with_short_names(&short_names))
        .collect();

    Ok(Json(summaries))
}
