//! Application router configuration for the JSON API and the optional frontend bundle.

use axum::{
    Json, Router,
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower_http::services::ServeDir;

use crate::{
    AppState,
    address::Address,
    balance::{Balance, get_balance_totals_endpoint},
    crud::{self, record_routes},
    earning::Earning,
    endpoints,
    investment::Investment,
    jewelry::Jewelry,
    person_transaction::{
        PersonTransaction, list_person_transactions_endpoint, summary_endpoint,
    },
    retirement::{Retirement401k, SsnRecord},
    user::User,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let person_transaction_routes = Router::new()
        .route(
            endpoints::PERSON_TRANSACTIONS,
            get(list_person_transactions_endpoint)
                .post(crud::create_endpoint::<PersonTransaction>),
        )
        .route(
            endpoints::PERSON_TRANSACTION_SUMMARY,
            get(summary_endpoint),
        )
        .route(
            endpoints::PERSON_TRANSACTION,
            get(crud::get_endpoint::<PersonTransaction>)
                .put(crud::update_endpoint::<PersonTransaction>)
                .delete(crud::delete_endpoint::<PersonTransaction>),
        );

    let router = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::BALANCE_TOTALS, get(get_balance_totals_endpoint))
        .merge(record_routes::<User>(endpoints::USERS, endpoints::USER))
        .merge(record_routes::<Address>(
            endpoints::ADDRESSES,
            endpoints::ADDRESS,
        ))
        .merge(record_routes::<Balance>(
            endpoints::BALANCES,
            endpoints::BALANCE,
        ))
        .merge(record_routes::<Investment>(
            endpoints::INVESTMENTS,
            endpoints::INVESTMENT,
        ))
        .merge(record_routes::<Earning>(
            endpoints::EARNINGS,
            endpoints::EARNING,
        ))
        .merge(record_routes::<Jewelry>(
            endpoints::JEWELRY,
            endpoints::JEWELRY_ITEM,
        ))
        .merge(record_routes::<Retirement401k>(
            endpoints::RETIREMENT_401K,
            endpoints::RETIREMENT_401K_ITEM,
        ))
        .merge(record_routes::<SsnRecord>(
            endpoints::RETIREMENT_SSN,
            endpoints::RETIREMENT_SSN_ITEM,
        ))
        .merge(person_transaction_routes);

    let router = match &state.static_dir {
        Some(static_dir) => router.fallback_service(
            ServeDir::new(static_dir).not_found_service(get_404_not_found.into_service()),
        ),
        None => router.fallback(get_404_not_found),
    };

    router.with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (
        StatusCode::IM_A_TEAPOT,
        Json(json!({ "error": "I'm a teapot" })),
    )
        .into_response()
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested route does not exist" })),
    )
        .into_response()
}
