//! Route handlers shared by every record type: list, get, create, update and delete.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    AppState, Error,
    app_state::DbState,
    database_id::DatabaseId,
    db::{self, Record},
};

/// Build the routes for record type `R`.
///
/// `collection` is the path for listing and creating records, e.g. "/api/addresses",
/// and `item` the path of a single record, e.g. "/api/addresses/{address_id}".
pub fn record_routes<R>(collection: &str, item: &str) -> Router<AppState>
where
    R: Record + Serialize + Send + 'static,
    R::Form: DeserializeOwned + Send + 'static,
{
    Router::new()
        .route(
            collection,
            get(list_endpoint::<R>).post(create_endpoint::<R>),
        )
        .route(
            item,
            get(get_endpoint::<R>)
                .put(update_endpoint::<R>)
                .delete(delete_endpoint::<R>),
        )
}

/// A route handler that responds with every record of type `R`.
pub async fn list_endpoint<R>(State(state): State<DbState>) -> Result<Json<Vec<R>>, Error>
where
    R: Record + Serialize,
{
    let connection = state.lock()?;

    db::select_all(&connection).map(Json)
}

/// A route handler that responds with the record of type `R` with the ID in the path.
pub async fn get_endpoint<R>(
    State(state): State<DbState>,
    Path(id): Path<DatabaseId>,
) -> Result<Json<R>, Error>
where
    R: Record + Serialize,
{
    let connection = state.lock()?;

    db::select_by_id(id, &connection).map(Json)
}

/// A route handler for creating a record of type `R`, responds with the new record.
pub async fn create_endpoint<R>(
    State(state): State<DbState>,
    Json(form): Json<R::Form>,
) -> Result<(StatusCode, Json<R>), Error>
where
    R: Record + Serialize,
{
    let connection = state.lock()?;

    let record = db::create::<R>(form, &connection).inspect_err(|error| {
        tracing::debug!("Could not create {}: {error}", R::KIND);
    })?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// A route handler for overwriting the record of type `R` with the ID in the path.
pub async fn update_endpoint<R>(
    State(state): State<DbState>,
    Path(id): Path<DatabaseId>,
    Json(form): Json<R::Form>,
) -> Result<Json<R>, Error>
where
    R: Record + Serialize,
{
    let connection = state.lock()?;

    db::update(id, form, &connection)
        .inspect_err(|error| tracing::debug!("Could not update {} {id}: {error}", R::KIND))
        .map(Json)
}

/// A route handler for deleting the record of type `R` with the ID in the path.
pub async fn delete_endpoint<R>(
    State(state): State<DbState>,
    Path(id): Path<DatabaseId>,
) -> Result<StatusCode, Error>
where
    R: Record,
{
    let connection = state.lock()?;

    db::delete::<R>(id, &connection)
        .inspect_err(|error| tracing::debug!("Could not delete {} {id}: {error}", R::KIND))?;

    Ok(StatusCode::NO_CONTENT)
}
