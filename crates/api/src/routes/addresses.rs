//! Address book endpoints for the purchaser.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::AddressId;
use domain::{Address, NewAddress};
use invoice::InvoiceStorage;
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{Purchaser, parse_id};

/// POST /api/addresses
#[tracing::instrument(skip(state, fields))]
pub async fn create<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
    Purchaser(user_id): Purchaser,
    Json(fields): Json<NewAddress>,
) -> Result<(StatusCode, Json<Address>), ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    let address = state.addresses.create(user_id, fields).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// GET /api/addresses/user
#[tracing::instrument(skip(state))]
pub async fn list<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
    Purchaser(user_id): Purchaser,
) -> Result<Json<Vec<Address>>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    Ok(Json(state.addresses.list(user_id).await?))
}

/// GET /api/addresses/default
#[tracing::instrument(skip(state))]
pub async fn default<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
    Purchaser(user_id): Purchaser,
) -> Result<Json<Address>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    Ok(Json(state.addresses.default_address(user_id).await?))
}

/// PUT /api/addresses/{id}/default
#[tracing::instrument(skip(state))]
pub async fn set_default<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
    Purchaser(user_id): Purchaser,
    Path(id): Path<String>,
) -> Result<Json<Address>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    let address_id: AddressId = parse_id(&id)?;
    Ok(Json(state.addresses.set_default(user_id, address_id).await?))
}

/// DELETE /api/addresses/{id}: returns the deleted address.
#[tracing::instrument(skip(state))]
pub async fn delete<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
    Purchaser(user_id): Purchaser,
    Path(id): Path<String>,
) -> Result<Json<Address>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    let address_id: AddressId = parse_id(&id)?;
    Ok(Json(state.addresses.delete(user_id, address_id).await?))
}
