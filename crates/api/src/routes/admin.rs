//! Administrative order endpoints: listing, status transitions and deletion.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::OrderStatus;
use invoice::InvoiceStorage;
use serde::Serialize;
use store::Store;

use super::orders::OrderResponse;
use crate::AppState;
use crate::error::ApiError;
use crate::extract::parse_id;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// GET /api/admin/orders: every order, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    let orders = state.orders.all_orders().await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// PUT /api/admin/orders/{id}/placed
pub async fn placed<S, F>(
    state: State<Arc<AppState<S, F>>>,
    id: Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    transition(state, id, OrderStatus::Placed).await
}

/// PUT /api/admin/orders/{id}/confirmed
pub async fn confirmed<S, F>(
    state: State<Arc<AppState<S, F>>>,
    id: Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    transition(state, id, OrderStatus::Confirmed).await
}

/// PUT /api/admin/orders/{id}/ship
pub async fn ship<S, F>(
    state: State<Arc<AppState<S, F>>>,
    id: Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    transition(state, id, OrderStatus::Shipped).await
}

/// PUT /api/admin/orders/{id}/deliver
pub async fn deliver<S, F>(
    state: State<Arc<AppState<S, F>>>,
    id: Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    transition(state, id, OrderStatus::Delivered).await
}

/// PUT /api/admin/orders/{id}/cancel
pub async fn cancel<S, F>(
    state: State<Arc<AppState<S, F>>>,
    id: Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    transition(state, id, OrderStatus::Cancelled).await
}

#[tracing::instrument(skip(state))]
async fn transition<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
    Path(id): Path<String>,
    target: OrderStatus,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    let order_id: OrderId = parse_id(&id)?;
    state.orders.transition(order_id, target).await?;

    // Re-load and return
    let details = state.orders.find_order(order_id).await?;
    Ok(Json(details.into()))
}

/// DELETE /api/admin/orders/{id}: remove an order and its items.
#[tracing::instrument(skip(state))]
pub async fn delete<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<DeleteResponse>), ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    let order_id: OrderId = parse_id(&id)?;
    state.orders.delete(order_id).await?;
    Ok((
        StatusCode::OK,
        Json(DeleteResponse {
            message: format!("Order {order_id} deleted"),
        }),
    ))
}
