//! Purchaser order endpoints: checkout, history, lookup and invoice download.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use checkout::PlaceOrder;
use chrono::{DateTime, Utc};
use common::{AddressId, OrderId, OrderItemId, ProductId, UserId};
use domain::{
    Address, Money, OrderDetails, OrderLine, OrderStatus, PaymentDetails, ShippingAddress, User,
};
use invoice::InvoiceStorage;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{Purchaser, parse_id};

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    /// `{"id": ...}` for a saved address, inline fields for a new one, or
    /// omitted for the default address.
    pub shipping_address: Option<ShippingAddress>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub user: Option<PurchaserResponse>,
    pub status: OrderStatus,
    pub payment: PaymentDetails,
    /// Amounts are in paise.
    pub total_price: Money,
    pub total_discounted_price: Money,
    pub discount: Money,
    pub total_item: u32,
    pub order_date: DateTime<Utc>,
    pub delivery_date: DateTime<Utc>,
    pub shipping_address_id: AddressId,
    pub shipping_address: Option<Address>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct PurchaserResponse {
    pub name: String,
    pub email: Option<String>,
    pub mobile: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub title: String,
    pub size: Option<String>,
    pub quantity: u32,
    pub price: Money,
    pub discounted_price: Money,
    pub line_total: Money,
}

impl From<&User> for PurchaserResponse {
    fn from(user: &User) -> Self {
        Self {
            name: user.full_name(),
            email: user.email.clone(),
            mobile: user.mobile.clone(),
        }
    }
}

impl From<&OrderLine> for OrderItemResponse {
    fn from(line: &OrderLine) -> Self {
        Self {
            id: line.item.id,
            product_id: line.item.product_id,
            title: line.title().to_string(),
            size: line.item.size.clone(),
            quantity: line.item.quantity,
            price: line.item.price,
            discounted_price: line.item.discounted_price,
            line_total: line.item.line_total(),
        }
    }
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        let OrderDetails {
            order,
            user,
            lines,
            shipping_address,
        } = details;

        Self {
            id: order.id,
            order_number: order.order_number.to_string(),
            user_id: order.user_id,
            user: user.as_ref().map(PurchaserResponse::from),
            status: order.status,
            payment: order.payment,
            total_price: order.totals.total_price,
            total_discounted_price: order.totals.total_discounted_price,
            discount: order.totals.discount,
            total_item: order.totals.total_item,
            order_date: order.order_date,
            delivery_date: order.delivery_date,
            shipping_address_id: order.shipping_address_id,
            shipping_address,
            items: lines.iter().map(OrderItemResponse::from).collect(),
        }
    }
}

// -- Handlers --

/// POST /api/orders: check out the purchaser's cart.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
    Purchaser(user_id): Purchaser,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    let mut cmd = PlaceOrder::new(user_id);
    cmd.shipping_address = req.shipping_address;
    cmd.delivery_date = req.delivery_date;
    cmd.payment_method = req.payment_method;

    let order = state.checkout.place_order(cmd).await?;

    // Re-load with joined references
    let details = state.orders.find_order(order.id).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

/// GET /api/orders/user: the purchaser's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn history<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
    Purchaser(user_id): Purchaser,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    let orders = state.orders.order_history(user_id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /api/orders/{id}: one order with its purchaser, lines and address.
#[tracing::instrument(skip(state))]
pub async fn get<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
    Purchaser(_): Purchaser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    let order_id: OrderId = parse_id(&id)?;
    let details = state.orders.find_order(order_id).await?;
    Ok(Json(details.into()))
}

/// GET /api/orders/invoice/{order_number}: the stored invoice PDF.
#[tracing::instrument(skip(state))]
pub async fn invoice<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
    Purchaser(_): Purchaser,
    Path(order_number): Path<String>,
) -> Result<Response, ApiError>
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    let bytes = state
        .invoices
        .download(&order_number)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice not found for order {order_number}")))?;

    let disposition = format!("attachment; filename=\"invoice-{order_number}.pdf\"");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
