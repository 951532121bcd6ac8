//! Order route handlers.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use atelier_core::{OrderId, OrderStatus};

use crate::error::AppError;
use crate::middleware::auth::{CurrentUser, RequireAdmin};
use crate::models::Order;
use crate::services::orders::{CartLine, OrderService, ShippingInfo};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub lines: Vec<CartLine>,
    pub shipping: ShippingInfo,
    #[serde(default)]
    pub notes: Option<String>,
    /// Intent created before the order in the payment-first flow.
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Place an order from the caller's cart.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = OrderService::new(state.pool())
        .create_order(
            &user,
            &req.lines,
            req.shipping,
            req.notes,
            req.payment_intent_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// Caller's order history, newest first.
pub async fn list_mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderService::new(state.pool()).list_for_user(&user).await?;
    Ok(Json(orders))
}

/// Every order, newest first (admin).
pub async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderService::new(state.pool()).list_all().await?;
    Ok(Json(orders))
}

/// One order, for its owner or an admin.
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, AppError> {
    let order = OrderService::new(state.pool()).get_for_user(&user, id).await?;
    Ok(Json(order))
}

/// Set an order's lifecycle status (admin).
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let status = OrderStatus::from_str(&req.status).map_err(|_| {
        let valid: Vec<String> = OrderStatus::ALL.iter().map(ToString::to_string).collect();
        AppError::InvalidStatus(format!(
            "{} is not one of: {}",
            req.status,
            valid.join(", ")
        ))
    })?;

    let order = OrderService::new(state.pool()).update_status(id, status).await?;

    tracing::info!(order_id = %id, %status, admin_id = %admin.id, "order status updated");
    Ok(Json(order))
}
