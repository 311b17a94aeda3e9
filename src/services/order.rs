use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use super::envelope::{self, ApiError};
use super::store::MemoryStore;

pub const SERVICE_NAME: &str = "order-service";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub price: f64,
    pub subtotal: f64,
}

#[derive(Debug, Clone)]
pub struct OrderState {
    store: MemoryStore<Order>,
    started_at: Instant,
}

impl OrderState {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            started_at: Instant::now(),
        }
    }
}

impl Default for OrderState {
    fn default() -> Self {
        Self::new()
    }
}

/// 订单服务的全部路由都挂在 /orders 前缀下，健康检查也不例外
pub fn router(state: OrderState) -> Router {
    Router::new()
        .route("/orders/health", get(health))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", put(update_order_status))
        .route("/orders/user/:user_id", get(get_orders_by_user))
        .fallback(envelope::endpoint_not_found)
        .with_state(state)
}

async fn health(State(state): State<OrderState>) -> Json<Value> {
    envelope::health_payload(SERVICE_NAME, state.started_at)
}

async fn list_orders(State(state): State<OrderState>) -> Json<Value> {
    tracing::info!("GET /orders - Fetching all orders");
    let orders = state.store.list();
    Json(json!({
        "success": true,
        "data": orders,
        "count": orders.len(),
    }))
}

async fn get_order(
    State(state): State<OrderState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    tracing::info!(order_id = %id, "GET /orders/:id - Fetching order by ID");
    let order = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;
    Ok(Json(json!({
        "success": true,
        "data": order,
    })))
}

async fn get_orders_by_user(
    State(state): State<OrderState>,
    Path(user_id): Path<String>,
) -> Json<Value> {
    tracing::info!(user_id = %user_id, "GET /orders/user/:userId - Fetching orders for user");
    let orders: Vec<Order> = state
        .store
        .list()
        .into_iter()
        .filter(|o| o.user_id == user_id)
        .collect();
    Json(json!({
        "success": true,
        "data": orders,
        "count": orders.len(),
        "userId": user_id,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOrderRequest {
    pub user_id: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub product_name: String,
}

/// 创建订单
///
/// 不做跨服务校验：userId/productId 是否存在由调用方负责，
/// 各服务之间没有事务边界，未知 id 的订单照样创建成功。
async fn create_order(
    State(state): State<OrderState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user_id = body
        .user_id
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("User ID is required".to_string()))?;

    if body.items.is_empty() {
        return Err(ApiError::Validation("Items are required".to_string()));
    }

    tracing::info!(user_id = %user_id, items = body.items.len(), "POST /orders - Creating new order");

    let items: Vec<OrderItem> = body
        .items
        .into_iter()
        .map(|item| OrderItem {
            subtotal: item.price * item.quantity as f64,
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            price: item.price,
        })
        .collect();
    let total_amount: f64 = items.iter().map(|item| item.subtotal).sum();

    let now = Utc::now().to_rfc3339();
    let order = Order {
        id: Uuid::new_v4().to_string(),
        user_id,
        items,
        total_amount,
        status: "CONFIRMED".to_string(),
        created_at: now.clone(),
        updated_at: now,
    };

    state
        .store
        .insert(&order.id, order.clone(), &[])
        .map_err(|_| ApiError::Internal)?;

    tracing::info!(order_id = %order.id, "Order created successfully");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Order created successfully",
            "data": order,
        })),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
}

async fn update_order_status(
    State(state): State<OrderState>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let status = body
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Status is required".to_string()))?;

    tracing::info!(order_id = %id, status = %status, "PUT /orders/:id/status - Updating status");

    let order = state
        .store
        .update(&id, |o| {
            o.status = status;
            o.updated_at = Utc::now().to_rfc3339();
        })
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Order status updated successfully",
        "data": order,
    })))
}
