use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::envelope::{self, ApiError};
use super::store::MemoryStore;

pub const SERVICE_NAME: &str = "product-service";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub stock: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct ProductState {
    store: MemoryStore<Product>,
    // 分类是静态目录数据，不走存储
    categories: Arc<Vec<Category>>,
    started_at: Instant,
}

impl ProductState {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            categories: Arc::new(Vec::new()),
            started_at: Instant::now(),
        }
    }

    /// 带演示数据的状态
    pub fn seeded() -> Self {
        let store = MemoryStore::new();
        let seed_products = [
            (
                "1",
                "Laptop Pro",
                "High-performance laptop for professionals",
                1299.99,
                "electronics",
                50,
                "2024-01-15T10:00:00Z",
            ),
            (
                "2",
                "Wireless Headphones",
                "Premium noise-cancelling headphones",
                299.99,
                "electronics",
                100,
                "2024-01-16T11:30:00Z",
            ),
            (
                "3",
                "Python Programming Book",
                "Complete guide to Python programming",
                49.99,
                "books",
                25,
                "2024-01-17T09:15:00Z",
            ),
            (
                "4",
                "Cotton T-Shirt",
                "Comfortable 100% cotton t-shirt",
                19.99,
                "clothing",
                200,
                "2024-01-18T14:20:00Z",
            ),
            (
                "5",
                "Smart Watch",
                "Feature-rich smartwatch with health tracking",
                399.99,
                "electronics",
                75,
                "2024-01-19T16:45:00Z",
            ),
        ];
        for (id, name, description, price, category, stock, created_at) in seed_products {
            let product = Product {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                price,
                category: category.to_string(),
                stock,
                created_at: created_at.to_string(),
            };
            store
                .insert(id, product, &[])
                .expect("seed products are unique");
        }

        let categories = vec![
            Category {
                id: "electronics".to_string(),
                name: "Electronics".to_string(),
                description: "Electronic devices and gadgets".to_string(),
            },
            Category {
                id: "books".to_string(),
                name: "Books".to_string(),
                description: "Books and educational materials".to_string(),
            },
            Category {
                id: "clothing".to_string(),
                name: "Clothing".to_string(),
                description: "Apparel and fashion items".to_string(),
            },
        ];

        Self {
            store,
            categories: Arc::new(categories),
            started_at: Instant::now(),
        }
    }
}

impl Default for ProductState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn router(state: ProductState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/products/:id/stock", get(check_stock))
        .route("/products/:id/reserve", post(reserve_stock))
        .route("/categories", get(list_categories))
        .fallback(envelope::endpoint_not_found)
        .with_state(state)
}

async fn health(State(state): State<ProductState>) -> Json<Value> {
    envelope::health_payload(SERVICE_NAME, state.started_at)
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
}

async fn list_products(
    State(state): State<ProductState>,
    Query(query): Query<ProductQuery>,
) -> Json<Value> {
    tracing::info!(category = ?query.category, "GET /products - Fetching products");

    let mut products = state.store.list();
    if let Some(category) = &query.category {
        products.retain(|p| p.category.eq_ignore_ascii_case(category));
    }

    Json(json!({
        "success": true,
        "data": products,
        "count": products.len(),
        "category": query.category,
    }))
}

async fn get_product(
    State(state): State<ProductState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    tracing::info!(product_id = %id, "GET /products/:id - Fetching product by ID");
    let product = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;
    Ok(Json(json!({
        "success": true,
        "data": product,
    })))
}

async fn list_categories(State(state): State<ProductState>) -> Json<Value> {
    tracing::info!("GET /categories - Fetching all categories");
    Json(json!({
        "success": true,
        "data": &*state.categories,
        "count": state.categories.len(),
    }))
}

async fn check_stock(
    State(state): State<ProductState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    tracing::info!(product_id = %id, "GET /products/:id/stock - Checking stock");
    let product = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "productId": id,
            "stock": product.stock,
            "available": product.stock > 0,
        },
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReserveRequest {
    pub quantity: Option<u32>,
}

/// 预留库存（订单流程的配套接口，演示实现）
async fn reserve_stock(
    State(state): State<ProductState>,
    Path(id): Path<String>,
    body: Option<Json<ReserveRequest>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let quantity = body.and_then(|b| b.quantity).unwrap_or(1);
    tracing::info!(product_id = %id, quantity = %quantity, "POST /products/:id/reserve - Reserving stock");

    // 校验和扣减在同一临界区内完成，并发预留不会把库存扣成负数
    let updated = state
        .store
        .try_update(&id, |p| {
            if p.stock < quantity {
                return Err(p.stock);
            }
            p.stock -= quantity;
            Ok(())
        })
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let updated = match updated {
        Ok(product) => product,
        Err(available) => {
            // 库存不足的响应带 available/requested 附加字段，不走统一错误信封
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "message": "Insufficient stock",
                    "available": available,
                    "requested": quantity,
                })),
            ));
        }
    };

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Stock reserved successfully",
            "data": {
                "productId": id,
                "reserved": quantity,
                "remainingStock": updated.stock,
            },
        })),
    ))
}
