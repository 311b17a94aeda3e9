use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use super::envelope::{self, ApiError};
use super::store::MemoryStore;

pub const SERVICE_NAME: &str = "user-service";

/// 用户实体，对外 JSON 字段保持 camelCase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct UserState {
    store: MemoryStore<User>,
    started_at: Instant,
}

impl UserState {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            started_at: Instant::now(),
        }
    }

    /// 带演示数据的状态
    pub fn seeded() -> Self {
        let state = Self::new();
        let seed_users = [
            ("1", "john_doe", "john@example.com", "John", "Doe"),
            ("2", "jane_smith", "jane@example.com", "Jane", "Smith"),
        ];
        for (id, username, email, first_name, last_name) in seed_users {
            let user = User {
                id: id.to_string(),
                username: username.to_string(),
                email: email.to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                created_at: Utc::now().to_rfc3339(),
            };
            state
                .store
                .insert(id, user, &[username.to_string(), email.to_string()])
                .expect("seed users are unique");
        }
        state
    }
}

impl Default for UserState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn router(state: UserState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/register", post(register))
        .route("/auth/login", post(login))
        .fallback(envelope::endpoint_not_found)
        .with_state(state)
}

async fn health(State(state): State<UserState>) -> Json<Value> {
    envelope::health_payload(SERVICE_NAME, state.started_at)
}

async fn list_users(State(state): State<UserState>) -> Json<Value> {
    tracing::info!("GET /users - Fetching all users");
    let users = state.store.list();
    Json(json!({
        "success": true,
        "data": users,
        "count": users.len(),
    }))
}

async fn get_user(
    State(state): State<UserState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    tracing::info!(user_id = %id, "GET /users/:id - Fetching user by ID");
    let user = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(json!({
        "success": true,
        "data": user,
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

async fn register(
    State(state): State<UserState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    // 基础校验，空字符串与缺失同等对待
    let (Some(username), Some(email), Some(first_name), Some(last_name)) = (
        required(body.username),
        required(body.email),
        required(body.first_name),
        required(body.last_name),
    ) else {
        return Err(ApiError::Validation(
            "All fields are required: username, email, firstName, lastName".to_string(),
        ));
    };

    tracing::info!(username = %username, email = %email, "POST /register - Registering new user");

    // 用户名/邮箱唯一性检查
    if state.store.exists_by_key(&username) || state.store.exists_by_key(&email) {
        return Err(ApiError::Conflict(
            "User with this username or email already exists".to_string(),
        ));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.clone(),
        email: email.clone(),
        first_name,
        last_name,
        created_at: Utc::now().to_rfc3339(),
    };

    state
        .store
        .insert(&user.id, user.clone(), &[username, email])
        .map_err(|_| {
            ApiError::Conflict("User with this username or email already exists".to_string())
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "data": user,
        })),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// 演示用登录，颁发占位 token 而非真实 JWT
async fn login(
    State(state): State<UserState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let username = required(body.username);
    let email = required(body.email);

    if username.is_none() && email.is_none() {
        return Err(ApiError::Validation(
            "Username or email is required".to_string(),
        ));
    }

    tracing::info!(username = ?username, email = ?email, "POST /auth/login - User login attempt");

    let user = state
        .store
        .list()
        .into_iter()
        .find(|u| {
            username.as_deref() == Some(u.username.as_str())
                || email.as_deref() == Some(u.email.as_str())
        })
        .ok_or_else(|| ApiError::Auth("Invalid credentials".to_string()))?;

    let token = format!("mock-jwt-token-{}", user.id);
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "data": {
            "user": user,
            "token": token,
        },
    })))
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
