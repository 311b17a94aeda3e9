use std::time::Instant;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

/// 服务端错误分类，统一渲染为 {success:false, message} 信封
///
/// 所有处理器通过 `Result<_, ApiError>` 返回，状态码映射只在这里做一次，
/// 取代原来每个路由里重复的 try/catch 样板。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 缺少必填字段 -> 400
    #[error("{0}")]
    Validation(String),
    /// 唯一键冲突 -> 409
    #[error("{0}")]
    Conflict(String),
    /// 未知 id 或路由 -> 404
    #[error("{0}")]
    NotFound(String),
    /// 凭证不匹配 -> 401
    #[error("{0}")]
    Auth(String),
    /// 未捕获的处理器错误 -> 500
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "success": false,
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// 未匹配路由的兜底处理器
pub async fn endpoint_not_found() -> ApiError {
    ApiError::NotFound("Endpoint not found".to_string())
}

/// 健康检查响应体
pub fn health_payload(service: &str, started_at: Instant) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": service,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": started_at.elapsed().as_secs(),
    }))
}
