//! HTTP 层错误类型定义
//!
//! 所有错误响应统一为 `{"error": "...", "code": "..."}`。

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use loyalty_core::LoyaltyError;
use serde_json::json;

/// 服务内部错误的对外提示
const INTERNAL_MESSAGE: &str = "服务内部错误，请稍后重试";

/// HTTP 层错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 认证错误
    #[error("未授权: {0}")]
    Unauthorized(String),
    #[error("账号或密码错误")]
    InvalidCredentials,

    // 验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    // 业务冲突
    #[error("该邮箱或手机号已注册")]
    CustomerExists,

    // 积分用例错误
    #[error(transparent)]
    Loyalty(#[from] LoyaltyError),

    // 系统错误
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Validation(_) | Self::Loyalty(LoyaltyError::Validation(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::CustomerExists => StatusCode::CONFLICT,
            Self::Loyalty(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::CustomerExists => "CUSTOMER_EXISTS",
            Self::Loyalty(e) => e.code(),
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                INTERNAL_MESSAGE.to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                INTERNAL_MESSAGE.to_string()
            }
            Self::Loyalty(e @ LoyaltyError::Configuration(_)) => {
                tracing::error!(error = %e, "积分服务配置错误");
                INTERNAL_MESSAGE.to_string()
            }
            Self::Loyalty(e) => {
                if let Some(step) = e.failed_step() {
                    tracing::warn!(step = step.as_str(), error = %e, "平台调用失败");
                }
                e.to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "error": message,
            "code": self.error_code(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 请求体无法解析时按参数错误处理
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// HTTP 层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;
