//! 请求 DTO 定义
//!
//! 字段名与既有客户端约定保持一致（snake_case，兑换档位字段为 `rewardtier`）。

use serde::Deserialize;
use validator::{Validate, ValidationError};

/// 注册请求
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "姓名长度必须在 1-100 之间"))]
    pub name: String,
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    #[validate(length(min = 5, max = 20, message = "手机号长度必须在 5-20 之间"))]
    pub phone: String,
    #[validate(length(min = 8, max = 100, message = "密码长度必须在 8-100 之间"))]
    pub password: String,
}

/// 登录请求，邮箱与手机号二选一
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_login_identity"))]
pub struct LoginRequest {
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 100, message = "密码长度必须在 1-100 之间"))]
    pub password: String,
}

fn validate_login_identity(req: &LoginRequest) -> Result<(), ValidationError> {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    if present(&req.email) || present(&req.phone) {
        Ok(())
    } else {
        Err(ValidationError::new("identity").with_message("邮箱或手机号必须填写一项".into()))
    }
}

/// 积分累积请求
#[derive(Debug, Deserialize, Validate)]
pub struct EarnRequest {
    /// 消费金额（最小货币单位）
    #[validate(range(min = 1, message = "金额必须大于 0"))]
    pub amount: i64,
    #[validate(length(min = 1, max = 255, message = "描述长度必须在 1-255 之间"))]
    pub description: String,
}

/// 积分兑换请求
#[derive(Debug, Deserialize, Validate)]
pub struct RedeemRequest {
    #[validate(range(min = 1, message = "金额必须大于 0"))]
    pub amount: i64,
    #[validate(length(min = 1, max = 255, message = "描述长度必须在 1-255 之间"))]
    pub description: String,
    #[serde(rename = "rewardtier")]
    #[validate(length(min = 1, message = "奖励档位不能为空"))]
    pub reward_tier_id: String,
}

/// 积分历史查询参数
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub cursor: Option<String>,
}
