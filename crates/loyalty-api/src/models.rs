//! 本地持久化模型

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// 会员记录
///
/// 积分余额等业务状态保存在平台侧，本地只保存身份信息和平台积分账户 ID。
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub loyalty_account_id: String,
    pub created_at: DateTime<Utc>,
}

/// 待写入的会员记录
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub loyalty_account_id: String,
}
