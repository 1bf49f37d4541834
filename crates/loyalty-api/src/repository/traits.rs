//! 仓储 Trait 定义

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Customer, NewCustomer};

/// 会员仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>>;
    /// 邮箱或手机号任一已被占用即返回 true
    async fn exists(&self, email: &str, phone: &str) -> Result<bool>;
    /// 写入会员，唯一约束冲突返回 `ApiError::CustomerExists`
    async fn insert(&self, customer: NewCustomer) -> Result<Customer>;
}
