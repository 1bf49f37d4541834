//! 应用状态定义

use std::sync::Arc;

use loyalty_core::LoyaltyService;

use crate::auth::JwtManager;
use crate::service::AuthService;

/// Axum 应用共享状态
///
/// 平台客户端和数据库连接池都在启动时构造一次，通过 Arc 在 handler 间共享
#[derive(Clone)]
pub struct AppState {
    pub loyalty: Arc<LoyaltyService>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(loyalty: Arc<LoyaltyService>, auth: Arc<AuthService>) -> Self {
        Self { loyalty, auth }
    }

    pub fn jwt_manager(&self) -> &JwtManager {
        self.auth.jwt()
    }
}
