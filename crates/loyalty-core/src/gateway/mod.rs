//! 积分/支付平台网关
//!
//! 平台能力通过 [`LoyaltyGateway`] trait 抽象，服务层只依赖 trait，
//! 生产环境注入基于 HTTP 的 [`SquareGateway`]，测试时注入 mock。

pub mod models;
mod square;

use async_trait::async_trait;

use crate::error::GatewayResult;
pub use models::*;
pub use square::SquareGateway;

/// 平台网关接口
///
/// 所有写操作都携带调用方生成的幂等键，平台保证同一幂等键至多生效一次。
/// 读操作在平台明确返回"不存在"时返回 `Ok(None)`，由服务层决定如何处理。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoyaltyGateway: Send + Sync {
    /// 创建订单
    async fn create_order(&self, request: CreateOrderRequest) -> GatewayResult<Order>;

    /// 查询订单（兑换奖励后获取折后总额）
    async fn get_order(&self, order_id: &str) -> GatewayResult<Order>;

    /// 创建支付
    async fn create_payment(&self, request: CreatePaymentRequest) -> GatewayResult<Payment>;

    /// 查询积分账户
    async fn get_account(&self, account_id: &str) -> GatewayResult<Option<LoyaltyAccount>>;

    /// 创建积分账户
    async fn create_account(
        &self,
        request: CreateLoyaltyAccountRequest,
    ) -> GatewayResult<LoyaltyAccount>;

    /// 检索积分事件（游标分页）
    async fn search_events(&self, request: SearchEventsRequest)
    -> GatewayResult<SearchEventsResponse>;

    /// 查询积分计划
    async fn get_program(&self, program_key: &str) -> GatewayResult<Option<LoyaltyProgram>>;

    /// 按订单累积积分
    async fn accumulate_points(
        &self,
        account_id: &str,
        request: AccumulatePointsRequest,
    ) -> GatewayResult<Vec<LoyaltyEvent>>;

    /// 创建奖励（将档位折扣挂到订单上并扣减积分）
    async fn create_reward(&self, request: CreateRewardRequest) -> GatewayResult<LoyaltyReward>;
}
