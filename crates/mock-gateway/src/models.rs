//! 模拟平台的 v2 协议模型
//!
//! 只覆盖积分服务实际调用到的字段，请求中多余字段一律忽略。

use serde::{Deserialize, Serialize};

/// 金额（最小货币单位）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

// ============================================================================
// 订单与支付
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub name: String,
    pub quantity: String,
    pub base_price_money: Money,
}

impl OrderLineItem {
    /// 行项目金额，数量无法解析时按 1 计
    pub fn gross(&self) -> i64 {
        let quantity = self.quantity.trim().parse::<i64>().unwrap_or(1).max(0);
        self.base_price_money.amount * quantity
    }
}

/// 订单上已挂载的奖励
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReward {
    pub id: String,
    pub reward_tier_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub location_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub line_items: Vec<OrderLineItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rewards: Vec<OrderReward>,
    pub total_money: Money,
    pub total_discount_money: Money,
    pub state: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub location_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub line_items: Vec<OrderLineItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub idempotency_key: String,
    pub order: NewOrder,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub source_id: String,
    pub idempotency_key: String,
    pub amount_money: Money,
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub status: String,
    pub amount_money: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub source_type: String,
    pub created_at: String,
}

// ============================================================================
// 积分账户
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyAccountMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub id: String,
    pub program_id: String,
    pub balance: i64,
    pub lifetime_points: i64,
    pub mapping: LoyaltyAccountMapping,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLoyaltyAccount {
    pub program_id: String,
    pub mapping: LoyaltyAccountMapping,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLoyaltyAccountRequest {
    pub loyalty_account: NewLoyaltyAccount,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccumulatePoints {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub loyalty_program_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccumulatePointsRequest {
    pub accumulate_points: AccumulatePoints,
    pub location_id: String,
    pub idempotency_key: String,
}

// ============================================================================
// 积分事件
// ============================================================================

pub const EVENT_ACCUMULATE_POINTS: &str = "ACCUMULATE_POINTS";
pub const EVENT_CREATE_REWARD: &str = "CREATE_REWARD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAccumulatePoints {
    pub loyalty_program_id: String,
    pub points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCreateReward {
    pub loyalty_program_id: String,
    pub reward_id: String,
    /// 扣减的积分，以负数表示
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub created_at: String,
    pub loyalty_account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulate_points: Option<EventAccumulatePoints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_reward: Option<EventCreateReward>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoyaltyAccountFilter {
    pub loyalty_account_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoyaltyEventFilter {
    #[serde(default)]
    pub loyalty_account_filter: Option<LoyaltyAccountFilter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoyaltyEventQuery {
    #[serde(default)]
    pub filter: Option<LoyaltyEventFilter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchEventsRequest {
    #[serde(default)]
    pub query: Option<LoyaltyEventQuery>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl SearchEventsRequest {
    pub fn account_id(&self) -> Option<&str> {
        self.query
            .as_ref()
            .and_then(|q| q.filter.as_ref())
            .and_then(|f| f.loyalty_account_filter.as_ref())
            .map(|f| f.loyalty_account_id.as_str())
    }
}

// ============================================================================
// 积分计划与奖励
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTierDefinition {
    pub scope: String,
    pub discount_type: String,
    pub percentage_discount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTier {
    pub id: String,
    pub points: i64,
    pub name: String,
    pub definition: RewardTierDefinition,
}

impl RewardTier {
    /// 整单百分比折扣档位
    pub fn percentage_off(id: &str, points: i64, percentage: &str) -> Self {
        Self {
            id: id.to_string(),
            points,
            name: format!("{percentage}% off entire sale"),
            definition: RewardTierDefinition {
                scope: "ORDER".to_string(),
                discount_type: "FIXED_PERCENTAGE".to_string(),
                percentage_discount: percentage.to_string(),
            },
        }
    }

    /// 按档位折扣计算减免金额（四舍五入到最小货币单位）
    pub fn discount_for(&self, amount: i64) -> i64 {
        let percentage = self
            .definition
            .percentage_discount
            .trim()
            .parse::<f64>()
            .unwrap_or(0.0)
            .clamp(0.0, 100.0);
        (amount as f64 * percentage / 100.0).round() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyProgram {
    pub id: String,
    pub status: String,
    pub location_ids: Vec<String>,
    pub reward_tiers: Vec<RewardTier>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLoyaltyReward {
    pub loyalty_account_id: String,
    pub reward_tier_id: String,
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRewardRequest {
    pub reward: NewLoyaltyReward,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyReward {
    pub id: String,
    pub status: String,
    pub loyalty_account_id: String,
    pub reward_tier_id: String,
    pub points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub created_at: String,
}

// ============================================================================
// 响应包装
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order: Order,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub payment: Payment,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoyaltyAccountResponse {
    pub loyalty_account: LoyaltyAccount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccumulatePointsResponse {
    pub events: Vec<LoyaltyEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchEventsResponse {
    pub events: Vec<LoyaltyEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoyaltyProgramResponse {
    pub program: LoyaltyProgram,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoyaltyRewardResponse {
    pub reward: LoyaltyReward,
}
