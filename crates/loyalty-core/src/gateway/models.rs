//! 平台 API 数据模型
//!
//! 字段命名与平台 v2 JSON 协议保持一致（snake_case）。
//! 平台返回的可空字段一律用 `Option` 承接，缺失时由调用方决定是报错还是取默认值。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 金额（最小货币单位，如美分）
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

// ============================================
// 订单
// ============================================

/// 订单行项目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub name: String,
    pub quantity: String,
    pub base_price_money: Money,
}

/// 待创建的订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub location_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub line_items: Vec<OrderLineItem>,
}

/// 创建订单请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub idempotency_key: String,
    pub order: NewOrder,
}

impl CreateOrderRequest {
    /// 构造单行项目订单
    pub fn single_item(
        idempotency_key: &str,
        location_id: &str,
        name: &str,
        amount: i64,
        currency: &str,
    ) -> Self {
        Self {
            idempotency_key: idempotency_key.to_string(),
            order: NewOrder {
                location_id: location_id.to_string(),
                customer_id: None,
                line_items: vec![OrderLineItem {
                    name: name.to_string(),
                    quantity: "1".to_string(),
                    base_price_money: Money::new(amount, currency),
                }],
            },
        }
    }
}

/// 平台订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub total_money: Option<Money>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub order: Option<Order>,
}

// ============================================
// 支付
// ============================================

/// 支付成功状态
pub const PAYMENT_COMPLETED: &str = "COMPLETED";

/// 创建支付请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub source_id: String,
    pub idempotency_key: String,
    pub amount_money: Money,
    pub order_id: String,
}

/// 平台支付记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount_money: Option<Money>,
    #[serde(default)]
    pub order_id: Option<String>,
}

impl Payment {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some(PAYMENT_COMPLETED)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    #[serde(default)]
    pub payment: Option<Payment>,
}

// ============================================
// 积分账户
// ============================================

/// 账户映射（平台以手机号识别会员）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyAccountMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// 平台积分账户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub id: String,
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub balance: Option<i64>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub mapping: Option<LoyaltyAccountMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLoyaltyAccount {
    pub program_id: String,
    pub mapping: LoyaltyAccountMapping,
}

/// 创建积分账户请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLoyaltyAccountRequest {
    pub loyalty_account: NewLoyaltyAccount,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyAccountResponse {
    #[serde(default)]
    pub loyalty_account: Option<LoyaltyAccount>,
}

// ============================================
// 积分累积
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulatePoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loyalty_program_id: Option<String>,
}

/// 累积积分请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulatePointsRequest {
    pub accumulate_points: AccumulatePoints,
    pub location_id: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccumulatePointsResponse {
    #[serde(default)]
    pub events: Vec<Option<LoyaltyEvent>>,
}

// ============================================
// 积分事件
// ============================================

/// 累积类事件明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyEventAccumulatePoints {
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub loyalty_program_id: Option<String>,
}

/// 兑换类事件明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyEventRedeemReward {
    #[serde(default)]
    pub reward_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// 平台原始积分事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// 缺失或类型不对时为空串，由历史记录归一化原样输出
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(default)]
    pub loyalty_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulate_points: Option<LoyaltyEventAccumulatePoints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeem_reward: Option<LoyaltyEventRedeemReward>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyAccountFilter {
    pub loyalty_account_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyEventFilter {
    pub loyalty_account_filter: LoyaltyAccountFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyEventQuery {
    pub filter: LoyaltyEventFilter,
}

/// 积分事件检索请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEventsRequest {
    pub query: LoyaltyEventQuery,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl SearchEventsRequest {
    /// 按账户过滤的事件检索，空游标视为首页
    pub fn for_account(account_id: &str, limit: u32, cursor: Option<&str>) -> Self {
        Self {
            query: LoyaltyEventQuery {
                filter: LoyaltyEventFilter {
                    loyalty_account_filter: LoyaltyAccountFilter {
                        loyalty_account_id: account_id.to_string(),
                    },
                },
            },
            limit,
            cursor: cursor
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from),
        }
    }
}

/// 积分事件检索响应
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchEventsResponse {
    #[serde(default)]
    pub events: Vec<Option<LoyaltyEvent>>,
    #[serde(default)]
    pub cursor: Option<String>,
}

// ============================================
// 积分计划
// ============================================

/// 奖励档位定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTierDefinition {
    /// 折扣百分比的文本表示，如 "10" 或 "12.5"；数字也接受
    #[serde(default, deserialize_with = "lenient_decimal_text")]
    pub percentage_discount: Option<String>,
}

/// 奖励档位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTier {
    #[serde(default)]
    pub id: Option<String>,
    /// 门槛缺失或不是整数的档位不参与解析
    #[serde(default, deserialize_with = "lenient_integer")]
    pub points: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub definition: Option<RewardTierDefinition>,
}

impl RewardTier {
    pub fn percentage_discount(&self) -> Option<&str> {
        self.definition
            .as_ref()
            .and_then(|d| d.percentage_discount.as_deref())
    }
}

/// 积分计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyProgram {
    pub id: String,
    #[serde(default)]
    pub reward_tiers: Vec<Option<RewardTier>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyProgramResponse {
    #[serde(default)]
    pub program: Option<LoyaltyProgram>,
}

// ============================================
// 奖励兑换
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLoyaltyReward {
    pub loyalty_account_id: String,
    pub reward_tier_id: String,
    pub order_id: String,
}

/// 创建奖励请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRewardRequest {
    pub reward: NewLoyaltyReward,
    pub idempotency_key: String,
}

/// 平台奖励记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyReward {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub reward_tier_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyRewardResponse {
    #[serde(default)]
    pub reward: Option<LoyaltyReward>,
}

// ============================================
// 错误响应
// ============================================

/// 平台错误明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformError {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformErrorResponse {
    #[serde(default)]
    pub errors: Vec<PlatformError>,
}

impl PlatformErrorResponse {
    /// 拼接错误摘要，优先使用 detail，其次 code
    pub fn summary(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .errors
            .iter()
            .filter_map(|e| e.detail.as_deref().or(e.code.as_deref()))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

// ============================================
// 宽松解码
// ============================================
//
// 平台偶尔返回类型不符的字段，单个字段异常只影响该字段本身，不能让整个响应解码失败。

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        _ => String::new(),
    })
}

fn lenient_decimal_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
