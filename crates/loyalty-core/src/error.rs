//! 积分核心错误类型定义
//!
//! 平台调用失败统一包装为 `LoyaltyError::Gateway`，并携带失败的步骤，
//! 便于在请求边界定位是下单、支付还是累积积分出了问题。

use std::fmt;

use thiserror::Error;

/// 平台调用错误
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("网络错误: {0}")]
    Network(String),

    #[error("请求超时")]
    Timeout,

    #[error("平台返回 HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("平台响应解析失败: {0}")]
    Decode(String),

    #[error("平台响应缺少字段: {0}")]
    MissingField(&'static str),
}

impl GatewayError {
    /// 用于指标标签的简短分类
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Timeout => "timeout",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
            Self::MissingField(_) => "missing_field",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// 平台调用结果类型别名
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// 用例中的平台调用步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStep {
    FetchProgram,
    CreateAccount,
    GetAccount,
    CreateOrder,
    GetOrder,
    CreatePayment,
    CreateReward,
    AccumulatePoints,
    SearchEvents,
}

impl GatewayStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchProgram => "fetch_program",
            Self::CreateAccount => "create_account",
            Self::GetAccount => "get_account",
            Self::CreateOrder => "create_order",
            Self::GetOrder => "get_order",
            Self::CreatePayment => "create_payment",
            Self::CreateReward => "create_reward",
            Self::AccumulatePoints => "accumulate_points",
            Self::SearchEvents => "search_events",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::FetchProgram => "获取积分计划",
            Self::CreateAccount => "创建积分账户",
            Self::GetAccount => "查询积分账户",
            Self::CreateOrder => "创建订单",
            Self::GetOrder => "查询订单",
            Self::CreatePayment => "创建支付",
            Self::CreateReward => "创建奖励",
            Self::AccumulatePoints => "累积积分",
            Self::SearchEvents => "查询积分历史",
        }
    }
}

impl fmt::Display for GatewayStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 积分用例错误类型
#[derive(Debug, Error)]
pub enum LoyaltyError {
    // 验证错误，发生在任何平台调用之前
    #[error("参数验证失败: {0}")]
    Validation(String),

    // 平台错误
    #[error("{step}失败: {source}")]
    Gateway {
        step: GatewayStep,
        #[source]
        source: GatewayError,
    },

    #[error("支付未完成，状态: {status}")]
    PaymentNotCompleted { status: String },

    #[error("未找到积分余额信息")]
    BalanceUnavailable,

    #[error("未找到有效的积分计划")]
    ProgramUnavailable,

    #[error("订单缺少应付金额")]
    MissingOrderTotal,

    #[error("配置错误: {0}")]
    Configuration(String),
}

impl LoyaltyError {
    /// 构造平台调用错误的闭包，配合 `map_err` 使用
    pub fn at(step: GatewayStep) -> impl FnOnce(GatewayError) -> Self {
        move |source| Self::Gateway { step, source }
    }

    /// 返回错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Gateway { .. } => "GATEWAY_ERROR",
            Self::PaymentNotCompleted { .. } => "PAYMENT_NOT_COMPLETED",
            Self::BalanceUnavailable => "BALANCE_UNAVAILABLE",
            Self::ProgramUnavailable => "PROGRAM_UNAVAILABLE",
            Self::MissingOrderTotal => "MISSING_ORDER_TOTAL",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// 失败的平台步骤（非平台错误返回 None）
    pub fn failed_step(&self) -> Option<GatewayStep> {
        match self {
            Self::Gateway { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// 积分用例 Result 类型别名
pub type Result<T> = std::result::Result<T, LoyaltyError>;
