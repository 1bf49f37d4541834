//! 积分核心库
//!
//! 对接积分/支付平台，提供积分累积、兑换、余额、历史与奖励档位查询。
//!
//! ## 模块结构
//!
//! - `gateway`: 平台 API 抽象与 HTTP 实现
//! - `tier`: 奖励档位解析（纯函数）
//! - `history`: 积分历史规范化（纯函数）
//! - `service`: 用例编排

pub mod error;
pub mod gateway;
pub mod history;
pub mod service;
pub mod tier;

pub use error::{GatewayError, GatewayStep, LoyaltyError, Result};
pub use gateway::{LoyaltyGateway, SquareGateway};
pub use history::{HistoryPage, Transaction};
pub use service::{
    EarnPointsCommand, LoyaltyService, LoyaltyServiceConfig, PointsReceipt, RedeemPointsCommand,
    RedemptionReceipt, RewardTierStatus,
};
pub use tier::{ResolvedTier, TierResolution, resolve_closest_tier};
