//! 用例命令与结果
//!
//! 命令在进入用例时先做本地校验，校验失败不会触发任何平台调用。

use serde::Serialize;

use crate::error::{LoyaltyError, Result};
use crate::tier::TierResolution;

/// 积分累积命令
#[derive(Debug, Clone, PartialEq)]
pub struct EarnPointsCommand {
    pub account_id: String,
    /// 消费金额（最小货币单位）
    pub amount: i64,
    pub description: String,
}

impl EarnPointsCommand {
    pub fn new(
        account_id: impl Into<String>,
        amount: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            amount,
            description: description.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_account(&self.account_id)?;
        require_amount(self.amount)?;
        require_description(&self.description)
    }
}

/// 积分兑换命令
#[derive(Debug, Clone, PartialEq)]
pub struct RedeemPointsCommand {
    pub account_id: String,
    pub reward_tier_id: String,
    /// 折扣前金额（最小货币单位）
    pub amount: i64,
    pub description: String,
}

impl RedeemPointsCommand {
    pub fn new(
        account_id: impl Into<String>,
        reward_tier_id: impl Into<String>,
        amount: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            reward_tier_id: reward_tier_id.into(),
            amount,
            description: description.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_account(&self.account_id)?;
        if self.reward_tier_id.trim().is_empty() {
            return Err(LoyaltyError::Validation("奖励档位不能为空".to_string()));
        }
        require_amount(self.amount)?;
        require_description(&self.description)
    }
}

fn require_account(account_id: &str) -> Result<()> {
    if account_id.trim().is_empty() {
        return Err(LoyaltyError::Validation("积分账户不能为空".to_string()));
    }
    Ok(())
}

fn require_amount(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(LoyaltyError::Validation("金额必须大于 0".to_string()));
    }
    Ok(())
}

fn require_description(description: &str) -> Result<()> {
    if description.trim().is_empty() {
        return Err(LoyaltyError::Validation("描述不能为空".to_string()));
    }
    Ok(())
}

/// 积分累积结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointsReceipt {
    pub order_id: String,
    pub payment_id: String,
    /// 本次累积的积分（平台事件中的积分之和）
    pub points_earned: i64,
}

/// 积分兑换结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedemptionReceipt {
    pub order_id: String,
    pub reward_id: String,
    pub payment_id: String,
    /// 折后实付金额
    pub amount_charged: i64,
    pub points_earned: i64,
}

/// 余额与当前可用档位
#[derive(Debug, Clone, PartialEq)]
pub struct RewardTierStatus {
    pub balance: i64,
    pub tier: TierResolution,
}
