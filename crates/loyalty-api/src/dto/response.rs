//! 响应 DTO 定义

use loyalty_core::{RewardTierStatus, TierResolution};
use serde::Serialize;

/// 注册响应
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub token: String,
    /// 平台积分账户 ID
    pub customer_id: String,
}

/// 登录响应
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub customer_id: String,
    /// Token 过期时间（Unix 秒）
    pub expires_at: i64,
}

/// 余额响应
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: i64,
}

/// 档位信息，未命中任何档位时 ID 为空、折扣为 0
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardTierDto {
    pub reward_tier_id: String,
    pub discount_percentage: f64,
}

impl From<&TierResolution> for RewardTierDto {
    fn from(resolution: &TierResolution) -> Self {
        Self {
            reward_tier_id: resolution.reward_tier_id().to_string(),
            discount_percentage: resolution.discount_percentage(),
        }
    }
}

/// 余额与档位响应（累积、兑换、档位查询共用）
#[derive(Debug, Serialize)]
pub struct PointsStatusResponse {
    pub balance: i64,
    pub rewardtier: RewardTierDto,
}

impl From<RewardTierStatus> for PointsStatusResponse {
    fn from(status: RewardTierStatus) -> Self {
        Self {
            balance: status.balance,
            rewardtier: RewardTierDto::from(&status.tier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loyalty_core::ResolvedTier;
    use serde_json::json;

    #[test]
    fn test_none_qualifying_projection() {
        let response = PointsStatusResponse::from(RewardTierStatus {
            balance: 40,
            tier: TierResolution::NoneQualifying,
        });

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "balance": 40,
                "rewardtier": { "reward_tier_id": "", "discount_percentage": 0.0 }
            })
        );
    }

    #[test]
    fn test_qualified_projection() {
        let response = PointsStatusResponse::from(RewardTierStatus {
            balance: 120,
            tier: TierResolution::Qualified(ResolvedTier {
                reward_tier_id: "silver".to_string(),
                name: Some("10% off".to_string()),
                points: 100,
                discount_percentage: 10.0,
            }),
        });

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["rewardtier"]["reward_tier_id"], "silver");
        assert_eq!(value["rewardtier"]["discount_percentage"], 10.0);
    }
}
