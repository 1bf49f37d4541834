//! 奖励档位解析
//!
//! 根据积分余额在积分计划的档位中选出"最接近"的档位：
//! 门槛不超过余额的档位里，门槛最高的那个。

use serde::Serialize;

use crate::gateway::RewardTier;

/// 已命中的奖励档位
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTier {
    pub reward_tier_id: String,
    pub name: Option<String>,
    /// 档位积分门槛
    pub points: i64,
    /// 折扣百分比（0-100）
    pub discount_percentage: f64,
}

/// 档位解析结果
///
/// "没有档位满足条件"是合法结果而不是错误，调用方必须显式处理两种分支。
#[derive(Debug, Clone, PartialEq)]
pub enum TierResolution {
    Qualified(ResolvedTier),
    NoneQualifying,
}

impl TierResolution {
    pub fn is_qualified(&self) -> bool {
        matches!(self, Self::Qualified(_))
    }

    /// 档位 ID，未命中时为空字符串
    pub fn reward_tier_id(&self) -> &str {
        match self {
            Self::Qualified(tier) => &tier.reward_tier_id,
            Self::NoneQualifying => "",
        }
    }

    /// 折扣百分比，未命中时为 0
    pub fn discount_percentage(&self) -> f64 {
        match self {
            Self::Qualified(tier) => tier.discount_percentage,
            Self::NoneQualifying => 0.0,
        }
    }

    pub fn as_tier(&self) -> Option<&ResolvedTier> {
        match self {
            Self::Qualified(tier) => Some(tier),
            Self::NoneQualifying => None,
        }
    }
}

/// 选出余额可达的最高档位
///
/// - 门槛等于余额的档位视为可达
/// - 门槛相同的多个档位取先出现的那个
/// - 没有 ID 或门槛的档位无法兑换，直接跳过
pub fn resolve_closest_tier<'a, I>(tiers: I, balance: i64) -> TierResolution
where
    I: IntoIterator<Item = &'a RewardTier>,
{
    let mut closest: Option<(&'a RewardTier, &'a str, i64)> = None;

    for tier in tiers {
        let (Some(id), Some(points)) = (tier.id.as_deref(), tier.points) else {
            continue;
        };
        if points > balance {
            continue;
        }
        if closest.is_none_or(|(_, _, best)| points > best) {
            closest = Some((tier, id, points));
        }
    }

    match closest {
        Some((tier, id, points)) => TierResolution::Qualified(ResolvedTier {
            reward_tier_id: id.to_string(),
            name: tier.name.clone(),
            points,
            discount_percentage: parse_discount(tier.percentage_discount()),
        }),
        None => TierResolution::NoneQualifying,
    }
}

/// 解析文本形式的折扣百分比
///
/// 缺失、无法解析或超出 0-100 的值按 0 处理，档位数据异常不能让余额查询失败。
pub fn parse_discount(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && (0.0..=100.0).contains(v))
        .unwrap_or(0.0)
}
