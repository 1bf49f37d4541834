//! 积分处理器
//!
//! 积分账户 ID 取自认证中间件注入的 Claims，客户端无法指定他人账户。

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use axum_extra::extract::WithRejection;
use loyalty_core::{EarnPointsCommand, HistoryPage, RedeemPointsCommand};
use validator::Validate;

use crate::auth::Claims;
use crate::dto::{
    BalanceResponse, EarnRequest, HistoryQuery, PointsStatusResponse, RedeemRequest,
};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 消费累积积分，返回最新余额与档位
///
/// POST /api/earn
pub async fn earn_points(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<EarnRequest>, ApiError>,
) -> Result<Json<PointsStatusResponse>> {
    req.validate()?;

    state
        .loyalty
        .earn_points(EarnPointsCommand::new(
            claims.customer_id.clone(),
            req.amount,
            req.description,
        ))
        .await?;

    let status = state.loyalty.get_reward_tiers(&claims.customer_id).await?;
    Ok(Json(status.into()))
}

/// 兑换档位折扣，返回最新余额与档位
///
/// POST /api/redeem
pub async fn redeem_points(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<RedeemRequest>, ApiError>,
) -> Result<Json<PointsStatusResponse>> {
    req.validate()?;

    state
        .loyalty
        .redeem_points(RedeemPointsCommand::new(
            claims.customer_id.clone(),
            req.reward_tier_id,
            req.amount,
            req.description,
        ))
        .await?;

    let status = state.loyalty.get_reward_tiers(&claims.customer_id).await?;
    Ok(Json(status.into()))
}

/// 查询积分余额
///
/// GET /api/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<BalanceResponse>> {
    let balance = state.loyalty.get_balance(&claims.customer_id).await?;
    Ok(Json(BalanceResponse { balance }))
}

/// 分页查询积分历史
///
/// GET /api/history?cursor=
pub async fn get_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryPage>> {
    let page = state
        .loyalty
        .get_history(&claims.customer_id, query.cursor.as_deref())
        .await?;
    Ok(Json(page))
}

/// 查询余额及当前可用的最高档位
///
/// GET /api/rewardtiers
pub async fn get_reward_tiers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<PointsStatusResponse>> {
    let status = state.loyalty.get_reward_tiers(&claims.customer_id).await?;
    Ok(Json(status.into()))
}
