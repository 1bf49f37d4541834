//! 注册与登录处理器

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;

use crate::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 会员注册
///
/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let session = state.auth.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            token: session.token.token,
            customer_id: session.customer.loyalty_account_id,
        }),
    ))
}

/// 会员登录
///
/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<Json<LoginResponse>> {
    let session = state.auth.login(req).await?;

    Ok(Json(LoginResponse {
        token: session.token.token,
        customer_id: session.customer.loyalty_account_id,
        expires_at: session.token.expires_at,
    }))
}
