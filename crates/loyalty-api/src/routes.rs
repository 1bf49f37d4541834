//! 路由配置模块

use axum::{
    Router, middleware,
    routing::{get, post},
};
use loyalty_shared::observability::middleware as obs_middleware;

use crate::{handlers, middleware::auth_middleware, state::AppState};

/// 公开路由（无需认证）
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
}

/// 积分路由（需要 Bearer Token）
pub fn loyalty_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/earn", post(handlers::loyalty::earn_points))
        .route("/redeem", post(handlers::loyalty::redeem_points))
        .route("/balance", get(handlers::loyalty::get_balance))
        .route("/history", get(handlers::loyalty::get_history))
        .route("/rewardtiers", get(handlers::loyalty::get_reward_tiers))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// 构建 /api 下的完整应用路由，附带请求 ID 与 HTTP 追踪中间件
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            auth_routes().merge(loyalty_routes(state.clone())),
        )
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
