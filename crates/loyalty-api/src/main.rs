//! 积分 REST API 服务
//!
//! 会员注册登录，积分累积、兑换与查询。积分业务状态全部委托给外部积分/支付平台。

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use loyalty_api::{
    auth::{JwtConfig, JwtManager},
    repository::PgCustomerRepository,
    routes,
    service::AuthService,
    state::AppState,
};
use loyalty_core::{LoyaltyService, LoyaltyServiceConfig, SquareGateway};
use loyalty_shared::{config::AppConfig, database::Database, observability};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

const SERVICE_NAME: &str = "loyalty-api";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(SERVICE_NAME)?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    // 平台凭据缺失时拒绝启动
    config.validate()?;
    if config.auth.jwt_secret == loyalty_shared::config::DEV_JWT_SECRET {
        warn!("Using default JWT secret - set JWT_SECRET for production");
    }

    info!("Starting {} on {}", SERVICE_NAME, config.server_addr());

    let db = Database::open(&config.database).await?;

    // 平台客户端进程内只构造一次
    let gateway = Arc::new(SquareGateway::new(&config.gateway)?);
    let loyalty = Arc::new(LoyaltyService::new(
        gateway,
        LoyaltyServiceConfig::from(&config.gateway),
    ));
    info!(base_url = %config.gateway.base_url, "Loyalty gateway initialized");

    let customers = Arc::new(PgCustomerRepository::new(db.pool().clone()));
    let jwt = JwtManager::new(JwtConfig::from(&config.auth));
    let auth = Arc::new(AuthService::new(customers, loyalty.clone(), jwt));

    let state = AppState::new(loyalty, auth);

    let app = Router::new()
        .merge(routes::app(state))
        .route("/health", get(health_check))
        .route(
            "/ready",
            get({
                let db_for_ready = db.clone();
                move || readiness_check(db_for_ready.clone())
            }),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer(&config.server.cors_origins, config.is_production()))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_seconds,
        )));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 根据配置构造 CORS 层，"*" 表示允许全部来源
fn cors_layer(allowed_origins: &str, is_production: bool) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        if is_production {
            warn!("cors_origins=\"*\" 在生产环境中不安全，请设置为具体域名");
        }
        info!("CORS allowed_origins: * (all origins)");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        info!("CORS allowed_origins: {}", allowed_origins);
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// 为所有响应注入 HTTP 安全头
async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "strict-transport-security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert("x-xss-protection", HeaderValue::from_static("0"));
    response
}

/// 监听关闭信号（SIGTERM 或 Ctrl+C）
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("注册 Ctrl+C 处理器失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("注册 SIGTERM 处理器失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 存活探针
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME
    }))
}

/// 就绪探针：检查会员库
async fn readiness_check(db: Database) -> (StatusCode, Json<serde_json::Value>) {
    let db_ok = db.health_check().await.is_ok();
    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if db_ok { "ok" } else { "degraded" },
            "service": SERVICE_NAME,
            "checks": {
                "database": if db_ok { "ok" } else { "fail" }
            },
            "pool": db.stats()
        })),
    )
}
