//! 积分平台模拟服务入口

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mock_gateway::cli::Cli;
use mock_gateway::{MockPlatform, PlatformConfig, routes};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 优先使用环境变量 RUST_LOG，否则使用命令行参数指定的级别
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .init();

    let platform = Arc::new(MockPlatform::new(PlatformConfig {
        seed_balance: cli.seed_balance,
        location_id: cli.location_id.clone(),
    }));
    let app = routes::app(platform).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = TcpListener::bind(addr).await.context("绑定端口失败")?;

    info!("Mock 平台已启动: http://{}", addr);
    info!(seed_balance = cli.seed_balance, location_id = %cli.location_id, "积分计划 main 已就绪");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务器运行失败")?;

    info!("Mock 平台已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("注册 Ctrl+C 处理器失败: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到关闭信号，正在停止服务...");
}
