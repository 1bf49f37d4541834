//! 会员库连接
//!
//! 本地只存会员身份（customers 表），积分数据全部在平台侧。
//! 启动时建池并执行内嵌迁移，就绪探针直接探测 customers 表。

use std::time::Duration;

use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument};

use crate::config::DatabaseConfig;
use crate::error::{Result, SharedError};

/// 会员库连接池
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

/// 连接池占用情况，供就绪探针输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
}

impl Database {
    /// 建池并应用迁移，服务启动只需调用这一步
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let db = Self::connect(config).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    #[instrument(skip(config), fields(target = %redact_url(&config.url)))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await?;

        info!(
            max_connections = config.max_connections,
            "会员库连接池已建立"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 探测 customers 表是否可查询
    ///
    /// 连接正常但迁移未执行时同样判为不可用。
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1 FROM customers LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map(|_| ())
            .map_err(SharedError::from)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("会员库连接池已关闭");
    }

    /// 应用 migrations/ 下的迁移（编译期打包）
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("会员库迁移已应用");
        Ok(())
    }
}

/// 去掉连接串中的密码，日志里只保留用户、主机和库名
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, location)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{location}"),
        None => url.to_string(),
    }
}
