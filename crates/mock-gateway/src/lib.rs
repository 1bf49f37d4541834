//! 积分/支付平台模拟服务
//!
//! 内存实现积分服务调用的平台接口，用于本地开发和端到端测试。
//!
//! # 使用示例
//!
//! ```rust
//! use std::sync::Arc;
//! use mock_gateway::{MockPlatform, PlatformConfig, routes};
//!
//! let platform = Arc::new(MockPlatform::new(PlatformConfig {
//!     seed_balance: 100,
//!     ..PlatformConfig::default()
//! }));
//! let app = routes::app(platform);
//! ```

pub mod cli;
pub mod error;
pub mod models;
pub mod platform;
pub mod routes;
pub mod store;

pub use platform::{MockPlatform, PlatformConfig};
