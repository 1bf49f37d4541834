//! 服务层
//!
//! 编排平台调用完成积分用例。
//!
//! ## 模块结构
//!
//! - `dto`: 用例命令与结果
//! - `loyalty_service`: 累积、兑换、余额、历史与档位查询

pub mod dto;
pub mod loyalty_service;

pub use dto::*;
pub use loyalty_service::{LoyaltyService, LoyaltyServiceConfig};
