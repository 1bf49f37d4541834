//! 数据库仓储层
//!
//! 定义 trait 接口以支持 mock 测试，PostgreSQL 实现基于 SQLx。

mod customer_repo;
mod traits;

pub use customer_repo::PgCustomerRepository;
pub use traits::*;
