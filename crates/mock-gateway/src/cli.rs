//! 命令行参数

use clap::Parser;

/// 积分/支付平台模拟服务
///
/// 提供积分服务依赖的 v2 REST 接口，数据全部保存在内存中。
#[derive(Parser, Debug)]
#[command(name = "mock-gateway")]
#[command(version, about = "积分平台模拟服务")]
pub struct Cli {
    /// 服务端口
    #[arg(short, long, default_value = "8090")]
    pub port: u16,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// 新开通账户的初始积分
    #[arg(long, default_value = "0")]
    pub seed_balance: i64,

    /// 积分计划所属门店
    #[arg(long, default_value = "LOC-MOCK")]
    pub location_id: String,
}
