//! HTTP 请求与响应 DTO

pub mod request;
pub mod response;

pub use request::{EarnRequest, HistoryQuery, LoginRequest, RedeemRequest, RegisterRequest};
pub use response::{
    BalanceResponse, LoginResponse, PointsStatusResponse, RegisterResponse, RewardTierDto,
};
