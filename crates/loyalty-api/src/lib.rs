//! 积分 REST API 服务
//!
//! 会员注册登录、积分累积与兑换、余额/历史/档位查询。

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;
