//! 基于 HTTP 的平台网关实现
//!
//! 对接 Square v2 兼容的 REST API。客户端在进程启动时构造一次，
//! 内部 `reqwest::Client` 自带连接池，clone 与跨任务共享都是廉价操作。

use std::time::Instant;

use async_trait::async_trait;
use loyalty_shared::config::GatewayConfig;
use loyalty_shared::observability::metrics::record_gateway_call;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::LoyaltyGateway;
use super::models::*;
use crate::error::{GatewayError, GatewayResult, LoyaltyError};

/// 平台 API 版本
const API_VERSION: &str = "2025-04-16";

/// 平台网关 HTTP 客户端
#[derive(Clone)]
pub struct SquareGateway {
    client: Client,
    base_url: Url,
}

impl SquareGateway {
    /// 根据配置创建客户端
    ///
    /// 访问令牌写入默认请求头；每次调用的超时由 `gateway.timeout_seconds` 控制。
    pub fn new(config: &GatewayConfig) -> crate::error::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.access_token.trim()))
            .map_err(|_| LoyaltyError::Configuration("访问令牌包含非法字符".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Square-Version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| LoyaltyError::Configuration(format!("创建 HTTP 客户端失败: {e}")))?;

        let base_url = Url::parse(config.base_url.trim())
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| {
                LoyaltyError::Configuration(format!("平台地址无效: {}", config.base_url))
            })?;

        Ok(Self { client, base_url })
    }

    /// 拼接接口地址，每个路径段单独转义
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// 发送请求并解析响应体
    ///
    /// 非 2xx 响应解析平台错误体作为错误信息；调用耗时与结果计入指标。
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> GatewayResult<T> {
        let start = Instant::now();
        let result = self.send_inner(builder).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        record_gateway_call(operation, outcome, start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            warn!(operation, error = %e, "Gateway call failed");
        }
        result
    }

    async fn send_inner<T: DeserializeOwned>(&self, builder: RequestBuilder) -> GatewayResult<T> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

/// 将非成功响应转换为错误
fn status_error(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<PlatformErrorResponse>(body)
        .ok()
        .and_then(|r| r.summary())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    GatewayError::Status {
        status: status.as_u16(),
        message,
    }
}

/// 读操作：平台返回 404 视为资源不存在
fn not_found_as_none<T>(result: GatewayResult<T>) -> GatewayResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(GatewayError::Status { status: 404, .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl LoyaltyGateway for SquareGateway {
    #[instrument(skip(self, request), fields(idempotency_key = %request.idempotency_key))]
    async fn create_order(&self, request: CreateOrderRequest) -> GatewayResult<Order> {
        let resp: OrderResponse = self
            .send(
                "create_order",
                self.client.post(self.endpoint(&["v2", "orders"])).json(&request),
            )
            .await?;
        let order = resp.order.ok_or(GatewayError::MissingField("order"))?;
        debug!(order_id = %order.id, "Order created");
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn get_order(&self, order_id: &str) -> GatewayResult<Order> {
        let resp: OrderResponse = self
            .send(
                "get_order",
                self.client.get(self.endpoint(&["v2", "orders", order_id])),
            )
            .await?;
        resp.order.ok_or(GatewayError::MissingField("order"))
    }

    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn create_payment(&self, request: CreatePaymentRequest) -> GatewayResult<Payment> {
        let resp: PaymentResponse = self
            .send(
                "create_payment",
                self.client.post(self.endpoint(&["v2", "payments"])).json(&request),
            )
            .await?;
        resp.payment.ok_or(GatewayError::MissingField("payment"))
    }

    #[instrument(skip(self))]
    async fn get_account(&self, account_id: &str) -> GatewayResult<Option<LoyaltyAccount>> {
        let result: GatewayResult<LoyaltyAccountResponse> = self
            .send(
                "get_account",
                self.client
                    .get(self.endpoint(&["v2", "loyalty", "accounts", account_id])),
            )
            .await;
        Ok(not_found_as_none(result)?.and_then(|r| r.loyalty_account))
    }

    #[instrument(skip(self, request))]
    async fn create_account(
        &self,
        request: CreateLoyaltyAccountRequest,
    ) -> GatewayResult<LoyaltyAccount> {
        let resp: LoyaltyAccountResponse = self
            .send(
                "create_account",
                self.client
                    .post(self.endpoint(&["v2", "loyalty", "accounts"]))
                    .json(&request),
            )
            .await?;
        resp.loyalty_account
            .ok_or(GatewayError::MissingField("loyalty_account"))
    }

    #[instrument(skip(self, request), fields(has_cursor = request.cursor.is_some()))]
    async fn search_events(
        &self,
        request: SearchEventsRequest,
    ) -> GatewayResult<SearchEventsResponse> {
        self.send(
            "search_events",
            self.client
                .post(self.endpoint(&["v2", "loyalty", "events", "search"]))
                .json(&request),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_program(&self, program_key: &str) -> GatewayResult<Option<LoyaltyProgram>> {
        let result: GatewayResult<LoyaltyProgramResponse> = self
            .send(
                "get_program",
                self.client
                    .get(self.endpoint(&["v2", "loyalty", "programs", program_key])),
            )
            .await;
        Ok(not_found_as_none(result)?.and_then(|r| r.program))
    }

    #[instrument(skip(self, request), fields(idempotency_key = %request.idempotency_key))]
    async fn accumulate_points(
        &self,
        account_id: &str,
        request: AccumulatePointsRequest,
    ) -> GatewayResult<Vec<LoyaltyEvent>> {
        let resp: AccumulatePointsResponse = self
            .send(
                "accumulate_points",
                self.client
                    .post(self.endpoint(&["v2", "loyalty", "accounts", account_id, "accumulate"]))
                    .json(&request),
            )
            .await?;
        Ok(resp.events.into_iter().flatten().collect())
    }

    #[instrument(skip(self, request), fields(reward_tier_id = %request.reward.reward_tier_id))]
    async fn create_reward(&self, request: CreateRewardRequest) -> GatewayResult<LoyaltyReward> {
        let resp: LoyaltyRewardResponse = self
            .send(
                "create_reward",
                self.client
                    .post(self.endpoint(&["v2", "loyalty", "rewards"]))
                    .json(&request),
            )
            .await?;
        resp.reward.ok_or(GatewayError::MissingField("reward"))
    }
}
