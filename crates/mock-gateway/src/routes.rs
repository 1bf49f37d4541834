//! 模拟平台 REST 路由
//!
//! 路径与平台 v2 API 一致，`/v2` 下的接口都要求 `Authorization: Bearer`。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use serde_json::json;
use tracing::debug;

use crate::error::{MockError, Result};
use crate::models::*;
use crate::platform::MockPlatform;

type SharedPlatform = Arc<MockPlatform>;

/// 构建完整路由
pub fn app(platform: SharedPlatform) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(platform_routes().route_layer(middleware::from_fn(require_bearer)))
        .with_state(platform)
}

fn platform_routes() -> Router<SharedPlatform> {
    Router::new()
        .route("/v2/orders", post(create_order))
        .route("/v2/orders/{order_id}", get(get_order))
        .route("/v2/payments", post(create_payment))
        .route("/v2/loyalty/accounts", post(create_account))
        .route("/v2/loyalty/accounts/{account_id}", get(get_account))
        .route(
            "/v2/loyalty/accounts/{account_id}/accumulate",
            post(accumulate_points),
        )
        .route("/v2/loyalty/events/search", post(search_events))
        .route("/v2/loyalty/programs/{program_id}", get(get_program))
        .route("/v2/loyalty/rewards", post(create_reward))
}

/// 只校验令牌存在，不校验内容
async fn require_bearer(request: Request, next: Next) -> std::result::Result<Response, MockError> {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| !token.trim().is_empty());

    if !authorized {
        return Err(MockError::Unauthorized);
    }
    Ok(next.run(request).await)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn create_order(
    State(platform): State<SharedPlatform>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>> {
    let order = platform.create_order(req)?;
    Ok(Json(OrderResponse { order }))
}

async fn get_order(
    State(platform): State<SharedPlatform>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>> {
    let order = platform.get_order(&order_id)?;
    Ok(Json(OrderResponse { order }))
}

async fn create_payment(
    State(platform): State<SharedPlatform>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<Json<PaymentResponse>> {
    let payment = platform.create_payment(req)?;
    Ok(Json(PaymentResponse { payment }))
}

async fn create_account(
    State(platform): State<SharedPlatform>,
    Json(req): Json<CreateLoyaltyAccountRequest>,
) -> Result<Json<LoyaltyAccountResponse>> {
    let loyalty_account = platform.create_account(req)?;
    Ok(Json(LoyaltyAccountResponse { loyalty_account }))
}

async fn get_account(
    State(platform): State<SharedPlatform>,
    Path(account_id): Path<String>,
) -> Result<Json<LoyaltyAccountResponse>> {
    let loyalty_account = platform.get_account(&account_id)?;
    Ok(Json(LoyaltyAccountResponse { loyalty_account }))
}

async fn accumulate_points(
    State(platform): State<SharedPlatform>,
    Path(account_id): Path<String>,
    Json(req): Json<AccumulatePointsRequest>,
) -> Result<Json<AccumulatePointsResponse>> {
    let events = platform.accumulate_points(&account_id, req)?;
    Ok(Json(AccumulatePointsResponse { events }))
}

async fn search_events(
    State(platform): State<SharedPlatform>,
    Json(req): Json<SearchEventsRequest>,
) -> Result<Json<SearchEventsResponse>> {
    debug!(account_id = ?req.account_id(), cursor = ?req.cursor, "检索积分事件");
    Ok(Json(platform.search_events(req)?))
}

async fn get_program(
    State(platform): State<SharedPlatform>,
    Path(program_id): Path<String>,
) -> Result<Json<LoyaltyProgramResponse>> {
    let program = platform.get_program(&program_id)?;
    Ok(Json(LoyaltyProgramResponse { program }))
}

async fn create_reward(
    State(platform): State<SharedPlatform>,
    Json(req): Json<CreateRewardRequest>,
) -> Result<Json<LoyaltyRewardResponse>> {
    let reward = platform.create_reward(req)?;
    Ok(Json(LoyaltyRewardResponse { reward }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn create_test_app() -> Router {
        app(Arc::new(MockPlatform::default()))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer sandbox-token");
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let app = create_test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v2/loyalty/programs/main")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = create_test_app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_program() {
        let app = create_test_app();
        let (status, body) = call(&app, "GET", "/v2/loyalty/programs/main", None).await;

        assert_eq!(status, StatusCode::OK);
        let tiers = body["program"]["reward_tiers"].as_array().unwrap();
        assert_eq!(tiers.len(), 3);
        assert_eq!(tiers[1]["points"], 100);
        assert_eq!(tiers[1]["definition"]["percentage_discount"], "10");
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let app = create_test_app();
        let (status, body) = call(&app, "GET", "/v2/loyalty/accounts/nope", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["code"], "NOT_FOUND");
        assert!(body["errors"][0]["detail"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_order_then_accumulate() {
        let app = create_test_app();

        let (status, body) = call(
            &app,
            "POST",
            "/v2/loyalty/accounts",
            Some(json!({
                "loyalty_account": {
                    "program_id": "prog-main",
                    "mapping": { "phone_number": "+15550001111" }
                },
                "idempotency_key": "acc-1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let account_id = body["loyalty_account"]["id"].as_str().unwrap().to_string();

        let (_, body) = call(
            &app,
            "POST",
            "/v2/orders",
            Some(json!({
                "idempotency_key": "k",
                "order": {
                    "location_id": "LOC-MOCK",
                    "line_items": [{
                        "name": "latte",
                        "quantity": "2",
                        "base_price_money": { "amount": 450, "currency": "USD" }
                    }]
                }
            })),
        )
        .await;
        assert_eq!(body["order"]["total_money"]["amount"], 900);
        let order_id = body["order"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            "POST",
            &format!("/v2/loyalty/accounts/{account_id}/accumulate"),
            Some(json!({
                "accumulate_points": { "order_id": order_id },
                "location_id": "LOC-MOCK",
                "idempotency_key": "k"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"][0]["type"], "ACCUMULATE_POINTS");
        assert_eq!(body["events"][0]["accumulate_points"]["points"], 9);

        let (_, body) = call(&app, "GET", &format!("/v2/loyalty/accounts/{account_id}"), None).await;
        assert_eq!(body["loyalty_account"]["balance"], 9);
    }
}
