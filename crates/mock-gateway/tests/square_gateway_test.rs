//! HTTP 网关端到端测试
//!
//! 在随机端口启动模拟平台，通过 `SquareGateway` 走真实 HTTP 调用完成积分用例。

use std::sync::Arc;

use loyalty_core::{
    EarnPointsCommand, LoyaltyError, LoyaltyGateway, LoyaltyService, LoyaltyServiceConfig,
    RedeemPointsCommand, SquareGateway,
};
use loyalty_shared::config::GatewayConfig;
use mock_gateway::platform::DECLINED_SOURCE_ID;
use mock_gateway::{MockPlatform, PlatformConfig, routes};
use tokio::net::TcpListener;

async fn spawn_platform(seed_balance: i64) -> String {
    let platform = Arc::new(MockPlatform::new(PlatformConfig {
        seed_balance,
        location_id: "LOC-MOCK".to_string(),
    }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, routes::app(platform)).await.unwrap();
    });

    format!("http://{addr}")
}

fn gateway_config(base_url: &str) -> GatewayConfig {
    GatewayConfig {
        base_url: base_url.to_string(),
        access_token: "sandbox-token".to_string(),
        location_id: "LOC-MOCK".to_string(),
        history_page_size: 2,
        ..GatewayConfig::default()
    }
}

fn service(config: &GatewayConfig) -> LoyaltyService {
    let gateway = Arc::new(SquareGateway::new(config).unwrap());
    LoyaltyService::new(gateway, LoyaltyServiceConfig::from(config))
}

#[tokio::test]
async fn test_earn_and_query_over_http() {
    let base_url = spawn_platform(0).await;
    let service = service(&gateway_config(&base_url));

    let account = service.open_account("+15550001111").await.unwrap();
    assert_eq!(service.get_balance(&account.id).await.unwrap(), 0);

    let receipt = service
        .earn_points(EarnPointsCommand::new(&account.id, 1250, "latte"))
        .await
        .unwrap();
    assert_eq!(receipt.points_earned, 12);
    assert_eq!(service.get_balance(&account.id).await.unwrap(), 12);

    let status = service.get_reward_tiers(&account.id).await.unwrap();
    assert_eq!(status.balance, 12);
    assert_eq!(status.tier.reward_tier_id(), "tier-bronze");
    assert_eq!(status.tier.discount_percentage(), 5.0);
}

#[tokio::test]
async fn test_redeem_pays_discounted_total() {
    let base_url = spawn_platform(150).await;
    let service = service(&gateway_config(&base_url));
    let account = service.open_account("+15550002222").await.unwrap();

    let receipt = service
        .redeem_points(RedeemPointsCommand::new(
            &account.id,
            "tier-silver",
            1000,
            "latte",
        ))
        .await
        .unwrap();

    assert_eq!(receipt.amount_charged, 900);
    assert_eq!(receipt.points_earned, 9);
    assert_eq!(service.get_balance(&account.id).await.unwrap(), 59);
}

#[tokio::test]
async fn test_history_pages_newest_first() {
    let base_url = spawn_platform(0).await;
    let service = service(&gateway_config(&base_url));
    let account = service.open_account("+15550003333").await.unwrap();

    for amount in [100, 200, 300] {
        service
            .earn_points(EarnPointsCommand::new(&account.id, amount, "tea"))
            .await
            .unwrap();
    }

    let first = service.get_history(&account.id, None).await.unwrap();
    let points: Vec<i64> = first.transactions.iter().map(|t| t.points).collect();
    assert_eq!(points, vec![3, 2]);
    assert!(first.has_more());

    let second = service
        .get_history(&account.id, Some(&first.cursor))
        .await
        .unwrap();
    assert_eq!(second.transactions.len(), 1);
    assert_eq!(second.transactions[0].transaction_type, "ACCUMULATE_POINTS");
    assert_eq!(second.cursor, "");
}

#[tokio::test]
async fn test_unknown_account_and_declined_payment() {
    let base_url = spawn_platform(0).await;
    let config = gateway_config(&base_url);
    let service = service(&config);

    let err = service.get_balance("missing").await.unwrap_err();
    assert!(matches!(err, LoyaltyError::BalanceUnavailable));

    let account = service.open_account("+15550004444").await.unwrap();
    let declining = self::service(&GatewayConfig {
        payment_source_id: DECLINED_SOURCE_ID.to_string(),
        ..config
    });
    let err = declining
        .earn_points(EarnPointsCommand::new(&account.id, 500, "latte"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "GATEWAY_ERROR");
    assert_eq!(service.get_balance(&account.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_token_is_reported() {
    let base_url = spawn_platform(0).await;
    let gateway = SquareGateway::new(&GatewayConfig {
        access_token: String::new(),
        ..gateway_config(&base_url)
    })
    .unwrap();

    let err = gateway.get_program("main").await.unwrap_err();
    assert!(err.to_string().contains("401"));
}
