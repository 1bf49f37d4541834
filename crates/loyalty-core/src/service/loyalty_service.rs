//! 积分用例编排服务
//!
//! 所有业务状态（账户、余额、订单、奖励）都保存在平台侧，本服务只负责：
//! - 本地参数校验
//! - 为每次调用生成幂等键，并在该调用的所有写操作中复用
//! - 按固定顺序串联平台调用，任何一步失败立即返回（不重试、不补偿）
//! - 将平台原始数据转换为档位结果与交易历史
//!
//! ## 累积流程
//!
//! 1. 创建订单 -> 2. 创建支付 -> 3. 校验支付完成 -> 4. 按订单累积积分
//!
//! ## 兑换流程
//!
//! 1. 获取积分计划 -> 2. 创建订单 -> 3. 创建奖励 -> 4. 查询折后订单
//!    -> 5. 支付折后金额 -> 6. 校验支付完成 -> 7. 按订单累积积分

use std::sync::Arc;

use loyalty_shared::config::GatewayConfig;
use loyalty_shared::observability::metrics::record_loyalty_operation;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{GatewayStep, LoyaltyError, Result};
use crate::gateway::{
    AccumulatePoints, AccumulatePointsRequest, CreateLoyaltyAccountRequest, CreateOrderRequest,
    CreatePaymentRequest, CreateRewardRequest, LoyaltyAccount, LoyaltyAccountMapping,
    LoyaltyGateway, LoyaltyProgram, Money, NewLoyaltyAccount, NewLoyaltyReward, Payment,
    SearchEventsRequest,
};
use crate::history::{HistoryPage, normalize_page};
use crate::service::dto::{
    EarnPointsCommand, PointsReceipt, RedeemPointsCommand, RedemptionReceipt, RewardTierStatus,
};
use crate::tier::resolve_closest_tier;

/// 用例所需的平台参数
#[derive(Debug, Clone, PartialEq)]
pub struct LoyaltyServiceConfig {
    pub location_id: String,
    pub program_key: String,
    pub payment_source_id: String,
    pub currency: String,
    pub history_page_size: u32,
}

impl From<&GatewayConfig> for LoyaltyServiceConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            location_id: config.location_id.clone(),
            program_key: config.program_key.clone(),
            payment_source_id: config.payment_source_id.clone(),
            currency: config.currency.clone(),
            history_page_size: config.history_page_size,
        }
    }
}

/// 积分用例服务
///
/// 进程内共享一个实例；积分计划 ID 首次成功获取后缓存，获取失败不缓存，下次调用重试。
pub struct LoyaltyService {
    gateway: Arc<dyn LoyaltyGateway>,
    config: LoyaltyServiceConfig,
    program_id: OnceCell<String>,
}

impl LoyaltyService {
    pub fn new(gateway: Arc<dyn LoyaltyGateway>, config: LoyaltyServiceConfig) -> Self {
        Self {
            gateway,
            config,
            program_id: OnceCell::new(),
        }
    }

    /// 累积积分
    #[instrument(skip(self, command), fields(account_id = %command.account_id, amount = command.amount))]
    pub async fn earn_points(&self, command: EarnPointsCommand) -> Result<PointsReceipt> {
        observe("earn", self.execute_earn(command).await)
    }

    async fn execute_earn(&self, command: EarnPointsCommand) -> Result<PointsReceipt> {
        command.validate()?;
        let idempotency_key = new_idempotency_key();

        let order = self
            .gateway
            .create_order(CreateOrderRequest::single_item(
                &idempotency_key,
                &self.config.location_id,
                &command.description,
                command.amount,
                &self.config.currency,
            ))
            .await
            .map_err(LoyaltyError::at(GatewayStep::CreateOrder))?;
        debug!(order_id = %order.id, "订单已创建");

        let amount = Money::new(command.amount, self.config.currency.clone());
        let payment = self.pay(&idempotency_key, &order.id, amount).await?;

        let points_earned = self
            .accumulate(&command.account_id, &order.id, &idempotency_key, None)
            .await?;

        info!(
            account_id = %command.account_id,
            order_id = %order.id,
            points_earned,
            "积分累积成功"
        );

        Ok(PointsReceipt {
            order_id: order.id,
            payment_id: payment.id,
            points_earned,
        })
    }

    /// 兑换积分
    ///
    /// 奖励挂到订单后平台会重算订单金额，实付金额以查询到的折后总额为准。
    #[instrument(
        skip(self, command),
        fields(account_id = %command.account_id, reward_tier_id = %command.reward_tier_id)
    )]
    pub async fn redeem_points(&self, command: RedeemPointsCommand) -> Result<RedemptionReceipt> {
        observe("redeem", self.execute_redeem(command).await)
    }

    async fn execute_redeem(&self, command: RedeemPointsCommand) -> Result<RedemptionReceipt> {
        command.validate()?;
        // 在任何写操作之前拿到计划 ID，避免支付完成后才发现无法累积
        let program_id = self.ensure_program_id().await?;
        let idempotency_key = new_idempotency_key();

        let order = self
            .gateway
            .create_order(CreateOrderRequest::single_item(
                &idempotency_key,
                &self.config.location_id,
                &command.description,
                command.amount,
                &self.config.currency,
            ))
            .await
            .map_err(LoyaltyError::at(GatewayStep::CreateOrder))?;

        let reward = self
            .gateway
            .create_reward(CreateRewardRequest {
                reward: NewLoyaltyReward {
                    loyalty_account_id: command.account_id.clone(),
                    reward_tier_id: command.reward_tier_id.clone(),
                    order_id: order.id.clone(),
                },
                idempotency_key: idempotency_key.clone(),
            })
            .await
            .map_err(LoyaltyError::at(GatewayStep::CreateReward))?;
        debug!(reward_id = %reward.id, order_id = %order.id, "奖励已创建");

        let discounted = self
            .gateway
            .get_order(&order.id)
            .await
            .map_err(LoyaltyError::at(GatewayStep::GetOrder))?;
        let total = discounted.total_money.ok_or(LoyaltyError::MissingOrderTotal)?;
        let amount_charged = total.amount;

        let payment = self.pay(&idempotency_key, &order.id, total).await?;

        let points_earned = self
            .accumulate(
                &command.account_id,
                &order.id,
                &idempotency_key,
                Some(program_id),
            )
            .await?;

        info!(
            account_id = %command.account_id,
            order_id = %order.id,
            reward_id = %reward.id,
            amount_charged,
            "积分兑换成功"
        );

        Ok(RedemptionReceipt {
            order_id: order.id,
            reward_id: reward.id,
            payment_id: payment.id,
            amount_charged,
            points_earned,
        })
    }

    /// 查询积分余额
    #[instrument(skip(self))]
    pub async fn get_balance(&self, account_id: &str) -> Result<i64> {
        observe("balance", self.fetch_balance(account_id).await)
    }

    async fn fetch_balance(&self, account_id: &str) -> Result<i64> {
        let account = self
            .gateway
            .get_account(account_id)
            .await
            .map_err(LoyaltyError::at(GatewayStep::GetAccount))?;

        account
            .and_then(|a| a.balance)
            .ok_or(LoyaltyError::BalanceUnavailable)
    }

    /// 查询积分历史（单页）
    ///
    /// `cursor` 为空或空白时返回第一页。
    #[instrument(skip(self))]
    pub async fn get_history(&self, account_id: &str, cursor: Option<&str>) -> Result<HistoryPage> {
        observe("history", self.fetch_history(account_id, cursor).await)
    }

    async fn fetch_history(&self, account_id: &str, cursor: Option<&str>) -> Result<HistoryPage> {
        let request =
            SearchEventsRequest::for_account(account_id, self.config.history_page_size, cursor);

        let response = self
            .gateway
            .search_events(request)
            .await
            .map_err(LoyaltyError::at(GatewayStep::SearchEvents))?;

        Ok(normalize_page(response.events, response.cursor))
    }

    /// 查询余额及当前可兑换的最高档位
    ///
    /// 没有满足条件的档位时返回 `TierResolution::NoneQualifying`，不视为错误。
    #[instrument(skip(self))]
    pub async fn get_reward_tiers(&self, account_id: &str) -> Result<RewardTierStatus> {
        observe("reward_tiers", self.fetch_reward_tiers(account_id).await)
    }

    async fn fetch_reward_tiers(&self, account_id: &str) -> Result<RewardTierStatus> {
        let balance = self.fetch_balance(account_id).await?;
        let program = self.fetch_program().await?;

        let tier = resolve_closest_tier(program.reward_tiers.iter().flatten(), balance);
        debug!(balance, reward_tier_id = %tier.reward_tier_id(), "档位解析完成");

        Ok(RewardTierStatus { balance, tier })
    }

    /// 获取积分计划 ID（进程内缓存）
    ///
    /// 并发的首次调用只会触发一次平台请求；请求失败时错误返回给本轮调用方，缓存保持为空。
    pub async fn ensure_program_id(&self) -> Result<String> {
        let id = self
            .program_id
            .get_or_try_init(|| async {
                let program = self.fetch_program().await?;
                info!(program_id = %program.id, "积分计划 ID 已缓存");
                Ok::<_, LoyaltyError>(program.id)
            })
            .await?;
        Ok(id.clone())
    }

    /// 为新会员开通积分账户，账户以手机号映射
    #[instrument(skip(self, phone_number))]
    pub async fn open_account(&self, phone_number: &str) -> Result<LoyaltyAccount> {
        if phone_number.trim().is_empty() {
            return Err(LoyaltyError::Validation("手机号不能为空".to_string()));
        }
        let program_id = self.ensure_program_id().await?;

        let account = self
            .gateway
            .create_account(CreateLoyaltyAccountRequest {
                loyalty_account: NewLoyaltyAccount {
                    program_id,
                    mapping: LoyaltyAccountMapping {
                        phone_number: Some(phone_number.trim().to_string()),
                    },
                },
                idempotency_key: new_idempotency_key(),
            })
            .await
            .map_err(LoyaltyError::at(GatewayStep::CreateAccount))?;

        info!(account_id = %account.id, "积分账户已开通");
        Ok(account)
    }

    async fn fetch_program(&self) -> Result<LoyaltyProgram> {
        self.gateway
            .get_program(&self.config.program_key)
            .await
            .map_err(LoyaltyError::at(GatewayStep::FetchProgram))?
            .ok_or(LoyaltyError::ProgramUnavailable)
    }

    /// 创建支付并确认已完成
    async fn pay(&self, idempotency_key: &str, order_id: &str, amount: Money) -> Result<Payment> {
        let payment = self
            .gateway
            .create_payment(CreatePaymentRequest {
                source_id: self.config.payment_source_id.clone(),
                idempotency_key: idempotency_key.to_string(),
                amount_money: amount,
                order_id: order_id.to_string(),
            })
            .await
            .map_err(LoyaltyError::at(GatewayStep::CreatePayment))?;

        if !payment.is_completed() {
            let status = payment.status.unwrap_or_else(|| "UNKNOWN".to_string());
            warn!(order_id, payment_id = %payment.id, status = %status, "支付未完成，跳过积分累积");
            return Err(LoyaltyError::PaymentNotCompleted { status });
        }
        Ok(payment)
    }

    /// 按订单累积积分，返回本次累积的积分数
    async fn accumulate(
        &self,
        account_id: &str,
        order_id: &str,
        idempotency_key: &str,
        program_id: Option<String>,
    ) -> Result<i64> {
        let events = self
            .gateway
            .accumulate_points(
                account_id,
                AccumulatePointsRequest {
                    accumulate_points: AccumulatePoints {
                        order_id: Some(order_id.to_string()),
                        loyalty_program_id: program_id,
                    },
                    location_id: self.config.location_id.clone(),
                    idempotency_key: idempotency_key.to_string(),
                },
            )
            .await
            .map_err(LoyaltyError::at(GatewayStep::AccumulatePoints))?;

        Ok(events
            .iter()
            .filter_map(|e| e.accumulate_points.as_ref().and_then(|a| a.points))
            .sum())
    }
}

fn new_idempotency_key() -> String {
    Uuid::new_v4().to_string()
}

/// 记录用例结果指标
fn observe<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => e.code(),
    };
    record_loyalty_operation(operation, outcome);
    result
}
