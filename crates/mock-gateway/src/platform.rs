//! 模拟积分/支付平台
//!
//! 单个积分计划 `main`，每 1 个完整货币单位累积 1 积分。
//! 所有写操作按 `操作:幂等键` 去重，同一幂等键重复提交返回首次创建的资源。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{MockError, Result};
use crate::models::*;
use crate::store::MemoryStore;

/// 积分计划的别名键
pub const PROGRAM_KEY: &str = "main";
pub const PROGRAM_ID: &str = "prog-main";

/// 触发拒付的支付来源
pub const DECLINED_SOURCE_ID: &str = "cnon:card-nonce-declined";

/// 积分事件单页上限
pub const MAX_PAGE_SIZE: u32 = 30;

#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// 新开通账户的初始积分
    pub seed_balance: i64,
    pub location_id: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            seed_balance: 0,
            location_id: "LOC-MOCK".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredEvent {
    sequence: u64,
    event: LoyaltyEvent,
}

/// 模拟平台状态
///
/// 内部存储均为共享引用，clone 后指向同一份数据。
#[derive(Clone)]
pub struct MockPlatform {
    config: PlatformConfig,
    program: LoyaltyProgram,
    orders: MemoryStore<Order>,
    payments: MemoryStore<Payment>,
    accounts: MemoryStore<LoyaltyAccount>,
    rewards: MemoryStore<LoyaltyReward>,
    events: MemoryStore<StoredEvent>,
    idempotency: MemoryStore<String>,
    sequence: Arc<AtomicU64>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new(PlatformConfig::default())
    }
}

impl MockPlatform {
    pub fn new(config: PlatformConfig) -> Self {
        let program = LoyaltyProgram {
            id: PROGRAM_ID.to_string(),
            status: "ACTIVE".to_string(),
            location_ids: vec![config.location_id.clone()],
            reward_tiers: vec![
                RewardTier::percentage_off("tier-bronze", 0, "5"),
                RewardTier::percentage_off("tier-silver", 100, "10"),
                RewardTier::percentage_off("tier-gold", 200, "15"),
            ],
        };

        Self {
            config,
            program,
            orders: MemoryStore::new(),
            payments: MemoryStore::new(),
            accounts: MemoryStore::new(),
            rewards: MemoryStore::new(),
            events: MemoryStore::new(),
            idempotency: MemoryStore::new(),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    // ========================================================================
    // 订单与支付
    // ========================================================================

    pub fn create_order(&self, req: CreateOrderRequest) -> Result<Order> {
        let scope = idempotency_scope("order", &req.idempotency_key)?;
        if let Some(order) = self.replay(&scope, &self.orders) {
            return Ok(order);
        }

        let new = req.order;
        if new.location_id.trim().is_empty() {
            return Err(MockError::BadRequest("location_id is required".to_string()));
        }
        let Some(first) = new.line_items.first() else {
            return Err(MockError::BadRequest(
                "Order must contain at least one line item".to_string(),
            ));
        };

        let currency = first.base_price_money.currency.clone();
        let total: i64 = new.line_items.iter().map(OrderLineItem::gross).sum();
        if total <= 0 {
            return Err(MockError::BadRequest("Order total must be positive".to_string()));
        }

        let order = Order {
            id: format!("ORD-{}", Uuid::new_v4().simple()),
            location_id: new.location_id,
            customer_id: new.customer_id,
            line_items: new.line_items,
            rewards: Vec::new(),
            total_money: Money::new(total, currency.clone()),
            total_discount_money: Money::new(0, currency),
            state: "OPEN".to_string(),
            created_at: now(),
        };

        self.orders.insert(&order.id, order.clone());
        self.idempotency.insert(&scope, order.id.clone());
        info!(order_id = %order.id, total, "创建订单");
        Ok(order)
    }

    pub fn get_order(&self, order_id: &str) -> Result<Order> {
        self.orders
            .get(order_id)
            .ok_or_else(|| MockError::NotFound("Order", order_id.to_string()))
    }

    pub fn create_payment(&self, req: CreatePaymentRequest) -> Result<Payment> {
        let scope = idempotency_scope("payment", &req.idempotency_key)?;
        if let Some(payment) = self.replay(&scope, &self.payments) {
            return Ok(payment);
        }

        if req.source_id == DECLINED_SOURCE_ID {
            warn!(source_id = %req.source_id, "支付被拒");
            return Err(MockError::CardDeclined);
        }
        if req.amount_money.amount <= 0 {
            return Err(MockError::BadRequest("amount_money must be positive".to_string()));
        }

        if let Some(order_id) = &req.order_id {
            let order = self.get_order(order_id)?;
            if order.total_money.amount != req.amount_money.amount {
                return Err(MockError::BadRequest(format!(
                    "Payment amount {} does not match order total {}",
                    req.amount_money.amount, order.total_money.amount
                )));
            }
            self.orders
                .update(order_id, |o| o.state = "COMPLETED".to_string());
        }

        let payment = Payment {
            id: format!("PAY-{}", Uuid::new_v4().simple()),
            status: "COMPLETED".to_string(),
            amount_money: req.amount_money,
            order_id: req.order_id,
            source_type: "CARD".to_string(),
            created_at: now(),
        };

        self.payments.insert(&payment.id, payment.clone());
        self.idempotency.insert(&scope, payment.id.clone());
        info!(payment_id = %payment.id, amount = payment.amount_money.amount, "支付完成");
        Ok(payment)
    }

    // ========================================================================
    // 积分账户
    // ========================================================================

    pub fn create_account(&self, req: CreateLoyaltyAccountRequest) -> Result<LoyaltyAccount> {
        let scope = idempotency_scope("account", &req.idempotency_key)?;
        if let Some(account) = self.replay(&scope, &self.accounts) {
            return Ok(account);
        }

        let new = req.loyalty_account;
        if new.program_id != PROGRAM_ID {
            return Err(MockError::NotFound("Loyalty program", new.program_id));
        }
        let phone = new
            .mapping
            .phone_number
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| MockError::BadRequest("mapping.phone_number is required".to_string()))?
            .to_string();

        let taken = self
            .accounts
            .list_by(|a| a.mapping.phone_number.as_deref() == Some(phone.as_str()));
        if !taken.is_empty() {
            return Err(MockError::Conflict(format!(
                "A loyalty account already exists for {phone}"
            )));
        }

        let account = LoyaltyAccount {
            id: format!("ACC-{}", Uuid::new_v4().simple()),
            program_id: PROGRAM_ID.to_string(),
            balance: self.config.seed_balance,
            lifetime_points: self.config.seed_balance,
            mapping: LoyaltyAccountMapping {
                phone_number: Some(phone),
            },
            created_at: now(),
        };

        self.accounts.insert(&account.id, account.clone());
        self.idempotency.insert(&scope, account.id.clone());
        info!(account_id = %account.id, "开通积分账户");
        Ok(account)
    }

    pub fn get_account(&self, account_id: &str) -> Result<LoyaltyAccount> {
        self.accounts
            .get(account_id)
            .ok_or_else(|| MockError::NotFound("Loyalty account", account_id.to_string()))
    }

    /// 按订单金额或显式积分累积
    pub fn accumulate_points(
        &self,
        account_id: &str,
        req: AccumulatePointsRequest,
    ) -> Result<Vec<LoyaltyEvent>> {
        let scope = idempotency_scope("accumulate", &req.idempotency_key)?;
        if let Some(stored) = self.replay(&scope, &self.events) {
            return Ok(vec![stored.event]);
        }

        self.get_account(account_id)?;
        let accumulate = req.accumulate_points;
        if let Some(program_id) = &accumulate.loyalty_program_id {
            if program_id != PROGRAM_ID {
                return Err(MockError::BadRequest(format!(
                    "Unknown loyalty program {program_id}"
                )));
            }
        }

        let points = match (&accumulate.order_id, accumulate.points) {
            (Some(order_id), _) => {
                let order = self.get_order(order_id)?;
                let already = self.events.list_by(|e| {
                    e.event
                        .accumulate_points
                        .as_ref()
                        .and_then(|a| a.order_id.as_deref())
                        == Some(order_id.as_str())
                });
                if !already.is_empty() {
                    return Err(MockError::BadRequest(format!(
                        "Points were already accumulated for order {order_id}"
                    )));
                }
                order.total_money.amount / 100
            }
            (None, Some(points)) if points > 0 => points,
            _ => {
                return Err(MockError::BadRequest(
                    "Either order_id or a positive points value is required".to_string(),
                ));
            }
        };

        self.accounts.update(account_id, |a| {
            a.balance += points;
            a.lifetime_points += points;
        });

        let stored = self.record_event(
            account_id,
            EVENT_ACCUMULATE_POINTS,
            Some(req.location_id),
            Some(EventAccumulatePoints {
                loyalty_program_id: PROGRAM_ID.to_string(),
                points,
                order_id: accumulate.order_id,
            }),
            None,
        );
        self.idempotency.insert(&scope, stored.event.id.clone());
        info!(account_id, points, "累积积分");
        Ok(vec![stored.event])
    }

    // ========================================================================
    // 积分计划与奖励
    // ========================================================================

    pub fn get_program(&self, key: &str) -> Result<LoyaltyProgram> {
        if key == PROGRAM_KEY || key == PROGRAM_ID {
            Ok(self.program.clone())
        } else {
            Err(MockError::NotFound("Loyalty program", key.to_string()))
        }
    }

    /// 创建奖励：扣减档位积分，并把折扣挂到订单上
    pub fn create_reward(&self, req: CreateRewardRequest) -> Result<LoyaltyReward> {
        let scope = idempotency_scope("reward", &req.idempotency_key)?;
        if let Some(reward) = self.replay(&scope, &self.rewards) {
            return Ok(reward);
        }

        let new = req.reward;
        let tier = self
            .program
            .reward_tiers
            .iter()
            .find(|t| t.id == new.reward_tier_id)
            .cloned()
            .ok_or_else(|| MockError::NotFound("Reward tier", new.reward_tier_id.clone()))?;
        self.get_account(&new.loyalty_account_id)?;

        if let Some(order_id) = &new.order_id {
            let order = self.get_order(order_id)?;
            if order.state != "OPEN" {
                return Err(MockError::BadRequest(format!("Order {order_id} is not open")));
            }
            if !order.rewards.is_empty() {
                return Err(MockError::BadRequest(format!(
                    "Order {order_id} already has a reward"
                )));
            }
        }

        self.accounts
            .update(&new.loyalty_account_id, |a| {
                if a.balance < tier.points {
                    return Err(MockError::BadRequest(format!(
                        "Insufficient points: balance {}, required {}",
                        a.balance, tier.points
                    )));
                }
                a.balance -= tier.points;
                Ok(())
            })
            .ok_or_else(|| {
                MockError::NotFound("Loyalty account", new.loyalty_account_id.clone())
            })??;

        let reward = LoyaltyReward {
            id: format!("RWD-{}", Uuid::new_v4().simple()),
            status: "ISSUED".to_string(),
            loyalty_account_id: new.loyalty_account_id,
            reward_tier_id: tier.id.clone(),
            points: tier.points,
            order_id: new.order_id,
            created_at: now(),
        };

        if let Some(order_id) = &reward.order_id {
            self.orders.update(order_id, |o| {
                let discount = tier.discount_for(o.total_money.amount);
                o.total_money.amount -= discount;
                o.total_discount_money.amount += discount;
                o.rewards.push(OrderReward {
                    id: reward.id.clone(),
                    reward_tier_id: tier.id.clone(),
                });
            });
        }

        self.record_event(
            &reward.loyalty_account_id,
            EVENT_CREATE_REWARD,
            None,
            None,
            Some(EventCreateReward {
                loyalty_program_id: PROGRAM_ID.to_string(),
                reward_id: reward.id.clone(),
                points: -tier.points,
            }),
        );

        self.rewards.insert(&reward.id, reward.clone());
        self.idempotency.insert(&scope, reward.id.clone());
        info!(reward_id = %reward.id, tier = %tier.id, "创建奖励");
        Ok(reward)
    }

    // ========================================================================
    // 积分事件
    // ========================================================================

    /// 检索积分事件，按创建顺序倒序；游标为下一页的偏移量
    pub fn search_events(&self, req: SearchEventsRequest) -> Result<SearchEventsResponse> {
        let limit = req.limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE) as usize;
        let offset = match req.cursor.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| MockError::BadRequest(format!("Invalid cursor {cursor}")))?,
        };

        let account_id = req.account_id();
        let mut matched = self
            .events
            .list_by(|e| account_id.is_none_or(|id| e.event.loyalty_account_id == id));
        matched.sort_by(|a, b| b.sequence.cmp(&a.sequence));

        let total = matched.len();
        let events: Vec<LoyaltyEvent> = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|e| e.event)
            .collect();
        let next = offset + events.len();
        let cursor = (next < total).then(|| next.to_string());

        Ok(SearchEventsResponse { events, cursor })
    }

    fn record_event(
        &self,
        account_id: &str,
        event_type: &str,
        location_id: Option<String>,
        accumulate_points: Option<EventAccumulatePoints>,
        create_reward: Option<EventCreateReward>,
    ) -> StoredEvent {
        let stored = StoredEvent {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            event: LoyaltyEvent {
                id: format!("EVT-{}", Uuid::new_v4().simple()),
                event_type: event_type.to_string(),
                created_at: now(),
                loyalty_account_id: account_id.to_string(),
                location_id,
                accumulate_points,
                create_reward,
            },
        };
        self.events.insert(&stored.event.id, stored.clone());
        stored
    }

    /// 幂等键已使用过时返回首次创建的资源
    fn replay<T: Clone>(&self, scope: &str, store: &MemoryStore<T>) -> Option<T> {
        self.idempotency.get(scope).and_then(|id| store.get(&id))
    }
}

fn idempotency_scope(operation: &str, key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        return Err(MockError::BadRequest("idempotency_key is required".to_string()));
    }
    Ok(format!("{operation}:{key}"))
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
