//! 会员注册与登录
//!
//! ## 注册流程
//!
//! 1. 参数校验 -> 2. 邮箱/手机号查重 -> 3. 平台开通积分账户
//!    -> 4. 密码哈希 -> 5. 写入会员记录 -> 6. 签发 Token

use std::sync::Arc;

use loyalty_core::LoyaltyService;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::{IssuedToken, JwtManager, hash_password_blocking, verify_password_blocking};
use crate::dto::{LoginRequest, RegisterRequest};
use crate::error::{ApiError, Result};
use crate::models::{Customer, NewCustomer};
use crate::repository::CustomerRepository;

/// 认证成功后的会话信息
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub customer: Customer,
    pub token: IssuedToken,
}

/// 会员认证服务
pub struct AuthService {
    customers: Arc<dyn CustomerRepository>,
    loyalty: Arc<LoyaltyService>,
    jwt: JwtManager,
}

impl AuthService {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        loyalty: Arc<LoyaltyService>,
        jwt: JwtManager,
    ) -> Self {
        Self {
            customers,
            loyalty,
            jwt,
        }
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    /// 注册会员
    ///
    /// 平台账户开通成功而本地写入失败时，平台侧会留下一个未关联的账户；
    /// 重试注册会再开通一个新账户。
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthSession> {
        req.validate()?;

        let email = normalize_email(&req.email);
        let phone = req.phone.trim().to_string();

        if self.customers.exists(&email, &phone).await? {
            return Err(ApiError::CustomerExists);
        }

        let account = self.loyalty.open_account(&phone).await?;
        let password_hash = hash_password_blocking(req.password.clone()).await?;

        let customer = self
            .customers
            .insert(NewCustomer {
                name: req.name.trim().to_string(),
                email,
                phone,
                password_hash,
                loyalty_account_id: account.id,
            })
            .await?;

        let token = self
            .jwt
            .generate_token(customer.id, &customer.loyalty_account_id)?;

        info!(customer_id = customer.id, "会员注册成功");
        Ok(AuthSession { customer, token })
    }

    /// 邮箱或手机号登录，优先使用邮箱
    #[instrument(skip(self, req))]
    pub async fn login(&self, req: LoginRequest) -> Result<AuthSession> {
        req.validate()?;

        let email = req
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty());

        let customer = match email {
            Some(email) => self.customers.find_by_email(&email).await?,
            None => {
                let phone = req.phone.as_deref().map(str::trim).unwrap_or_default();
                self.customers.find_by_phone(phone).await?
            }
        };

        let Some(customer) = customer else {
            return Err(ApiError::InvalidCredentials);
        };

        if !verify_password_blocking(req.password.clone(), customer.password_hash.clone()).await? {
            warn!(customer_id = customer.id, "密码错误");
            return Err(ApiError::InvalidCredentials);
        }

        let token = self
            .jwt
            .generate_token(customer.id, &customer.loyalty_account_id)?;

        info!(customer_id = customer.id, "会员登录成功");
        Ok(AuthSession { customer, token })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtConfig, hash_password};
    use crate::repository::MockCustomerRepository;
    use async_trait::async_trait;
    use chrono::Utc;
    use loyalty_core::error::GatewayResult;
    use loyalty_core::gateway::*;
    use loyalty_core::{LoyaltyGateway, LoyaltyServiceConfig};
    use loyalty_shared::config::GatewayConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 只支持开通账户的平台桩
    #[derive(Default)]
    struct AccountOnlyGateway {
        created: AtomicUsize,
    }

    #[async_trait]
    impl LoyaltyGateway for AccountOnlyGateway {
        async fn create_order(&self, _: CreateOrderRequest) -> GatewayResult<Order> {
            unimplemented!()
        }
        async fn get_order(&self, _: &str) -> GatewayResult<Order> {
            unimplemented!()
        }
        async fn create_payment(&self, _: CreatePaymentRequest) -> GatewayResult<Payment> {
            unimplemented!()
        }
        async fn get_account(&self, _: &str) -> GatewayResult<Option<LoyaltyAccount>> {
            unimplemented!()
        }
        async fn create_account(
            &self,
            request: CreateLoyaltyAccountRequest,
        ) -> GatewayResult<LoyaltyAccount> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(LoyaltyAccount {
                id: "acc-new".to_string(),
                program_id: Some(request.loyalty_account.program_id),
                balance: Some(0),
                customer_id: None,
                mapping: Some(request.loyalty_account.mapping),
            })
        }
        async fn search_events(&self, _: SearchEventsRequest) -> GatewayResult<SearchEventsResponse> {
            unimplemented!()
        }
        async fn get_program(&self, _: &str) -> GatewayResult<Option<LoyaltyProgram>> {
            Ok(Some(LoyaltyProgram {
                id: "prog-1".to_string(),
                reward_tiers: Vec::new(),
            }))
        }
        async fn accumulate_points(
            &self,
            _: &str,
            _: AccumulatePointsRequest,
        ) -> GatewayResult<Vec<LoyaltyEvent>> {
            unimplemented!()
        }
        async fn create_reward(&self, _: CreateRewardRequest) -> GatewayResult<LoyaltyReward> {
            unimplemented!()
        }
    }

    fn build_service(
        repo: MockCustomerRepository,
        gateway: Arc<AccountOnlyGateway>,
    ) -> AuthService {
        let loyalty = LoyaltyService::new(
            gateway,
            LoyaltyServiceConfig::from(&GatewayConfig::default()),
        );
        AuthService::new(
            Arc::new(repo),
            Arc::new(loyalty),
            JwtManager::new(JwtConfig::default()),
        )
    }

    fn stored_customer(password: &str) -> Customer {
        Customer {
            id: 42,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+15550001111".to_string(),
            password_hash: hash_password(password).unwrap(),
            loyalty_account_id: "acc-42".to_string(),
            created_at: Utc::now(),
        }
    }

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            name: " Ada ".to_string(),
            email: "Ada@Example.com".to_string(),
            phone: "+15550001111".to_string(),
            password: "longenough".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_opens_account_and_issues_token() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_exists()
            .withf(|email, phone| email == "ada@example.com" && phone == "+15550001111")
            .returning(|_, _| Ok(false));
        repo.expect_insert()
            .times(1)
            .withf(|c| {
                c.name == "Ada" && c.loyalty_account_id == "acc-new" && c.password_hash != "longenough"
            })
            .returning(|c| {
                Ok(Customer {
                    id: 1,
                    name: c.name,
                    email: c.email,
                    phone: c.phone,
                    password_hash: c.password_hash,
                    loyalty_account_id: c.loyalty_account_id,
                    created_at: Utc::now(),
                })
            });

        let gateway = Arc::new(AccountOnlyGateway::default());
        let service = build_service(repo, gateway.clone());

        let session = service.register(register_request()).await.unwrap();
        assert_eq!(session.customer.loyalty_account_id, "acc-new");
        assert_eq!(gateway.created.load(Ordering::SeqCst), 1);

        let claims = service.jwt().verify_token(&session.token.token).unwrap();
        assert_eq!(claims.customer_id, "acc-new");
        assert_eq!(claims.sub, "1");
    }

    #[tokio::test]
    async fn test_register_duplicate_skips_platform() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_exists().returning(|_, _| Ok(true));
        repo.expect_insert().never();

        let gateway = Arc::new(AccountOnlyGateway::default());
        let service = build_service(repo, gateway.clone());

        let err = service.register(register_request()).await.unwrap_err();
        assert!(matches!(err, ApiError::CustomerExists));
        assert_eq!(gateway.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_login_by_phone() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_email().never();
        repo.expect_find_by_phone()
            .withf(|phone| phone == "+15550001111")
            .returning(|_| Ok(Some(stored_customer("longenough"))));

        let service = build_service(repo, Arc::new(AccountOnlyGateway::default()));
        let session = service
            .login(LoginRequest {
                email: None,
                phone: Some(" +15550001111 ".to_string()),
                password: "longenough".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session.customer.id, 42);
        assert!(session.token.expires_at > Utc::now().timestamp());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_email()
            .returning(|_| Ok(Some(stored_customer("longenough"))));

        let service = build_service(repo, Arc::new(AccountOnlyGateway::default()));
        let err = service
            .login(LoginRequest {
                email: Some("ada@example.com".to_string()),
                phone: None,
                password: "wrong-password".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_unknown_customer() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));

        let service = build_service(repo, Arc::new(AccountOnlyGateway::default()));
        let err = service
            .login(LoginRequest {
                email: Some("ghost@example.com".to_string()),
                phone: None,
                password: "whatever".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidCredentials));
    }
}
