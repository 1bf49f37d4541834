//! JWT Token 处理
//!
//! Token 中携带会员的积分账户 ID，受保护接口直接以此访问平台账户。

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use loyalty_shared::config::AuthConfig;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// JWT 配置
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// 签名密钥
    pub secret: String,
    /// Token 过期时间（秒）
    pub expires_in_secs: i64,
    /// Token 签发者
    pub issuer: String,
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expires_in_secs: config.jwt_expires_secs,
            issuer: config.issuer.clone(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

/// JWT Claims（Token 载荷）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// 会员记录 ID
    pub sub: String,
    /// 平台积分账户 ID
    pub customer_id: String,
    /// 签发时间
    pub iat: i64,
    /// 过期时间
    pub exp: i64,
    /// 签发者
    pub iss: String,
}

/// 已签发的 Token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// 过期时间（Unix 秒）
    pub expires_at: i64,
}

/// JWT 管理器
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为会员签发 Token
    pub fn generate_token(
        &self,
        customer_row_id: i64,
        loyalty_account_id: &str,
    ) -> Result<IssuedToken, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.expires_in_secs);

        let claims = Claims {
            sub: customer_row_id.to_string(),
            customer_id: loyalty_account_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("JWT 生成失败: {e}")))?;

        Ok(IssuedToken {
            token,
            expires_at: exp.timestamp(),
        })
    }

    /// 验证并解析 JWT Token
    ///
    /// 过期、签名错误或签发者不符都返回 `Unauthorized`；积分账户为空的 Token 同样无效。
    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::Unauthorized("Token 已过期".to_string())
                }
                _ => ApiError::Unauthorized("无效的 Token".to_string()),
            },
        )?;

        if token_data.claims.customer_id.trim().is_empty() {
            return Err(ApiError::Unauthorized("Token 缺少积分账户".to_string()));
        }

        Ok(token_data.claims)
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.config.expires_in_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        JwtManager::new(JwtConfig {
            secret: "test-secret".to_string(),
            expires_in_secs: 3600,
            issuer: "loyalty-api".to_string(),
        })
    }

    #[test]
    fn test_generate_and_verify_token() {
        let manager = manager();
        let issued = manager.generate_token(7, "acc-123").unwrap();

        let claims = manager.verify_token(&issued.token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.customer_id, "acc-123");
        assert_eq!(claims.iss, "loyalty-api");
        assert_eq!(claims.exp, issued.expires_at);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_default_lifetime_is_three_days() {
        assert_eq!(JwtConfig::default().expires_in_secs, 72 * 3600);
    }

    #[test]
    fn test_invalid_token() {
        assert!(matches!(
            manager().verify_token("invalid.token.here"),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let other = JwtManager::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..JwtConfig::default()
        });
        let issued = other.generate_token(1, "acc-1").unwrap();
        assert!(manager().verify_token(&issued.token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let expired = JwtManager::new(JwtConfig {
            secret: "test-secret".to_string(),
            expires_in_secs: -3600,
            issuer: "loyalty-api".to_string(),
        });
        let issued = expired.generate_token(1, "acc-1").unwrap();

        match manager().verify_token(&issued.token) {
            Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, "Token 已过期"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_empty_account_rejected() {
        let manager = manager();
        let issued = manager.generate_token(1, "").unwrap();
        assert!(manager.verify_token(&issued.token).is_err());
    }
}
