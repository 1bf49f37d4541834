//! 会员仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::CustomerRepository;
use crate::error::{ApiError, Result};
use crate::models::{Customer, NewCustomer};

/// PostgreSQL 会员仓储
pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, password_hash, loyalty_account_id, created_at
            FROM customers
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, password_hash, loyalty_account_id, created_at
            FROM customers
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn exists(&self, email: &str, phone: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM customers WHERE lower(email) = lower($1) OR phone = $2
            )
            "#,
        )
        .bind(email)
        .bind(phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, customer: NewCustomer) -> Result<Customer> {
        let result = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, phone, password_hash, loyalty_account_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, phone, password_hash, loyalty_account_id, created_at
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.password_hash)
        .bind(&customer.loyalty_account_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(ApiError::CustomerExists)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loyalty_shared::config::DatabaseConfig;
    use loyalty_shared::database::Database;

    #[tokio::test]
    #[ignore = "需要 PostgreSQL 数据库"]
    async fn test_insert_and_find() {
        let db = Database::connect(&DatabaseConfig::default()).await.unwrap();
        db.run_migrations().await.unwrap();
        let repo = PgCustomerRepository::new(db.pool().clone());

        let suffix = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let email = format!("repo-{suffix}@example.com");
        let phone = format!("+1{}", suffix % 10_000_000_000);

        let created = repo
            .insert(NewCustomer {
                name: "Repo Test".to_string(),
                email: email.clone(),
                phone: phone.clone(),
                password_hash: "hash".to_string(),
                loyalty_account_id: "acc-repo".to_string(),
            })
            .await
            .unwrap();

        let by_email = repo.find_by_email(&email.to_uppercase()).await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert!(repo.exists("nobody@example.com", &phone).await.unwrap());

        let duplicate = repo
            .insert(NewCustomer {
                name: "Dup".to_string(),
                email,
                phone: "+10000000000".to_string(),
                password_hash: "hash".to_string(),
                loyalty_account_id: "acc-dup".to_string(),
            })
            .await;
        assert!(matches!(duplicate, Err(ApiError::CustomerExists)));
    }
}
