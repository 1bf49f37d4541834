//! 密码处理

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::error::ApiError;

/// 使用 bcrypt 生成密码哈希
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    hash(password, DEFAULT_COST).map_err(|e| ApiError::Internal(format!("密码哈希失败: {e}")))
}

/// 比较明文密码与存储的哈希值
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    verify(password, hash).map_err(|e| ApiError::Internal(format!("密码验证失败: {e}")))
}

/// 在阻塞线程池中生成哈希，bcrypt 计算期间不占用异步工作线程
pub async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("密码哈希任务中断: {e}")))?
}

/// 在阻塞线程池中校验密码
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("密码验证任务中断: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("correct horse").unwrap();

        assert_ne!(hashed, "correct horse");
        assert!(verify_password("correct horse", &hashed).unwrap());
        assert!(!verify_password("battery staple", &hashed).unwrap());
    }

    #[tokio::test]
    async fn test_blocking_variants_agree() {
        let hashed = hash_password_blocking("correct horse".to_string())
            .await
            .unwrap();

        assert!(verify_password("correct horse", &hashed).unwrap());
        assert!(
            verify_password_blocking("correct horse".to_string(), hashed.clone())
                .await
                .unwrap()
        );
        assert!(
            !verify_password_blocking("battery staple".to_string(), hashed)
                .await
                .unwrap()
        );
        assert!(
            verify_password_blocking("x".to_string(), "not-a-bcrypt-hash".to_string())
                .await
                .is_err()
        );
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("anything", "not-a-bcrypt-hash").is_err());
    }
}
