//! Admin repository (管理员数据访问)

use crate::{error::AppError, models::admin::Admin};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct AdminRepository {
    db: PgPool,
}

pub struct NewAdmin<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: &'a str,
    pub hospital_id: Option<Uuid>,
    pub permissions: &'a [String],
}

impl AdminRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ==================== Admins ====================

    /// 按邮箱查找（不区分大小写）
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, AppError> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE email = lower($1)")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(admin)
    }

    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<Admin>, AppError> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(admin)
    }

    /// 创建管理员，邮箱统一小写存储
    pub async fn create(&self, new: NewAdmin<'_>) -> Result<Admin, AppError> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (
                email, password_hash, first_name, last_name, role, hospital_id, permissions
            )
            VALUES (lower($1), $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.role)
        .bind(new.hospital_id)
        .bind(new.permissions)
        .fetch_one(&self.db)
        .await?;

        Ok(admin)
    }

    pub async fn list_all(&self) -> Result<Vec<Admin>, AppError> {
        let admins = sqlx::query_as::<_, Admin>("SELECT * FROM admins ORDER BY created_at DESC")
            .fetch_all(&self.db)
            .await?;

        Ok(admins)
    }

    // ==================== Lockout ====================

    /// 记录一次失败登录，必要时写入锁定截止时间
    pub async fn record_failed_attempt(
        &self,
        admin_id: &Uuid,
        attempts: i32,
        lock_until: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE admins
            SET failed_login_attempts = $2, lock_until = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(admin_id)
        .bind(attempts)
        .bind(lock_until)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 清除失败计数与锁定状态
    pub async fn reset_lockout(&self, admin_id: &Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE admins
            SET failed_login_attempts = 0, lock_until = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(admin_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub async fn set_last_login(&self, admin_id: &Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE admins SET last_login = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(admin_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    // ==================== Refresh Tokens ====================

    /// 存储刷新令牌哈希，并裁剪到每个账号的上限（FIFO 淘汰最旧的）
    pub async fn store_refresh_token(
        &self,
        admin_id: &Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        max_tokens: i64,
    ) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO admin_refresh_tokens (admin_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(admin_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM admin_refresh_tokens
            WHERE admin_id = $1
                AND id NOT IN (
                    SELECT id FROM admin_refresh_tokens
                    WHERE admin_id = $1
                    ORDER BY created_at DESC
                    LIMIT $2
                )
            "#,
        )
        .bind(admin_id)
        .bind(max_tokens)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// 检查刷新令牌哈希是否仍然有效（存在且未过期）
    pub async fn refresh_token_exists(
        &self,
        admin_id: &Uuid,
        token_hash: &str,
    ) -> Result<bool, AppError> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*)
            FROM admin_refresh_tokens
            WHERE admin_id = $1 AND token_hash = $2 AND expires_at > NOW()
            "#,
        )
        .bind(admin_id)
        .bind(token_hash)
        .fetch_one(&self.db)
        .await?
        .get(0);

        Ok(count > 0)
    }

    /// 删除单个刷新令牌（登出当前会话）
    pub async fn delete_refresh_token(
        &self,
        admin_id: &Uuid,
        token_hash: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM admin_refresh_tokens WHERE admin_id = $1 AND token_hash = $2",
        )
        .bind(admin_id)
        .bind(token_hash)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 删除账号的全部刷新令牌（全端登出）
    pub async fn clear_refresh_tokens(&self, admin_id: &Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM admin_refresh_tokens WHERE admin_id = $1")
            .bind(admin_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// 清理过期的刷新令牌
    pub async fn cleanup_expired_tokens(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM admin_refresh_tokens WHERE expires_at < NOW()")
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    // ==================== Password Reset ====================

    /// 写入密码重置令牌哈希与过期时间
    pub async fn set_reset_token(
        &self,
        admin_id: &Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE admins
            SET password_reset_token = $2, password_reset_expires = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(admin_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 按未过期的重置令牌哈希查找账号
    pub async fn find_by_reset_token(&self, token_hash: &str) -> Result<Option<Admin>, AppError> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            SELECT * FROM admins
            WHERE password_reset_token = $1 AND password_reset_expires > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.db)
        .await?;

        Ok(admin)
    }

    /// 重置密码：更新哈希、清除重置令牌与锁定状态、撤销全部刷新令牌
    pub async fn reset_password(
        &self,
        admin_id: &Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE admins
            SET password_hash = $2,
                password_reset_token = NULL,
                password_reset_expires = NULL,
                failed_login_attempts = 0,
                lock_until = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(admin_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM admin_refresh_tokens WHERE admin_id = $1")
            .bind(admin_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    // ==================== Utility Functions ====================

    /// 哈希令牌用于存储
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
