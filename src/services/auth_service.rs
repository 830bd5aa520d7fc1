//! 认证服务：登录、登出、令牌刷新、密码重置
//! Owns the account lockout policy: after the configured number of failed
//! attempts the account locks for a fixed window, and the counter resets
//! lazily on the first attempt after the window passes.

use crate::{
    auth::jwt::JwtService,
    auth::password::PasswordHasher,
    config::AppConfig,
    error::AppError,
    models::admin::*,
    models::audit::AuditAction,
    repository::{admin_repo::NewAdmin, AdminRepository},
    services::audit_service::{AuditService, RequestMeta},
};
use rand::RngCore;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Login response: token pair plus the sanitized account
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub admin: AdminResponse,
}

/// Refresh response: a new access token only, the refresh token stays valid
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// Forgot-password response. The raw token is returned directly because
/// there is no mail delivery here; callers are expected to hand it to the
/// admin out of band.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,
    pub reset_token: Option<String>,
}

pub struct AuthService {
    db: PgPool,
    jwt_service: Arc<JwtService>,
    config: Arc<AppConfig>,
    audit: Arc<AuditService>,
}

impl AuthService {
    pub fn new(
        db: PgPool,
        jwt_service: Arc<JwtService>,
        config: Arc<AppConfig>,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            db,
            jwt_service,
            config,
            audit,
        }
    }

    /// 管理员登录
    pub async fn login(
        &self,
        req: LoginRequest,
        meta: &RequestMeta,
    ) -> Result<LoginResponse, AppError> {
        let repo = AdminRepository::new(self.db.clone());
        let now = chrono::Utc::now();

        let admin = repo
            .find_by_email(&req.email)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid email or password."))?;

        // 锁定中的账户直接拒绝，不消耗尝试次数
        if admin.is_locked(now) {
            return Err(AppError::AccountLocked(format!(
                "Account is locked. Try again in {} minutes.",
                admin.lock_remaining_minutes(now)
            )));
        }

        if !admin.is_active {
            return Err(AppError::forbidden(
                "Account has been deactivated. Contact support.",
            ));
        }

        let password_ok = self.verify_password(&req.password, &admin.password_hash).await?;

        if !password_ok {
            return Err(self.handle_failed_attempt(&repo, &admin, now).await?);
        }

        // 成功登录：清理失败计数与过期锁定
        if admin.failed_login_attempts > 0 || admin.lock_until.is_some() {
            repo.reset_lockout(&admin.id).await?;
        }
        repo.set_last_login(&admin.id).await?;

        let token_pair = self.jwt_service.generate_token_pair(&admin.id)?;

        // 存储刷新令牌哈希，超出上限时淘汰最旧的
        let token_hash = AdminRepository::hash_token(&token_pair.refresh_token);
        let expires_at = now
            + chrono::Duration::seconds(self.config.security.refresh_token_exp_secs as i64);
        repo.store_refresh_token(
            &admin.id,
            &token_hash,
            expires_at,
            self.config.security.max_refresh_tokens as i64,
        )
        .await?;

        self.audit.log(
            AuditAction::Login,
            admin.id,
            admin.hospital_id,
            serde_json::json!({ "email": admin.email }),
            meta,
        );

        Ok(LoginResponse {
            access_token: token_pair.access_token,
            refresh_token: token_pair.refresh_token,
            expires_in: token_pair.expires_in,
            admin: AdminResponse::from(admin),
        })
    }

    /// 记录一次失败尝试，返回应当呈现给调用方的错误
    async fn handle_failed_attempt(
        &self,
        repo: &AdminRepository,
        admin: &Admin,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<AppError, AppError> {
        let max_attempts = self.config.security.max_login_attempts;

        // 锁定窗口已过：惰性重置，本次失败从 1 开始计
        let lock_expired = matches!(admin.lock_until, Some(until) if until <= now);
        let attempts = if lock_expired {
            1
        } else {
            admin.failed_login_attempts + 1
        };

        if attempts >= max_attempts {
            let lockout_secs = self.config.security.login_lockout_duration_secs as i64;
            let lock_until = now + chrono::Duration::seconds(lockout_secs);
            repo.record_failed_attempt(&admin.id, attempts, Some(lock_until)).await?;

            return Ok(AppError::AccountLocked(format!(
                "Account locked due to {} failed login attempts. Try again in {} minutes.",
                max_attempts,
                lockout_secs / 60
            )));
        }

        repo.record_failed_attempt(&admin.id, attempts, None).await?;

        Ok(AppError::Unauthorized(format!(
            "Invalid email or password. {} attempts remaining.",
            max_attempts - attempts
        )))
    }

    /// 刷新访问令牌。刷新令牌本身保持有效，不做轮换
    pub async fn refresh_token(&self, req: RefreshTokenRequest) -> Result<RefreshResponse, AppError> {
        let admin_id = self
            .jwt_service
            .validate_refresh_token(&req.refresh_token)
            .map_err(|e| match e {
                AppError::TokenExpired => AppError::unauthorized("Refresh token expired"),
                _ => AppError::unauthorized("Invalid refresh token"),
            })?;

        // 令牌必须仍在该账号的会话列表中（未被登出或淘汰）
        let repo = AdminRepository::new(self.db.clone());
        let token_hash = AdminRepository::hash_token(&req.refresh_token);
        if !repo.refresh_token_exists(&admin_id, &token_hash).await? {
            // 命中不到时顺带清理已过期的残留会话
            let removed = repo.cleanup_expired_tokens().await?;
            if removed > 0 {
                tracing::debug!(removed, "Removed expired refresh tokens");
            }
            return Err(AppError::unauthorized("Invalid refresh token"));
        }

        let admin = repo
            .find_by_id(&admin_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        if !admin.is_active {
            return Err(AppError::forbidden(
                "Account has been deactivated. Contact support.",
            ));
        }

        let access_token = self.jwt_service.generate_access_token(&admin.id)?;

        Ok(RefreshResponse {
            access_token,
            expires_in: self.jwt_service.access_token_exp_secs(),
        })
    }

    /// 登出。携带刷新令牌登出当前会话，不携带则登出全部会话
    pub async fn logout(&self, admin_id: Uuid, req: LogoutRequest) -> Result<(), AppError> {
        let repo = AdminRepository::new(self.db.clone());

        match req.refresh_token {
            Some(token) => {
                let token_hash = AdminRepository::hash_token(&token);
                repo.delete_refresh_token(&admin_id, &token_hash).await?;
            }
            None => {
                repo.clear_refresh_tokens(&admin_id).await?;
            }
        }

        Ok(())
    }

    /// 注册新管理员（仅超级管理员可调用，权限在路由层校验）
    pub async fn register_admin(
        &self,
        req: RegisterAdminRequest,
        created_by: Uuid,
        meta: &RequestMeta,
    ) -> Result<AdminResponse, AppError> {
        let repo = AdminRepository::new(self.db.clone());

        if repo.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        PasswordHasher::validate_password_policy(&req.password, &self.config)?;

        // 医院级角色必须绑定医院
        if req.role.is_hospital_scoped() && req.hospital_id.is_none() {
            return Err(AppError::BadRequest(format!(
                "Hospital is required for role {}",
                req.role.as_str()
            )));
        }

        let password_hash = self.hash_password(req.password.clone()).await?;

        let permissions: Vec<String> =
            req.permissions.iter().map(|p| p.as_str().to_string()).collect();

        let admin = repo
            .create(NewAdmin {
                email: &req.email,
                password_hash: &password_hash,
                first_name: &req.first_name,
                last_name: &req.last_name,
                role: req.role.as_str(),
                hospital_id: req.hospital_id,
                permissions: &permissions,
            })
            .await?;

        self.audit.log(
            AuditAction::CreateAdmin,
            created_by,
            admin.hospital_id,
            serde_json::json!({ "email": admin.email, "role": admin.role }),
            meta,
        );

        Ok(AdminResponse::from(admin))
    }

    /// 发起密码重置。对不存在的邮箱返回同样的响应，避免账号探测
    pub async fn forgot_password(
        &self,
        req: ForgotPasswordRequest,
    ) -> Result<ForgotPasswordResponse, AppError> {
        let message = "If the email exists, a reset link has been sent.".to_string();

        let repo = AdminRepository::new(self.db.clone());
        let admin = match repo.find_by_email(&req.email).await? {
            Some(admin) if admin.is_active => admin,
            _ => {
                return Ok(ForgotPasswordResponse {
                    message,
                    reset_token: None,
                })
            }
        };

        // 32 字节随机令牌，只存哈希
        let mut raw = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut raw);
        let token = hex::encode(raw);
        let token_hash = AdminRepository::hash_token(&token);

        let expires_at = chrono::Utc::now()
            + chrono::Duration::seconds(self.config.security.reset_token_exp_secs as i64);
        repo.set_reset_token(&admin.id, &token_hash, expires_at).await?;

        Ok(ForgotPasswordResponse {
            message,
            reset_token: Some(token),
        })
    }

    /// 用重置令牌设置新密码，同时撤销所有会话并清除锁定状态
    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), AppError> {
        let repo = AdminRepository::new(self.db.clone());

        let token_hash = AdminRepository::hash_token(&req.token);
        let admin = repo
            .find_by_reset_token(&token_hash)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

        PasswordHasher::validate_password_policy(&req.password, &self.config)?;

        let password_hash = self.hash_password(req.password.clone()).await?;
        repo.reset_password(&admin.id, &password_hash).await?;

        Ok(())
    }

    /// 手动解锁账户（超级管理员）
    pub async fn unlock_account(
        &self,
        admin_id: Uuid,
        unlocked_by: Uuid,
        meta: &RequestMeta,
    ) -> Result<AdminResponse, AppError> {
        let repo = AdminRepository::new(self.db.clone());

        let admin = repo
            .find_by_id(&admin_id)
            .await?
            .ok_or_else(|| AppError::not_found("Admin not found"))?;

        repo.reset_lockout(&admin.id).await?;

        self.audit.log(
            AuditAction::UnlockAccount,
            unlocked_by,
            admin.hospital_id,
            serde_json::json!({ "email": admin.email }),
            meta,
        );

        let admin = repo
            .find_by_id(&admin_id)
            .await?
            .ok_or_else(|| AppError::not_found("Admin not found"))?;

        Ok(AdminResponse::from(admin))
    }

    pub async fn get_profile(&self, admin_id: Uuid) -> Result<AdminResponse, AppError> {
        let repo = AdminRepository::new(self.db.clone());
        let admin = repo
            .find_by_id(&admin_id)
            .await?
            .ok_or_else(|| AppError::not_found("Admin not found"))?;

        Ok(AdminResponse::from(admin))
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminResponse>, AppError> {
        let repo = AdminRepository::new(self.db.clone());
        let admins = repo.list_all().await?;
        Ok(admins.into_iter().map(AdminResponse::from).collect())
    }

    // Argon2 is CPU-bound; keep it off the async workers.

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        tokio::task::spawn_blocking(move || PasswordHasher::new().hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_string();
        let hash = hash.to_string();

        let result =
            tokio::task::spawn_blocking(move || PasswordHasher::new().verify(&password, &hash))
                .await
                .map_err(|e| AppError::Internal(format!("Password verify task failed: {}", e)))?;

        match result {
            Ok(()) => Ok(true),
            Err(AppError::Unauthorized(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
