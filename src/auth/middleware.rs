//! JWT 认证中间件与授权守卫

use crate::{
    error::AppError,
    middleware::AppState,
    models::admin::{Admin, Permission, Role},
    repository::AdminRepository,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::{collections::HashSet, sync::Arc};
use uuid::Uuid;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub admin_id: Uuid,
    pub email: String,
    pub role: Role,
    pub hospital_id: Option<Uuid>,
    pub permissions: HashSet<Permission>,
}

impl AuthContext {
    pub fn from_admin(admin: &Admin) -> Self {
        Self {
            admin_id: admin.id,
            email: admin.email.clone(),
            role: admin.role(),
            hospital_id: admin.hospital_id,
            permissions: admin.resolved_permissions(),
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// 要求持有指定角色之一
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::forbidden("Access denied. Insufficient permissions."))
        }
    }

    /// 要求持有指定权限（super_admin 直接放行）
    pub fn require_permission(&self, permission: Permission) -> Result<(), AppError> {
        if self.is_super_admin() || self.permissions.contains(&permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Access denied. Required permission: {}",
                permission.as_str()
            )))
        }
    }

    /// 只读审计员不允许任何写操作
    pub fn require_write(&self) -> Result<(), AppError> {
        if self.role == Role::ReadOnlyAuditor {
            return Err(AppError::forbidden(
                "Read-only auditors cannot perform write operations.",
            ));
        }
        Ok(())
    }

    /// Hospital-scoped roles may only touch their own hospital's data.
    /// Super admins have cross-hospital access.
    pub fn require_hospital_scope(&self, hospital_id: &Uuid) -> Result<(), AppError> {
        if self.is_super_admin() {
            return Ok(());
        }

        match self.hospital_id {
            Some(own) if own == *hospital_id => Ok(()),
            _ => Err(AppError::forbidden(
                "Access denied. You can only access your own hospital's data.",
            )),
        }
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Access denied. No token provided."))
    }
}

/// 从 Authorization 头提取令牌
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| {
            if s.starts_with("Bearer ") {
                Some(s[7..].to_string())
            } else {
                None
            }
        })
        .ok_or_else(|| AppError::unauthorized("Access denied. No token provided."))
}

/// JWT 认证中间件 - 必须认证
///
/// Validates the bearer token, then reloads the admin from the database so
/// deactivated accounts lose access immediately, regardless of token expiry.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 从 Authorization 头提取令牌
    let token = extract_token(req.headers())?;

    // 验证令牌
    let admin_id = state.jwt_service.validate_access_token(&token)?;

    // 加载管理员并检查账号状态
    let repo = AdminRepository::new(state.db.clone());
    let admin = repo
        .find_by_id(&admin_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid token."))?;

    if !admin.is_active {
        return Err(AppError::forbidden(
            "Account has been deactivated. Contact support.",
        ));
    }

    // 附加到请求扩展
    req.extensions_mut().insert(AuthContext::from_admin(&admin));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: Role, hospital_id: Option<Uuid>) -> AuthContext {
        AuthContext {
            admin_id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            role,
            hospital_id,
            permissions: role.default_permissions().iter().copied().collect(),
        }
    }

    #[test]
    fn test_extract_token_valid() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer test_token_123".parse().unwrap());

        let token = extract_token(&headers).unwrap();
        assert_eq!(token, "test_token_123");
    }

    #[test]
    fn test_extract_token_missing() {
        let headers = HeaderMap::new();
        assert!(extract_token(&headers).is_err());
    }

    #[test]
    fn test_extract_token_invalid_format() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "InvalidFormat".parse().unwrap());

        assert!(extract_token(&headers).is_err());
    }

    #[test]
    fn test_super_admin_bypasses_permission_checks() {
        let ctx = context(Role::SuperAdmin, None);
        for permission in Permission::ALL {
            assert!(ctx.require_permission(*permission).is_ok());
        }
    }

    #[test]
    fn test_permission_check_enforced_for_other_roles() {
        let ctx = context(Role::StaffManager, Some(Uuid::new_v4()));
        assert!(ctx.require_permission(Permission::ManageStaff).is_ok());
        assert!(ctx.require_permission(Permission::ManageHospitals).is_err());
    }

    #[test]
    fn test_read_only_auditor_cannot_write() {
        let ctx = context(Role::ReadOnlyAuditor, None);
        assert!(ctx.require_write().is_err());

        let ctx = context(Role::HospitalAdmin, Some(Uuid::new_v4()));
        assert!(ctx.require_write().is_ok());
    }

    #[test]
    fn test_hospital_scope_enforced() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();

        let ctx = context(Role::HospitalAdmin, Some(own));
        assert!(ctx.require_hospital_scope(&own).is_ok());
        assert!(ctx.require_hospital_scope(&other).is_err());

        // Super admins are not hospital scoped
        let ctx = context(Role::SuperAdmin, None);
        assert!(ctx.require_hospital_scope(&other).is_ok());
    }

    #[test]
    fn test_role_check() {
        let ctx = context(Role::StaffManager, Some(Uuid::new_v4()));
        assert!(ctx.require_role(&[Role::SuperAdmin, Role::StaffManager]).is_ok());
        assert!(ctx.require_role(&[Role::SuperAdmin]).is_err());
    }
}
