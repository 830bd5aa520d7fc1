//! Administrator domain models
//! Roles and permissions are closed enums; the role -> default permission
//! mapping is a pure lookup table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

/// Administrator role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    HospitalAdmin,
    StaffManager,
    ReadOnlyAuditor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::HospitalAdmin => "hospital_admin",
            Role::StaffManager => "staff_manager",
            Role::ReadOnlyAuditor => "read_only_auditor",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "super_admin" => Some(Role::SuperAdmin),
            "hospital_admin" => Some(Role::HospitalAdmin),
            "staff_manager" => Some(Role::StaffManager),
            "read_only_auditor" => Some(Role::ReadOnlyAuditor),
            _ => None,
        }
    }

    /// 角色的默认权限集合
    pub fn default_permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::SuperAdmin => Permission::ALL,
            Role::HospitalAdmin => &[
                ManageStaff,
                ManageResources,
                ViewUsers,
                ViewAnalytics,
                ViewStaff,
                ViewResources,
                ViewHospitals,
                ViewFeedback,
                ManageShifts,
            ],
            Role::StaffManager => &[
                ManageStaff,
                ManageShifts,
                ViewStaff,
                ViewResources,
                ViewHospitals,
            ],
            Role::ReadOnlyAuditor => &[
                ViewStaff,
                ViewResources,
                ViewHospitals,
                ViewFeedback,
                ViewLogs,
                ViewAnalytics,
            ],
        }
    }

    /// 是否为绑定到单个医院的角色
    pub fn is_hospital_scoped(&self) -> bool {
        matches!(self, Role::HospitalAdmin | Role::StaffManager)
    }
}

/// Administrator permission
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageHospitals,
    ManageStaff,
    ManageResources,
    ViewUsers,
    ManageUsers,
    ViewAnalytics,
    ViewStaff,
    ViewResources,
    ViewHospitals,
    ViewFeedback,
    ViewLogs,
    ManageShifts,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::ManageHospitals,
        Permission::ManageStaff,
        Permission::ManageResources,
        Permission::ViewUsers,
        Permission::ManageUsers,
        Permission::ViewAnalytics,
        Permission::ViewStaff,
        Permission::ViewResources,
        Permission::ViewHospitals,
        Permission::ViewFeedback,
        Permission::ViewLogs,
        Permission::ManageShifts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageHospitals => "manage_hospitals",
            Permission::ManageStaff => "manage_staff",
            Permission::ManageResources => "manage_resources",
            Permission::ViewUsers => "view_users",
            Permission::ManageUsers => "manage_users",
            Permission::ViewAnalytics => "view_analytics",
            Permission::ViewStaff => "view_staff",
            Permission::ViewResources => "view_resources",
            Permission::ViewHospitals => "view_hospitals",
            Permission::ViewFeedback => "view_feedback",
            Permission::ViewLogs => "view_logs",
            Permission::ManageShifts => "manage_shifts",
        }
    }

    pub fn parse(s: &str) -> Option<Permission> {
        Permission::ALL.iter().copied().find(|p| p.as_str() == s)
    }
}

/// Administrator account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,

    // Authorization
    pub role: String,
    pub hospital_id: Option<Uuid>,
    /// Explicit grants beyond the role defaults
    pub permissions: Vec<String>,

    // Account state
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,

    // Lockout policy
    pub failed_login_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,

    // Password reset (one-way hash of the raw token, never the raw value)
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    /// 解析存储的角色；未知角色降级为只读审计员
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::ReadOnlyAuditor)
    }

    /// 账户当前是否处于锁定状态
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.lock_until, Some(until) if until > now)
    }

    /// 锁定剩余分钟数（向上取整）
    pub fn lock_remaining_minutes(&self, now: DateTime<Utc>) -> i64 {
        match self.lock_until {
            Some(until) if until > now => {
                let secs = (until - now).num_seconds();
                (secs + 59) / 60
            }
            _ => 0,
        }
    }

    /// 有效权限集合：super_admin 拥有全部权限，
    /// 其他角色为默认权限与显式授权的并集
    pub fn resolved_permissions(&self) -> HashSet<Permission> {
        let role = self.role();
        if role == Role::SuperAdmin {
            return Permission::ALL.iter().copied().collect();
        }

        let mut set: HashSet<Permission> = role.default_permissions().iter().copied().collect();
        for raw in &self.permissions {
            if let Some(p) = Permission::parse(raw) {
                set.insert(p);
            }
        }
        set
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Logout request; omitting the token logs out every device
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// Register admin request (super admin only)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdminRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Last name is required"))]
    pub last_name: String,
    pub role: Role,
    pub hospital_id: Option<Uuid>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// Forgot password request
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

/// Reset password request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Admin response (password and refresh sessions stripped)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub hospital_id: Option<Uuid>,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            first_name: admin.first_name,
            last_name: admin.last_name,
            role: admin.role,
            hospital_id: admin.hospital_id,
            permissions: admin.permissions,
            is_active: admin.is_active,
            last_login: admin.last_login,
            created_at: admin.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_admin(role: &str) -> Admin {
        Admin {
            id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "Admin".to_string(),
            role: role.to_string(),
            hospital_id: None,
            permissions: vec![],
            is_active: true,
            last_login: None,
            failed_login_attempts: 0,
            lock_until: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_round_trip() {
        for role in [
            Role::SuperAdmin,
            Role::HospitalAdmin,
            Role::StaffManager,
            Role::ReadOnlyAuditor,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("intruder"), None);
    }

    #[test]
    fn test_super_admin_has_every_permission() {
        let admin = test_admin("super_admin");
        let resolved = admin.resolved_permissions();
        for p in Permission::ALL {
            assert!(resolved.contains(p), "missing {:?}", p);
        }
    }

    #[test]
    fn test_role_defaults_mirror_permission_table() {
        let admin = test_admin("staff_manager");
        let resolved = admin.resolved_permissions();
        assert!(resolved.contains(&Permission::ManageStaff));
        assert!(resolved.contains(&Permission::ManageShifts));
        assert!(!resolved.contains(&Permission::ManageResources));
        assert!(!resolved.contains(&Permission::ViewLogs));
    }

    #[test]
    fn test_explicit_grants_extend_role_defaults() {
        let mut admin = test_admin("staff_manager");
        admin.permissions = vec!["view_logs".to_string(), "bogus_permission".to_string()];
        let resolved = admin.resolved_permissions();
        assert!(resolved.contains(&Permission::ViewLogs));
        // 未知权限字符串被忽略
        assert_eq!(
            resolved.len(),
            Role::StaffManager.default_permissions().len() + 1
        );
    }

    #[test]
    fn test_unknown_role_degrades_to_read_only() {
        let admin = test_admin("garbage_role");
        assert_eq!(admin.role(), Role::ReadOnlyAuditor);
    }

    #[test]
    fn test_lockout_window() {
        let now = Utc::now();
        let mut admin = test_admin("hospital_admin");

        assert!(!admin.is_locked(now));
        assert_eq!(admin.lock_remaining_minutes(now), 0);

        admin.lock_until = Some(now + Duration::minutes(30));
        assert!(admin.is_locked(now));
        assert_eq!(admin.lock_remaining_minutes(now), 30);

        // 锁定到期后视为解锁（懒惰转换，由登录路径清理计数器）
        admin.lock_until = Some(now - Duration::seconds(1));
        assert!(!admin.is_locked(now));
        assert_eq!(admin.lock_remaining_minutes(now), 0);
    }

    #[test]
    fn test_lock_remaining_minutes_rounds_up() {
        let now = Utc::now();
        let mut admin = test_admin("hospital_admin");
        admin.lock_until = Some(now + Duration::seconds(61));
        assert_eq!(admin.lock_remaining_minutes(now), 2);
    }
}
