//! Audit domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: Uuid,
    pub action: String,
    pub admin_id: Uuid,
    pub hospital_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 审计操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Login,
    UnlockAccount,
    CreateAdmin,

    CreateResource,
    UpdateResource,
    UpdateAvailability,
    DeleteResource,

    CreateStaff,
    UpdateStaff,
    DeleteStaff,

    CreateHospital,
    UpdateHospital,
    DeleteHospital,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::UnlockAccount => "UNLOCK_ACCOUNT",
            AuditAction::CreateAdmin => "CREATE_ADMIN",

            AuditAction::CreateResource => "CREATE_RESOURCE",
            AuditAction::UpdateResource => "UPDATE_RESOURCE",
            AuditAction::UpdateAvailability => "UPDATE_AVAILABILITY",
            AuditAction::DeleteResource => "DELETE_RESOURCE",

            AuditAction::CreateStaff => "CREATE_STAFF",
            AuditAction::UpdateStaff => "UPDATE_STAFF",
            AuditAction::DeleteStaff => "DELETE_STAFF",

            AuditAction::CreateHospital => "CREATE_HOSPITAL",
            AuditAction::UpdateHospital => "UPDATE_HOSPITAL",
            AuditAction::DeleteHospital => "DELETE_HOSPITAL",
        }
    }
}

/// Audit log query filters
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogFilters {
    pub action: Option<String>,
    pub admin_id: Option<Uuid>,
    pub hospital_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
