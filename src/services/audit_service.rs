//! 审计服务：结构化操作日志
//! Writes are fire-and-forget; an audit failure must never fail the
//! operation it records.

use crate::{
    error::AppError,
    models::audit::{AuditAction, AuditLog, AuditLogFilters},
    repository::{audit_repo::NewAuditLog, AuditRepository},
};
use sqlx::PgPool;
use uuid::Uuid;

/// 请求级元数据，随审计记录一并落库
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 异步落库，不阻塞调用方，失败只记日志
    pub fn log(
        &self,
        action: AuditAction,
        admin_id: Uuid,
        hospital_id: Option<Uuid>,
        details: serde_json::Value,
        meta: &RequestMeta,
    ) {
        let db = self.db.clone();
        let meta = meta.clone();

        tokio::spawn(async move {
            let repo = AuditRepository::new(db);
            let entry = NewAuditLog {
                action: action.as_str(),
                admin_id,
                hospital_id,
                details,
                ip: meta.ip,
                user_agent: meta.user_agent,
            };

            if let Err(e) = repo.insert(entry).await {
                tracing::warn!(
                    action = action.as_str(),
                    %admin_id,
                    "Failed to write audit log: {}",
                    e
                );
            }
        });
    }

    /// 查询审计日志（分页）
    pub async fn query(
        &self,
        filters: &AuditLogFilters,
    ) -> Result<(Vec<AuditLog>, i64), AppError> {
        let repo = AuditRepository::new(self.db.clone());
        let logs = repo.list(filters).await?;
        let total = repo.count(filters).await?;
        Ok((logs, total))
    }
}
