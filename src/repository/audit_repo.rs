//! Audit log repository (审计日志数据访问)
//! Append-only; entries are never updated or deleted.

use crate::{
    error::AppError,
    models::audit::{AuditLog, AuditLogFilters},
};
use sqlx::PgPool;
use uuid::Uuid;

pub struct AuditRepository {
    db: PgPool,
}

pub struct NewAuditLog<'a> {
    pub action: &'a str,
    pub admin_id: Uuid,
    pub hospital_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn insert(&self, entry: NewAuditLog<'_>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (action, admin_id, hospital_id, details, ip, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.action)
        .bind(entry.admin_id)
        .bind(entry.hospital_id)
        .bind(&entry.details)
        .bind(&entry.ip)
        .bind(&entry.user_agent)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 分页查询，最新的在前
    pub async fn list(&self, filters: &AuditLogFilters) -> Result<Vec<AuditLog>, AppError> {
        let limit = filters.limit.unwrap_or(50).clamp(1, 500);
        let page = filters.page.unwrap_or(1).max(1);
        let offset = (page - 1) * limit;

        let logs = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT * FROM audit_logs
            WHERE ($1::text IS NULL OR action = $1)
                AND ($2::uuid IS NULL OR admin_id = $2)
                AND ($3::uuid IS NULL OR hospital_id = $3)
                AND ($4::timestamptz IS NULL OR created_at >= $4)
                AND ($5::timestamptz IS NULL OR created_at <= $5)
            ORDER BY created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(&filters.action)
        .bind(filters.admin_id)
        .bind(filters.hospital_id)
        .bind(filters.start_time)
        .bind(filters.end_time)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }

    pub async fn count(&self, filters: &AuditLogFilters) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM audit_logs
            WHERE ($1::text IS NULL OR action = $1)
                AND ($2::uuid IS NULL OR admin_id = $2)
                AND ($3::uuid IS NULL OR hospital_id = $3)
                AND ($4::timestamptz IS NULL OR created_at >= $4)
                AND ($5::timestamptz IS NULL OR created_at <= $5)
            "#,
        )
        .bind(&filters.action)
        .bind(filters.admin_id)
        .bind(filters.hospital_id)
        .bind(filters.start_time)
        .bind(filters.end_time)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }
}
