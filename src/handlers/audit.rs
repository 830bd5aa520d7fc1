//! 审计日志查询处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::admin::Permission,
    models::audit::AuditLogFilters,
    response::ApiResponse,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use std::sync::Arc;

/// 查询审计日志（需要 view_logs 权限）
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(mut filters): Query<AuditLogFilters>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_permission(Permission::ViewLogs)?;

    // 医院级角色只能看到本院的记录
    if auth.role.is_hospital_scoped() {
        filters.hospital_id = auth.hospital_id;
    }

    let (logs, total) = state.audit_service.query(&filters).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({
            "logs": logs,
            "total": total,
            "page": filters.page.unwrap_or(1),
            "limit": filters.limit.unwrap_or(50),
        }),
        "Audit logs retrieved successfully",
    ))
}
