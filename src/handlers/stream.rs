//! SSE 订阅处理器
//! 客户端按医院订阅资源变更事件流

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::admin::Permission,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// 订阅某医院的资源事件流（SSE）
pub async fn subscribe_hospital_events(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(hospital_id): Path<Uuid>,
) -> Result<Response, AppError> {
    auth.require_permission(Permission::ViewResources)?;

    // 医院级角色只能订阅本院
    if auth.role.is_hospital_scoped() {
        auth.require_hospital_scope(&hospital_id)?;
    }

    let stream = state
        .event_bus
        .subscribe_to_hospital(hospital_id)
        .to_sse_stream()
        .await?;

    let body = axum::body::Body::from_stream(stream);

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/event-stream")
        .header("Cache-Control", "no-cache")
        .header("Connection", "keep-alive")
        .header("X-Accel-Buffering", "no") // 禁用nginx缓冲
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to create SSE response: {}", e)))
}
