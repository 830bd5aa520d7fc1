//! 资源相关的 HTTP 处理器
//! Write access requires the manage_resources permission and, for
//! hospital-scoped roles, ownership of the target hospital.

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::{request_meta, AppState},
    models::admin::Permission,
    models::resource::*,
    response::ApiResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ListResourcesQuery {
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// (page, limit, offset)，limit 限制在 1..=200
pub(crate) fn paginate(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let limit = limit.unwrap_or(50).clamp(1, 200);
    let page = page.unwrap_or(1).max(1);
    (page, limit, (page - 1) * limit)
}

fn require_hospital_write(auth: &AuthContext, hospital_id: &Uuid) -> Result<(), AppError> {
    auth.require_write()?;
    auth.require_permission(Permission::ManageResources)?;
    if auth.role.is_hospital_scoped() {
        auth.require_hospital_scope(hospital_id)?;
    }
    Ok(())
}

/// 创建资源
pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    Json(req): Json<CreateResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    require_hospital_write(&auth, &req.hospital_id)?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    let resource = state
        .resource_service
        .create(req, auth.admin_id, &meta)
        .await?;

    Ok(ApiResponse::created(resource, "Resource created successfully"))
}

/// 资源列表，可按类型过滤，分页返回。
/// 医院级角色静默限定为本院资源
pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(query): Query<ListResourcesQuery>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_permission(Permission::ViewResources)?;

    let scope = if auth.role.is_hospital_scoped() {
        auth.hospital_id
    } else {
        None
    };

    let (page, limit, offset) = paginate(query.page, query.limit);
    let (resources, total) = state
        .resource_service
        .list(query.resource_type.as_deref(), scope.as_ref(), limit, offset)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::json!({
            "resources": resources,
            "total": total,
            "page": page,
            "limit": limit,
        }),
        "Resources retrieved successfully",
    ))
}

/// 获取单个资源。读取同样受医院归属限制
pub async fn get_resource(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_permission(Permission::ViewResources)?;

    let resource = state.resource_service.get(&id).await?;
    if auth.role.is_hospital_scoped() {
        auth.require_hospital_scope(&resource.hospital_id)?;
    }

    Ok(ApiResponse::ok(resource, "Resource retrieved successfully"))
}

/// 某医院的全部资源
pub async fn list_hospital_resources(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(hospital_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_permission(Permission::ViewResources)?;
    if auth.role.is_hospital_scoped() {
        auth.require_hospital_scope(&hospital_id)?;
    }

    let resources = state.resource_service.list_by_hospital(&hospital_id).await?;

    Ok(ApiResponse::ok(resources, "Resources retrieved successfully"))
}

/// 全量更新资源
pub async fn update_resource(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    // 归属校验基于已存储的医院，而不是请求中的值
    let existing = state.resource_service.get(&id).await?;
    require_hospital_write(&auth, &existing.hospital_id)?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    let resource = state
        .resource_service
        .update(&id, req, auth.admin_id, &meta)
        .await?;

    Ok(ApiResponse::ok(resource, "Resource updated successfully"))
}

/// 调整可用性计数
pub async fn update_availability(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAvailabilityRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let existing = state.resource_service.get(&id).await?;
    require_hospital_write(&auth, &existing.hospital_id)?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    let resource = state
        .resource_service
        .update_availability(&id, req, auth.admin_id, &meta)
        .await?;

    Ok(ApiResponse::ok(resource, "Availability updated successfully"))
}

/// 删除资源
pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let existing = state.resource_service.get(&id).await?;
    require_hospital_write(&auth, &existing.hospital_id)?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    state
        .resource_service
        .delete(&id, auth.admin_id, &meta)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "Resource deleted successfully",
    ))
}
