//! 人员相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::{request_meta, AppState},
    models::admin::Permission,
    models::staff::*,
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

use super::resource::paginate;

#[derive(Debug, Default, Deserialize)]
pub struct ListStaffQuery {
    pub hospital_id: Option<Uuid>,
    pub role: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

fn require_staff_write(auth: &AuthContext, hospital_id: &Uuid) -> Result<(), AppError> {
    auth.require_write()?;
    auth.require_permission(Permission::ManageStaff)?;
    if auth.role.is_hospital_scoped() {
        auth.require_hospital_scope(hospital_id)?;
    }
    Ok(())
}

/// 创建员工
pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    Json(req): Json<CreateStaffRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    require_staff_write(&auth, &req.hospital_id)?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    let staff = state.staff_service.create(req, auth.admin_id, &meta).await?;

    Ok(ApiResponse::created(staff, "Staff member created successfully"))
}

/// 员工列表，可按医院和角色过滤，分页返回。
/// 医院级角色静默限定为本院员工
pub async fn list_staff(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(query): Query<ListStaffQuery>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_permission(Permission::ViewStaff)?;

    let hospital_filter = if auth.role.is_hospital_scoped() {
        auth.hospital_id
    } else {
        query.hospital_id
    };

    let (page, limit, offset) = paginate(query.page, query.limit);
    let (staff, total) = state
        .staff_service
        .list(hospital_filter.as_ref(), query.role.as_deref(), limit, offset)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::json!({
            "staff": staff,
            "total": total,
            "page": page,
            "limit": limit,
        }),
        "Staff retrieved successfully",
    ))
}

/// 某医院的全部员工
pub async fn list_hospital_staff(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(hospital_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_permission(Permission::ViewStaff)?;
    if auth.role.is_hospital_scoped() {
        auth.require_hospital_scope(&hospital_id)?;
    }

    let staff = state.staff_service.list_by_hospital(&hospital_id).await?;

    Ok(ApiResponse::ok(staff, "Staff retrieved successfully"))
}

/// 获取单个员工。读取同样受医院归属限制
pub async fn get_staff(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_permission(Permission::ViewStaff)?;

    let staff = state.staff_service.get(&id).await?;
    if auth.role.is_hospital_scoped() {
        auth.require_hospital_scope(&staff.hospital_id)?;
    }

    Ok(ApiResponse::ok(staff, "Staff member retrieved successfully"))
}

/// 更新员工
pub async fn update_staff(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStaffRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let existing = state.staff_service.get(&id).await?;
    require_staff_write(&auth, &existing.hospital_id)?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    let staff = state
        .staff_service
        .update(&id, req, auth.admin_id, &meta)
        .await?;

    Ok(ApiResponse::ok(staff, "Staff member updated successfully"))
}

/// 停用员工
pub async fn delete_staff(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let existing = state.staff_service.get(&id).await?;
    require_staff_write(&auth, &existing.hospital_id)?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    state.staff_service.delete(&id, auth.admin_id, &meta).await?;

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "Staff member deleted successfully",
    ))
}
