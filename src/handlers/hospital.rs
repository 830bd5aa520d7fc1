//! 医院相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::{request_meta, AppState},
    models::admin::Permission,
    models::hospital::*,
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
pub struct ListHospitalsQuery {
    #[serde(default)]
    pub include_inactive: bool,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// 创建医院
pub async fn create_hospital(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    Json(req): Json<CreateHospitalRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_write()?;
    auth.require_permission(Permission::ManageHospitals)?;
    req.validate()?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    let hospital = state
        .hospital_service
        .create(req, auth.admin_id, &meta)
        .await?;

    Ok(ApiResponse::created(hospital, "Hospital created successfully"))
}

/// 医院列表，分页返回
pub async fn list_hospitals(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(query): Query<ListHospitalsQuery>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_permission(Permission::ViewHospitals)?;

    let (page, limit, offset) = paginate(query.page, query.limit);
    let (hospitals, total) = state
        .hospital_service
        .list(query.include_inactive, limit, offset)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::json!({
            "hospitals": hospitals,
            "total": total,
            "page": page,
            "limit": limit,
        }),
        "Hospitals retrieved successfully",
    ))
}

/// 获取单个医院
pub async fn get_hospital(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_permission(Permission::ViewHospitals)?;

    let hospital = state.hospital_service.get(&id).await?;

    Ok(ApiResponse::ok(hospital, "Hospital retrieved successfully"))
}

/// 更新医院
pub async fn update_hospital(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateHospitalRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_write()?;
    auth.require_permission(Permission::ManageHospitals)?;
    req.validate()?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    let hospital = state
        .hospital_service
        .update(&id, req, auth.admin_id, &meta)
        .await?;

    Ok(ApiResponse::ok(hospital, "Hospital updated successfully"))
}

/// 停用医院
pub async fn delete_hospital(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_write()?;
    auth.require_permission(Permission::ManageHospitals)?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    state
        .hospital_service
        .delete(&id, auth.admin_id, &meta)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "Hospital deleted successfully",
    ))
}
