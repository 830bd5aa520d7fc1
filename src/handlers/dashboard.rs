//! 仪表盘处理器：跨表汇总

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::admin::Permission,
    repository::{HospitalRepository, ResourceRepository, StaffRepository},
    response::ApiResponse,
};
use axum::{extract::State, response::IntoResponse};
use std::sync::Arc;

/// 总览：医院数、在职人员数、按类型汇总的资源
pub async fn overview(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    auth.require_permission(Permission::ViewAnalytics)?;

    // 医院级账号只统计本院数据
    let scope = if auth.role.is_hospital_scoped() {
        auth.hospital_id
    } else {
        None
    };

    let hospital_repo = HospitalRepository::new(state.db.clone());
    let staff_repo = StaffRepository::new(state.db.clone());
    let resource_repo = ResourceRepository::new(state.db.clone());

    let hospitals = match scope {
        Some(_) => 1,
        None => hospital_repo.count_active().await?,
    };
    let staff = staff_repo.count_active(scope.as_ref()).await?;
    let staff_by_role = staff_repo.count_by_role(scope.as_ref()).await?;
    let resources = resource_repo.summarize_by_type(scope.as_ref()).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({
            "hospitals": hospitals,
            "staff": staff,
            "staffByRole": staff_by_role,
            "resources": resources,
        }),
        "Dashboard overview retrieved successfully",
    ))
}

/// 资源汇总视图
pub async fn resources(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    auth.require_permission(Permission::ViewAnalytics)?;

    let scope = if auth.role.is_hospital_scoped() {
        auth.hospital_id
    } else {
        None
    };

    let resource_repo = ResourceRepository::new(state.db.clone());
    let summaries = resource_repo.summarize_by_type(scope.as_ref()).await?;

    Ok(ApiResponse::ok(
        summaries,
        "Resource summary retrieved successfully",
    ))
}
