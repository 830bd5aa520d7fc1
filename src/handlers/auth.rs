//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::{request_meta, AppState},
    models::admin::*,
    response::ApiResponse,
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    let response = state.auth_service.login(req, &meta).await?;

    Ok(ApiResponse::ok(response, "Login successful"))
}

/// 刷新访问令牌
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let response = state.auth_service.refresh_token(req).await?;

    Ok(ApiResponse::ok(response, "Token refreshed successfully"))
}

/// 登出。请求体可省略，省略时登出全部会话
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    body: Option<Json<LogoutRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();

    state.auth_service.logout(auth.admin_id, req).await?;

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "Logged out successfully",
    ))
}

/// 注册新管理员（仅超级管理员）
pub async fn register_admin(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    Json(req): Json<RegisterAdminRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_role(&[Role::SuperAdmin])?;
    req.validate()?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    let admin = state
        .auth_service
        .register_admin(req, auth.admin_id, &meta)
        .await?;

    Ok(ApiResponse::created(admin, "Admin registered successfully"))
}

/// 发起密码重置
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let response = state.auth_service.forgot_password(req).await?;

    Ok(ApiResponse::ok(response, "Password reset requested"))
}

/// 用重置令牌设置新密码
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    state.auth_service.reset_password(req).await?;

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "Password reset successful",
    ))
}

/// 当前登录账户信息
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let admin = state.auth_service.get_profile(auth.admin_id).await?;

    Ok(ApiResponse::ok(admin, "Profile retrieved successfully"))
}

/// 列出全部管理员（仅超级管理员）
pub async fn list_admins(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    auth.require_role(&[Role::SuperAdmin])?;

    let admins = state.auth_service.list_admins().await?;

    Ok(ApiResponse::ok(admins, "Admins retrieved successfully"))
}

/// 手动解锁账户（仅超级管理员）
pub async fn unlock_account(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    Path(admin_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_role(&[Role::SuperAdmin])?;

    let meta = request_meta(&headers, state.config.security.trust_proxy);
    let admin = state
        .auth_service
        .unlock_account(admin_id, auth.admin_id, &meta)
        .await?;

    Ok(ApiResponse::ok(admin, "Account unlocked successfully"))
}
