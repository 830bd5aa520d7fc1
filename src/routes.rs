//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
    auth::JwtService,
    config::AppConfig,
    error::AppError,
    handlers,
    middleware::{AppState, IpRateLimiter},
    realtime::EventBus,
    services::{AuditService, AuthService, HospitalService, ResourceService, StaffService},
};

/// 创建应用路由
pub fn create_router(config: AppConfig, db: sqlx::PgPool) -> Result<Router, AppError> {
    // 创建所有服务
    let jwt_service = Arc::new(JwtService::from_config(&config)?);
    let shared_config = Arc::new(config.clone());

    let audit_service = Arc::new(AuditService::new(db.clone()));

    let auth_service = Arc::new(AuthService::new(
        db.clone(),
        jwt_service.clone(),
        shared_config,
        audit_service.clone(),
    ));

    // 创建事件总线（资源变更推送）
    let event_bus = EventBus::new(1000);

    let hospital_service = Arc::new(HospitalService::new(db.clone(), audit_service.clone()));
    let resource_service = Arc::new(ResourceService::new(
        db.clone(),
        audit_service.clone(),
        event_bus.clone(),
    ));
    let staff_service = Arc::new(StaffService::new(db.clone(), audit_service.clone()));

    // 登录限流：滑动窗口，账户锁定策略之外的第一道防线
    let login_limiter = Arc::new(IpRateLimiter::new(Duration::from_secs(60), 20));

    let state = Arc::new(AppState {
        config,
        db,
        jwt_service,
        auth_service,
        hospital_service,
        resource_service,
        staff_service,
        audit_service,
        event_bus,
        login_limiter,
    });

    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 登录端点单独应用限流
    let login_routes = Router::new()
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::login_rate_limit_middleware,
        ));

    // 无需认证的认证路由
    let auth_routes = Router::new()
        .route("/api/v1/auth/refresh", post(handlers::auth::refresh_token))
        .route(
            "/api/v1/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/api/v1/auth/reset-password",
            post(handlers::auth::reset_password),
        );

    // 需要认证的路由
    let authenticated_routes = Router::new()
        // 当前账户
        .route("/api/v1/auth/me", get(handlers::auth::get_profile))
        .route("/api/v1/auth/logout", post(handlers::auth::logout))

        // 管理员管理（超级管理员）
        .route("/api/v1/auth/admins", get(handlers::auth::list_admins))
        .route("/api/v1/auth/register", post(handlers::auth::register_admin))
        .route(
            "/api/v1/auth/unlock/{id}",
            post(handlers::auth::unlock_account),
        )

        // 医院
        .route(
            "/api/v1/hospitals",
            get(handlers::hospital::list_hospitals).post(handlers::hospital::create_hospital),
        )
        .route(
            "/api/v1/hospitals/{id}",
            get(handlers::hospital::get_hospital)
                .put(handlers::hospital::update_hospital)
                .delete(handlers::hospital::delete_hospital),
        )

        // 资源
        .route(
            "/api/v1/resources",
            get(handlers::resource::list_resources).post(handlers::resource::create_resource),
        )
        .route(
            "/api/v1/resources/{id}",
            get(handlers::resource::get_resource)
                .put(handlers::resource::update_resource)
                .delete(handlers::resource::delete_resource),
        )
        .route(
            "/api/v1/resources/{id}/availability",
            axum::routing::patch(handlers::resource::update_availability),
        )
        .route(
            "/api/v1/resources/hospital/{id}",
            get(handlers::resource::list_hospital_resources),
        )

        // 人员
        .route(
            "/api/v1/staff",
            get(handlers::staff::list_staff).post(handlers::staff::create_staff),
        )
        .route(
            "/api/v1/staff/{id}",
            get(handlers::staff::get_staff)
                .put(handlers::staff::update_staff)
                .delete(handlers::staff::delete_staff),
        )
        .route(
            "/api/v1/staff/hospital/{id}",
            get(handlers::staff::list_hospital_staff),
        )

        // 审计日志
        .route("/api/v1/logs", get(handlers::audit::list_audit_logs))

        // 仪表盘
        .route("/api/v1/dashboard/overview", get(handlers::dashboard::overview))
        .route("/api/v1/dashboard/resources", get(handlers::dashboard::resources))

        // 实时事件流（SSE）
        .route(
            "/api/v1/stream/hospitals/{id}",
            get(handlers::stream::subscribe_hospital_events),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::middleware::auth_middleware,
        ));

    // 组合所有路由
    let router = Router::new()
        .merge(public_routes)
        .merge(login_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(
                    crate::middleware::request_tracking_middleware,
                ))
                // 请求体上限 1MB
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state);

    Ok(router)
}
