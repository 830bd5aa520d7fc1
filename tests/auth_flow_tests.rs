//! 认证流程集成测试：登录、锁定、刷新、重置
//! 需要测试数据库（TEST_DATABASE_URL），默认跳过

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": email, "password": password }),
    )
    .await
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_login_success_returns_token_pair() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    common::create_test_admin(&pool, "admin@example.com", "Secret1234", "super_admin", None).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();

    let (status, body) = login(&app, "admin@example.com", "Secret1234").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"]["accessToken"].is_string());
    assert!(body["data"]["refreshToken"].is_string());
    assert_eq!(body["data"]["admin"]["email"], "admin@example.com");
    // 密码哈希绝不能出现在响应中
    assert!(body["data"]["admin"].get("passwordHash").is_none());
    assert!(body["data"]["admin"].get("password_hash").is_none());
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_failed_logins_count_down_then_lock() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    common::create_test_admin(&pool, "lockme@example.com", "Secret1234", "super_admin", None).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();

    // 前四次失败：401，剩余次数递减
    for remaining in (1..=4).rev() {
        let (status, body) = login(&app, "lockme@example.com", "WrongPass1").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body["message"],
            format!("Invalid email or password. {} attempts remaining.", remaining)
        );
    }

    // 第五次失败：423，账户锁定
    let (status, body) = login(&app, "lockme@example.com", "WrongPass1").await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(
        body["message"],
        "Account locked due to 5 failed login attempts. Try again in 5 minutes."
    );

    // 锁定期间即使密码正确也拒绝
    let (status, body) = login(&app, "lockme@example.com", "Secret1234").await;
    assert_eq!(status, StatusCode::LOCKED);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Account is locked. Try again in"));
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_unknown_email_gets_generic_message() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();

    let (status, body) = login(&app, "nobody@example.com", "Whatever1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password.");
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_refresh_returns_new_access_token_only() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    common::create_test_admin(&pool, "admin@example.com", "Secret1234", "super_admin", None).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();

    let (_, body) = login(&app, "admin@example.com", "Secret1234").await;
    let refresh_token = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        &app,
        "/api/v1/auth/refresh",
        json!({ "refreshToken": refresh_token }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["accessToken"].is_string());
    // 刷新令牌不轮换，响应中不应包含新的刷新令牌
    assert!(body["data"].get("refreshToken").is_none());
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_refresh_with_garbage_token_is_rejected() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();

    let (status, body) = post_json(
        &app,
        "/api/v1/auth/refresh",
        json!({ "refreshToken": "not-a-jwt" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token");
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_refresh_tokens_capped_at_five_oldest_evicted() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    common::create_test_admin(&pool, "sessions@example.com", "Secret1234", "super_admin", None)
        .await;

    let app = hospital_admin_system::routes::create_router(config, pool.clone()).unwrap();

    // 连续登录六次，每次产生一个刷新令牌
    let mut tokens = Vec::new();
    for _ in 0..6 {
        let (status, body) = login(&app, "sessions@example.com", "Secret1234").await;
        assert_eq!(status, StatusCode::OK);
        tokens.push(body["data"]["refreshToken"].as_str().unwrap().to_string());
    }

    // 会话列表保留最近的五条
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_refresh_tokens")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 5);

    // 最早的令牌已被淘汰
    let (status, body) = post_json(
        &app,
        "/api/v1/auth/refresh",
        json!({ "refreshToken": tokens[0] }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token");

    // 最近的令牌仍然可用
    let (status, body) = post_json(
        &app,
        "/api/v1/auth/refresh",
        json!({ "refreshToken": tokens[5] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["accessToken"].is_string());
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_expired_stored_refresh_token_is_removed_on_refresh() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    common::create_test_admin(&pool, "stale@example.com", "Secret1234", "super_admin", None).await;

    let app = hospital_admin_system::routes::create_router(config, pool.clone()).unwrap();

    let (_, body) = login(&app, "stale@example.com", "Secret1234").await;
    let refresh_token = body["data"]["refreshToken"].as_str().unwrap().to_string();

    // 存储侧过期（JWT 本身仍然有效）
    sqlx::query("UPDATE admin_refresh_tokens SET expires_at = NOW() - interval '1 hour'")
        .execute(&pool)
        .await
        .unwrap();

    let (status, body) = post_json(
        &app,
        "/api/v1/auth/refresh",
        json!({ "refreshToken": refresh_token }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token");

    // 过期的残留记录被顺带清理
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_refresh_tokens")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_forgot_then_reset_password() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    common::create_test_admin(&pool, "reset@example.com", "Secret1234", "super_admin", None).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();

    let (status, body) = post_json(
        &app,
        "/api/v1/auth/forgot-password",
        json!({ "email": "reset@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["resetToken"].as_str().unwrap().to_string();

    let (status, _) = post_json(
        &app,
        "/api/v1/auth/reset-password",
        json!({ "token": token, "password": "NewSecret99" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 旧密码失效，新密码生效
    let (status, _) = login(&app, "reset@example.com", "Secret1234").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = login(&app, "reset@example.com", "NewSecret99").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_reset_token_is_single_use() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    common::create_test_admin(&pool, "reset@example.com", "Secret1234", "super_admin", None).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();

    let (_, body) = post_json(
        &app,
        "/api/v1/auth/forgot-password",
        json!({ "email": "reset@example.com" }),
    )
    .await;
    let token = body["data"]["resetToken"].as_str().unwrap().to_string();

    let (status, _) = post_json(
        &app,
        "/api/v1/auth/reset-password",
        json!({ "token": token, "password": "NewSecret99" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 同一令牌第二次使用必须失败
    let (status, body) = post_json(
        &app,
        "/api/v1/auth/reset-password",
        json!({ "token": token, "password": "OtherSecret7" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired reset token");
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_forgot_password_does_not_reveal_accounts() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();

    let (status, body) = post_json(
        &app,
        "/api/v1/auth/forgot-password",
        json!({ "email": "ghost@example.com" }),
    )
    .await;

    // 不存在的邮箱得到同样的 200 响应
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["resetToken"].is_null());
}
