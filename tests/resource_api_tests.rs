//! 资源 API 集成测试：不变式、查重、权限
//! 需要测试数据库（TEST_DATABASE_URL），默认跳过

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

mod common;

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

async fn login_token(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["data"]["accessToken"].as_str().unwrap().to_string()
}

fn bed_payload(hospital_id: Uuid, total: i64, available: i64, occupied: i64) -> Value {
    json!({
        "hospitalId": hospital_id,
        "resourceType": "bed",
        "category": "general",
        "total": total,
        "available": available,
        "occupied": occupied,
    })
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_create_resource_and_derived_status() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    let hospital_id = common::create_test_hospital(&pool, "KHI1").await;
    common::create_test_admin(&pool, "super@example.com", "Secret1234", "super_admin", None).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();
    let token = login_token(&app, "super@example.com", "Secret1234").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/resources",
        Some(&token),
        Some(bed_payload(hospital_id, 100, 15, 85)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["availabilityPercentage"], 15);
    assert_eq!(body["data"]["status"], "critical");
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_count_invariant_rejected_on_create() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    let hospital_id = common::create_test_hospital(&pool, "KHI1").await;
    common::create_test_admin(&pool, "super@example.com", "Secret1234", "super_admin", None).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();
    let token = login_token(&app, "super@example.com", "Secret1234").await;

    // available + occupied + maintenance > total
    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/resources",
        Some(&token),
        Some(bed_payload(hospital_id, 10, 6, 5)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Sum of available, occupied, and maintenance cannot exceed total"
    );
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_duplicate_resource_is_conflict() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    let hospital_id = common::create_test_hospital(&pool, "KHI1").await;
    common::create_test_admin(&pool, "super@example.com", "Secret1234", "super_admin", None).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();
    let token = login_token(&app, "super@example.com", "Secret1234").await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/v1/resources",
        Some(&token),
        Some(bed_payload(hospital_id, 10, 5, 5)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/resources",
        Some(&token),
        Some(bed_payload(hospital_id, 20, 10, 10)),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "This resource type already exists for this hospital. Please update existing resource."
    );
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_availability_patch_validates_against_stored_total() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    let hospital_id = common::create_test_hospital(&pool, "KHI1").await;
    common::create_test_admin(&pool, "super@example.com", "Secret1234", "super_admin", None).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();
    let token = login_token(&app, "super@example.com", "Secret1234").await;

    let (_, body) = request(
        &app,
        "POST",
        "/api/v1/resources",
        Some(&token),
        Some(bed_payload(hospital_id, 10, 5, 5)),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // 合法的部分更新
    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/api/v1/resources/{}/availability", id),
        Some(&token),
        Some(json!({ "available": 2, "occupied": 8 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["available"], 2);
    assert_eq!(body["data"]["status"], "critical");

    // 超过已存储 total 的更新被拒绝
    let (status, _) = request(
        &app,
        "PATCH",
        &format!("/api/v1/resources/{}/availability", id),
        Some(&token),
        Some(json!({ "available": 11 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_hospital_admin_cannot_touch_other_hospital() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    let own = common::create_test_hospital(&pool, "KHI1").await;
    let other = common::create_test_hospital(&pool, "LHE1").await;
    common::create_test_admin(&pool, "ha@example.com", "Secret1234", "hospital_admin", Some(own))
        .await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();
    let token = login_token(&app, "ha@example.com", "Secret1234").await;

    // 本院可以创建
    let (status, _) = request(
        &app,
        "POST",
        "/api/v1/resources",
        Some(&token),
        Some(bed_payload(own, 10, 5, 5)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // 他院被拒绝
    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/resources",
        Some(&token),
        Some(bed_payload(other, 10, 5, 5)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "Access denied. You can only access your own hospital's data."
    );
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_hospital_admin_reads_are_scoped_to_own_hospital() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    let own = common::create_test_hospital(&pool, "KHI1").await;
    let other = common::create_test_hospital(&pool, "LHE1").await;
    let admin_id =
        common::create_test_admin(&pool, "ha@example.com", "Secret1234", "hospital_admin", Some(own))
            .await;
    let own_resource = common::create_test_resource(&pool, own, "bed", "general", admin_id).await;
    let other_resource =
        common::create_test_resource(&pool, other, "bed", "general", admin_id).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();
    let token = login_token(&app, "ha@example.com", "Secret1234").await;

    // 列表静默限定为本院资源
    let (status, body) = request(&app, "GET", "/api/v1/resources", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let resources = body["data"]["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["id"], own_resource.to_string());

    // 读取他院资源被拒绝
    let (status, body) = request(
        &app,
        "GET",
        &format!("/api/v1/resources/{}", other_resource),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "Access denied. You can only access your own hospital's data."
    );

    // 他院资源列表同样被拒绝
    let (status, _) = request(
        &app,
        "GET",
        &format!("/api/v1/resources/hospital/{}", other),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_resource_list_is_paginated() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    let hospital_id = common::create_test_hospital(&pool, "KHI1").await;
    let admin_id =
        common::create_test_admin(&pool, "super@example.com", "Secret1234", "super_admin", None)
            .await;
    common::create_test_resource(&pool, hospital_id, "bed", "general", admin_id).await;
    common::create_test_resource(&pool, hospital_id, "bed", "icu", admin_id).await;
    common::create_test_resource(&pool, hospital_id, "ventilator", "icu", admin_id).await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();
    let token = login_token(&app, "super@example.com", "Secret1234").await;

    let (status, body) = request(
        &app,
        "GET",
        "/api/v1/resources?page=1&limit=2",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["resources"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["limit"], 2);

    // 第二页拿到剩余的一条
    let (status, body) = request(
        &app,
        "GET",
        "/api/v1/resources?page=2&limit=2",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["resources"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["total"], 3);

    // 类型过滤与分页组合
    let (status, body) = request(
        &app,
        "GET",
        "/api/v1/resources?type=bed&limit=50",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["resources"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_read_only_auditor_cannot_write() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    let hospital_id = common::create_test_hospital(&pool, "KHI1").await;
    common::create_test_admin(&pool, "auditor@example.com", "Secret1234", "read_only_auditor", None)
        .await;

    let app = hospital_admin_system::routes::create_router(config, pool).unwrap();
    let token = login_token(&app, "auditor@example.com", "Secret1234").await;

    // 读可以
    let (status, _) = request(&app, "GET", "/api/v1/resources", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // 写被拒绝
    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/resources",
        Some(&token),
        Some(bed_payload(hospital_id, 10, 5, 5)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "Read-only auditors cannot perform write operations."
    );
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_writes_produce_audit_entries() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    common::truncate_all(&pool).await;

    let hospital_id = common::create_test_hospital(&pool, "KHI1").await;
    common::create_test_admin(&pool, "super@example.com", "Secret1234", "super_admin", None).await;

    let app = hospital_admin_system::routes::create_router(config, pool.clone()).unwrap();
    let token = login_token(&app, "super@example.com", "Secret1234").await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/v1/resources",
        Some(&token),
        Some(bed_payload(hospital_id, 10, 5, 5)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // 审计写入是异步的，稍等片刻
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs WHERE action = 'CREATE_RESOURCE'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}
