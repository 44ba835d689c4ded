use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web::Data};
use chrono::NaiveDate;
use serde_json::{Value, json};

use hrm_service::access::RoleBasedAccess;
use hrm_service::clock::FixedClock;
use hrm_service::config::Config;
use hrm_service::model::role::Role;
use hrm_service::model::user::{Department, NewUser, User};
use hrm_service::routes::{self, Limiters};
use hrm_service::service::{Policy, Services, Stores};

const PASSWORD: &str = "correct-horse";

fn config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: "test-secret".into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        rate_login_per_min: 600,
        rate_refresh_per_min: 600,
        rate_protected_per_min: 6000,
        api_prefix: "/api/v1".into(),
        db_max_connections: 1,
        run_migrations: false,
        log_dir: "logs".into(),
        half_day_threshold_minutes: 240,
        allow_cancel_approved_leave: true,
    }
}

fn services() -> Services {
    let now = NaiveDate::from_ymd_opt(2025, 6, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    Services::new(
        Stores::in_memory(),
        Arc::new(FixedClock::new(now)),
        Arc::new(RoleBasedAccess),
        Policy::default(),
    )
}

async fn seed(services: &Services, code: &str, role: Role, manager_id: Option<u64>) -> User {
    services
        .users
        .create_user(NewUser {
            employee_id: code.into(),
            first_name: code.into(),
            last_name: "Tester".into(),
            email: format!("{}@example.com", code.to_lowercase()),
            password: PASSWORD.into(),
            phone: None,
            role,
            department: Department::Engineering,
            manager_id,
            position: None,
            base_salary: 3000.0,
            hire_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
        .await
        .unwrap()
}

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

macro_rules! app {
    ($services:expr) => {{
        let config = config();
        let limiters = Limiters::new(&config);
        test::init_service(
            App::new()
                .app_data(Data::new($services.clone()))
                .app_data(Data::new(config.clone()))
                .configure(|cfg| routes::configure(cfg, &config, &limiters)),
        )
        .await
    }};
}

macro_rules! login {
    ($app:expr, $email:expr) => {{
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .peer_addr(peer())
            .set_json(json!({ "email": $email, "password": PASSWORD }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body["access_token"].as_str().unwrap().to_string()
    }};
}

fn get(uri: &str, token: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri(uri)
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {}", token)))
}

fn post(uri: &str, token: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {}", token)))
}

fn put(uri: &str, token: &str) -> test::TestRequest {
    test::TestRequest::put()
        .uri(uri)
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {}", token)))
}

#[actix_web::test]
async fn login_rejects_bad_password_and_missing_token() {
    let services = services();
    seed(&services, "EMP-1", Role::Employee, None).await;
    let app = app!(services);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr(peer())
        .set_json(json!({ "email": "emp-1@example.com", "password": "wrong-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get().uri("/api/v1/me").peer_addr(peer()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let token = login!(app, "EMP-1@example.com");
    let me: Value = test::call_and_read_body_json(&app, get("/api/v1/me", &token).to_request()).await;
    assert_eq!(me["employee_id"], "EMP-1");
    assert!(me.get("password_hash").is_none());
}

#[actix_web::test]
async fn refresh_requires_a_refresh_token() {
    let services = services();
    seed(&services, "EMP-1", Role::Employee, None).await;
    let app = app!(services);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr(peer())
        .set_json(json!({ "email": "emp-1@example.com", "password": PASSWORD }))
        .to_request();
    let tokens: Value = test::call_and_read_body_json(&app, req).await;
    let access = tokens["access_token"].as_str().unwrap();
    let refresh = tokens["refresh_token"].as_str().unwrap();

    let resp = test::call_service(&app, post("/auth/refresh", access).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, post("/auth/refresh", refresh).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // a refresh token is not an access token
    let resp = test::call_service(&app, get("/api/v1/me", refresh).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn punch_in_twice_is_a_bad_request() {
    let services = services();
    seed(&services, "EMP-1", Role::Employee, None).await;
    let app = app!(services);
    let token = login!(app, "emp-1@example.com");

    let req = post("/api/v1/attendance/punch-in", &token)
        .set_json(json!({ "location": "Head office" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, post("/api/v1/attendance/punch-in", &token).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "already punched in today");

    let today: Value = test::call_and_read_body_json(&app, get("/api/v1/attendance/today", &token).to_request()).await;
    assert_eq!(today["status"], "PRESENT");
}

#[actix_web::test]
async fn employees_cannot_use_hr_endpoints() {
    let services = services();
    let employee = seed(&services, "EMP-1", Role::Employee, None).await;
    seed(&services, "HR-1", Role::Hr, None).await;
    let app = app!(services);
    let token = login!(app, "emp-1@example.com");
    let hr = login!(app, "hr-1@example.com");

    let resp = test::call_service(&app, get("/api/v1/users", &token).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let mark = json!({ "user_id": employee.id, "date": "2025-06-02" });
    let req = post("/api/v1/attendance/absent", &token).set_json(&mark).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = post("/api/v1/attendance/absent", &hr).set_json(&mark).to_request();
    let record: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(record["status"], "ABSENT");

    let users: Value = test::call_and_read_body_json(&app, get("/api/v1/users", &hr).to_request()).await;
    assert_eq!(users["total"], 2);
}

#[actix_web::test]
async fn manager_approves_a_reports_leave() {
    let services = services();
    let boss = seed(&services, "MGR-1", Role::Manager, None).await;
    seed(&services, "EMP-1", Role::Employee, Some(boss.id)).await;
    seed(&services, "EMP-2", Role::Employee, None).await;
    let app = app!(services);
    let employee = login!(app, "emp-1@example.com");
    let manager = login!(app, "mgr-1@example.com");
    let stranger = login!(app, "emp-2@example.com");

    let req = post("/api/v1/leave", &employee)
        .set_json(json!({
            "start_date": "2025-06-10",
            "end_date": "2025-06-12",
            "leave_type": "ANNUAL",
            "reason": "family visit"
        }))
        .to_request();
    let leave: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(leave["status"], "PENDING");
    let id = leave["id"].as_u64().unwrap();

    let uri = format!("/api/v1/leave/{}", id);
    let resp = test::call_service(&app, get(&uri, &stranger).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let approve = format!("/api/v1/leave/{}/approve", id);
    let resp = test::call_service(&app, put(&approve, &employee).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let leave: Value = test::call_and_read_body_json(&app, put(&approve, &manager).to_request()).await;
    assert_eq!(leave["status"], "APPROVED");

    let resp = test::call_service(&app, put(&approve, &manager).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn manager_reads_department_records_listed_for_them() {
    let services = services();
    seed(&services, "MGR-1", Role::Manager, None).await;
    seed(&services, "EMP-1", Role::Employee, None).await;
    let app = app!(services);
    let manager = login!(app, "mgr-1@example.com");
    let colleague = login!(app, "emp-1@example.com");

    let req = post("/api/v1/attendance/punch-in", &colleague).to_request();
    let record: Value = test::call_and_read_body_json(&app, req).await;
    let id = record["id"].as_u64().unwrap();

    let listed: Value = test::call_and_read_body_json(
        &app,
        get("/api/v1/attendance/department/ENGINEERING/2025-06-02", &manager).to_request(),
    )
    .await;
    assert_eq!(listed[0]["id"], id);

    let uri = format!("/api/v1/attendance/{}", id);
    let resp = test::call_service(&app, get(&uri, &manager).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let other = get("/api/v1/attendance/department/SALES/2025-06-02", &manager).to_request();
    let resp = test::call_service(&app, other).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn overlong_mark_reason_is_a_bad_request() {
    let services = services();
    let employee = seed(&services, "EMP-1", Role::Employee, None).await;
    seed(&services, "HR-1", Role::Hr, None).await;
    let app = app!(services);
    let hr = login!(app, "hr-1@example.com");

    let mark = json!({ "user_id": employee.id, "date": "2025-06-02", "reason": "x".repeat(501) });
    let req = post("/api/v1/attendance/absent", &hr).set_json(&mark).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
