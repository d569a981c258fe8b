use rocket::http::{ContentType, Header, Status};
use rocket::local::blocking::Client;
use std::sync::Arc;

fn test_client() -> (Client, String) {
    let db_path = format!("/tmp/sentinelcheck_test_{}.db", uuid::Uuid::new_v4());
    std::env::set_var("JWT_SECRET", "test-secret-do-not-use-in-prod");

    let config = sentinelcheck::config::Config::from_env().expect("valid test config");
    let database = Arc::new(sentinelcheck::db::Db::new(&db_path).expect("db init failed"));
    let rate_limiter = sentinelcheck::rate_limiter::RateLimiter::new(1000, 3600);

    let rocket = rocket::build()
        .manage(database)
        .manage(config)
        .manage(rate_limiter)
        .register(
            "/",
            rocket::catchers![
                sentinelcheck::catchers::bad_request,
                sentinelcheck::catchers::unauthorized,
                sentinelcheck::catchers::forbidden,
                sentinelcheck::catchers::not_found,
                sentinelcheck::catchers::unprocessable_entity,
                sentinelcheck::catchers::too_many_requests,
                sentinelcheck::catchers::internal_error,
            ],
        )
        .mount(
            "/api/v1",
            rocket::routes![
                sentinelcheck::routes::register,
                sentinelcheck::routes::login,
                sentinelcheck::routes::me,
                sentinelcheck::routes::create_monitor,
                sentinelcheck::routes::list_monitors,
                sentinelcheck::routes::get_monitor,
                sentinelcheck::routes::update_monitor,
                sentinelcheck::routes::delete_monitor,
                sentinelcheck::routes::get_monitor_checks,
                sentinelcheck::routes::get_monitor_ssl_status,
                sentinelcheck::routes::create_alert_rule,
                sentinelcheck::routes::list_alert_rules,
                sentinelcheck::routes::get_alert_rule,
                sentinelcheck::routes::update_alert_rule,
                sentinelcheck::routes::delete_alert_rule,
                sentinelcheck::routes::create_alert_channel,
                sentinelcheck::routes::list_alert_channels,
                sentinelcheck::routes::get_alert_channel,
                sentinelcheck::routes::delete_alert_channel,
                sentinelcheck::routes::list_incidents,
                sentinelcheck::routes::dashboard,
                sentinelcheck::routes::health,
            ],
        )
        .mount("/", rocket::routes![sentinelcheck::routes::status_page]);

    (Client::tracked(rocket).expect("valid rocket instance"), db_path)
}

fn register_and_login(client: &Client, email: &str) -> (String, String) {
    let resp = client
        .post("/api/v1/auth/register")
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"email": "{email}", "password": "correct-horse-battery", "tenant_name": "Acme Corp"}}"#
        ))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    (
        body["token"].as_str().unwrap().to_string(),
        body["tenant_id"].as_str().unwrap().to_string(),
    )
}

fn auth_header(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

fn create_monitor(client: &Client, token: &str) -> String {
    let resp = client
        .post("/api/v1/monitors")
        .header(ContentType::JSON)
        .header(auth_header(token))
        .body(
            r#"{"name": "Main site", "target": "https://example.com/health", "monitor_type": "http", "check_interval_seconds": 60}"#,
        )
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    body["id"].as_str().unwrap().to_string()
}

#[test]
fn health_check_endpoint() {
    let (client, _) = test_client();
    let resp = client.get("/api/v1/health").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    assert_eq!(body["status"], "ok");
}

#[test]
fn register_creates_tenant_and_returns_token() {
    let (client, _) = test_client();
    let resp = client
        .post("/api/v1/auth/register")
        .header(ContentType::JSON)
        .body(r#"{"email": "owner@acme.test", "password": "correct-horse-battery", "tenant_name": "Acme Corp"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert!(!body["tenant_id"].as_str().unwrap().is_empty());
    assert!(!body["user_id"].as_str().unwrap().is_empty());
}

#[test]
fn register_rejects_short_password() {
    let (client, _) = test_client();
    let resp = client
        .post("/api/v1/auth/register")
        .header(ContentType::JSON)
        .body(r#"{"email": "owner@acme.test", "password": "short", "tenant_name": "Acme Corp"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test]
fn register_rejects_duplicate_email() {
    let (client, _) = test_client();
    register_and_login(&client, "dup@acme.test");
    let resp = client
        .post("/api/v1/auth/register")
        .header(ContentType::JSON)
        .body(r#"{"email": "dup@acme.test", "password": "correct-horse-battery", "tenant_name": "Other Co"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test]
fn login_round_trips_and_rejects_wrong_password() {
    let (client, _) = test_client();
    register_and_login(&client, "login@acme.test");

    let resp = client
        .post("/api/v1/auth/login")
        .header(ContentType::JSON)
        .body(r#"{"email": "login@acme.test", "password": "correct-horse-battery"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);

    let resp = client
        .post("/api/v1/auth/login")
        .header(ContentType::JSON)
        .body(r#"{"email": "login@acme.test", "password": "wrong-password"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);
}

#[test]
fn me_requires_bearer_token() {
    let (client, _) = test_client();
    let resp = client.get("/api/v1/auth/me").dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);

    let (token, _) = register_and_login(&client, "me@acme.test");
    let resp = client
        .get("/api/v1/auth/me")
        .header(auth_header(&token))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    assert_eq!(body["email"], "me@acme.test");
}

#[test]
fn create_and_get_monitor() {
    let (client, _) = test_client();
    let (token, _) = register_and_login(&client, "monitors@acme.test");
    let id = create_monitor(&client, &token);

    let resp = client
        .get(format!("/api/v1/monitors/{id}"))
        .header(auth_header(&token))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    assert_eq!(body["name"], "Main site");
    assert_eq!(body["monitor_type"], "http");
    assert_eq!(body["enabled"], true);
}

#[test]
fn create_monitor_rejects_bad_interval_and_type() {
    let (client, _) = test_client();
    let (token, _) = register_and_login(&client, "validate@acme.test");

    let resp = client
        .post("/api/v1/monitors")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Too fast", "target": "https://example.com", "monitor_type": "http", "check_interval_seconds": 5}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);

    let resp = client
        .post("/api/v1/monitors")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Bad type", "target": "https://example.com", "monitor_type": "ftp", "check_interval_seconds": 60}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);

    let resp = client
        .post("/api/v1/monitors")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Bad tcp target", "target": "not-a-host-port", "monitor_type": "tcp", "check_interval_seconds": 60}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test]
fn monitors_are_tenant_scoped() {
    let (client, _) = test_client();
    let (token_a, _) = register_and_login(&client, "tenant-a@acme.test");
    let (token_b, _) = register_and_login(&client, "tenant-b@acme.test");
    let id = create_monitor(&client, &token_a);

    let resp = client
        .get(format!("/api/v1/monitors/{id}"))
        .header(auth_header(&token_b))
        .dispatch();
    assert_eq!(resp.status(), Status::NotFound);

    let resp = client
        .get("/api/v1/monitors")
        .header(auth_header(&token_b))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: Vec<serde_json::Value> = resp.into_json().unwrap();
    assert!(body.is_empty());
}

#[test]
fn update_and_delete_monitor() {
    let (client, _) = test_client();
    let (token, _) = register_and_login(&client, "update@acme.test");
    let id = create_monitor(&client, &token);

    let resp = client
        .patch(format!("/api/v1/monitors/{id}"))
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Renamed", "enabled": false}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["enabled"], false);

    let resp = client
        .delete(format!("/api/v1/monitors/{id}"))
        .header(auth_header(&token))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);

    let resp = client
        .get(format!("/api/v1/monitors/{id}"))
        .header(auth_header(&token))
        .dispatch();
    assert_eq!(resp.status(), Status::NotFound);
}

#[test]
fn monitor_checks_and_ssl_status_start_empty() {
    let (client, _) = test_client();
    let (token, _) = register_and_login(&client, "checks@acme.test");
    let id = create_monitor(&client, &token);

    let resp = client
        .get(format!("/api/v1/monitors/{id}/checks"))
        .header(auth_header(&token))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: Vec<serde_json::Value> = resp.into_json().unwrap();
    assert!(body.is_empty());

    let resp = client
        .get(format!("/api/v1/monitors/{id}/ssl-status"))
        .header(auth_header(&token))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    assert!(body["ssl_valid"].is_null());
}

#[test]
fn create_alert_rule_validates_trigger_type_and_threshold() {
    let (client, _) = test_client();
    let (token, _) = register_and_login(&client, "rules@acme.test");
    let monitor_id = create_monitor(&client, &token);

    let resp = client
        .post("/api/v1/alert-rules")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(format!(
            r#"{{"name": "Down alert", "monitor_id": "{monitor_id}", "trigger_type": "down", "threshold_value": 3}}"#
        ))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    assert_eq!(body["trigger_type"], "down");
    assert_eq!(body["threshold_value"], 3);

    let resp = client
        .post("/api/v1/alert-rules")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Bad trigger", "trigger_type": "flaky", "threshold_value": 1}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);

    let resp = client
        .post("/api/v1/alert-rules")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Too slow threshold", "trigger_type": "slow_response", "threshold_value": 1}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test]
fn tenant_wide_alert_rule_has_no_monitor_id() {
    let (client, _) = test_client();
    let (token, _) = register_and_login(&client, "tenantwide@acme.test");

    let resp = client
        .post("/api/v1/alert-rules")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Any monitor down", "trigger_type": "down", "threshold_value": 1}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    assert!(body["monitor_id"].is_null());
}

#[test]
fn create_alert_channel_blocks_private_webhook_targets() {
    let (client, _) = test_client();
    let (token, _) = register_and_login(&client, "ssrf@acme.test");

    let resp = client
        .post("/api/v1/alert-channels")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Internal webhook", "channel_type": "webhook", "config": {"url": "http://127.0.0.1:8080/hook"}}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);

    let resp = client
        .post("/api/v1/alert-channels")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Internal webhook 2", "channel_type": "webhook", "config": {"url": "http://169.254.169.254/latest/meta-data"}}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test]
fn create_alert_channel_requires_discord_host() {
    let (client, _) = test_client();
    let (token, _) = register_and_login(&client, "discord@acme.test");

    let resp = client
        .post("/api/v1/alert-channels")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Fake discord", "channel_type": "discord", "config": {"url": "https://evil.example.com/webhook"}}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test]
fn create_alert_channel_validates_email_address() {
    let (client, _) = test_client();
    let (token, _) = register_and_login(&client, "email@acme.test");

    let resp = client
        .post("/api/v1/alert-channels")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Bad email", "channel_type": "email", "config": {"to": "not-an-email"}}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);

    let resp = client
        .post("/api/v1/alert-channels")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Good email", "channel_type": "email", "config": {"to": "ops@acme.test"}}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
}

#[test]
fn alert_rule_can_link_channels_and_delete_cleanly() {
    let (client, _) = test_client();
    let (token, _) = register_and_login(&client, "link@acme.test");

    let resp = client
        .post("/api/v1/alert-channels")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(r#"{"name": "Ops email", "channel_type": "email", "config": {"to": "ops@acme.test"}}"#)
        .dispatch();
    let channel: serde_json::Value = resp.into_json().unwrap();
    let channel_id = channel["id"].as_str().unwrap().to_string();

    let resp = client
        .post("/api/v1/alert-rules")
        .header(ContentType::JSON)
        .header(auth_header(&token))
        .body(format!(
            r#"{{"name": "Notify ops", "trigger_type": "down", "threshold_value": 1, "channel_ids": ["{channel_id}"]}}"#
        ))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let rule: serde_json::Value = resp.into_json().unwrap();
    assert_eq!(rule["channel_ids"][0], channel_id);

    let rule_id = rule["id"].as_str().unwrap();
    let resp = client
        .delete(format!("/api/v1/alert-rules/{rule_id}"))
        .header(auth_header(&token))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
}

#[test]
fn dashboard_reflects_monitor_and_incident_counts() {
    let (client, _) = test_client();
    let (token, _) = register_and_login(&client, "dashboard@acme.test");
    create_monitor(&client, &token);

    let resp = client
        .get("/api/v1/dashboard")
        .header(auth_header(&token))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    assert_eq!(body["total_monitors"], 1);
    assert_eq!(body["unknown"], 1);
    assert_eq!(body["open_incidents"], 0);
}

#[test]
fn incidents_list_is_empty_for_new_tenant() {
    let (client, _) = test_client();
    let (token, _) = register_and_login(&client, "incidents@acme.test");
    create_monitor(&client, &token);

    let resp = client
        .get("/api/v1/incidents")
        .header(auth_header(&token))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: Vec<serde_json::Value> = resp.into_json().unwrap();
    assert!(body.is_empty());
}

#[test]
fn status_page_unknown_slug_is_not_found() {
    let (client, _) = test_client();
    let resp = client.get("/status/does-not-exist").dispatch();
    assert_eq!(resp.status(), Status::NotFound);
}

#[test]
fn status_page_reports_unknown_for_never_checked_monitor() {
    let (client, db_path) = test_client();
    let (token, tenant_id) = register_and_login(&client, "status@acme.test");
    create_monitor(&client, &token);

    let conn = rusqlite::Connection::open(&db_path).expect("reopen test database");
    let slug: String = conn
        .query_row("SELECT slug FROM tenants WHERE id = ?1", [&tenant_id], |row| row.get(0))
        .expect("tenant row must exist with a slug");

    let resp = client.get(format!("/status/{slug}")).dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    assert_eq!(body["overall"], "unknown");
    assert_eq!(body["monitors"][0]["status"], "unknown");
}

#[test]
fn status_page_reports_major_outage_when_a_monitor_is_down() {
    let (client, db_path) = test_client();
    let (token, tenant_id) = register_and_login(&client, "outage@acme.test");
    let monitor_id = create_monitor(&client, &token);

    let conn = rusqlite::Connection::open(&db_path).expect("reopen test database");
    conn.execute(
        "INSERT INTO monitor_checks (id, monitor_id, status_code, response_time_ms, success, error_message, ssl_valid, ssl_expires_at, checked_at) \
         VALUES (?1, ?2, 500, 120, 0, 'connection refused', NULL, NULL, datetime('now'))",
        rusqlite::params![uuid::Uuid::new_v4().to_string(), monitor_id],
    )
    .unwrap();

    let slug: String = conn
        .query_row("SELECT slug FROM tenants WHERE id = ?1", [&tenant_id], |row| row.get(0))
        .expect("tenant row must exist with a slug");

    let resp = client.get(format!("/status/{slug}")).dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value = resp.into_json().unwrap();
    assert_eq!(body["overall"], "major_outage");
}
