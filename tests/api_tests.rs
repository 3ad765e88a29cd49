//! API integration tests
//!
//! These run against a live server with a migrated database. They mutate
//! shared state (emergency checkout closes every open visit), so run them
//! single-threaded: cargo test -- --ignored --test-threads=1

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an authenticated token for the default admin
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a fresh visitor with a unique phone, returning their id
async fn register_visitor(client: &Client) -> i64 {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();

    let response = client
        .post(format!("{}/public/register", BASE_URL))
        .json(&json!({
            "first_name": "Test",
            "last_name": "Visitor",
            "phone": format!("+1555{}", suffix % 10_000_000_000),
            "company": "Acme Corp"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "pending");
    body["id"].as_i64().expect("No visitor ID")
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/visitors", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_register_requires_valid_input() {
    let client = Client::new();

    // Missing last name and phone
    let response = client
        .post(format!("{}/public/register", BASE_URL))
        .json(&json!({
            "first_name": "Solo"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_client_error());
}

#[tokio::test]
#[ignore]
async fn test_full_visit_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let visitor_id = register_visitor(&client).await;

    // Check-in before approval is a lifecycle violation
    let response = client
        .post(format!("{}/visitors/{}/check-in", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // Approve
    let response = client
        .post(format!("{}/visitors/{}/approve", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "approved");

    // Approving twice is a lifecycle violation
    let response = client
        .post(format!("{}/visitors/{}/approve", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // Check in (walk-in, badge generated)
    let response = client
        .post(format!("{}/visitors/{}/check-in", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let visit: Value = response.json().await.expect("Failed to parse response");
    let visit_id = visit["id"].as_i64().expect("No visit ID");
    let badge = visit["badge_number"].as_str().expect("No badge number");
    assert!(badge.starts_with("BADGE-"));
    assert!(visit["check_in_time"].is_string());
    assert!(visit["check_out_time"].is_null());

    // Double check-in conflicts
    let response = client
        .post(format!("{}/visitors/{}/check-in", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // The visitor appears on the presence dashboard
    let response = client
        .get(format!("{}/visits/checked-in", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let entries: Value = response.json().await.expect("Failed to parse response");
    let found = entries
        .as_array()
        .expect("Expected array")
        .iter()
        .any(|e| e["visit_id"].as_i64() == Some(visit_id));
    assert!(found);

    // Check out
    let response = client
        .post(format!("{}/visitors/{}/check-out", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let visit: Value = response.json().await.expect("Failed to parse response");
    assert!(visit["check_out_time"].is_string());

    // Checking out again fails: no open visit remains
    let response = client
        .post(format!("{}/visitors/{}/check-out", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // Checking out the visit by id reports the closed state
    let response = client
        .post(format!("{}/visits/{}/check-out", BASE_URL, visit_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Cleanup
    let _ = client
        .delete(format!("{}/visitors/{}", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_reject_stores_reason() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let visitor_id = register_visitor(&client).await;

    let response = client
        .post(format!("{}/visitors/{}/reject", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "reason": "Failed screening" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "rejected");
    assert!(body["notes"]
        .as_str()
        .unwrap_or_default()
        .contains("Failed screening"));

    // Cleanup
    let _ = client
        .delete(format!("{}/visitors/{}", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_emergency_checkout_is_idempotent() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let visitor_id = register_visitor(&client).await;

    client
        .post(format!("{}/visitors/{}/approve", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    client
        .post(format!("{}/visitors/{}/check-in", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    // First call closes at least our open visit
    let response = client
        .post(format!("{}/visits/emergency-checkout", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["checkout_count"].as_u64().unwrap() >= 1);

    // Second call finds nothing left to close
    let response = client
        .post(format!("{}/visits/emergency-checkout", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["checkout_count"].as_u64().unwrap(), 0);

    // Cleanup
    let _ = client
        .delete(format!("{}/visitors/{}", BASE_URL, visitor_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_get_stats() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["today_visits"].is_number());
    assert!(body["today_checkins"].is_number());
    assert!(body["currently_checked_in"].is_number());
    assert!(body["weekly_visits"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_list_visitors() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/visitors", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_activity_feed() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/activity?limit=10", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_list_hosts() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/hosts", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}
