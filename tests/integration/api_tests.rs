//! API integration tests against a running server.
//!
//! Expects a head librarian account `admin` / `admin`:
//!   smart-library-server create-head admin admin "Admin"
//! Run with: cargo test --test api_tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

fn api(query: &str) -> String {
    format!("{}/api?{}", BASE_URL, query)
}

fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

/// Client holding a head librarian session cookie
async fn logged_in_client() -> Client {
    let client = Client::builder().cookie_store(true).build().unwrap();

    let response = client
        .post(api("entity=auth&action=login"))
        .json(&json!({ "credential": "admin", "password": "admin" }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);

    client
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
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
async fn test_login_sets_session_cookie() {
    let client = Client::new();

    let response = client
        .post(api("entity=auth&action=login"))
        .json(&json!({ "credential": "admin", "password": "admin" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.contains("HttpOnly"));

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["user"]["role"], "kepala_perpustakaan");
}

#[tokio::test]
#[ignore]
async fn test_wrong_password() {
    let client = Client::new();

    let response = client
        .post(api("entity=auth&action=login"))
        .json(&json!({ "credential": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = logged_in_client().await;

    // Member
    let username = unique("member");
    let response = client
        .post(api("entity=users"))
        .json(&json!({
            "username": username,
            "nama_lengkap": "Integration Member",
            "password": "secret"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    let member_id = body["data"]["id"].as_i64().unwrap();

    // Book with a single copy
    let title = unique("Integration Book");
    let response = client
        .post(api("entity=books"))
        .json(&json!({
            "judul": title,
            "pengarang": "Tester",
            "kategori": "Testing",
            "jumlah_stok": 1
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    let book_id = body["data"]["id"].as_i64().unwrap();

    // Checkout takes the only copy
    let loan = json!({ "user_id": member_id, "buku_id": book_id, "due_date": "2099-01-01" });
    let response = client.post(api("entity=loans")).json(&loan).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    let loan_id = body["data"]["id"].as_i64().unwrap();

    let response = client.post(api("entity=loans")).json(&loan).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Book cannot be deleted while lent
    let response = client
        .delete(api(&format!("entity=books&id={}", book_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Return, then a second return conflicts
    let response = client
        .patch(api(&format!("entity=loans&id={}", loan_id)))
        .json(&json!({ "action": "return" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .patch(api(&format!("entity=loans&id={}", loan_id)))
        .json(&json!({ "action": "return" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Clean up
    let response = client
        .delete(api(&format!("entity=books&id={}", book_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .delete(api(&format!("entity=users&id={}", member_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_dashboard_and_logs() {
    let client = logged_in_client().await;

    let response = client.get(api("entity=dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["data"]["totals"]["books"].is_number());
    assert!(body["data"]["overdue"].as_array().unwrap().len() <= 6);

    let response = client.get(api("entity=logs")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().len() <= 60);
}

#[tokio::test]
#[ignore]
async fn test_logout_ends_session() {
    let client = logged_in_client().await;

    let response = client
        .delete(api("entity=auth&action=logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get(api("entity=books")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
