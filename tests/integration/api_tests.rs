//! API integration tests
//!
//! These run against a live server with an `admin` / `admin123` account
//! (see the `create-admin` binary).

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8000/api/v1";

/// Helper to get an admin token through the OAuth2 form login
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .form(&[("username", "admin"), ("password", "admin123")])
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["access_token"].as_str().expect("No token in response").to_string()
}

async fn create_category(client: &Client, token: &str, name: &str) -> i64 {
    let response = client
        .post(format!("{}/categories", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No category id")
}

async fn create_event(client: &Client, token: &str, payload: Value) -> Value {
    let response = client
        .post(format!("{}/events", BASE_URL))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
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
async fn test_login_with_json_body() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin123"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["access_token"].is_string());
    assert_eq!(body["token_type"], "bearer");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .form(&[("username", "admin"), ("password", "wrong")])
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
        .get(format!("{}/events", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_event_partial_update_clears_with_null() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let event = create_event(
        &client,
        &token,
        json!({
            "title": "Gottesdienst",
            "start_date": "2030-03-03",
            "start_time": "10:00",
            "preacher": "Pastor Meier",
            "ort": "Saal"
        }),
    )
    .await;
    let id = event["id"].as_i64().unwrap();

    let response = client
        .put(format!("{}/events/{}", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({ "preacher": null, "besucherzahl": 120 }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let updated: Value = response.json().await.unwrap();
    assert!(updated["preacher"].is_null());
    assert_eq!(updated["besucherzahl"], 120);
    assert_eq!(updated["ort"], "Saal");
    assert_eq!(updated["title"], "Gottesdienst");

    let response = client
        .delete(format!("{}/events/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/events/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_event_tree_nests_children() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let parent = create_event(&client, &token, json!({ "title": unique("Advent"), "start_date": "2030-12-01" })).await;
    let parent_id = parent["id"].as_i64().unwrap();
    let child = create_event(
        &client,
        &token,
        json!({ "title": "Kinderprogramm", "parent_id": parent_id }),
    )
    .await;

    let tree: Value = client
        .get(format!("{}/events/tree", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let node = tree
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"].as_i64() == Some(parent_id))
        .expect("Parent missing from tree");
    assert_eq!(node["children"][0]["id"], child["id"]);
}

#[tokio::test]
#[ignore]
async fn test_reporting_annotation_and_upsert() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    // Category names are unique; reuse them when they already exist
    let categories: Value = client
        .get(format!("{}/categories?limit=1000", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let find = |name: &str| {
        categories
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == name)
            .and_then(|c| c["id"].as_i64())
    };
    let vacation_id = match find("Ferien") {
        Some(id) => id,
        None => create_category(&client, &token, "Ferien").await,
    };
    let special_id = match find("Special") {
        Some(id) => id,
        None => create_category(&client, &token, "Special").await,
    };

    let vacation_title = unique("Sommerferien");
    create_event(
        &client,
        &token,
        json!({
            "title": vacation_title,
            "start_date": "2031-07-01",
            "end_date": "2031-08-10",
            "category_ids": [vacation_id]
        }),
    )
    .await;
    let special_title = unique("Taufe");
    create_event(
        &client,
        &token,
        json!({
            "title": special_title,
            "start_date": "2031-07-13",
            "start_time": "10:00",
            "category_ids": [special_id]
        }),
    )
    .await;
    let service = create_event(
        &client,
        &token,
        json!({ "title": "Gottesdienst", "start_date": "2031-07-13", "start_time": "10:00" }),
    )
    .await;
    let event_id = service["id"].as_i64().unwrap();

    let first: Value = client
        .post(format!("{}/reporting", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "event_id": event_id, "visitor": 80, "vacation": "ignored" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["vacation"], vacation_title.as_str());
    assert_eq!(first["special"], special_title.as_str());
    assert_eq!(first["event_title"], "Gottesdienst");

    let second: Value = client
        .post(format!("{}/reporting", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "event_id": event_id, "visitor": 85 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["visitor"], 85);

    let history: Value = client
        .get(format!("{}/reporting/by-event/{}", BASE_URL, event_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().map(|a| a.len()), Some(1));
}

#[tokio::test]
#[ignore]
async fn test_manual_reporting_and_report() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let entry: Value = client
        .post(format!("{}/reporting/manual", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "event_date": "2032-01-04", "visitor": 42 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(entry["event_id"], 99);
    assert_eq!(entry["event_title"], "");

    let report: Value = client
        .get(format!(
            "{}/reports/visitors-by-title?start_date=2032-01-04&end_date=2032-01-04",
            BASE_URL
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let row = report
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == entry["id"])
        .expect("Manual entry missing from report");
    assert_eq!(row["date"], "2032-01-04");
    assert_eq!(row["visitors"], 42);

    let response = client
        .delete(format!("{}/reporting/{}", BASE_URL, entry["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_create_user_rejects_short_password() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "username": unique("welcome"), "password": "123", "role": "welcome" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
