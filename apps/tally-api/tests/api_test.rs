//! Router tests driven through `tower::ServiceExt::oneshot`.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tally_api::{
    auth::{hash_password, JwtManager},
    build_router, AppState,
};
use tally_core::{Role, UserInput};
use tally_db::{Database, DbConfig};
use tower::util::ServiceExt;

// =============================================================================
// Helpers
// =============================================================================

struct TestApp {
    router: Router,
    admin_token: String,
    cashier_token: String,
    admin_id: i64,
}

async fn setup() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    for (username, password, role) in [
        ("admin", "admin123", Role::Admin),
        ("kasir1", "kasir123", Role::Cashier),
    ] {
        db.users()
            .create(&UserInput {
                username: username.to_string(),
                email: format!("{username}@tally.local"),
                password_hash: Some(hash_password(password).unwrap()),
                role,
            })
            .await
            .unwrap();
    }

    let state = AppState::new(db, JwtManager::new("test-secret".to_string(), 3600));
    let router = build_router(state);

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/login",
        None,
        Some(json!({ "username": "admin", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let admin_token = body["data"]["token"].as_str().unwrap().to_string();
    let admin_id = body["data"]["user"]["id"].as_i64().unwrap();

    let (_, body) = send(
        &router,
        "POST",
        "/api/v1/login",
        None,
        Some(json!({ "username": "kasir1@tally.local", "password": "kasir123" })),
    )
    .await;
    let cashier_token = body["data"]["token"].as_str().unwrap().to_string();

    TestApp {
        router,
        admin_token,
        cashier_token,
        admin_id,
    }
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn create_product(app: &TestApp, name: &str, price_cents: i64, stock: i64) -> i64 {
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/v1/products",
        Some(&app.admin_token),
        Some(json!({
            "name": name,
            "price_cents": price_cents,
            "stock": stock,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_i64().unwrap()
}

async fn stock_of(app: &TestApp, product_id: i64) -> i64 {
    let (_, body) = send(
        &app.router,
        "GET",
        &format!("/api/v1/products/{product_id}"),
        Some(&app.cashier_token),
        None,
    )
    .await;
    body["data"]["stock"].as_i64().unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = setup().await;

    let (status, body) = send(&app.router, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_auth_required_and_login_failures() {
    let app = setup().await;

    let (status, body) = send(&app.router, "GET", "/api/v1/products", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(
        &app.router,
        "GET",
        "/api/v1/products",
        Some("not-a-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/v1/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_sale_happy_path_and_read_back() {
    let app = setup().await;
    let product_id = create_product(&app, "Coca-Cola", 999, 10).await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/v1/transactions",
        Some(&app.cashier_token),
        Some(json!({
            "items": [{ "product_id": product_id, "quantity": 2 }],
            "payment_method": "cash",
            "payment_cents": 2500,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    let sale = &body["data"];
    assert_eq!(sale["total_cents"], 1998);
    assert_eq!(sale["change_cents"], 502);
    assert_eq!(sale["status"], "completed");
    assert_eq!(sale["lines"][0]["unit_price_cents"], 999);
    assert_eq!(sale["lines"][0]["product"]["name"], "Coca-Cola");
    assert_eq!(sale["cashier"]["username"], "kasir1");
    assert!(sale["cashier"].get("password_hash").is_none());
    assert_eq!(stock_of(&app, product_id).await, 8);

    let sale_id = sale["id"].as_i64().unwrap();
    let (status, read_back) = send(
        &app.router,
        "GET",
        &format!("/api/v1/transactions/{sale_id}"),
        Some(&app.cashier_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read_back["data"], body["data"]);

    let (status, list) = send(
        &app.router,
        "GET",
        "/api/v1/transactions?status=completed&limit=5",
        Some(&app.cashier_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"]["total"], 1);
}

#[tokio::test]
async fn test_sale_failures_leave_stock_untouched() {
    let app = setup().await;
    let product_id = create_product(&app, "Coca-Cola", 999, 5).await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/v1/transactions",
        Some(&app.cashier_token),
        Some(json!({
            "items": [
                { "product_id": product_id, "quantity": 3 },
                { "product_id": product_id, "quantity": 3 },
            ],
            "payment_method": "cash",
            "payment_cents": 10000,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(stock_of(&app, product_id).await, 5);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/v1/transactions",
        Some(&app.cashier_token),
        Some(json!({
            "items": [{ "product_id": product_id, "quantity": 5 }],
            "payment_method": "card",
            "payment_cents": 4000,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_PAYMENT");
    assert_eq!(stock_of(&app, product_id).await, 5);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/v1/transactions",
        Some(&app.cashier_token),
        Some(json!({
            "items": [],
            "payment_method": "cash",
            "payment_cents": 100,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/v1/transactions",
        Some(&app.cashier_token),
        Some(json!({ "items": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, list) = send(
        &app.router,
        "GET",
        "/api/v1/transactions",
        Some(&app.cashier_token),
        None,
    )
    .await;
    assert_eq!(list["data"]["total"], 0);
}

#[tokio::test]
async fn test_product_rules() {
    let app = setup().await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/v1/products",
        Some(&app.admin_token),
        Some(json!({ "name": "Free", "price_cents": 0, "stock": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/v1/products",
        Some(&app.admin_token),
        Some(json!({ "name": "Gold Bar", "price_cents": i64::MAX, "stock": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let product = json!({
        "name": "Chips",
        "price_cents": 1250,
        "stock": 3,
        "barcode": "8886013100011",
    });
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/v1/products",
        Some(&app.admin_token),
        Some(product.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/v1/products",
        Some(&app.admin_token),
        Some(product),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = send(
        &app.router,
        "GET",
        "/api/v1/products/999",
        Some(&app.cashier_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = send(
        &app.router,
        "GET",
        "/api/v1/products?search=chip",
        Some(&app.cashier_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_user_admin_is_admin_only() {
    let app = setup().await;

    let (status, body) = send(
        &app.router,
        "GET",
        "/api/v1/users",
        Some(&app.cashier_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = send(
        &app.router,
        "GET",
        "/api/v1/users",
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert!(body["data"]["items"][0].get("password_hash").is_none());

    let (status, _) = send(
        &app.router,
        "DELETE",
        &format!("/api/v1/users/{}", app.admin_id),
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/v1/users",
        Some(&app.admin_token),
        Some(json!({
            "username": "kasir2",
            "email": "kasir2@tally.local",
            "password": "kasir456",
            "role": "cashier",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["role"], "cashier");
}

#[tokio::test]
async fn test_dashboard_after_sale() {
    let app = setup().await;
    let product_id = create_product(&app, "Water", 350, 40).await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/v1/transactions",
        Some(&app.cashier_token),
        Some(json!({
            "items": [{ "product_id": product_id, "quantity": 3 }],
            "payment_method": "transfer",
            "payment_cents": 1050,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app.router,
        "GET",
        "/api/v1/dashboard",
        Some(&app.cashier_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["stats"]["today_transactions"], 1);
    assert_eq!(data["stats"]["today_revenue_cents"], 1050);
    assert_eq!(data["top_products"][0]["product_name"], "Water");
    assert_eq!(data["revenue_data"].as_array().unwrap().len(), 7);
    assert_eq!(data["recent_transactions"].as_array().unwrap().len(), 1);
}
