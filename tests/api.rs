mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::*;
use serde_json::{json, Value};
use storefront_catalog::api::{router, AppState};
use storefront_catalog::payments::VnPayConfig;
use tower::ServiceExt;

fn app(t: &TestCatalog, vnpay: Option<VnPayConfig>) -> Router {
    router(AppState { catalog: t.catalog.clone(), nats: None, vnpay })
}

fn vnpay() -> VnPayConfig {
    VnPayConfig {
        tmn_code: "TESTCODE".into(),
        hash_secret: "SECRETKEY".into(),
        url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".into(),
        return_url: "http://localhost:3000/vnpay-return".into(),
    }
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, value)
}

fn phone_json() -> Value {
    json!({
        "fields": {
            "model": "Phone X",
            "type": "Smartphone",
            "sku": "PHX",
            "sizes": {"128GB": true, "256GB": true, "512GB": false}
        },
        "variants": [{
            "id": "v-gray",
            "color": "Space Gray",
            "currentPrice": "1200",
            "actualPrice": "999",
            "images": [{"name": "front.png"}],
            "inventory": {"128GB": 5, "256GB": 2}
        }],
        "images": [{"id": "product-images/front", "name": "front.png", "url": "https://img.test/front.png"}]
    })
}

#[tokio::test]
async fn health() {
    let t = TestCatalog::new();
    let (status, body) = send(app(&t, None), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn product_lifecycle_over_http() {
    let t = TestCatalog::new();

    let (status, created) = send(app(&t, None), Method::POST, "/api/v1/admin/products", Some(phone_json())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["skus"], json!(["PHX-SGR-128", "PHX-SGR-256"]));
    let id = created["product"]["id"].as_str().unwrap().to_string();

    let (status, fetched) = send(app(&t, None), Method::GET, &format!("/api/v1/admin/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["sizes"], json!(["128GB", "256GB"]));
    assert_eq!(fetched["variants"][0]["inventory"]["128GB"], 5);
    assert_eq!(fetched["baseSku"], "PHX");

    let (status, deleted) = send(app(&t, None), Method::DELETE, &format!("/api/v1/admin/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["variants"], 1);

    let (status, _) = send(app(&t, None), Method::GET, &format!("/api/v1/admin/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_product_is_unprocessable() {
    let t = TestCatalog::new();
    let mut body = phone_json();
    body["variants"] = json!([]);
    let (status, _) = send(app(&t, None), Method::POST, "/api/v1/admin/products", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn deleting_last_variant_reports_product_removed() {
    let t = TestCatalog::new();
    let (_, created) = send(app(&t, None), Method::POST, "/api/v1/admin/products", Some(phone_json())).await;
    let id = created["product"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/admin/products/{id}/variants/v-gray");
    let (status, outcome) = send(app(&t, None), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "product_removed");
}

#[tokio::test]
async fn payment_routes_need_configuration() {
    let t = TestCatalog::new();
    let order = json!({"amount": 150000, "orderId": "ORDER1", "orderInfo": "Order ORDER1"});
    let (status, _) = send(app(&t, None), Method::POST, "/api/v1/payments/vnpay/url", Some(order)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn payment_url_is_signed() {
    let t = TestCatalog::new();
    let order = json!({"amount": 150000, "orderId": "ORDER1", "orderInfo": "Order ORDER1"});
    let (status, body) = send(app(&t, Some(vnpay())), Method::POST, "/api/v1/payments/vnpay/url", Some(order)).await;
    assert_eq!(status, StatusCode::OK);
    let url = body["paymentUrl"].as_str().unwrap();
    assert!(url.starts_with("https://sandbox.vnpayment.vn/paymentv2/vpcpay.html?vnp_Amount=15000000&"));
    assert!(url.contains("&vnp_SecureHash="));
}

#[tokio::test]
async fn oversized_payment_amount_is_unprocessable() {
    let t = TestCatalog::new();
    let order = json!({"amount": u64::MAX / 10, "orderId": "ORDER1", "orderInfo": "Order ORDER1"});
    let (status, _) = send(app(&t, Some(vnpay())), Method::POST, "/api/v1/payments/vnpay/url", Some(order)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unsigned_payment_return_is_rejected() {
    let t = TestCatalog::new();
    let uri = "/api/v1/payments/vnpay/return?vnp_ResponseCode=00&vnp_TxnRef=ORDER1&vnp_SecureHash=deadbeef";
    let (status, body) = send(app(&t, Some(vnpay())), Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "invalid_signature");
}

#[tokio::test]
async fn upload_skips_non_images_and_known_names() {
    let t = TestCatalog::new();
    let boundary = "XBOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"current\"\r\n\r\n{current}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"front.png\"\r\nContent-Type: image/png\r\n\r\nPNG\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"back.png\"\r\nContent-Type: image/png\r\n\r\nPNG\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nhi\r\n\
         --{b}--\r\n",
        b = boundary,
        current = json!([{"id": "product-images/front", "name": "front.png", "url": "https://img.test/front.png"}]),
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/admin/images")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();

    let response = app(&t, None).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let images: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    let names: Vec<&str> = images.as_array().unwrap().iter().map(|i| i["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["front.png", "back.png"]);
    assert_eq!(t.images.uploaded_names().await, vec!["back.png".to_string()]);
}
