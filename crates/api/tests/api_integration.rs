//! Integration tests for the API server.

use std::sync::OnceLock;

use api::config::Config;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{Money, RandomIds, SystemClock};
use domain::{NewProduct, PaymentStatus, Product, ProductRepository};
use gateway::InMemoryPaymentGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryStore,
    gateway: InMemoryPaymentGateway,
}

fn setup() -> TestApp {
    setup_with_config(Config::default())
}

fn setup_with_config(config: Config) -> TestApp {
    let (state, store, gateway) = api::create_default_state(&config);
    let app = api::create_app(state, get_metrics_handle(), &config);
    TestApp {
        app,
        store,
        gateway,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
    }

    async fn add_product(&self, price: i64, stock: i64) -> Product {
        let product = Product::create(
            NewProduct {
                name: "Smart Watch Pro".to_string(),
                description: "GPS and heart rate".to_string(),
                price: Money::from_major(price),
                stock,
                image_url: "https://example.com/watch.jpg".to_string(),
            },
            &RandomIds,
            &SystemClock,
        )
        .unwrap();
        ProductRepository::save(&self.store, &product).await.unwrap()
    }

    async fn open_transaction(&self, product: &Product) -> Value {
        let (status, json) = self
            .post("/api/v1/transactions", create_body(product))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        json
    }
}

fn create_body(product: &Product) -> Value {
    json!({
        "productId": product.id().to_string(),
        "customerEmail": "jane@example.com",
        "customerFullName": "Jane Doe",
        "customerPhone": "+573001234567",
        "baseFee": 1000,
        "deliveryFee": 5000,
        "paymentMethod": "CARD"
    })
}

fn payment_body(transaction_id: &str) -> Value {
    json!({
        "transactionId": transaction_id,
        "cardNumber": "4242424242424242",
        "cardHolder": "JANE DOE",
        "expirationDate": "08/28",
        "cvv": "123",
        "deliveryAddress": "Calle 123 #45-67",
        "deliveryCity": "Bogota",
        "deliveryState": "Cundinamarca",
        "deliveryZipCode": "110111",
        "deliveryCountry": "Colombia",
        "deliveryNotes": "Ring twice"
    })
}

fn assert_envelope(json: &Value, status: StatusCode, code: &str) {
    assert_eq!(json["statusCode"], status.as_u16());
    assert_eq!(json["code"], code);
    assert!(json["message"].is_string());
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_check() {
    let t = setup();
    let (status, json) = t.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_list_and_get_products() {
    let t = setup();
    let product = t.add_product(299000, 50).await;

    let (status, json) = t.get("/api/v1/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (status, json) = t.get(&format!("/api/v1/products/{}", product.id())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["price"], 299000.0);
    assert_eq!(json["stock"], 50);
    assert_eq!(json["imageUrl"], "https://example.com/watch.jpg");
}

#[tokio::test]
async fn test_get_missing_product_is_not_found() {
    let t = setup();
    let (status, json) = t
        .get(&format!("/api/v1/products/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_envelope(&json, StatusCode::NOT_FOUND, "NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_product_id_format() {
    let t = setup();
    let (status, json) = t.get("/api/v1/products/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&json, StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_transaction() {
    let t = setup();
    let product = t.add_product(100000, 5).await;

    let json = t.open_transaction(&product).await;
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["productAmount"], 100000.0);
    assert_eq!(json["totalAmount"], 106000.0);
    assert!(json["transactionNumber"].as_str().unwrap().starts_with("TXN-"));
    assert!(json.get("wompiTransactionId").is_none());
}

#[tokio::test]
async fn test_create_transaction_uses_default_fees() {
    let t = setup();
    let product = t.add_product(100000, 5).await;

    let mut body = create_body(&product);
    body.as_object_mut().unwrap().remove("baseFee");
    body.as_object_mut().unwrap().remove("deliveryFee");
    let (status, json) = t.post("/api/v1/transactions", body).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["baseFee"], 1000.0);
    assert_eq!(json["deliveryFee"], 5000.0);
}

#[tokio::test]
async fn test_create_transaction_validation_error() {
    let t = setup();
    let product = t.add_product(100000, 5).await;

    let mut body = create_body(&product);
    body["customerPhone"] = json!("123");
    let (status, json) = t.post("/api/v1/transactions", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&json, StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_oversized_fee_is_validation_error() {
    let t = setup();
    let product = t.add_product(100000, 5).await;

    let mut body = create_body(&product);
    body["baseFee"] = json!(1e17);
    let (status, json) = t.post("/api/v1/transactions", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&json, StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
    assert_eq!(json["message"], "baseFee must not be greater than 1000000000");
    assert_eq!(t.store.transaction_count().await, 0);
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let t = setup();
    let (status, json) = t
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/v1/transactions")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&json, StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_transaction_out_of_stock_is_conflict() {
    let t = setup();
    let product = t.add_product(100000, 0).await;

    let (status, json) = t.post("/api/v1/transactions", create_body(&product)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_envelope(&json, StatusCode::CONFLICT, "INSUFFICIENT_STOCK");
    assert_eq!(json["message"], "Insufficient stock. Available: 0");
}

#[tokio::test]
async fn test_process_payment_approved() {
    let t = setup();
    let product = t.add_product(100000, 5).await;
    let created = t.open_transaction(&product).await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = t
        .post("/api/v1/transactions/process-payment", payment_body(id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "APPROVED");
    assert_eq!(json["wompiTransactionId"], "PAY-0001");
    assert!(json.get("gatewayTransactionId").is_none());

    let (_, product_json) = t.get(&format!("/api/v1/products/{}", product.id())).await;
    assert_eq!(product_json["stock"], 4);
    assert_eq!(t.store.delivery_count().await, 1);

    let (status, fetched) = t.get(&format!("/api/v1/transactions/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "APPROVED");

    let number = created["transactionNumber"].as_str().unwrap();
    let (status, by_number) = t
        .get(&format!("/api/v1/transactions/number/{number}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_number["id"], id);
}

#[tokio::test]
async fn test_process_payment_declined_is_still_ok() {
    let t = setup();
    let product = t.add_product(100000, 5).await;
    let created = t.open_transaction(&product).await;
    t.gateway.push_charge_status(PaymentStatus::Declined);

    let (status, json) = t
        .post(
            "/api/v1/transactions/process-payment",
            payment_body(created["id"].as_str().unwrap()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "DECLINED");
}

#[tokio::test]
async fn test_process_payment_gateway_failure_is_payment_required() {
    let t = setup();
    let product = t.add_product(100000, 5).await;
    let created = t.open_transaction(&product).await;
    let id = created["id"].as_str().unwrap();
    t.gateway.set_fail_on_charge(true);

    let (status, json) = t
        .post("/api/v1/transactions/process-payment", payment_body(id))
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_envelope(&json, StatusCode::PAYMENT_REQUIRED, "PAYMENT_FAILED");

    let (_, fetched) = t.get(&format!("/api/v1/transactions/{id}")).await;
    assert_eq!(fetched["status"], "ERROR");
}

#[tokio::test]
async fn test_process_payment_rejects_bad_card() {
    let t = setup();
    let product = t.add_product(100000, 5).await;
    let created = t.open_transaction(&product).await;

    let mut body = payment_body(created["id"].as_str().unwrap());
    body["expirationDate"] = json!("13/28");
    let (status, json) = t.post("/api/v1/transactions/process-payment", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Expiration date must be in MM/YY format");
    assert_eq!(t.gateway.charge_count(), 0);
}

#[tokio::test]
async fn test_get_missing_transaction_is_not_found() {
    let t = setup();
    let (status, json) = t
        .get(&format!("/api/v1/transactions/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_envelope(&json, StatusCode::NOT_FOUND, "NOT_FOUND");

    let (status, _) = t.get("/api/v1/transactions/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_custom_prefix() {
    let t = setup_with_config(Config {
        api_prefix: "/shop".to_string(),
        ..Config::default()
    });
    t.add_product(100000, 5).await;

    let (status, _) = t.get("/shop/products").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t.get("/api/v1/products").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_prefix_mounts_at_root() {
    let t = setup_with_config(Config {
        api_prefix: String::new(),
        ..Config::default()
    });
    t.add_product(100000, 5).await;

    let (status, _) = t.get("/products").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t.get("/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup();
    let product = t.add_product(100000, 5).await;
    let created = t.open_transaction(&product).await;
    t.post(
        "/api/v1/transactions/process-payment",
        payment_body(created["id"].as_str().unwrap()),
    )
    .await;

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("transactions_created_total"));
    assert!(text.contains("payments_processed_total"));
}
