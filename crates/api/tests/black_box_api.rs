//! Black-box tests over the HTTP surface: real server on an ephemeral port,
//! real JWTs, in-memory store behind the same contracts as production.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use tillpoint_api::app;
use tillpoint_auth::{AccessClaims, Role};
use tillpoint_core::{ProductId, TenantId, UserId};
use tillpoint_store::MemoryStore;
use tillpoint_tenancy::{Profile, SubscriptionTier, Tenant, TenantStatus};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    store: Arc<MemoryStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let (services, auth_state, store) =
            app::services::build_memory_services(JWT_SECRET.as_bytes());
        let router = app::build_app(services, auth_state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    fn seed_tenant(&self, name: &str) -> TenantId {
        let id = TenantId::new();
        self.store.insert_tenant(Tenant {
            id,
            name: name.to_string(),
            status: TenantStatus::Active,
            tier: SubscriptionTier::Pro,
            subscription_ends_at: Some(Utc::now() + ChronoDuration::days(30)),
            is_platform: false,
            tax_rate_bps: 1300,
            deleted_at: None,
        });
        id
    }

    fn seed_user(&self, tenant_id: TenantId, role: Role) -> (UserId, String) {
        let id = UserId::new();
        let email = format!("{id}@example.test");
        self.store.insert_profile(Profile {
            id,
            tenant_id: Some(tenant_id),
            role,
            full_name: "Test User".to_string(),
            email: email.clone(),
            active: true,
            branch_id: None,
        });
        (id, mint_token(id, &email))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_token(user_id: UserId, email: &str) -> String {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user_id,
        email: email.to_string(),
        iat: now.timestamp(),
        exp: (now + ChronoDuration::minutes(10)).timestamp(),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn order_body(product_id: ProductId, quantity: u32) -> serde_json::Value {
    json!({
        "idempotency_key": uuid::Uuid::now_v7().to_string(),
        "items": [{ "product_id": product_id, "quantity": quantity }],
        "payment_method": "cash",
    })
}

#[tokio::test]
async fn missing_credential_is_rejected_without_mutation() {
    let srv = TestServer::spawn().await;
    let tenant = srv.seed_tenant("Acme Retail");
    let product = srv.store.insert_product(tenant, "Widget", 1000, 5);

    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&order_body(product, 2))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "error");

    // Nothing sold.
    assert_eq!(srv.store.stock_of(product), Some(5));
}

#[tokio::test]
async fn whoami_echoes_the_resolved_context() {
    let srv = TestServer::spawn().await;
    let tenant = srv.seed_tenant("Acme Retail");
    let (user_id, token) = srv.seed_user(tenant, Role::Cashier);

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["user_id"], json!(user_id));
    assert_eq!(body["data"]["role"], "CASHIER");
    assert_eq!(body["data"]["tenant_id"], json!(tenant));
    assert_eq!(body["data"]["is_super_admin"], json!(false));
}

#[tokio::test]
async fn sale_replay_void_round_trip() {
    let srv = TestServer::spawn().await;
    let tenant = srv.seed_tenant("Acme Retail");
    let (_, cashier_token) = srv.seed_user(tenant, Role::Cashier);
    let (_, admin_token) = srv.seed_user(tenant, Role::TenantAdmin);
    let product = srv.store.insert_product(tenant, "Widget", 1000, 5);

    let client = reqwest::Client::new();
    let body = order_body(product, 2);

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&cashier_token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let first: serde_json::Value = res.json().await.unwrap();
    assert_eq!(first["status"], "success");
    // Tax-inclusive total: stock decremented, total = 2 × 1000.
    assert_eq!(first["data"]["total_amount"], json!(2000));
    assert_eq!(srv.store.stock_of(product), Some(3));

    // Same idempotency key replays to the original receipt; no second sale.
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&cashier_token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let replay: serde_json::Value = res.json().await.unwrap();
    assert_eq!(replay["data"]["sale_id"], first["data"]["sale_id"]);
    assert_eq!(
        replay["data"]["invoice_number"],
        first["data"]["invoice_number"]
    );
    assert_eq!(srv.store.stock_of(product), Some(3));

    let sale_id = first["data"]["sale_id"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{}/orders/{}", srv.base_url, sale_id))
        .bearer_auth(&cashier_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Void restores stock; a second void is an explicit error.
    let void_body = json!({ "reason": "customer changed their mind" });
    let res = client
        .post(format!("{}/invoices/{}/void", srv.base_url, sale_id))
        .bearer_auth(&admin_token)
        .json(&void_body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(srv.store.stock_of(product), Some(5));

    let res = client
        .post(format!("{}/invoices/{}/void", srv.base_url, sale_id))
        .bearer_auth(&admin_token)
        .json(&void_body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn cashier_cannot_void_and_gets_required_roles() {
    let srv = TestServer::spawn().await;
    let tenant = srv.seed_tenant("Acme Retail");
    let (_, cashier_token) = srv.seed_user(tenant, Role::Cashier);
    let product = srv.store.insert_product(tenant, "Widget", 1000, 5);

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&cashier_token)
        .json(&order_body(product, 1))
        .send()
        .await
        .unwrap();
    let sale_id = res.json::<serde_json::Value>().await.unwrap()["data"]["sale_id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .post(format!("{}/invoices/{}/void", srv.base_url, sale_id))
        .bearer_auth(&cashier_token)
        .json(&json!({ "reason": "should not be allowed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert!(
        body["required_roles"]
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r == "TENANT_ADMIN")
    );
}

#[tokio::test]
async fn foreign_tenant_product_is_indistinguishable_from_unknown() {
    let srv = TestServer::spawn().await;
    let tenant_a = srv.seed_tenant("Tenant A");
    let tenant_b = srv.seed_tenant("Tenant B");
    let (_, token_a) = srv.seed_user(tenant_a, Role::Cashier);
    let foreign_product = srv.store.insert_product(tenant_b, "B-only", 500, 5);

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&token_a)
        .json(&order_body(foreign_product, 1))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Foreign stock untouched.
    assert_eq!(srv.store.stock_of(foreign_product), Some(5));
}

#[tokio::test]
async fn unknown_payment_method_is_a_field_error() {
    let srv = TestServer::spawn().await;
    let tenant = srv.seed_tenant("Acme Retail");
    let (_, token) = srv.seed_user(tenant, Role::Cashier);
    let product = srv.store.insert_product(tenant, "Widget", 1000, 5);

    let mut body = order_body(product, 1);
    body["payment_method"] = json!("barter");

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["field"], "payment_method");
}

#[tokio::test]
async fn return_flow_reports_refund() {
    let srv = TestServer::spawn().await;
    let tenant = srv.seed_tenant("Acme Retail");
    let (_, token) = srv.seed_user(tenant, Role::Cashier);
    let product = srv.store.insert_product(tenant, "Widget", 1000, 5);

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&token)
        .json(&order_body(product, 3))
        .send()
        .await
        .unwrap();
    let sale_id = res.json::<serde_json::Value>().await.unwrap()["data"]["sale_id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .post(format!("{}/returns", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "sale_id": sale_id,
            "items": [{ "product_id": product, "quantity": 1 }],
            "reason": "damaged in transit",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["refund_amount"], json!(1000));
    assert_eq!(srv.store.stock_of(product), Some(3));

    let res = client
        .get(format!("{}/returns", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["total"], json!(1));
}
