mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use sales_backoffice::{
    config::{AppConfig, AppState},
    models::auth::Claims,
    services::provisioning::ProvisioningConfig,
};

use common::{fast_poll, FakeBackend, FakeContracts};

const SECRET: &str = "segredo-de-teste";

fn config() -> AppConfig {
    AppConfig {
        backend_url: "http://backend.invalid".into(),
        jwt_secret: SECRET.into(),
        bind_addr: "127.0.0.1:0".into(),
        backend_timeout: Duration::from_secs(1),
        enrolment_poll: fast_poll(20),
        locate_poll: fast_poll(20),
        contract_fonts_dir: "./fonts".into(),
        contract_font_family: "Roboto".into(),
        public_base_url: "http://console.test".into(),
        provisioning: ProvisioningConfig {
            admin_component: "com.financing.agent/.AdminReceiver".into(),
            package_download_url: "https://downloads.example.com/agent.apk".into(),
            package_checksum: "c2hhMjU2".into(),
        },
    }
}

fn token_for(user_id: Uuid) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id,
        vendor_id: Uuid::new_v4(),
        name: Some("Carlos Gómez".into()),
        exp: now + 3_600,
        iat: now,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_ref())).unwrap()
}

async fn spawn_console(backend: Arc<FakeBackend>) -> String {
    let state = AppState::with_collaborators(&config(), backend, Arc::new(FakeContracts::default()));
    let app = sales_backoffice::app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn health_is_public() {
    let base = spawn_console(FakeBackend::new()).await;

    let response = reqwest::get(format!("{base}/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn missing_token_is_rejected() {
    let base = spawn_console(FakeBackend::new()).await;

    let response = Client::new()
        .post(format!("{base}/api/sales/wizards"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing or invalid authentication token.");
}

#[tokio::test]
async fn wizard_flow_over_http_forwards_the_operator_token() {
    let backend = FakeBackend::new();
    let base = spawn_console(backend.clone()).await;
    let token = token_for(Uuid::new_v4());
    let client = Client::new();

    let opened: Value = client
        .post(format!("{base}/api/sales/wizards"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(opened["stage"], "CUSTOMER");
    assert_eq!(opened["stageNumber"], 1);
    let id = opened["id"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{base}/api/sales/wizards/{id}/customer"))
        .bearer_auth(&token)
        .json(&json!({ "customerId": Uuid::new_v4(), "fullName": "Ana María Restrepo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(format!("{base}/api/sales/wizards/{id}/enrolment"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let state: Value = response.json().await.unwrap();
    assert_eq!(state["status"], "AWAITING_DEVICE");

    assert!(backend.tokens.lock().unwrap().iter().all(|t| *t == token));
}

#[tokio::test]
async fn skipping_a_stage_is_a_conflict() {
    let base = spawn_console(FakeBackend::new()).await;
    let token = token_for(Uuid::new_v4());
    let client = Client::new();

    let opened: Value = client
        .post(format!("{base}/api/sales/wizards"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = opened["id"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{base}/api/sales/wizards/{id}/finalize"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"]["expected"], "SUMMARY");
    assert_eq!(body["details"]["actual"], "CUSTOMER");
}

#[tokio::test]
async fn plan_errors_are_reported_per_field_in_the_client_language() {
    let base = spawn_console(FakeBackend::new()).await;
    let token = token_for(Uuid::new_v4());

    let response = Client::new()
        .post(format!("{base}/api/sales/plans/preview"))
        .bearer_auth(&token)
        .header("accept-language", "en-US,en;q=0.9")
        .json(&json!({
            "devicePrice": "500.000",
            "initialPayment": "700.000",
            "currency": "COP"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"]["initialPayment"].is_array());
}

#[tokio::test]
async fn preview_returns_formatted_schedule() {
    let base = spawn_console(FakeBackend::new()).await;
    let token = token_for(Uuid::new_v4());

    let body: Value = Client::new()
        .post(format!("{base}/api/sales/plans/preview"))
        .bearer_auth(&token)
        .json(&json!({
            "devicePrice": "1.000.000",
            "initialPayment": "200.000",
            "currency": "COP",
            "quotas": 4,
            "frecuenciaDias": 30,
            "initialDate": "2024-01-01"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["formattedBalance"], "$ 800.000");
    let installments = body["installments"].as_array().unwrap();
    assert_eq!(installments.len(), 4);
    assert_eq!(installments[3]["dueDate"], "2024-03-31");
    assert_eq!(installments[3]["formattedAmount"], "$ 200.000");
}

#[tokio::test]
async fn oversized_schedule_is_rejected_before_building_it() {
    let base = spawn_console(FakeBackend::new()).await;
    let token = token_for(Uuid::new_v4());

    let response = Client::new()
        .post(format!("{base}/api/sales/plans/preview"))
        .bearer_auth(&token)
        .json(&json!({
            "devicePrice": "1.000.000",
            "initialPayment": "0",
            "currency": "COP",
            "quotas": u32::MAX,
            "frecuenciaDias": 1,
            "initialDate": "2024-01-01"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"]["quotas"].is_array());
}

#[tokio::test]
async fn locate_then_poll_until_located() {
    let backend = FakeBackend::new();
    backend
        .location_pending_polls
        .store(2, std::sync::atomic::Ordering::SeqCst);
    let base = spawn_console(backend).await;
    let token = token_for(Uuid::new_v4());
    let client = Client::new();
    let device_id = Uuid::new_v4();

    let response = client
        .post(format!("{base}/api/devices/{device_id}/locate"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let mut status = Value::Null;
    for _ in 0..500 {
        status = client
            .get(format!("{base}/api/devices/{device_id}/location"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if status["status"] == "LOCATED" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert_eq!(status["status"], "LOCATED");
    assert_eq!(status["location"]["latitude"], 4.711);
}

#[tokio::test]
async fn block_reports_the_new_device_state() {
    let base = spawn_console(FakeBackend::new()).await;
    let token = token_for(Uuid::new_v4());
    let device_id = Uuid::new_v4();

    let body: Value = Client::new()
        .post(format!("{base}/api/devices/{device_id}/block"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["state"], "BLOCKED");
    assert_eq!(body["deviceId"], device_id.to_string());
}
