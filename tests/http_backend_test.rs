mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use sales_backoffice::{
    backend::{
        payloads::{CreateEnrolmentRequest, DeviceDetailsDto},
        BackendApi, HttpBackend,
    },
    common::error::BackendError,
    models::device::{DeviceCommand, DeviceState},
};

use common::{sample_device, TOKEN};

#[derive(Clone, Default)]
struct Remote {
    enrolment_polls: Arc<AtomicU32>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn create_enrolment(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })));
    }
    assert!(body.get("user_id").is_some());
    assert!(body.get("vendor_id").is_some());
    (
        StatusCode::CREATED,
        Json(json!({ "enrolment_id": "6f1c2d3e-0000-4000-8000-000000000001" })),
    )
}

// 404 nas duas primeiras consultas, depois o aparelho
async fn get_enrolment(
    State(remote): State<Remote>,
    Path(id): Path<Uuid>,
) -> (StatusCode, Json<Value>) {
    let poll = remote.enrolment_polls.fetch_add(1, Ordering::SeqCst) + 1;
    if poll <= 2 {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "pending" })));
    }
    let details = DeviceDetailsDto::from(&sample_device());
    (
        StatusCode::OK,
        Json(json!({ "enrolment_id": id, "device_details": details })),
    )
}

async fn create_plan() -> (StatusCode, Json<Value>) {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": "quotas inválidas" })))
}

async fn get_location() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "latitude": null, "longitude": null })))
}

async fn block() -> Json<Value> {
    Json(json!({ "state": "BLOCKED" }))
}

async fn garbage() -> &'static str {
    "not json"
}

async fn spawn_remote() -> (String, Remote) {
    let remote = Remote::default();
    let app = Router::new()
        .route("/enrolments", post(create_enrolment))
        .route("/enrolments/{id}", get(get_enrolment))
        .route("/plans", post(create_plan))
        .route("/payments", post(garbage))
        .route("/devices/{id}/location", get(get_location))
        .route("/devices/{id}/block", post(block))
        .with_state(remote.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/"), remote)
}

fn client(base_url: &str) -> HttpBackend {
    HttpBackend::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn create_enrolment_reads_the_named_id() {
    let (base_url, _) = spawn_remote().await;
    let backend = client(&base_url);

    let request = CreateEnrolmentRequest {
        user_id: Uuid::new_v4(),
        vendor_id: Uuid::new_v4(),
    };
    let id = backend.create_enrolment(TOKEN, &request).await.unwrap();

    assert_eq!(id, Uuid::parse_str("6f1c2d3e-0000-4000-8000-000000000001").unwrap());
}

#[tokio::test]
async fn pending_enrolment_is_not_found_until_the_device_reports() {
    let (base_url, remote) = spawn_remote().await;
    let backend = client(&base_url);
    let id = Uuid::new_v4();

    assert!(backend.get_enrolment(TOKEN, id).await.unwrap_err().is_not_found());
    assert!(backend.get_enrolment(TOKEN, id).await.unwrap_err().is_not_found());

    let device = backend.get_enrolment(TOKEN, id).await.unwrap().unwrap();
    assert_eq!(device, sample_device());
    assert_eq!(remote.enrolment_polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn wrong_token_is_a_status_error() {
    let (base_url, _) = spawn_remote().await;
    let backend = client(&base_url);
    let request = CreateEnrolmentRequest {
        user_id: Uuid::new_v4(),
        vendor_id: Uuid::new_v4(),
    };

    let err = backend.create_enrolment("outro-token", &request).await.unwrap_err();
    assert!(matches!(err, BackendError::Status { status: 401, .. }));
}

#[tokio::test]
async fn rejected_create_keeps_status_and_body() {
    let (base_url, _) = spawn_remote().await;
    let backend = client(&base_url);
    let request = sales_backoffice::backend::payloads::CreatePlanRequest {
        device_id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        vendor_id: Uuid::new_v4(),
        value: rust_decimal_macros::dec!(100),
        balance_to_finance: rust_decimal_macros::dec!(100),
        quotas: 1,
        frecuencia_dias: 30,
        initial_date: None,
        monto_cuota: rust_decimal_macros::dec!(100),
        currency: Default::default(),
    };

    match backend.create_plan(TOKEN, &request).await.unwrap_err() {
        BackendError::Status { status, body } => {
            assert_eq!(status, 422);
            assert!(body.contains("quotas"));
        }
        other => panic!("esperava Status, veio {:?}", other),
    }
}

#[tokio::test]
async fn unparseable_body_is_an_invalid_response() {
    let (base_url, _) = spawn_remote().await;
    let backend = client(&base_url);
    let request = sales_backoffice::backend::payloads::CreatePaymentRequest {
        device_id: Uuid::new_v4(),
        plan_id: Uuid::new_v4(),
        value: rust_decimal_macros::dec!(10),
        method: sales_backoffice::models::plan::PaymentMethod::Cash,
        date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        state: sales_backoffice::models::plan::PaymentState::Paid,
    };

    let err = backend.create_payment(TOKEN, &request).await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidResponse(_)));
}

#[tokio::test]
async fn location_without_coordinates_is_empty() {
    let (base_url, _) = spawn_remote().await;
    let backend = client(&base_url);

    let location = backend.get_location(TOKEN, Uuid::new_v4()).await.unwrap();
    assert_eq!(location, None);
}

#[tokio::test]
async fn block_returns_the_new_state() {
    let (base_url, _) = spawn_remote().await;
    let backend = client(&base_url);

    let state = backend
        .send_device_command(TOKEN, Uuid::new_v4(), DeviceCommand::Block)
        .await
        .unwrap();
    assert_eq!(state, DeviceState::Blocked);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (base_url, _) = spawn_remote().await;
    let backend = client(&base_url);

    let err = backend.request_location(TOKEN, Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}
