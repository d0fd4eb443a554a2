mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use uuid::Uuid;

use sales_backoffice::{
    common::error::AppError,
    middleware::i18n::Locale,
    models::{enrolment::EnrolmentState, plan::PaymentState},
    services::{
        sale_saga::{SagaStep, SalePersistenceSaga},
        sale_wizard::FinalizeInput,
        SaleWizard,
    },
};

use common::{customer, operator, plan_form, sample_device, FakeBackend, TOKEN};

fn finalize_input() -> FinalizeInput {
    let resolved = EnrolmentState::Resolved {
        enrolment_id: Uuid::new_v4(),
        device: sample_device(),
    };
    let signed = sales_backoffice::models::sale::SignedContract {
        file_name: "contrato.pdf".into(),
        reference: "files/contrato.pdf".into(),
        attached_at: chrono::Utc::now(),
    };

    SaleWizard::start(operator())
        .select_customer(customer())
        .and_then(|w| w.confirm_device(&resolved))
        .and_then(|w| w.submit_plan(&plan_form()))
        .and_then(|w| w.attach_signed_contract(signed))
        .and_then(|w| w.confirm_contract())
        .and_then(|w| w.ready_to_finalize())
        .unwrap()
}

#[tokio::test]
async fn persists_the_four_records_in_order() {
    let backend = FakeBackend::new();
    let saga = SalePersistenceSaga::new(backend.clone());
    let input = finalize_input();

    let receipt = saga.run(TOKEN, &input).await.unwrap();

    assert_eq!(
        backend.calls(),
        vec!["confirm_enrolment", "create_device", "create_plan", "create_payment"]
    );

    let confirm = backend.confirm_requests.lock().unwrap()[0].clone();
    assert_eq!(confirm.enrolment_id, input.device.enrolment_id);
    assert_eq!(confirm.customer_id, input.customer_id);
    assert_eq!(confirm.user_id, input.operator.user_id);

    let device = backend.device_requests.lock().unwrap()[0].clone();
    assert_eq!(device.enrolment_id, receipt.enrolment_id);
    assert_eq!(device.serial_number, "R58N123ABC");

    let plan = backend.plan_requests.lock().unwrap()[0].clone();
    assert_eq!(plan.device_id, receipt.device_id);
    assert_eq!(plan.customer_id, input.customer_id);
    assert_eq!(plan.balance_to_finance, dec!(800000));
    assert_eq!(plan.monto_cuota, dec!(200000));

    let payment = backend.payment_requests.lock().unwrap()[0].clone();
    assert_eq!(payment.device_id, receipt.device_id);
    assert_eq!(payment.plan_id, receipt.plan_id);
    assert_eq!(payment.value, dec!(200000));
    assert_eq!(payment.state, PaymentState::Paid);
}

// Falha no plano depois de enrolamento e aparelho criados: um erro só,
// e os dois registros anteriores continuam no backend.
#[tokio::test]
async fn plan_failure_reports_one_error_and_keeps_earlier_records() {
    let backend = FakeBackend::new();
    backend.fail("create_plan");
    let saga = SalePersistenceSaga::new(backend.clone());

    let err = saga.run(TOKEN, &finalize_input()).await.unwrap_err();

    assert_eq!(err.step, SagaStep::CreatePlan);
    assert!(err.is_partial());
    assert!(err.created.enrolment_id.is_some());
    assert!(err.created.device_id.is_some());
    assert!(err.created.plan_id.is_none());
    assert_eq!(backend.count("create_payment"), 0);
    assert_eq!(backend.device_requests.lock().unwrap().len(), 1);

    let api = AppError::SaleFinalize(err).to_api_error(&Locale("en".into()));
    assert_eq!(api.status, StatusCode::BAD_GATEWAY);
    let details = api.details.unwrap();
    assert_eq!(details["failedStep"], "CREATE_PLAN");
    assert_eq!(details["partial"], true);
}

#[tokio::test]
async fn first_step_failure_is_not_partial() {
    let backend = FakeBackend::new();
    backend.fail("confirm_enrolment");
    let saga = SalePersistenceSaga::new(backend.clone());

    let err = saga.run(TOKEN, &finalize_input()).await.unwrap_err();

    assert_eq!(err.step, SagaStep::ConfirmEnrolment);
    assert!(!err.is_partial());
    assert_eq!(backend.calls(), vec!["confirm_enrolment"]);
}

#[tokio::test]
async fn retry_reruns_every_step_from_the_start() {
    let backend = FakeBackend::new();
    backend.fail("create_payment");
    let saga = SalePersistenceSaga::new(backend.clone());
    let input = finalize_input();

    assert!(saga.run(TOKEN, &input).await.is_err());
    backend.recover("create_payment");
    assert!(saga.run(TOKEN, &input).await.is_ok());

    // Sem compensação: a primeira tentativa deixa registros duplicados
    assert_eq!(backend.count("confirm_enrolment"), 2);
    assert_eq!(backend.count("create_device"), 2);
    assert_eq!(backend.count("create_plan"), 2);
}
