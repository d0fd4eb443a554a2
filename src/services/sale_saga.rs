// src/services/sale_saga.rs

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    backend::{
        payloads::{
            ConfirmEnrolmentRequest, CreateDeviceRequest, CreatePaymentRequest, CreatePlanRequest,
        },
        BackendApi,
    },
    common::error::BackendError,
    models::sale::SaleReceipt,
    services::sale_wizard::FinalizeInput,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaStep {
    ConfirmEnrolment,
    CreateDevice,
    CreatePlan,
    CreateInitialPayment,
}

// Registros que já existem no backend quando um passo falha
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRecords {
    pub enrolment_id: Option<Uuid>,
    pub device_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
}

impl CreatedRecords {
    pub fn is_empty(&self) -> bool {
        self.enrolment_id.is_none() && self.device_id.is_none() && self.plan_id.is_none()
    }
}

/// Um único erro agregado para o operador. Os registros criados antes da falha
/// não são desfeitos; ficam listados em `created`.
#[derive(Debug, Error)]
#[error("falha no passo {step:?} da finalização: {source}")]
pub struct SagaError {
    pub step: SagaStep,
    pub created: CreatedRecords,
    #[source]
    pub source: BackendError,
}

impl SagaError {
    /// Sucesso parcial: algo ficou gravado no backend.
    pub fn is_partial(&self) -> bool {
        !self.created.is_empty()
    }
}

/// Persiste a venda em quatro criações dependentes, uma por vez:
/// confirmação do enrolamento, aparelho, plano e pagamento de entrada.
#[derive(Clone)]
pub struct SalePersistenceSaga {
    backend: Arc<dyn BackendApi>,
}

impl SalePersistenceSaga {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self { backend }
    }

    pub async fn run(&self, token: &str, input: &FinalizeInput) -> Result<SaleReceipt, SagaError> {
        let mut created = CreatedRecords::default();

        // 1. Confirmação do enrolamento (cliente + operador)
        let confirm = ConfirmEnrolmentRequest {
            enrolment_id: input.device.enrolment_id,
            customer_id: input.customer_id,
            user_id: input.operator.user_id,
            vendor_id: input.operator.vendor_id,
        };
        let enrolment_id = self
            .backend
            .confirm_enrolment(token, &confirm)
            .await
            .map_err(|e| fail(SagaStep::ConfirmEnrolment, &created, e))?;
        created.enrolment_id = Some(enrolment_id);
        tracing::info!(%enrolment_id, "enrolamento confirmado");

        // 2. Aparelho, com os atributos reportados no enrolamento
        let details = &input.device.details;
        let device_request = CreateDeviceRequest {
            enrolment_id,
            serial_number: details.serial_number.clone(),
            imeis: details.imeis.clone(),
            brand: details.brand.clone(),
            model: details.model.clone(),
            product_name: details.product_name.clone(),
            state: details.state,
        };
        let device_id = self
            .backend
            .create_device(token, &device_request)
            .await
            .map_err(|e| fail(SagaStep::CreateDevice, &created, e))?;
        created.device_id = Some(device_id);
        tracing::info!(%device_id, serial = %details.serial_number, "aparelho registrado");

        // 3. Plano de pagamento
        let plan = &input.plan;
        let plan_request = CreatePlanRequest {
            device_id,
            customer_id: input.customer_id,
            user_id: input.operator.user_id,
            vendor_id: input.operator.vendor_id,
            value: plan.value,
            balance_to_finance: plan.balance_to_finance,
            quotas: plan.quotas,
            frecuencia_dias: plan.frecuencia_dias,
            initial_date: plan.initial_date,
            monto_cuota: plan.monto_cuota,
            currency: plan.currency,
        };
        let plan_id = self
            .backend
            .create_plan(token, &plan_request)
            .await
            .map_err(|e| fail(SagaStep::CreatePlan, &created, e))?;
        created.plan_id = Some(plan_id);
        tracing::info!(%plan_id, quotas = plan.quotas, currency = plan.currency.code(), "plano criado");

        // 4. Pagamento de entrada
        let payment = &input.initial_payment;
        let payment_request = CreatePaymentRequest {
            device_id,
            plan_id,
            value: payment.value,
            method: payment.method,
            date: payment.date,
            state: payment.state,
        };
        let payment_id = self
            .backend
            .create_payment(token, &payment_request)
            .await
            .map_err(|e| fail(SagaStep::CreateInitialPayment, &created, e))?;
        tracing::info!(%payment_id, "✅ venda registrada");

        Ok(SaleReceipt {
            enrolment_id,
            device_id,
            plan_id,
            payment_id,
        })
    }
}

fn fail(step: SagaStep, created: &CreatedRecords, source: BackendError) -> SagaError {
    if created.is_empty() {
        tracing::error!(?step, error = %source, "finalização falhou sem registros criados");
    } else {
        tracing::error!(
            ?step,
            error = %source,
            orphans = ?created,
            "finalização parcial: registros anteriores permanecem no backend"
        );
    }
    SagaError {
        step,
        created: created.clone(),
        source,
    }
}
