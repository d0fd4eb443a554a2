#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use sales_backoffice::{
    backend::{
        payloads::{
            ConfirmEnrolmentRequest, CreateDeviceRequest, CreateEnrolmentRequest,
            CreatePaymentRequest, CreatePlanRequest,
        },
        BackendApi,
    },
    common::error::{AppError, BackendError},
    models::{
        currency::Currency,
        device::{DeviceCommand, DeviceDetails, DeviceLocation, DeviceState},
        plan::PaymentMethod,
        sale::{CustomerRef, Operator},
    },
    services::{
        contract_service::{ContractContent, ContractGenerator},
        polling::PollConfig,
        sale_wizard::PlanSubmission,
    },
};

pub const TOKEN: &str = "token-de-teste";

/// Backend em memória. Cada chamada fica registrada em `calls` pelo nome do
/// método; `failing` faz o método responder 500.
pub struct FakeBackend {
    pub calls: Mutex<Vec<&'static str>>,
    pub failing: Mutex<HashSet<&'static str>>,
    // Quantas consultas respondem 404 antes do aparelho aparecer
    pub enrolment_pending_polls: AtomicU32,
    pub enrolment_polls: AtomicU32,
    pub location_pending_polls: AtomicU32,
    pub location_polls: AtomicU32,
    pub device: DeviceDetails,
    pub location: DeviceLocation,
    pub enrolment_requests: Mutex<Vec<CreateEnrolmentRequest>>,
    pub confirm_requests: Mutex<Vec<ConfirmEnrolmentRequest>>,
    pub device_requests: Mutex<Vec<CreateDeviceRequest>>,
    pub plan_requests: Mutex<Vec<CreatePlanRequest>>,
    pub payment_requests: Mutex<Vec<CreatePaymentRequest>>,
    pub tokens: Mutex<Vec<String>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            enrolment_pending_polls: AtomicU32::new(0),
            enrolment_polls: AtomicU32::new(0),
            location_pending_polls: AtomicU32::new(0),
            location_polls: AtomicU32::new(0),
            device: sample_device(),
            location: DeviceLocation {
                latitude: 4.711,
                longitude: -74.0721,
                reported_at: None,
            },
            enrolment_requests: Mutex::new(Vec::new()),
            confirm_requests: Mutex::new(Vec::new()),
            device_requests: Mutex::new(Vec::new()),
            plan_requests: Mutex::new(Vec::new()),
            payment_requests: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn resolving_after(pending_polls: u32) -> Arc<Self> {
        let backend = Self::default();
        backend.enrolment_pending_polls.store(pending_polls, Ordering::SeqCst);
        Arc::new(backend)
    }

    pub fn never_resolving() -> Arc<Self> {
        Self::resolving_after(u32::MAX)
    }

    pub fn fail(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

    pub fn recover(&self, method: &'static str) {
        self.failing.lock().unwrap().remove(method);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == method).count()
    }

    fn record(&self, method: &'static str, token: &str) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(method);
        self.tokens.lock().unwrap().push(token.to_string());
        if self.failing.lock().unwrap().contains(method) {
            return Err(BackendError::Status {
                status: 500,
                body: format!("{method} indisponível"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn create_enrolment(
        &self,
        token: &str,
        request: &CreateEnrolmentRequest,
    ) -> Result<Uuid, BackendError> {
        self.record("create_enrolment", token)?;
        self.enrolment_requests.lock().unwrap().push(request.clone());
        Ok(Uuid::new_v4())
    }

    async fn get_enrolment(
        &self,
        token: &str,
        _enrolment_id: Uuid,
    ) -> Result<Option<DeviceDetails>, BackendError> {
        self.record("get_enrolment", token)?;
        let poll = self.enrolment_polls.fetch_add(1, Ordering::SeqCst) + 1;
        if poll <= self.enrolment_pending_polls.load(Ordering::SeqCst) {
            return Err(BackendError::NotFound);
        }
        Ok(Some(self.device.clone()))
    }

    async fn confirm_enrolment(
        &self,
        token: &str,
        request: &ConfirmEnrolmentRequest,
    ) -> Result<Uuid, BackendError> {
        self.record("confirm_enrolment", token)?;
        self.confirm_requests.lock().unwrap().push(request.clone());
        Ok(request.enrolment_id)
    }

    async fn create_device(
        &self,
        token: &str,
        request: &CreateDeviceRequest,
    ) -> Result<Uuid, BackendError> {
        self.record("create_device", token)?;
        self.device_requests.lock().unwrap().push(request.clone());
        Ok(Uuid::new_v4())
    }

    async fn create_plan(
        &self,
        token: &str,
        request: &CreatePlanRequest,
    ) -> Result<Uuid, BackendError> {
        self.record("create_plan", token)?;
        self.plan_requests.lock().unwrap().push(request.clone());
        Ok(Uuid::new_v4())
    }

    async fn create_payment(
        &self,
        token: &str,
        request: &CreatePaymentRequest,
    ) -> Result<Uuid, BackendError> {
        self.record("create_payment", token)?;
        self.payment_requests.lock().unwrap().push(request.clone());
        Ok(Uuid::new_v4())
    }

    async fn request_location(&self, token: &str, _device_id: Uuid) -> Result<(), BackendError> {
        self.record("request_location", token)
    }

    async fn get_location(
        &self,
        token: &str,
        _device_id: Uuid,
    ) -> Result<Option<DeviceLocation>, BackendError> {
        self.record("get_location", token)?;
        let poll = self.location_polls.fetch_add(1, Ordering::SeqCst) + 1;
        if poll <= self.location_pending_polls.load(Ordering::SeqCst) {
            return Err(BackendError::NotFound);
        }
        Ok(Some(self.location))
    }

    async fn send_device_command(
        &self,
        token: &str,
        _device_id: Uuid,
        command: DeviceCommand,
    ) -> Result<DeviceState, BackendError> {
        self.record("send_device_command", token)?;
        Ok(match command {
            DeviceCommand::Block => DeviceState::Blocked,
            DeviceCommand::Unblock => DeviceState::Active,
        })
    }
}

/// Gerador de contrato que não depende de fontes no disco.
#[derive(Default)]
pub struct FakeContracts {
    pub rendered: Mutex<Vec<ContractContent>>,
    pub failing: Mutex<bool>,
}

impl ContractGenerator for FakeContracts {
    fn render(&self, content: &ContractContent) -> Result<Vec<u8>, AppError> {
        if *self.failing.lock().unwrap() {
            return Err(AppError::ContractGeneration("falha simulada".into()));
        }
        self.rendered.lock().unwrap().push(content.clone());
        Ok(b"%PDF-1.4 contrato".to_vec())
    }
}

pub fn sample_device() -> DeviceDetails {
    DeviceDetails {
        serial_number: "R58N123ABC".into(),
        imeis: vec!["356938035643809".into(), "356938035643817".into()],
        brand: "Samsung".into(),
        model: "SM-A145M".into(),
        product_name: "Galaxy A14".into(),
        state: DeviceState::Active,
    }
}

pub fn operator() -> Operator {
    Operator {
        user_id: Uuid::new_v4(),
        vendor_id: Uuid::new_v4(),
        name: Some("Carlos Gómez".into()),
    }
}

pub fn customer() -> CustomerRef {
    CustomerRef {
        id: Uuid::new_v4(),
        full_name: Some("Ana María Restrepo".into()),
        document_number: Some("1020304050".into()),
    }
}

pub fn plan_form() -> PlanSubmission {
    PlanSubmission {
        device_price: "1.000.000".into(),
        initial_payment: "200.000".into(),
        currency: Currency::Cop,
        quotas: Some(4),
        frecuencia_dias: Some(30),
        initial_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        payment_method: Some(PaymentMethod::Cash),
        payment_date: NaiveDate::from_ymd_opt(2024, 1, 1),
    }
}

pub fn fast_poll(max_attempts: u32) -> PollConfig {
    PollConfig {
        initial_delay: Duration::ZERO,
        interval: Duration::from_millis(1),
        max_attempts,
    }
}
