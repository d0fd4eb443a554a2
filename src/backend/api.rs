// src/backend/api.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    backend::payloads::{
        ConfirmEnrolmentRequest, CreateDeviceRequest, CreateEnrolmentRequest,
        CreatePaymentRequest, CreatePlanRequest,
    },
    common::error::BackendError,
    models::device::{DeviceCommand, DeviceDetails, DeviceLocation, DeviceState},
};

/// Operações da API remota que o núcleo de vendas usa.
///
/// Todas recebem o token Bearer do operador, que é repassado como está.
/// Um `404` vira `BackendError::NotFound`; é assim que o polling distingue
/// "ainda pendente" de falha.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// `POST /enrolments` -> id do enrolamento pendente.
    async fn create_enrolment(
        &self,
        token: &str,
        request: &CreateEnrolmentRequest,
    ) -> Result<Uuid, BackendError>;

    /// `GET /enrolments/{id}`: `NotFound` enquanto o aparelho não se conecta.
    /// `Ok(None)` quando o registro existe mas ainda sem atributos.
    async fn get_enrolment(
        &self,
        token: &str,
        enrolment_id: Uuid,
    ) -> Result<Option<DeviceDetails>, BackendError>;

    async fn confirm_enrolment(
        &self,
        token: &str,
        request: &ConfirmEnrolmentRequest,
    ) -> Result<Uuid, BackendError>;

    async fn create_device(
        &self,
        token: &str,
        request: &CreateDeviceRequest,
    ) -> Result<Uuid, BackendError>;

    async fn create_plan(
        &self,
        token: &str,
        request: &CreatePlanRequest,
    ) -> Result<Uuid, BackendError>;

    async fn create_payment(
        &self,
        token: &str,
        request: &CreatePaymentRequest,
    ) -> Result<Uuid, BackendError>;

    /// `POST /devices/{id}/locate`
    async fn request_location(&self, token: &str, device_id: Uuid) -> Result<(), BackendError>;

    /// `GET /devices/{id}/location`: `NotFound` até o aparelho reportar.
    async fn get_location(
        &self,
        token: &str,
        device_id: Uuid,
    ) -> Result<Option<DeviceLocation>, BackendError>;

    async fn send_device_command(
        &self,
        token: &str,
        device_id: Uuid,
        command: DeviceCommand,
    ) -> Result<DeviceState, BackendError>;
}
