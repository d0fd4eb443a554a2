// src/backend/http_client.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    backend::{
        api::BackendApi,
        payloads::{
            ConfirmEnrolmentRequest, CreateDeviceRequest, CreateEnrolmentRequest,
            CreatePaymentRequest, CreatePlanRequest, CreatedResponse, DeviceStateResponse,
            EnrolmentResponse, LocationResponse,
        },
    },
    common::error::BackendError,
    models::device::{DeviceCommand, DeviceDetails, DeviceLocation, DeviceState},
};

/// Cliente HTTP da API remota de financiamento.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn post_for_id<B: Serialize + ?Sized>(
        &self,
        token: &str,
        path: &str,
        body: &B,
    ) -> Result<Uuid, BackendError> {
        let request = self.client.post(self.url(path)).bearer_auth(token).json(body);
        let created: CreatedResponse = Self::read_json(Self::send(request).await?).await?;
        Ok(created.id)
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    #[instrument(name = "backend_create_enrolment", skip_all)]
    async fn create_enrolment(
        &self,
        token: &str,
        request: &CreateEnrolmentRequest,
    ) -> Result<Uuid, BackendError> {
        self.post_for_id(token, "/enrolments", request).await
    }

    async fn get_enrolment(
        &self,
        token: &str,
        enrolment_id: Uuid,
    ) -> Result<Option<DeviceDetails>, BackendError> {
        let request = self
            .client
            .get(self.url(&format!("/enrolments/{enrolment_id}")))
            .bearer_auth(token);

        let enrolment: EnrolmentResponse = Self::read_json(Self::send(request).await?).await?;
        Ok(enrolment.device_details.map(DeviceDetails::from))
    }

    #[instrument(name = "backend_confirm_enrolment", skip_all)]
    async fn confirm_enrolment(
        &self,
        token: &str,
        request: &ConfirmEnrolmentRequest,
    ) -> Result<Uuid, BackendError> {
        self.post_for_id(token, "/enrolments/confirmations", request).await
    }

    #[instrument(name = "backend_create_device", skip_all)]
    async fn create_device(
        &self,
        token: &str,
        request: &CreateDeviceRequest,
    ) -> Result<Uuid, BackendError> {
        self.post_for_id(token, "/devices", request).await
    }

    #[instrument(name = "backend_create_plan", skip_all)]
    async fn create_plan(
        &self,
        token: &str,
        request: &CreatePlanRequest,
    ) -> Result<Uuid, BackendError> {
        self.post_for_id(token, "/plans", request).await
    }

    #[instrument(name = "backend_create_payment", skip_all)]
    async fn create_payment(
        &self,
        token: &str,
        request: &CreatePaymentRequest,
    ) -> Result<Uuid, BackendError> {
        self.post_for_id(token, "/payments", request).await
    }

    async fn request_location(&self, token: &str, device_id: Uuid) -> Result<(), BackendError> {
        let request = self
            .client
            .post(self.url(&format!("/devices/{device_id}/locate")))
            .bearer_auth(token);

        Self::send(request).await?;
        Ok(())
    }

    async fn get_location(
        &self,
        token: &str,
        device_id: Uuid,
    ) -> Result<Option<DeviceLocation>, BackendError> {
        let request = self
            .client
            .get(self.url(&format!("/devices/{device_id}/location")))
            .bearer_auth(token);

        let location: LocationResponse = Self::read_json(Self::send(request).await?).await?;
        Ok(location.into_location())
    }

    async fn send_device_command(
        &self,
        token: &str,
        device_id: Uuid,
        command: DeviceCommand,
    ) -> Result<DeviceState, BackendError> {
        let request = self
            .client
            .post(self.url(&format!("/devices/{device_id}/{}", command.path_segment())))
            .bearer_auth(token);

        let response: DeviceStateResponse = Self::read_json(Self::send(request).await?).await?;
        Ok(response.state)
    }
}
