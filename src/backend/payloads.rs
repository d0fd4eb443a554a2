// src/backend/payloads.rs

// Formato de fio da API remota (snake_case). Os modelos expostos pelo
// console usam camelCase, então a tradução fica concentrada aqui.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    currency::Currency,
    device::{DeviceDetails, DeviceLocation, DeviceState},
    plan::{PaymentMethod, PaymentState},
};

// --- Requisições ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEnrolmentRequest {
    pub user_id: Uuid,
    pub vendor_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmEnrolmentRequest {
    // Enrolamento pendente que o aparelho resolveu
    pub enrolment_id: Uuid,
    pub customer_id: Uuid,
    pub user_id: Uuid,
    pub vendor_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    pub enrolment_id: Uuid,
    pub serial_number: String,
    pub imeis: Vec<String>,
    pub brand: String,
    pub model: String,
    pub product_name: String,
    pub state: DeviceState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlanRequest {
    pub device_id: Uuid,
    pub customer_id: Uuid,
    pub user_id: Uuid,
    pub vendor_id: Uuid,
    pub value: Decimal,
    pub balance_to_finance: Decimal,
    pub quotas: u32,
    pub frecuencia_dias: u32,
    pub initial_date: Option<NaiveDate>,
    pub monto_cuota: Decimal,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub device_id: Uuid,
    pub plan_id: Uuid,
    pub value: Decimal,
    pub method: PaymentMethod,
    pub date: NaiveDate,
    pub state: PaymentState,
}

// --- Respostas ---

// Cada recurso devolve o id com o próprio nome da chave
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    #[serde(
        alias = "enrolment_id",
        alias = "device_id",
        alias = "plan_id",
        alias = "payment_id"
    )]
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrolmentResponse {
    #[serde(default, alias = "id")]
    pub enrolment_id: Option<Uuid>,
    #[serde(default)]
    pub device_details: Option<DeviceDetailsDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDetailsDto {
    pub serial_number: String,
    #[serde(default, alias = "imei")]
    pub imeis: Vec<String>,
    pub brand: String,
    pub model: String,
    pub product_name: String,
    pub state: DeviceState,
}

impl From<DeviceDetailsDto> for DeviceDetails {
    fn from(dto: DeviceDetailsDto) -> Self {
        DeviceDetails {
            serial_number: dto.serial_number,
            imeis: dto.imeis,
            brand: dto.brand,
            model: dto.model,
            product_name: dto.product_name,
            state: dto.state,
        }
    }
}

impl From<&DeviceDetails> for DeviceDetailsDto {
    fn from(details: &DeviceDetails) -> Self {
        DeviceDetailsDto {
            serial_number: details.serial_number.clone(),
            imeis: details.imeis.clone(),
            brand: details.brand.clone(),
            model: details.model.clone(),
            product_name: details.product_name.clone(),
            state: details.state,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub reported_at: Option<DateTime<Utc>>,
}

impl LocationResponse {
    // Resposta sem coordenadas conta como "sem fix" (vazia)
    pub fn into_location(self) -> Option<DeviceLocation> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(DeviceLocation {
                latitude,
                longitude,
                reported_at: self.reported_at,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStateResponse {
    pub state: DeviceState,
}
