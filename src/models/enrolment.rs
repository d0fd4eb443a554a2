// src/models/enrolment.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::device::DeviceDetails;

// JSON lido pelo agente de gestão do aparelho (renderizado como QR)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ProvisioningPayload(pub Value);

// Máquina de estados de uma tentativa de enrolamento:
// Idle -> Requesting -> AwaitingDevice -> {Resolved | TimedOut | Failed}
#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrolmentState {
    #[default]
    Idle,
    Requesting,
    #[serde(rename_all = "camelCase")]
    AwaitingDevice {
        enrolment_id: Uuid,
        payload: ProvisioningPayload,
    },
    #[serde(rename_all = "camelCase")]
    Resolved {
        enrolment_id: Uuid,
        device: DeviceDetails,
    },
    #[serde(rename_all = "camelCase")]
    TimedOut { enrolment_id: Uuid, attempts: u32 },
    #[serde(rename_all = "camelCase")]
    Failed { message: String },
}

impl EnrolmentState {
    /// Pedido ou polling ainda em curso.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, EnrolmentState::Requesting | EnrolmentState::AwaitingDevice { .. })
    }

    pub fn resolved(&self) -> Option<(Uuid, &DeviceDetails)> {
        match self {
            EnrolmentState::Resolved { enrolment_id, device } => Some((*enrolment_id, device)),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&ProvisioningPayload> {
        match self {
            EnrolmentState::AwaitingDevice { payload, .. } => Some(payload),
            _ => None,
        }
    }
}
