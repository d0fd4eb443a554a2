// src/models/device.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    Active,
    Blocked,
    Released,
}

// Atributos reportados pelo próprio aparelho ao concluir o enrolamento.
// Depois de resolvidos não mudam: a persistência usa exatamente estes dados.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetails {
    #[schema(example = "R58N123ABC")]
    pub serial_number: String,

    #[schema(example = json!(["356938035643809", "356938035643817"]))]
    pub imeis: Vec<String>,

    #[schema(example = "Samsung")]
    pub brand: String,

    #[schema(example = "SM-A145M")]
    pub model: String,

    #[schema(example = "Galaxy A14")]
    pub product_name: String,

    pub state: DeviceState,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub reported_at: Option<DateTime<Utc>>,
}

// Ações diretas (sem polling) sobre um aparelho já vendido
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCommand {
    Block,
    Unblock,
}

impl DeviceCommand {
    pub fn path_segment(self) -> &'static str {
        match self {
            DeviceCommand::Block => "block",
            DeviceCommand::Unblock => "unblock",
        }
    }
}
