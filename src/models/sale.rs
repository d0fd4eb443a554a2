// src/models/sale.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    device::DeviceDetails,
    plan::{InitialPayment, PaymentPlan},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    pub id: Uuid,
    #[schema(example = "Ana María Restrepo")]
    pub full_name: Option<String>,
    #[schema(example = "1020304050")]
    pub document_number: Option<String>,
}

// Operador (usuário + vendedor) que conduz a venda
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub user_id: Uuid,
    pub vendor_id: Uuid,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDevice {
    pub enrolment_id: Uuid,
    pub details: DeviceDetails,
}

// Referência ao arquivo assinado (o upload em si é de outro módulo)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedContract {
    #[schema(example = "contrato_assinado.pdf")]
    pub file_name: String,
    #[schema(example = "files/2024/01/contrato_assinado.pdf")]
    pub reference: String,
    pub attached_at: DateTime<Utc>,
}

/// Acumulador do assistente de venda.
///
/// Cada etapa devolve um rascunho novo com o seu campo preenchido (`with_*`),
/// preservando o que as etapas anteriores já produziram. Nenhuma etapa pode
/// assumir que um campo opcional existe sem checar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleDraft {
    pub customer: Option<CustomerRef>,
    pub device: Option<ResolvedDevice>,
    pub payment_plan: Option<PaymentPlan>,
    pub initial_payment: Option<InitialPayment>,
    pub signed_contract_file: Option<SignedContract>,
    pub authenticated_user: Operator,
}

impl SaleDraft {
    pub fn new(operator: Operator) -> Self {
        Self {
            customer: None,
            device: None,
            payment_plan: None,
            initial_payment: None,
            signed_contract_file: None,
            authenticated_user: operator,
        }
    }

    pub fn with_customer(self, customer: CustomerRef) -> Self {
        Self {
            customer: Some(customer),
            ..self
        }
    }

    pub fn with_device(self, device: ResolvedDevice) -> Self {
        Self {
            device: Some(device),
            ..self
        }
    }

    pub fn with_plan(self, plan: PaymentPlan, initial_payment: InitialPayment) -> Self {
        Self {
            payment_plan: Some(plan),
            initial_payment: Some(initial_payment),
            ..self
        }
    }

    pub fn with_signed_contract(self, signed: SignedContract) -> Self {
        Self {
            signed_contract_file: Some(signed),
            ..self
        }
    }
}

// Identificadores gerados pelo backend ao finalizar a venda
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub enrolment_id: Uuid,
    pub device_id: Uuid,
    pub plan_id: Uuid,
    pub payment_id: Uuid,
}
