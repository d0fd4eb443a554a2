// src/models/plan.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::currency::Currency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Pending,
    Paid,
    Cancelled,
}

// Plano de financiamento do aparelho.
// balance_to_finance = value - entrada (>= 0); monto_cuota = saldo / quotas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlan {
    #[schema(example = "1000000")]
    pub value: Decimal,
    #[schema(example = "800000")]
    pub balance_to_finance: Decimal,
    #[schema(example = 4)]
    pub quotas: u32,
    #[schema(example = 30)]
    pub frecuencia_dias: u32,
    #[schema(value_type = Option<String>, format = Date, example = "2024-01-01")]
    pub initial_date: Option<NaiveDate>,
    #[schema(example = "200000")]
    pub monto_cuota: Decimal,
    pub currency: Currency,
}

// Parcela derivada do plano; nunca é digitada pelo operador.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    #[schema(example = 1)]
    pub number: u32,
    #[schema(value_type = String, format = Date, example = "2024-01-31")]
    pub due_date: NaiveDate,
    #[schema(example = "200000")]
    pub amount: Decimal,
}

// Entrada paga no ato da venda (vira o primeiro Payment no backend)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitialPayment {
    #[schema(example = "200000")]
    pub value: Decimal,
    pub method: PaymentMethod,
    #[schema(value_type = String, format = Date, example = "2024-01-01")]
    pub date: NaiveDate,
    pub state: PaymentState,
}
