// src/services/amortization.rs

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::plan::Installment;

// Casas decimais mantidas na divisão saldo / parcelas. Bem acima da menor
// unidade de qualquer moeda do catálogo, e garante que parcela * n e a soma
// das n parcelas continuam exatas dentro da mantissa do Decimal.
pub const MONTO_SCALE: u32 = 10;

// Limites do cronograma: 30 anos de parcelas diárias e 100 anos de prazo
pub const MAX_QUOTAS: u32 = 10_950;
pub const MAX_SCHEDULE_DAYS: u64 = 36_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("o valor do dispositivo é obrigatório")]
    MissingDevicePrice,
    #[error("o valor da entrada é obrigatório")]
    MissingInitialPayment,
    #[error("valor negativo em {0}")]
    NegativeAmount(&'static str),
    #[error("a entrada supera o valor do dispositivo")]
    NegativeBalance,
    #[error("sem saldo a financiar, parcelas e frequência devem ser 0")]
    ScheduleOnSettledBalance,
    #[error("número de parcelas obrigatório")]
    MissingQuotas,
    #[error("frequência em dias obrigatória")]
    MissingFrequency,
    #[error("data da primeira parcela obrigatória")]
    MissingInitialDate,
    #[error("número de parcelas acima do limite")]
    TooManyQuotas,
    #[error("o cronograma ultrapassa o prazo máximo")]
    ScheduleOutOfRange,
    #[error("a parcela arredondada fica zerada")]
    InstallmentTooSmall,
    #[error("método de pagamento obrigatório")]
    MissingPaymentMethod,
    #[error("data do pagamento obrigatória")]
    MissingPaymentDate,
}

impl PlanError {
    // Campo do formulário onde o erro deve aparecer
    pub fn field(&self) -> &'static str {
        match self {
            PlanError::MissingDevicePrice => "devicePrice",
            PlanError::MissingInitialPayment | PlanError::NegativeBalance => "initialPayment",
            PlanError::NegativeAmount(field) => field,
            PlanError::ScheduleOnSettledBalance
            | PlanError::MissingQuotas
            | PlanError::TooManyQuotas
            | PlanError::InstallmentTooSmall => "quotas",
            PlanError::MissingFrequency | PlanError::ScheduleOutOfRange => "frecuenciaDias",
            PlanError::MissingInitialDate => "initialDate",
            PlanError::MissingPaymentMethod => "paymentMethod",
            PlanError::MissingPaymentDate => "paymentDate",
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            PlanError::MissingDevicePrice => "device_price_required",
            PlanError::MissingInitialPayment => "initial_payment_required",
            PlanError::NegativeAmount(_) => "negative_amount",
            PlanError::NegativeBalance => "initial_exceeds_price",
            PlanError::ScheduleOnSettledBalance => "settled_requires_zero",
            PlanError::MissingQuotas => "quotas_required",
            PlanError::MissingFrequency => "frequency_required",
            PlanError::MissingInitialDate => "initial_date_required",
            PlanError::TooManyQuotas => "too_many_quotas",
            PlanError::ScheduleOutOfRange => "schedule_out_of_range",
            PlanError::InstallmentTooSmall => "installment_too_small",
            PlanError::MissingPaymentMethod => "payment_method_required",
            PlanError::MissingPaymentDate => "payment_date_required",
        }
    }
}

/// Parâmetros do financiamento já normalizados (valores numéricos, não texto).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanTerms {
    pub device_price: Decimal,
    pub initial_payment: Decimal,
    pub quotas: Option<u32>,
    pub frecuencia_dias: Option<u32>,
    pub initial_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Amortization {
    pub balance_to_finance: Decimal,
    pub monto_por_cuota: Decimal,
    pub quotas: u32,
    pub frecuencia_dias: u32,
    pub installments: Vec<Installment>,
}

/// Calcula saldo, valor da parcela e cronograma.
///
/// Saldo zero exige parcelas e frequência zeradas (ausente conta como zero) e
/// não gera cronograma. Saldo positivo exige parcelas >= 1, frequência >= 1 e
/// data inicial. A parcela é `saldo / parcelas` sem arredondar para a moeda
/// (apenas limitada a `MONTO_SCALE` casas). O cronograma sai sempre com
/// exatamente `quotas` parcelas; prazo ou quantidade fora dos limites é erro.
pub fn amortize(terms: &PlanTerms) -> Result<Amortization, PlanError> {
    if terms.device_price < Decimal::ZERO {
        return Err(PlanError::NegativeAmount("devicePrice"));
    }
    if terms.initial_payment < Decimal::ZERO {
        return Err(PlanError::NegativeAmount("initialPayment"));
    }

    let balance = terms.device_price - terms.initial_payment;
    if balance < Decimal::ZERO {
        return Err(PlanError::NegativeBalance);
    }

    if balance.is_zero() {
        let quotas = terms.quotas.unwrap_or(0);
        let frecuencia_dias = terms.frecuencia_dias.unwrap_or(0);
        if quotas != 0 || frecuencia_dias != 0 {
            return Err(PlanError::ScheduleOnSettledBalance);
        }
        return Ok(Amortization {
            balance_to_finance: Decimal::ZERO,
            monto_por_cuota: Decimal::ZERO,
            quotas: 0,
            frecuencia_dias: 0,
            installments: Vec::new(),
        });
    }

    let quotas = terms.quotas.filter(|q| *q >= 1).ok_or(PlanError::MissingQuotas)?;
    let frecuencia_dias = terms
        .frecuencia_dias
        .filter(|f| *f >= 1)
        .ok_or(PlanError::MissingFrequency)?;
    let initial_date = terms.initial_date.ok_or(PlanError::MissingInitialDate)?;
    if quotas > MAX_QUOTAS {
        return Err(PlanError::TooManyQuotas);
    }

    let last_offset = u64::from(quotas - 1) * u64::from(frecuencia_dias);
    if last_offset > MAX_SCHEDULE_DAYS
        || initial_date.checked_add_days(Days::new(last_offset)).is_none()
    {
        return Err(PlanError::ScheduleOutOfRange);
    }

    let monto_por_cuota = (balance / Decimal::from(quotas)).round_dp(MONTO_SCALE);
    if monto_por_cuota.is_zero() {
        return Err(PlanError::InstallmentTooSmall);
    }

    let installments = installment_schedule(
        Some(monto_por_cuota),
        Some(quotas),
        Some(frecuencia_dias),
        Some(initial_date),
    );

    Ok(Amortization {
        balance_to_finance: balance,
        monto_por_cuota,
        quotas,
        frecuencia_dias,
        installments,
    })
}

/// Cronograma determinístico: parcela `i` vence em `data_inicial + i * frequência`.
/// Qualquer parâmetro ausente (ou zerado) resulta em cronograma vazio, assim
/// como um cronograma acima de `MAX_QUOTAS` ou cuja última data não existe:
/// nunca sai um cronograma parcial.
pub fn installment_schedule(
    monto_cuota: Option<Decimal>,
    quotas: Option<u32>,
    frecuencia_dias: Option<u32>,
    initial_date: Option<NaiveDate>,
) -> Vec<Installment> {
    let (Some(amount), Some(quotas), Some(frecuencia_dias), Some(initial_date)) =
        (monto_cuota, quotas, frecuencia_dias, initial_date)
    else {
        return Vec::new();
    };
    if quotas == 0 || quotas > MAX_QUOTAS || frecuencia_dias == 0 || amount <= Decimal::ZERO {
        return Vec::new();
    }

    (0..quotas)
        .map(|i| {
            let offset = u64::from(i) * u64::from(frecuencia_dias);
            initial_date
                .checked_add_days(Days::new(offset))
                .map(|due_date| Installment {
                    number: i + 1,
                    due_date,
                    amount,
                })
        })
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}
