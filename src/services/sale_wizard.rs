// src/services/sale_wizard.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        currency::Currency,
        enrolment::EnrolmentState,
        plan::{InitialPayment, PaymentMethod, PaymentPlan, PaymentState},
        sale::{CustomerRef, Operator, ResolvedDevice, SaleDraft, SignedContract},
    },
    services::amortization::{amortize, Amortization, PlanError, PlanTerms},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WizardStage {
    Customer,
    Device,
    Plan,
    Contract,
    Summary,
}

impl WizardStage {
    pub fn number(self) -> u8 {
        match self {
            WizardStage::Customer => 1,
            WizardStage::Device => 2,
            WizardStage::Plan => 3,
            WizardStage::Contract => 4,
            WizardStage::Summary => 5,
        }
    }

    pub fn previous(self) -> Option<WizardStage> {
        match self {
            WizardStage::Customer => None,
            WizardStage::Device => Some(WizardStage::Customer),
            WizardStage::Plan => Some(WizardStage::Device),
            WizardStage::Contract => Some(WizardStage::Plan),
            WizardStage::Summary => Some(WizardStage::Contract),
        }
    }
}

// =============================================================================
//  FORMULÁRIO DO PLANO (valores como digitados pelo operador)
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanSubmission {
    #[schema(example = "1.000.000")]
    pub device_price: String,
    #[schema(example = "200.000")]
    pub initial_payment: String,
    #[serde(default)]
    pub currency: Currency,
    #[schema(example = 4)]
    pub quotas: Option<u32>,
    #[schema(example = 30)]
    pub frecuencia_dias: Option<u32>,
    #[schema(value_type = Option<String>, format = Date, example = "2024-01-01")]
    pub initial_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    #[schema(value_type = Option<String>, format = Date, example = "2024-01-01")]
    pub payment_date: Option<NaiveDate>,
}

impl PlanSubmission {
    pub fn terms(&self) -> PlanTerms {
        PlanTerms {
            device_price: self.currency.parse_amount(&self.device_price),
            initial_payment: self.currency.parse_amount(&self.initial_payment),
            quotas: self.quotas,
            frecuencia_dias: self.frecuencia_dias,
            initial_date: self.initial_date,
        }
    }

    /// Valida tudo o que bloqueia o avanço da etapa, coletando um erro por campo.
    pub fn validate(&self) -> Result<(PaymentPlan, InitialPayment, Amortization), AppError> {
        let terms = self.terms();
        let mut errors = Vec::new();

        // Preço zerado (inclusive texto ilegível) não passa. A entrada pode ser
        // "0" digitado, mas não vazia nem ilegível.
        if terms.device_price.is_zero() {
            errors.push(PlanError::MissingDevicePrice);
        }
        if self.currency.try_parse_amount(&self.initial_payment).is_none() {
            errors.push(PlanError::MissingInitialPayment);
        }
        if self.payment_method.is_none() {
            errors.push(PlanError::MissingPaymentMethod);
        }
        if self.payment_date.is_none() {
            errors.push(PlanError::MissingPaymentDate);
        }

        let amortization = match amortize(&terms) {
            Ok(amortization) => Some(amortization),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        let (Some(amortization), Some(method), Some(date), true) =
            (amortization, self.payment_method, self.payment_date, errors.is_empty())
        else {
            return Err(AppError::PlanValidation(errors));
        };

        let plan = PaymentPlan {
            value: terms.device_price,
            balance_to_finance: amortization.balance_to_finance,
            quotas: amortization.quotas,
            frecuencia_dias: amortization.frecuencia_dias,
            initial_date: amortization.installments.first().map(|i| i.due_date),
            monto_cuota: amortization.monto_por_cuota,
            currency: self.currency,
        };
        let initial_payment = InitialPayment {
            value: terms.initial_payment,
            method,
            date,
            state: PaymentState::Paid,
        };

        Ok((plan, initial_payment, amortization))
    }
}

// =============================================================================
//  CONTROLADOR
// =============================================================================

/// Assistente linear de cinco etapas. Cada transição devolve um assistente
/// novo; o atual nunca é alterado, então uma falha não deixa estado pela metade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleWizard {
    stage: WizardStage,
    draft: SaleDraft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackNavigation {
    // Voltar na etapa 1 sai do assistente (volta para a listagem)
    Exit,
    Moved(SaleWizard),
}

impl SaleWizard {
    pub fn start(operator: Operator) -> Self {
        Self {
            stage: WizardStage::Customer,
            draft: SaleDraft::new(operator),
        }
    }

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    pub fn draft(&self) -> &SaleDraft {
        &self.draft
    }

    fn expect_stage(&self, expected: WizardStage) -> Result<(), AppError> {
        if self.stage != expected {
            return Err(AppError::InvalidStage {
                expected,
                actual: self.stage,
            });
        }
        Ok(())
    }

    fn advance(&self, draft: SaleDraft, next: WizardStage) -> Self {
        Self { stage: next, draft }
    }

    // --- Etapa 1: Cliente ---
    pub fn select_customer(&self, customer: CustomerRef) -> Result<Self, AppError> {
        self.expect_stage(WizardStage::Customer)?;
        if customer.id.is_nil() {
            return Err(AppError::CustomerRequired);
        }
        Ok(self.advance(self.draft.clone().with_customer(customer), WizardStage::Device))
    }

    // --- Etapa 2: Dispositivo (só avança com o enrolamento resolvido) ---
    pub fn confirm_device(&self, enrolment: &EnrolmentState) -> Result<Self, AppError> {
        self.expect_stage(WizardStage::Device)?;
        let (enrolment_id, details) = enrolment.resolved().ok_or(AppError::DeviceNotResolved)?;

        let device = ResolvedDevice {
            enrolment_id,
            details: details.clone(),
        };
        Ok(self.advance(self.draft.clone().with_device(device), WizardStage::Plan))
    }

    // --- Etapa 3: Plano e entrada ---
    pub fn submit_plan(&self, form: &PlanSubmission) -> Result<Self, AppError> {
        self.expect_stage(WizardStage::Plan)?;
        let (plan, initial_payment, _) = form.validate()?;
        Ok(self.advance(
            self.draft.clone().with_plan(plan, initial_payment),
            WizardStage::Contract,
        ))
    }

    // --- Etapa 4: Contrato ---
    pub fn attach_signed_contract(&self, signed: SignedContract) -> Result<Self, AppError> {
        self.expect_stage(WizardStage::Contract)?;
        Ok(self.advance(self.draft.clone().with_signed_contract(signed), WizardStage::Contract))
    }

    pub fn confirm_contract(&self) -> Result<Self, AppError> {
        self.expect_stage(WizardStage::Contract)?;
        if self.draft.signed_contract_file.is_none() {
            return Err(AppError::SignedContractRequired);
        }
        Ok(self.advance(self.draft.clone(), WizardStage::Summary))
    }

    // --- Etapa 5: Resumo ---
    pub fn ready_to_finalize(&self) -> Result<FinalizeInput, AppError> {
        self.expect_stage(WizardStage::Summary)?;
        FinalizeInput::from_draft(&self.draft)
    }

    pub fn back(&self) -> BackNavigation {
        match self.stage.previous() {
            None => BackNavigation::Exit,
            Some(previous) => BackNavigation::Moved(self.advance(self.draft.clone(), previous)),
        }
    }

    // Depois de uma venda registrada, recomeça do zero com o mesmo operador
    pub fn reset(&self) -> Self {
        Self::start(self.draft.authenticated_user.clone())
    }
}

/// Tudo o que a persistência precisa, já sem opcionais.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeInput {
    pub customer_id: Uuid,
    pub operator: Operator,
    pub device: ResolvedDevice,
    pub plan: PaymentPlan,
    pub initial_payment: InitialPayment,
}

impl FinalizeInput {
    pub fn from_draft(draft: &SaleDraft) -> Result<Self, AppError> {
        let customer = draft
            .customer
            .as_ref()
            .ok_or(AppError::StagePrecondition("cliente não selecionado"))?;
        let device = draft
            .device
            .clone()
            .ok_or(AppError::StagePrecondition("dispositivo não resolvido"))?;
        let plan = draft
            .payment_plan
            .clone()
            .ok_or(AppError::StagePrecondition("plano não definido"))?;
        let initial_payment = draft
            .initial_payment
            .clone()
            .ok_or(AppError::StagePrecondition("entrada não registrada"))?;
        if draft.signed_contract_file.is_none() {
            return Err(AppError::StagePrecondition("contrato assinado ausente"));
        }

        Ok(Self {
            customer_id: customer.id,
            operator: draft.authenticated_user.clone(),
            device,
            plan,
            initial_payment,
        })
    }
}
