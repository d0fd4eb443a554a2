// src/services/sale_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        currency::Currency,
        enrolment::EnrolmentState,
        sale::{CustomerRef, Operator, SaleDraft, SaleReceipt, SignedContract},
    },
    services::{
        amortization::amortize,
        contract_service::{ContractContent, ContractGenerator, GeneratedContract},
        enrolment_service::EnrolmentProtocol,
        polling::PollSlot,
        sale_saga::SalePersistenceSaga,
        sale_wizard::{BackNavigation, PlanSubmission, SaleWizard, WizardStage},
    },
};

// =============================================================================
//  SESSÃO DO ASSISTENTE
// =============================================================================

/// Uma instância do assistente, dona exclusiva do seu rascunho e do seu
/// loop de enrolamento.
struct WizardSession {
    id: Uuid,
    owner: Uuid,
    wizard: SaleWizard,
    enrolment: EnrolmentState,
    enrolment_slot: PollSlot,
    contract: Option<GeneratedContract>,
    last_error: Option<String>,
    finalizing: bool,
}

impl WizardSession {
    fn new(operator: &Operator) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: operator.user_id,
            wizard: SaleWizard::start(operator.clone()),
            enrolment: EnrolmentState::Idle,
            enrolment_slot: PollSlot::default(),
            contract: None,
            last_error: None,
            finalizing: false,
        }
    }

    fn view(&self) -> WizardView {
        WizardView {
            id: self.id,
            stage: self.wizard.stage(),
            stage_number: self.wizard.stage().number(),
            draft: self.wizard.draft().clone(),
            enrolment: self.enrolment.clone(),
            contract: self.contract.as_ref().map(ContractReference::from),
            last_error: self.last_error.clone(),
            finalizing: self.finalizing,
        }
    }

    // Troca o assistente; um contrato gerado com o rascunho antigo deixa de valer
    fn replace(&mut self, wizard: SaleWizard, invalidate_contract: bool) {
        self.wizard = wizard;
        self.last_error = None;
        if invalidate_contract {
            self.contract = None;
        }
    }

    fn reset(&mut self) {
        self.enrolment_slot.cancel();
        self.wizard = self.wizard.reset();
        self.enrolment = EnrolmentState::Idle;
        self.contract = None;
        self.last_error = None;
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractReference {
    #[schema(example = "http://localhost:3000/api/sales/wizards/0b7e.../contract")]
    pub url: String,
    pub generated_at: DateTime<Utc>,
}

impl From<&GeneratedContract> for ContractReference {
    fn from(contract: &GeneratedContract) -> Self {
        Self {
            url: contract.reference_url.clone(),
            generated_at: contract.generated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub id: Uuid,
    pub stage: WizardStage,
    #[schema(example = 1)]
    pub stage_number: u8,
    pub draft: SaleDraft,
    pub enrolment: EnrolmentState,
    pub contract: Option<ContractReference>,
    pub last_error: Option<String>,
    pub finalizing: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackOutcome {
    // Voltar na etapa 1 fecha o assistente
    pub exited: bool,
    pub wizard: Option<WizardView>,
}

// =============================================================================
//  PRÉ-VISUALIZAÇÃO DO PLANO
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewInstallment {
    pub number: u32,
    #[schema(value_type = String, format = Date)]
    pub due_date: NaiveDate,
    pub amount: Decimal,
    #[schema(example = "$ 200.000")]
    pub formatted_amount: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanPreview {
    pub currency: Currency,
    pub device_price: Decimal,
    pub initial_payment: Decimal,
    pub balance_to_finance: Decimal,
    #[schema(example = "$ 800.000")]
    pub formatted_balance: String,
    pub monto_por_cuota: Decimal,
    #[schema(example = "$ 200.000")]
    pub formatted_monto_por_cuota: String,
    pub installments: Vec<PreviewInstallment>,
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct SaleService {
    enrolment: EnrolmentProtocol,
    saga: SalePersistenceSaga,
    contracts: Arc<dyn ContractGenerator>,
    public_base_url: String,
    sessions: Arc<Mutex<HashMap<Uuid, Arc<Mutex<WizardSession>>>>>,
}

impl SaleService {
    pub fn new(
        enrolment: EnrolmentProtocol,
        saga: SalePersistenceSaga,
        contracts: Arc<dyn ContractGenerator>,
        public_base_url: &str,
    ) -> Self {
        Self {
            enrolment,
            saga,
            contracts,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // Assistente de outro operador é tratado como inexistente
    async fn session(
        &self,
        wizard_id: Uuid,
        operator: &Operator,
    ) -> Result<OwnedMutexGuard<WizardSession>, AppError> {
        let session = self
            .sessions
            .lock()
            .await
            .get(&wizard_id)
            .cloned()
            .ok_or(AppError::WizardNotFound)?;

        let guard = session.lock_owned().await;
        if guard.owner != operator.user_id {
            return Err(AppError::WizardNotFound);
        }
        Ok(guard)
    }

    async fn session_handle(&self, wizard_id: Uuid) -> Result<Arc<Mutex<WizardSession>>, AppError> {
        self.sessions
            .lock()
            .await
            .get(&wizard_id)
            .cloned()
            .ok_or(AppError::WizardNotFound)
    }

    pub async fn open(&self, operator: &Operator) -> WizardView {
        let session = WizardSession::new(operator);
        let view = session.view();
        self.sessions
            .lock()
            .await
            .insert(session.id, Arc::new(Mutex::new(session)));
        tracing::info!(wizard_id = %view.id, user_id = %operator.user_id, "assistente de venda aberto");
        view
    }

    pub async fn view(&self, wizard_id: Uuid, operator: &Operator) -> Result<WizardView, AppError> {
        Ok(self.session(wizard_id, operator).await?.view())
    }

    pub async fn close(&self, wizard_id: Uuid, operator: &Operator) -> Result<(), AppError> {
        let mut session = self.session(wizard_id, operator).await?;
        if session.enrolment_slot.cancel() {
            tracing::info!(%wizard_id, "polling de enrolamento cancelado no fechamento");
        }
        drop(session);

        self.sessions.lock().await.remove(&wizard_id);
        tracing::info!(%wizard_id, "assistente de venda fechado");
        Ok(())
    }

    pub async fn back(&self, wizard_id: Uuid, operator: &Operator) -> Result<BackOutcome, AppError> {
        let mut session = self.session(wizard_id, operator).await?;
        match session.wizard.back() {
            BackNavigation::Moved(wizard) => {
                session.replace(wizard, false);
                Ok(BackOutcome {
                    exited: false,
                    wizard: Some(session.view()),
                })
            }
            BackNavigation::Exit => {
                drop(session);
                self.close(wizard_id, operator).await?;
                Ok(BackOutcome {
                    exited: true,
                    wizard: None,
                })
            }
        }
    }

    // --- Etapa 1 ---

    pub async fn select_customer(
        &self,
        wizard_id: Uuid,
        operator: &Operator,
        customer: CustomerRef,
    ) -> Result<WizardView, AppError> {
        let mut session = self.session(wizard_id, operator).await?;
        let next = session.wizard.select_customer(customer)?;
        session.replace(next, true);
        Ok(session.view())
    }

    // --- Etapa 2 ---

    /// Inicia (ou reinicia) o enrolamento do assistente.
    ///
    /// Um pedido ainda em `Requesting` torna a chamada um no-op; um polling em
    /// `AwaitingDevice` é cancelado e substituído por uma tentativa nova.
    pub async fn start_enrolment(
        &self,
        wizard_id: Uuid,
        operator: &Operator,
        token: &str,
    ) -> Result<EnrolmentState, AppError> {
        let mut session = self.session(wizard_id, operator).await?;
        if session.wizard.stage() != WizardStage::Device {
            return Err(AppError::InvalidStage {
                expected: WizardStage::Device,
                actual: session.wizard.stage(),
            });
        }

        if matches!(session.enrolment, EnrolmentState::Requesting) {
            tracing::debug!(%wizard_id, "enrolamento já sendo solicitado, ignorando");
            return Ok(session.enrolment.clone());
        }
        if session.enrolment.is_in_flight() {
            tracing::info!(%wizard_id, "enrolamento anterior substituído");
        }

        let (generation, cancel) = session.enrolment_slot.begin();
        session.enrolment = EnrolmentState::Requesting;
        session.last_error = None;
        drop(session);

        let requested = self.enrolment.request(token, operator).await;

        let handle = self.session_handle(wizard_id).await?;
        let mut session = handle.clone().lock_owned().await;
        if !session.enrolment_slot.is_current(generation) {
            // Fechado ou substituído enquanto o pedido estava em curso
            return Ok(session.enrolment.clone());
        }

        let pending = match requested {
            Ok(pending) => pending,
            Err(e) => {
                session.enrolment_slot.finish(generation);
                session.enrolment = EnrolmentState::Failed {
                    message: e.to_string(),
                };
                session.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let awaiting = pending.state();
        session.enrolment = awaiting.clone();
        drop(session);

        let protocol = self.enrolment.clone();
        let token = token.to_string();
        tokio::spawn(async move {
            let Some(outcome) = protocol
                .await_device(&token, pending.enrolment_id, &cancel)
                .await
            else {
                return;
            };

            let mut session = handle.lock().await;
            if session.enrolment_slot.finish(generation) {
                session.enrolment = outcome;
            }
        });

        Ok(awaiting)
    }

    pub async fn enrolment_state(
        &self,
        wizard_id: Uuid,
        operator: &Operator,
    ) -> Result<EnrolmentState, AppError> {
        Ok(self.session(wizard_id, operator).await?.enrolment.clone())
    }

    pub async fn enrolment_qr(&self, wizard_id: Uuid, operator: &Operator) -> Result<Vec<u8>, AppError> {
        let session = self.session(wizard_id, operator).await?;
        let payload = session
            .enrolment
            .payload()
            .cloned()
            .ok_or(AppError::NoProvisioningPayload)?;
        drop(session);

        payload.to_qr_png()
    }

    pub async fn confirm_device(&self, wizard_id: Uuid, operator: &Operator) -> Result<WizardView, AppError> {
        let mut session = self.session(wizard_id, operator).await?;
        let next = session.wizard.confirm_device(&session.enrolment)?;
        session.replace(next, true);
        Ok(session.view())
    }

    // --- Etapa 3 ---

    pub async fn submit_plan(
        &self,
        wizard_id: Uuid,
        operator: &Operator,
        form: &PlanSubmission,
    ) -> Result<WizardView, AppError> {
        let mut session = self.session(wizard_id, operator).await?;
        let next = session.wizard.submit_plan(form)?;
        session.replace(next, true);
        Ok(session.view())
    }

    /// Cálculo sem estado para a tela do plano (não valida a entrada).
    pub fn preview_plan(&self, form: &PlanSubmission) -> Result<PlanPreview, AppError> {
        let terms = form.terms();
        let amortization = amortize(&terms).map_err(|e| AppError::PlanValidation(vec![e]))?;
        let currency = form.currency;

        Ok(PlanPreview {
            currency,
            device_price: terms.device_price,
            initial_payment: terms.initial_payment,
            balance_to_finance: amortization.balance_to_finance,
            formatted_balance: currency.format_amount(amortization.balance_to_finance),
            monto_por_cuota: amortization.monto_por_cuota,
            formatted_monto_por_cuota: currency.format_amount(amortization.monto_por_cuota),
            installments: amortization
                .installments
                .into_iter()
                .map(|i| PreviewInstallment {
                    number: i.number,
                    due_date: i.due_date,
                    amount: i.amount,
                    formatted_amount: currency.format_amount(i.amount),
                })
                .collect(),
        })
    }

    // --- Etapa 4 ---

    /// Gera o contrato do rascunho atual. Pode ser repetido após falha.
    pub async fn generate_contract(
        &self,
        wizard_id: Uuid,
        operator: &Operator,
    ) -> Result<ContractReference, AppError> {
        let session = self.session(wizard_id, operator).await?;
        if session.wizard.stage() != WizardStage::Contract {
            return Err(AppError::InvalidStage {
                expected: WizardStage::Contract,
                actual: session.wizard.stage(),
            });
        }
        let draft = session.wizard.draft().clone();
        drop(session);

        let rendered = self.render_contract(&draft).await;

        let mut session = self.session(wizard_id, operator).await?;
        let bytes = match rendered {
            Ok(bytes) => bytes,
            Err(e) => {
                session.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let contract = GeneratedContract {
            bytes,
            reference_url: format!("{}/api/sales/wizards/{}/contract", self.public_base_url, wizard_id),
            generated_at: Utc::now(),
        };
        let reference = ContractReference::from(&contract);
        session.contract = Some(contract);
        session.last_error = None;
        tracing::info!(%wizard_id, "contrato gerado");

        Ok(reference)
    }

    async fn render_contract(&self, draft: &SaleDraft) -> Result<Vec<u8>, AppError> {
        let content = ContractContent::from_draft(draft, Utc::now().date_naive())?;
        let generator = self.contracts.clone();

        tokio::task::spawn_blocking(move || generator.render(&content))
            .await
            .map_err(|e| AppError::InternalServerError(anyhow::Error::new(e)))?
    }

    pub async fn contract_pdf(&self, wizard_id: Uuid, operator: &Operator) -> Result<Vec<u8>, AppError> {
        let session = self.session(wizard_id, operator).await?;
        session
            .contract
            .as_ref()
            .map(|c| c.bytes.clone())
            .ok_or(AppError::ContractNotGenerated)
    }

    pub async fn attach_signed_contract(
        &self,
        wizard_id: Uuid,
        operator: &Operator,
        file_name: String,
        reference: String,
    ) -> Result<WizardView, AppError> {
        let mut session = self.session(wizard_id, operator).await?;
        let signed = SignedContract {
            file_name,
            reference,
            attached_at: Utc::now(),
        };
        let next = session.wizard.attach_signed_contract(signed)?;
        session.replace(next, false);
        Ok(session.view())
    }

    pub async fn confirm_contract(&self, wizard_id: Uuid, operator: &Operator) -> Result<WizardView, AppError> {
        let mut session = self.session(wizard_id, operator).await?;
        let next = session.wizard.confirm_contract()?;
        session.replace(next, false);
        Ok(session.view())
    }

    // --- Etapa 5 ---

    /// Executa a persistência. Em sucesso o assistente volta ao início;
    /// em falha fica no Resumo com o erro, e um novo finalize refaz tudo.
    pub async fn finalize(
        &self,
        wizard_id: Uuid,
        operator: &Operator,
        token: &str,
    ) -> Result<SaleReceipt, AppError> {
        let mut session = self.session(wizard_id, operator).await?;
        if session.finalizing {
            return Err(AppError::FinalizeInProgress);
        }
        let input = session.wizard.ready_to_finalize()?;
        session.finalizing = true;
        drop(session);

        let result = self.saga.run(token, &input).await;

        let handle = self.session_handle(wizard_id).await;
        let mut session = match handle {
            Ok(handle) => handle.lock_owned().await,
            // Fechado durante a finalização: só devolve o resultado
            Err(_) => return result.map_err(AppError::from),
        };
        session.finalizing = false;

        match result {
            Ok(receipt) => {
                session.reset();
                tracing::info!(%wizard_id, device_id = %receipt.device_id, "assistente reiniciado após a venda");
                Ok(receipt)
            }
            Err(e) => {
                session.last_error = Some(e.to_string());
                Err(AppError::SaleFinalize(e))
            }
        }
    }
}
