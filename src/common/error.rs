// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n,
    middleware::i18n::Locale,
    services::{amortization::PlanError, sale_saga::SagaError, sale_wizard::WizardStage},
};

// =============================================================================
//  ERROS DA API REMOTA (backend de financiamento)
// =============================================================================

#[derive(Debug, Error)]
pub enum BackendError {
    // 404: para o polling isso significa "ainda pendente"
    #[error("Recurso não encontrado no backend")]
    NotFound,

    #[error("Backend respondeu {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Falha de transporte: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Resposta inválida do backend: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound)
    }
}

// =============================================================================
//  ERRO PRINCIPAL DA APLICAÇÃO
// =============================================================================

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Plano de pagamento inválido")]
    PlanValidation(Vec<PlanError>),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Assistente de venda não encontrado")]
    WizardNotFound,

    #[error("Etapa inválida: esperado {expected:?}, atual {actual:?}")]
    InvalidStage {
        expected: WizardStage,
        actual: WizardStage,
    },

    // Pré-condição de entrada de etapa (ex.: Resumo sem dispositivo resolvido)
    #[error("Pré-condição não atendida: {0}")]
    StagePrecondition(&'static str),

    #[error("Cliente obrigatório")]
    CustomerRequired,

    #[error("O dispositivo ainda não foi resolvido")]
    DeviceNotResolved,

    #[error("Nenhum código de provisionamento ativo")]
    NoProvisioningPayload,

    #[error("Contrato assinado obrigatório")]
    SignedContractRequired,

    #[error("Contrato ainda não gerado")]
    ContractNotGenerated,

    #[error("Falha ao gerar o contrato: {0}")]
    ContractGeneration(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Finalização já em andamento")]
    FinalizeInProgress,

    #[error("Falha ao finalizar a venda")]
    SaleFinalize(#[from] SagaError),

    #[error("Erro do backend: {0}")]
    Backend(#[from] BackendError),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    fn status_and_key(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation"),
            AppError::PlanValidation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "plan_invalid"),
            AppError::InvalidToken | AppError::JwtError(_) => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::WizardNotFound => (StatusCode::NOT_FOUND, "wizard_not_found"),
            AppError::InvalidStage { .. } => (StatusCode::CONFLICT, "invalid_stage"),
            AppError::StagePrecondition(_) => (StatusCode::CONFLICT, "stage_precondition"),
            AppError::CustomerRequired => (StatusCode::UNPROCESSABLE_ENTITY, "customer_required"),
            AppError::DeviceNotResolved => (StatusCode::CONFLICT, "device_not_resolved"),
            AppError::NoProvisioningPayload => (StatusCode::NOT_FOUND, "no_provisioning_payload"),
            AppError::SignedContractRequired => (StatusCode::UNPROCESSABLE_ENTITY, "signed_contract_required"),
            AppError::ContractNotGenerated => (StatusCode::NOT_FOUND, "contract_not_generated"),
            AppError::ContractGeneration(_) | AppError::FontNotFound(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "contract_generation")
            }
            AppError::FinalizeInProgress => (StatusCode::CONFLICT, "finalize_in_progress"),
            AppError::SaleFinalize(_) => (StatusCode::BAD_GATEWAY, "sale_finalize"),
            AppError::Backend(_) => (StatusCode::BAD_GATEWAY, "backend_unavailable"),
            AppError::InternalServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }

    /// Converte o erro de domínio no erro HTTP, com a mensagem no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let (status, key) = self.status_and_key();
        let message = i18n::message(&locale.0, key).to_string();

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::PlanValidation(errors) => {
                let mut details: HashMap<&str, Vec<&str>> = HashMap::new();
                for error in errors {
                    details
                        .entry(error.field())
                        .or_default()
                        .push(i18n::message(&locale.0, error.message_key()));
                }
                Some(json!(details))
            }
            AppError::InvalidStage { expected, actual } => {
                Some(json!({ "expected": expected, "actual": actual }))
            }
            AppError::SaleFinalize(saga) => Some(json!({
                "failedStep": saga.step,
                "createdRecords": saga.created,
                "partial": saga.is_partial(),
                "cause": saga.source.to_string(),
            })),
            AppError::ContractGeneration(cause) | AppError::FontNotFound(cause) => {
                Some(json!({ "cause": cause }))
            }
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        ApiError {
            status,
            message,
            details,
        }
    }
}

// Sem locale explícito (ex.: rejeição de extratores) usamos o idioma padrão.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

// =============================================================================
//  ERRO HTTP (o que sai na resposta)
// =============================================================================

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}
