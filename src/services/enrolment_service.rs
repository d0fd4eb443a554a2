// src/services/enrolment_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    backend::{payloads::CreateEnrolmentRequest, BackendApi},
    common::error::AppError,
    models::{
        enrolment::{EnrolmentState, ProvisioningPayload},
        sale::Operator,
    },
    services::{
        polling::{poll_until, CancelSignal, PollConfig, PollOutcome},
        provisioning::ProvisioningConfig,
    },
};

// Resultado da fase Requesting: id do enrolamento + QR para o aparelho
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEnrolment {
    pub enrolment_id: Uuid,
    pub payload: ProvisioningPayload,
}

impl PendingEnrolment {
    pub fn state(&self) -> EnrolmentState {
        EnrolmentState::AwaitingDevice {
            enrolment_id: self.enrolment_id,
            payload: self.payload.clone(),
        }
    }
}

/// Protocolo de enrolamento remoto: cria o enrolamento, monta o payload de
/// provisionamento e espera o aparelho se conectar.
#[derive(Clone)]
pub struct EnrolmentProtocol {
    backend: Arc<dyn BackendApi>,
    poll: PollConfig,
    provisioning: ProvisioningConfig,
}

impl EnrolmentProtocol {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        poll: PollConfig,
        provisioning: ProvisioningConfig,
    ) -> Self {
        Self {
            backend,
            poll,
            provisioning,
        }
    }

    // Requesting -> AwaitingDevice. Sem retry: a falha sobe para o operador.
    pub async fn request(
        &self,
        token: &str,
        operator: &Operator,
    ) -> Result<PendingEnrolment, AppError> {
        let request = CreateEnrolmentRequest {
            user_id: operator.user_id,
            vendor_id: operator.vendor_id,
        };

        let enrolment_id = self.backend.create_enrolment(token, &request).await?;
        tracing::info!(%enrolment_id, user_id = %operator.user_id, "enrolamento criado, aguardando aparelho");

        Ok(PendingEnrolment {
            enrolment_id,
            payload: self.provisioning.build_payload(enrolment_id),
        })
    }

    /// AwaitingDevice -> Resolved | TimedOut.
    ///
    /// Devolve `None` se a espera foi cancelada: quem cancelou é dono do estado.
    pub async fn await_device(
        &self,
        token: &str,
        enrolment_id: Uuid,
        cancel: &CancelSignal,
    ) -> Option<EnrolmentState> {
        let outcome = poll_until("enrolment", &self.poll, cancel, |_| {
            self.backend.get_enrolment(token, enrolment_id)
        })
        .await;

        match outcome {
            PollOutcome::Resolved { value: device, attempts } => {
                tracing::info!(%enrolment_id, attempts, serial = %device.serial_number, "✅ aparelho conectado");
                Some(EnrolmentState::Resolved { enrolment_id, device })
            }
            PollOutcome::TimedOut { attempts } => {
                tracing::warn!(%enrolment_id, attempts, "aparelho não se conectou a tempo");
                Some(EnrolmentState::TimedOut { enrolment_id, attempts })
            }
            PollOutcome::Cancelled { attempts } => {
                tracing::info!(%enrolment_id, attempts, "espera do enrolamento cancelada");
                None
            }
        }
    }

    /// Executa o protocolo inteiro a partir de Idle (sem o guard de sessão).
    pub async fn run(
        &self,
        token: &str,
        operator: &Operator,
        cancel: &CancelSignal,
    ) -> Option<EnrolmentState> {
        match self.request(token, operator).await {
            Ok(pending) => self.await_device(token, pending.enrolment_id, cancel).await,
            Err(e) => {
                tracing::error!("falha ao criar enrolamento: {}", e);
                Some(EnrolmentState::Failed {
                    message: e.to_string(),
                })
            }
        }
    }
}
