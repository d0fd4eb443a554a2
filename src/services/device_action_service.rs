// src/services/device_action_service.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{sync::Mutex, time::Instant};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    backend::BackendApi,
    common::error::AppError,
    models::device::{DeviceCommand, DeviceLocation, DeviceState},
    services::polling::{poll_until, CancelSignal, PollConfig, PollOutcome, PollSlot},
};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocateStatus {
    Idle,
    #[serde(rename_all = "camelCase")]
    Polling { requested_at: DateTime<Utc> },
    #[serde(rename_all = "camelCase")]
    Located { location: DeviceLocation },
    #[serde(rename_all = "camelCase")]
    TimedOut { attempts: u32 },
}

// Por quanto tempo um resultado final (Located/TimedOut) continua consultável
pub const LOCATE_RETENTION: Duration = Duration::from_secs(15 * 60);

#[derive(Default)]
struct LocateTracker {
    slot: PollSlot,
    status: Option<LocateStatus>,
    finished_at: Option<Instant>,
}

impl LocateTracker {
    fn expired(&self, now: Instant) -> bool {
        !self.slot.is_active()
            && self
                .finished_at
                .is_some_and(|finished| now.duration_since(finished) >= LOCATE_RETENTION)
    }
}

// Descarta rastreadores terminados há mais de LOCATE_RETENTION
fn prune(trackers: &mut HashMap<Uuid, LocateTracker>) {
    let now = Instant::now();
    trackers.retain(|_, tracker| !tracker.expired(now));
}

/// Ações pós-venda sobre o aparelho. A localização usa o mesmo polling
/// limitado do enrolamento, com uma espera inicial para o aparelho reportar.
#[derive(Clone)]
pub struct DeviceActionService {
    backend: Arc<dyn BackendApi>,
    poll: PollConfig,
    trackers: Arc<Mutex<HashMap<Uuid, LocateTracker>>>,
}

impl DeviceActionService {
    pub fn new(backend: Arc<dyn BackendApi>, poll: PollConfig) -> Self {
        Self {
            backend,
            poll,
            trackers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Espera por uma localização não vazia (sem tocar no estado compartilhado).
    pub async fn wait_for_location(
        &self,
        token: &str,
        device_id: Uuid,
        cancel: &CancelSignal,
    ) -> PollOutcome<DeviceLocation> {
        poll_until("locate", &self.poll, cancel, |_| {
            self.backend.get_location(token, device_id)
        })
        .await
    }

    /// Pede um fix novo e dispara o polling em background.
    /// Um pedido anterior ainda em curso para o mesmo aparelho é substituído.
    pub async fn locate(&self, token: &str, device_id: Uuid) -> Result<LocateStatus, AppError> {
        self.backend.request_location(token, device_id).await?;

        let status = LocateStatus::Polling {
            requested_at: Utc::now(),
        };

        let (generation, cancel) = {
            let mut trackers = self.trackers.lock().await;
            prune(&mut trackers);
            let tracker = trackers.entry(device_id).or_default();
            if tracker.slot.is_active() {
                tracing::info!(%device_id, "localização anterior substituída");
            }
            let begun = tracker.slot.begin();
            tracker.status = Some(status.clone());
            tracker.finished_at = None;
            begun
        };

        let service = self.clone();
        let token = token.to_string();
        tokio::spawn(async move {
            let outcome = service.wait_for_location(&token, device_id, &cancel).await;
            let final_status = match outcome {
                PollOutcome::Resolved { value, attempts } => {
                    tracing::info!(%device_id, attempts, "📍 localização recebida");
                    LocateStatus::Located { location: value }
                }
                PollOutcome::TimedOut { attempts } => {
                    tracing::warn!(%device_id, attempts, "aparelho não reportou localização");
                    LocateStatus::TimedOut { attempts }
                }
                PollOutcome::Cancelled { .. } => return,
            };

            let mut trackers = service.trackers.lock().await;
            if let Some(tracker) = trackers.get_mut(&device_id) {
                if tracker.slot.finish(generation) {
                    tracker.status = Some(final_status);
                    tracker.finished_at = Some(Instant::now());
                }
            }
        });

        Ok(status)
    }

    pub async fn location_status(&self, device_id: Uuid) -> LocateStatus {
        let mut trackers = self.trackers.lock().await;
        prune(&mut trackers);
        trackers
            .get(&device_id)
            .and_then(|tracker| tracker.status.clone())
            .unwrap_or(LocateStatus::Idle)
    }

    pub async fn cancel_locate(&self, device_id: Uuid) -> bool {
        let mut trackers = self.trackers.lock().await;
        match trackers.remove(&device_id) {
            Some(mut tracker) => tracker.slot.cancel(),
            None => false,
        }
    }

    pub async fn send_command(
        &self,
        token: &str,
        device_id: Uuid,
        command: DeviceCommand,
    ) -> Result<DeviceState, AppError> {
        let state = self.backend.send_device_command(token, device_id, command).await?;
        tracing::info!(%device_id, ?command, ?state, "comando enviado ao aparelho");
        Ok(state)
    }
}
