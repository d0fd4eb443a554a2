// src/services/polling.rs

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

use crate::common::error::BackendError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;
// Tempo para o aparelho reportar antes da primeira consulta (localização)
pub const DEFAULT_LOCATE_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollConfig {
    pub fn enrolment() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn locate() -> Self {
        Self {
            initial_delay: DEFAULT_LOCATE_GRACE,
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Resolved { value: T, attempts: u32 },
    TimedOut { attempts: u32 },
    // Cancelado ou substituído por uma nova tentativa
    Cancelled { attempts: u32 },
}

// =============================================================================
//  CANCELAMENTO
// =============================================================================

/// Lado de leitura do cancelamento, passado a cada espera do loop.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolve quando cancelado. Se o dono do slot sumiu, conta como cancelado.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Dorme `duration`; `false` se o cancelamento chegou antes.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.cancelled() => false,
        }
    }
}

/// Garante no máximo um loop de polling lógico por alvo (assistente ou aparelho).
///
/// `begin` cancela o loop anterior e devolve uma geração nova; só quem ainda
/// detém a geração corrente pode gravar o resultado (`finish`).
#[derive(Debug, Default)]
pub struct PollSlot {
    generation: u64,
    active: Option<watch::Sender<bool>>,
}

impl PollSlot {
    pub fn begin(&mut self) -> (u64, CancelSignal) {
        self.cancel();
        self.generation += 1;
        let (tx, rx) = watch::channel(false);
        self.active = Some(tx);
        (self.generation, CancelSignal { rx })
    }

    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(tx) => {
                let _ = tx.send(true);
                true
            }
            None => false,
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.active.is_some() && self.generation == generation
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn finish(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.active = None;
        true
    }
}

// =============================================================================
//  LOOP
// =============================================================================

/// Repete `probe` até obter um valor, esgotar as tentativas ou ser cancelado.
///
/// `Ok(None)` e `NotFound` contam como pendente. Qualquer outro erro é
/// registrado e também não interrompe o loop; só o orçamento de tentativas
/// encerra a espera.
pub async fn poll_until<T, F, Fut>(
    label: &str,
    config: &PollConfig,
    cancel: &CancelSignal,
    mut probe: F,
) -> PollOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, BackendError>>,
{
    if !config.initial_delay.is_zero() && !cancel.sleep(config.initial_delay).await {
        return PollOutcome::Cancelled { attempts: 0 };
    }

    for attempt in 1..=config.max_attempts {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled { attempts: attempt - 1 };
        }

        let result = tokio::select! {
            result = probe(attempt) => result,
            _ = cancel.cancelled() => return PollOutcome::Cancelled { attempts: attempt - 1 },
        };

        match result {
            Ok(Some(value)) => {
                tracing::debug!(label, attempt, "polling resolvido");
                return PollOutcome::Resolved { value, attempts: attempt };
            }
            Ok(None) => tracing::debug!(label, attempt, "ainda pendente"),
            Err(e) if e.is_not_found() => tracing::debug!(label, attempt, "ainda pendente (404)"),
            Err(e) => tracing::warn!(label, attempt, error = %e, "falha na consulta, seguindo"),
        }

        if attempt < config.max_attempts && !cancel.sleep(config.interval).await {
            return PollOutcome::Cancelled { attempts: attempt };
        }
    }

    tracing::warn!(label, attempts = config.max_attempts, "polling esgotou as tentativas");
    PollOutcome::TimedOut { attempts: config.max_attempts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_attempts: u32) -> PollConfig {
        PollConfig {
            initial_delay: Duration::ZERO,
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn stops_after_exactly_max_attempts() {
        let mut slot = PollSlot::default();
        let (_, cancel) = slot.begin();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let outcome: PollOutcome<()> = poll_until("teste", &fast(7), &cancel, |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::NotFound)
            }
        })
        .await;

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 7 });
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn stops_on_first_success() {
        let mut slot = PollSlot::default();
        let (_, cancel) = slot.begin();

        let outcome = poll_until("teste", &fast(10), &cancel, |attempt| async move {
            if attempt == 3 { Ok(Some("pronto")) } else { Ok(None) }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Resolved { value: "pronto", attempts: 3 });
    }

    #[tokio::test]
    async fn hard_errors_do_not_abort_the_loop() {
        let mut slot = PollSlot::default();
        let (_, cancel) = slot.begin();

        let outcome = poll_until("teste", &fast(5), &cancel, |attempt| async move {
            match attempt {
                1 => Err(BackendError::Status { status: 500, body: "boom".into() }),
                2 => Err(BackendError::InvalidResponse("lixo".into())),
                _ => Ok(Some(attempt)),
            }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Resolved { value: 3, attempts: 3 });
    }

    #[tokio::test]
    async fn superseded_poll_stops_promptly() {
        let mut slot = PollSlot::default();
        let (first, cancel) = slot.begin();
        let config = PollConfig {
            initial_delay: Duration::ZERO,
            interval: Duration::from_secs(3600),
            max_attempts: 100,
        };

        let handle = tokio::spawn(async move {
            poll_until::<(), _, _>("teste", &config, &cancel, |_| async { Ok(None) }).await
        });
        tokio::task::yield_now().await;

        let (second, _new_signal) = slot.begin();
        let outcome = handle.await.unwrap();

        assert!(matches!(outcome, PollOutcome::Cancelled { .. }));
        assert!(!slot.finish(first));
        assert!(slot.is_current(second));
        assert!(slot.finish(second));
        assert!(!slot.is_active());
    }

    #[tokio::test]
    async fn cancelled_during_grace_delay() {
        let mut slot = PollSlot::default();
        let (_, cancel) = slot.begin();
        slot.cancel();

        let config = PollConfig {
            initial_delay: Duration::from_secs(3600),
            ..fast(3)
        };
        let outcome = poll_until::<(), _, _>("teste", &config, &cancel, |_| async { Ok(None) }).await;
        assert_eq!(outcome, PollOutcome::Cancelled { attempts: 0 });
    }
}
