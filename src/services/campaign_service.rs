//! services/campaign_service.rs
//! Corrida de una campaña: recorre los destinatarios, compone, envía con
//! reintentos y acumula el reporte. Se ejecuta fuera del ciclo del request.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use chrono::Local;
use futures_util::{future, StreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    config::app_config::AppConfig,
    models::{
        campaign_model::CampaignConfig,
        report_model::{Report, SendResult, SendStatus},
    },
    services::{
        attachment_service::{self, PairedAttachments},
        campaign_store::{CampaignStore, RunInput},
        composer_service,
        email_service::{is_valid_email, Dispatch, OutgoingEmail},
        retry_policy::{RetryPolicy, Sleeper},
    },
};

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("No recipients loaded")]
    NoRecipients,

    #[error("Invalid sender address: {0}")]
    InvalidSender(String),

    #[error("A campaign is already running")]
    AlreadyRunning,

    #[error("Error parsing recipients: {0}")]
    Import(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Ejecuta una corrida completa. Es `Clone` barato: cada tarea por
/// destinatario se lleva su propia copia.
#[derive(Clone)]
pub struct CampaignRunner {
    dispatcher: Arc<dyn Dispatch>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    max_concurrent: usize,
}

impl CampaignRunner {
    pub fn new(
        dispatcher: Arc<dyn Dispatch>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
        max_concurrent: usize,
    ) -> Self {
        Self {
            dispatcher,
            sleeper,
            policy,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Procesa los destinatarios en orden. Con `max_concurrent > 1` se envían
    /// varios a la vez, pero el reporte conserva el orden de entrada.
    /// Un pánico en una tarea corta la corrida; lo ya producido se conserva.
    pub async fn run(
        &self,
        run_id: &str,
        config: Arc<CampaignConfig>,
        input: Arc<RunInput>,
        cancel: CancellationToken,
    ) -> Report {
        log::info!(
            "[{}] Starting background email send for {} recipients",
            run_id,
            input.recipients.len()
        );
        log::info!(
            "[{}] Config: Subject='{}', Sender='{}'",
            run_id,
            config.subject,
            config.sender_email
        );
        warn_on_count_mismatch(run_id, &input);

        let mut entries = Vec::with_capacity(input.recipients.len());
        let stop = cancel.clone();
        let mut results = futures_util::stream::iter(0..input.recipients.len())
            .take_while(move |_| future::ready(!stop.is_cancelled()))
            .map(|index| {
                let runner = self.clone();
                let config = Arc::clone(&config);
                let input = Arc::clone(&input);
                let cancel = cancel.clone();
                tokio::spawn(async move { runner.process_recipient(index, &config, &input, &cancel).await })
            })
            .buffered(self.max_concurrent);

        while let Some(joined) = results.next().await {
            match joined {
                Ok(Some(result)) => entries.push(result),
                // cancelado antes de empezar
                Ok(None) => {}
                // no se lanzan más destinatarios, pero los que ya están en
                // vuelo terminan y su fila se conserva
                Err(e) => {
                    log::error!("[{}] GLOBAL ERROR in campaign run: {}", run_id, e);
                    cancel.cancel();
                }
            }
        }

        if cancel.is_cancelled() {
            log::warn!(
                "[{}] Run stopped early; {} of {} recipients reported",
                run_id,
                entries.len(),
                input.recipients.len()
            );
        }
        log::info!("[{}] Reporte generado con {} registros", run_id, entries.len());
        Report::new(run_id, entries)
    }

    /// Máquina de estados de un destinatario: termina en `Sent` o `Error`.
    async fn process_recipient(
        &self,
        index: usize,
        config: &CampaignConfig,
        input: &RunInput,
        cancel: &CancellationToken,
    ) -> Option<SendResult> {
        if cancel.is_cancelled() {
            return None;
        }

        let recipient = &input.recipients[index];
        let paired = attachment_service::pair(index, &input.folder1, &input.folder2);
        let name = recipient.display_name().to_string();

        let email = match recipient.email() {
            Some(email) if is_valid_email(email) => email.to_string(),
            Some(email) => {
                log::warn!("Skipping recipient {}: invalid email '{}'", index, email);
                return Some(build_result(email, name, SendStatus::Error, 0, Duration::ZERO, &paired));
            }
            None => {
                log::warn!("Skipping recipient {}: No email address found", index);
                return Some(build_result("", name, SendStatus::Error, 0, Duration::ZERO, &paired));
            }
        };

        let html = composer_service::compose_html(config, recipient);
        let attachments: Vec<PathBuf> = paired.paths();
        let outgoing = OutgoingEmail {
            sender: &config.sender_email,
            password: &config.password,
            recipient: &email,
            subject: &config.subject,
            html: &html,
            assets: &input.assets,
            attachments: &attachments,
        };

        let dispatcher = &self.dispatcher;
        let outcome = self
            .policy
            .run(self.sleeper.as_ref(), |attempt| {
                log::info!("Sending to {}, attempt {}", email, attempt);
                dispatcher.dispatch(&outgoing)
            })
            .await;

        let status = match &outcome.error {
            None => {
                log::info!("Successfully sent to {}", email);
                SendStatus::Sent
            }
            Some(e) => {
                log::warn!(
                    "Failed to send to {} after {} attempt(s): {}",
                    email,
                    outcome.attempts,
                    e
                );
                SendStatus::Error
            }
        };

        Some(build_result(
            &email,
            name,
            status,
            outcome.attempts,
            outcome.last_duration,
            &paired,
        ))
    }
}

fn build_result(
    email: &str,
    name: String,
    status: SendStatus,
    attempts: u32,
    duration: Duration,
    paired: &PairedAttachments,
) -> SendResult {
    let now = Local::now();
    SendResult {
        email: email.to_string(),
        name,
        status,
        attempts,
        duration: round_secs(duration),
        date: now.format("%Y-%m-%d").to_string(),
        time: now.format("%H:%M:%S").to_string(),
        attachment1: paired.first_name(),
        attachment2: paired.second_name(),
    }
}

fn round_secs(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 100.0).round() / 100.0
}

// El emparejamiento es por posición: si las cantidades no coinciden es
// probable que la carpeta no esté en el mismo orden que la lista.
fn warn_on_count_mismatch(run_id: &str, input: &RunInput) {
    let total = input.recipients.len();
    for (label, seq) in [("folder1", &input.folder1), ("folder2", &input.folder2)] {
        if !seq.is_empty() && seq.len() != total {
            log::warn!(
                "[{}] {} has {} files for {} recipients; pairing is positional",
                run_id,
                label,
                seq.len(),
                total
            );
        }
    }
}

/// Dueño del ciclo de vida de las corridas: acepta, lanza en segundo plano,
/// publica el reporte y permite cancelar.
#[derive(Clone)]
pub struct CampaignService {
    store: CampaignStore,
    runner: CampaignRunner,
    running: Arc<AtomicBool>,
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl CampaignService {
    pub fn new(store: CampaignStore, runner: CampaignRunner) -> Self {
        Self {
            store,
            runner,
            running: Arc::new(AtomicBool::new(false)),
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_config(
        config: &AppConfig,
        store: CampaignStore,
        dispatcher: Arc<dyn Dispatch>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let runner = CampaignRunner::new(
            dispatcher,
            sleeper,
            RetryPolicy::from_config(config),
            config.max_concurrent_sends,
        );
        Self::new(store, runner)
    }

    pub fn store(&self) -> &CampaignStore {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Valida y lanza la corrida; devuelve la cantidad de destinatarios y el id
    /// de la corrida sin esperar a que termine.
    pub fn start(&self, config: CampaignConfig) -> Result<(usize, String), CampaignError> {
        let input = self.store.snapshot();
        if input.recipients.is_empty() {
            return Err(CampaignError::NoRecipients);
        }
        if !is_valid_email(config.sender_email.trim()) {
            return Err(CampaignError::InvalidSender(config.sender_email));
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CampaignError::AlreadyRunning);
        }

        let run_id = Uuid::new_v4().to_string();
        let count = input.recipients.len();
        let generation = self.store.generation();
        let cancel = CancellationToken::new();
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(cancel.clone());

        let service = self.clone();
        let task_run_id = run_id.clone();
        tokio::spawn(async move {
            let _finish = FinishGuard(&service);
            let report = service
                .runner
                .run(&task_run_id, Arc::new(config), Arc::new(input), cancel)
                .await;
            if !service.store.publish_for(generation, report) {
                log::warn!("[{}] Campaign was cleared while running; report discarded", task_run_id);
            }
            log::info!("[{}] Campaign run finished", task_run_id);
        });

        Ok((count, run_id))
    }

    /// Cancela la corrida activa (si hay). Los destinatarios no iniciados no se reportan.
    pub fn cancel(&self) -> bool {
        match self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Cancela lo que esté corriendo y limpia el estado en memoria.
    pub fn reset(&self) {
        self.cancel();
        self.store.reset();
    }

    fn finish(&self) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Libera el flag `running` al salir de la tarea, incluso si entra en pánico.
struct FinishGuard<'a>(&'a CampaignService);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_rt::test;

    use super::*;
    use crate::tests::support::{runner, ScriptedDispatcher};

    #[test]
    async fn panicking_run_task_still_releases_running_flag() {
        let service = CampaignService::new(
            CampaignStore::new(),
            runner(Arc::new(ScriptedDispatcher::always_ok()), Arc::default(), 1),
        );
        service.running.store(true, Ordering::SeqCst);
        *service.active.lock().unwrap() = Some(CancellationToken::new());

        let task_service = service.clone();
        let joined = tokio::spawn(async move {
            let _finish = FinishGuard(&task_service);
            panic!("fallo dentro de la corrida");
        })
        .await;

        assert!(joined.is_err());
        assert!(!service.is_running());
        assert!(!service.cancel());
    }
}
