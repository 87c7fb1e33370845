//! services/retry_policy.rs
//! Reintentos con espera fija entre intentos. El `Sleeper` se inyecta para
//! poder probar sin esperar tiempo real.

use std::{
    future::Future,
    time::{Duration, Instant},
};

use async_trait::async_trait;

use crate::{config::app_config::AppConfig, services::email_service::DispatchError};

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

/// Resultado de la máquina de estados de un destinatario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub attempts: u32,
    /// Duración del último intento
    pub last_duration: Duration,
    /// `None` si el último intento tuvo éxito
    pub error: Option<DispatchError>,
}

impl AttemptOutcome {
    pub fn succeeded(&self) -> bool {
        self.attempts > 0 && self.error.is_none()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.max_attempts, config.backoff)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Ejecuta `op(intento)` hasta que tenga éxito, falle con un error
    /// permanente o se agoten los intentos. No espera después del último.
    pub async fn run<F, Fut>(&self, sleeper: &dyn Sleeper, mut op: F) -> AttemptOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<(), DispatchError>>,
    {
        let mut attempts = 0;
        let mut last_duration = Duration::ZERO;
        let mut last_error = None;

        while attempts < self.max_attempts {
            attempts += 1;
            let started = Instant::now();
            let result = op(attempts).await;
            last_duration = started.elapsed();

            match result {
                Ok(()) => {
                    return AttemptOutcome {
                        attempts,
                        last_duration,
                        error: None,
                    }
                }
                Err(e) => {
                    let retryable = e.is_retryable();
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                }
            }

            if attempts < self.max_attempts {
                sleeper.sleep(self.backoff).await;
            }
        }

        AttemptOutcome {
            attempts,
            last_duration,
            error: last_error,
        }
    }
}
