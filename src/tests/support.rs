//! tests/support.rs
//! Dobles de prueba: dispatcher con guion y sleeper que no duerme.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    models::{campaign_model::CampaignConfig, recipient_model::Recipient},
    services::{
        campaign_service::CampaignRunner,
        email_service::{Dispatch, DispatchError, OutgoingEmail},
        retry_policy::{RetryPolicy, Sleeper},
    },
};

/// No duerme; solo registra las esperas pedidas.
#[derive(Default)]
pub struct RecordingSleeper {
    pub calls: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().unwrap().push(duration);
    }
}

/// Lo que vio el dispatcher en cada intento.
#[derive(Debug, Clone)]
pub struct DispatchCall {
    pub recipient: String,
    pub attempt: u32,
    pub html: String,
    pub attachments: Vec<PathBuf>,
}

type Script = dyn Fn(&str, u32) -> Result<(), DispatchError> + Send + Sync;

/// Responde según `script(destinatario, n-ésimo intento para ese destinatario)`.
pub struct ScriptedDispatcher {
    script: Box<Script>,
    delay: Option<Box<dyn Fn(&str) -> Duration + Send + Sync>>,
    calls: Mutex<Vec<DispatchCall>>,
}

impl ScriptedDispatcher {
    pub fn new(script: impl Fn(&str, u32) -> Result<(), DispatchError> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            delay: None,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn always_ok() -> Self {
        Self::new(|_, _| Ok(()))
    }

    pub fn always_failing() -> Self {
        Self::new(|_, _| Err(DispatchError::Connection("connection refused".to_string())))
    }

    pub fn failing_first(failures: u32) -> Self {
        Self::new(move |_, attempt| {
            if attempt <= failures {
                Err(DispatchError::Authentication("535 try again".to_string()))
            } else {
                Ok(())
            }
        })
    }

    /// Demora real (tokio) por destinatario, para mezclar el orden de finalización.
    pub fn with_delay(mut self, delay: impl Fn(&str) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn calls(&self) -> Vec<DispatchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn recipients_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.recipient).collect()
    }
}

#[async_trait]
impl Dispatch for ScriptedDispatcher {
    async fn dispatch(&self, email: &OutgoingEmail<'_>) -> Result<(), DispatchError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let attempt = calls.iter().filter(|c| c.recipient == email.recipient).count() as u32 + 1;
            calls.push(DispatchCall {
                recipient: email.recipient.to_string(),
                attempt,
                html: email.html.to_string(),
                attachments: email.attachments.to_vec(),
            });
            attempt
        };

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(email.recipient)).await;
        }

        (self.script)(email.recipient, attempt)
    }
}

pub fn campaign_config() -> CampaignConfig {
    CampaignConfig {
        sender_email: "eventos@gmail.com".to_string(),
        password: "app-password".to_string(),
        subject: "Constancia de participación".to_string(),
        body_html: "<p>Hola {{Nombre}}</p>".to_string(),
        footer_html: Some("<small>Oficina de eventos</small>".to_string()),
    }
}

pub fn recipient(email: &str, name: &str) -> Recipient {
    Recipient::from_pairs([("Correo", email), ("Nombre", name)])
}

pub fn runner(
    dispatcher: Arc<ScriptedDispatcher>,
    sleeper: Arc<RecordingSleeper>,
    max_concurrent: usize,
) -> CampaignRunner {
    CampaignRunner::new(
        dispatcher,
        sleeper,
        RetryPolicy::new(2, Duration::from_secs(1)),
        max_concurrent,
    )
}
