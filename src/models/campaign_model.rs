//! models/campaign_model.rs
//! Configuración del mensaje de una campaña (lo que llega en POST /api/send).

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Deserialize)]
pub struct CampaignConfig {
    pub sender_email: String,
    /// Contraseña (o app password) del remitente.
    pub password: String,
    pub subject: String,
    /// Cuerpo HTML con marcadores `{{Columna}}`.
    pub body_html: String,
    #[serde(default)]
    pub footer_html: Option<String>,
}

impl CampaignConfig {
    pub fn footer(&self) -> &str {
        self.footer_html.as_deref().unwrap_or_default()
    }
}

// No imprimir la credencial en los logs
impl fmt::Debug for CampaignConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CampaignConfig")
            .field("sender_email", &self.sender_email)
            .field("password", &"***")
            .field("subject", &self.subject)
            .field("body_html_len", &self.body_html.len())
            .field("footer_html_len", &self.footer().len())
            .finish()
    }
}

/// Respuesta al aceptar un envío.
#[derive(Debug, Clone, Serialize)]
pub struct SendStartedResponse {
    pub message: String,
    pub recipient_count: usize,
    pub run_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignStatusResponse {
    pub running: bool,
    pub recipients: usize,
    pub report_total: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}
