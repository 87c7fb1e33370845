//! services/email_service.rs
//! Envío de un correo ya renderizado a un destinatario por SMTP.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::{
    models::attachment_model::AssetMap,
    services::{
        attachment_service::base_name,
        smtp_resolver::{ProviderResolver, SmtpTarget, TransportSecurity},
    },
};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("regex válido")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Motivo de fallo, una variante por etapa.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("could not build message: {0}")]
    Compose(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication rejected: {0}")]
    Authentication(String),

    #[error("transmission failed: {0}")]
    Transmission(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl DispatchError {
    /// Errores de formato no mejoran reintentando.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            DispatchError::InvalidAddress(_) | DispatchError::Compose(_)
        )
    }
}

/// Un correo listo para enviar a un único destinatario.
#[derive(Clone, Copy)]
pub struct OutgoingEmail<'a> {
    pub sender: &'a str,
    pub password: &'a str,
    pub recipient: &'a str,
    pub subject: &'a str,
    pub html: &'a str,
    pub assets: &'a AssetMap,
    pub attachments: &'a [PathBuf],
}

#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, email: &OutgoingEmail<'_>) -> Result<(), DispatchError>;
}

#[derive(Debug, Clone)]
pub struct EmailService {
    resolver: ProviderResolver,
    timeout: Duration,
}

impl EmailService {
    pub fn new(resolver: ProviderResolver, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    /// multipart/mixed { multipart/related { html, imágenes inline }, adjuntos }.
    /// Un archivo que no existe se omite con un warning, nunca aborta el envío.
    pub fn build_message(email: &OutgoingEmail<'_>) -> Result<Message, DispatchError> {
        let from: Mailbox = email
            .sender
            .parse()
            .map_err(|e| DispatchError::Compose(format!("Invalid from address: {e}")))?;
        let to: Mailbox = email
            .recipient
            .parse()
            .map_err(|_| DispatchError::InvalidAddress(email.recipient.to_string()))?;

        let html_part = SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(email.html.to_string());

        let mut related = MultiPart::related().singlepart(html_part);
        for (cid, path) in email.assets.iter() {
            let Some(data) = read_optional(path, "Imagen") else {
                continue;
            };
            let content_type = image_content_type(path)?;
            related = related.singlepart(Attachment::new_inline(cid.to_string()).body(data, content_type));
        }

        let mut mixed = MultiPart::mixed().multipart(related);
        for path in email.attachments {
            let Some(data) = read_optional(path, "Adjunto") else {
                continue;
            };
            let content_type = attachment_content_type(path)?;
            mixed = mixed.singlepart(Attachment::new(base_name(path)).body(data, content_type));
        }

        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject)
            .multipart(mixed)
            .map_err(|e| DispatchError::Compose(e.to_string()))
    }

    fn build_transport(
        &self,
        target: &SmtpTarget,
        email: &OutgoingEmail<'_>,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, DispatchError> {
        let builder = match target.security {
            TransportSecurity::ImplicitTls => AsyncSmtpTransport::<Tokio1Executor>::relay(&target.host),
            TransportSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&target.host)
            }
        }
        .map_err(|e| DispatchError::Connection(e.to_string()))?;

        Ok(builder
            .port(target.port)
            .credentials(Credentials::new(
                email.sender.to_string(),
                email.password.to_string(),
            ))
            .timeout(Some(self.timeout))
            .build())
    }
}

#[async_trait]
impl Dispatch for EmailService {
    async fn dispatch(&self, email: &OutgoingEmail<'_>) -> Result<(), DispatchError> {
        // 1) Validación antes de tocar la red
        if !is_valid_email(email.recipient) {
            log::warn!("Invalid email format: {}", email.recipient);
            return Err(DispatchError::InvalidAddress(email.recipient.to_string()));
        }

        // 2) Servidor SMTP según el remitente
        let target = self.resolver.resolve(email.sender);
        log::info!(
            "Using SMTP: {}:{} ({:?}) for {}",
            target.host,
            target.port,
            target.security,
            email.sender
        );

        // 3) Mensaje MIME
        let message = Self::build_message(email)?;

        // 4) Conexión, login y envío
        let mailer = self.build_transport(&target, email)?;
        match tokio::time::timeout(self.timeout, mailer.send(message)).await {
            Err(_) => Err(DispatchError::Timeout(self.timeout)),
            Ok(Err(e)) => {
                let code = e.status().map(|c| c.to_string());
                Err(classify_smtp_failure(code.as_deref(), e.to_string()))
            }
            Ok(Ok(_)) => {
                log::info!("Email sent successfully to {}", email.recipient);
                Ok(())
            }
        }
    }
}

/// 530/534/535 vienen del AUTH; cualquier otra respuesta del servidor es de
/// transmisión; sin código de respuesta el fallo fue de conexión/TLS.
pub fn classify_smtp_failure(code: Option<&str>, detail: String) -> DispatchError {
    match code {
        Some("530" | "534" | "535") => DispatchError::Authentication(detail),
        Some(_) => DispatchError::Transmission(detail),
        None => DispatchError::Connection(detail),
    }
}

fn read_optional(path: &Path, what: &str) -> Option<Vec<u8>> {
    if !path.exists() {
        log::warn!("{} no encontrado: {:?}", what, path);
        return None;
    }
    match std::fs::read(path) {
        Ok(data) => Some(data),
        Err(e) => {
            log::warn!("{} ilegible {:?}: {}", what, path, e);
            None
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| !e.is_empty())
}

fn octet_stream() -> Result<ContentType, DispatchError> {
    ContentType::parse("application/octet-stream").map_err(|e| DispatchError::Compose(e.to_string()))
}

fn image_content_type(path: &Path) -> Result<ContentType, DispatchError> {
    let mime = match extension(path).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => return octet_stream(),
    };
    ContentType::parse(mime).map_err(|e| DispatchError::Compose(e.to_string()))
}

/// `application/<ext>` como subtipo genérico; sin extensión, octet-stream.
fn attachment_content_type(path: &Path) -> Result<ContentType, DispatchError> {
    match extension(path) {
        Some(ext) => ContentType::parse(&format!("application/{}", ext)).or_else(|_| octet_stream()),
        None => octet_stream(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("a@gmail.com"));
        assert!(is_valid_email("ana.perez+evento@upt.edu.pe"));
        assert!(!is_valid_email("sin-arroba.com"));
        assert!(!is_valid_email("a@dominio"));
        assert!(!is_valid_email("a@dominio.c"));
        assert!(!is_valid_email(" a@gmail.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn smtp_failures_are_classified_by_stage() {
        assert!(matches!(
            classify_smtp_failure(Some("535"), "bad credentials".into()),
            DispatchError::Authentication(_)
        ));
        assert!(matches!(
            classify_smtp_failure(Some("550"), "mailbox unavailable".into()),
            DispatchError::Transmission(_)
        ));
        assert!(matches!(
            classify_smtp_failure(None, "connection refused".into()),
            DispatchError::Connection(_)
        ));
    }

    #[test]
    fn only_format_errors_are_permanent() {
        assert!(!DispatchError::InvalidAddress("x".into()).is_retryable());
        assert!(!DispatchError::Compose("x".into()).is_retryable());
        assert!(DispatchError::Connection("x".into()).is_retryable());
        assert!(DispatchError::Authentication("x".into()).is_retryable());
        assert!(DispatchError::Timeout(Duration::from_secs(30)).is_retryable());
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(
            attachment_content_type(Path::new("x/1_constancia.PDF")).unwrap(),
            ContentType::parse("application/pdf").unwrap()
        );
        assert_eq!(
            attachment_content_type(Path::new("x/README")).unwrap(),
            ContentType::parse("application/octet-stream").unwrap()
        );
        assert_eq!(
            image_content_type(Path::new("logo.jpeg")).unwrap(),
            ContentType::parse("image/jpeg").unwrap()
        );
    }
}
