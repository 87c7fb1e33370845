//! config/app_config.rs
//! Configuración global del servicio, leída del entorno (.env) con valores por defecto.

use std::{env, fmt, path::PathBuf, str::FromStr, time::Duration};

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Raíz de los archivos subidos (uploads/, assets/, assets/folderN/)
    pub temp_dir: PathBuf,
    pub max_attempts: u32,
    pub backoff: Duration,
    pub smtp_timeout: Duration,
    /// Conexiones SMTP simultáneas por corrida (1 = secuencial)
    pub max_concurrent_sends: usize,
    pub admin_user: String,
    pub admin_password: String,
    pub institution_domain: String,
    pub institution_smtp_host: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_addr: "0.0.0.0".to_string(),
            port: 8000,
            temp_dir: PathBuf::from("temp"),
            max_attempts: 2,
            backoff: Duration::from_millis(1000),
            smtp_timeout: Duration::from_secs(30),
            max_concurrent_sends: 1,
            admin_user: "admin".to_string(),
            admin_password: "admin123".to_string(),
            institution_domain: "upt.edu.pe".to_string(),
            institution_smtp_host: "smtp.upt.edu.pe".to_string(),
        }
    }
}

// Se imprime al arrancar; la contraseña del admin no va al log
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("temp_dir", &self.temp_dir)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("smtp_timeout", &self.smtp_timeout)
            .field("max_concurrent_sends", &self.max_concurrent_sends)
            .field("admin_user", &self.admin_user)
            .field("admin_password", &"***")
            .field("institution_domain", &self.institution_domain)
            .field("institution_smtp_host", &self.institution_smtp_host)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();

        AppConfig {
            bind_addr: env::var("MAILER_BIND").unwrap_or(defaults.bind_addr),
            port: parse_var("MAILER_PORT", defaults.port),
            temp_dir: env::var("MAILER_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            max_attempts: parse_var("MAILER_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            backoff: Duration::from_millis(parse_var(
                "MAILER_BACKOFF_MS",
                defaults.backoff.as_millis() as u64,
            )),
            smtp_timeout: Duration::from_secs(parse_var(
                "MAILER_SMTP_TIMEOUT_SECS",
                defaults.smtp_timeout.as_secs(),
            )),
            max_concurrent_sends: parse_var(
                "MAILER_MAX_CONCURRENT_SENDS",
                defaults.max_concurrent_sends,
            )
            .max(1),
            admin_user: env::var("MAILER_ADMIN_USER").unwrap_or(defaults.admin_user),
            admin_password: env::var("MAILER_ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            institution_domain: env::var("MAILER_INSTITUTION_DOMAIN")
                .unwrap_or(defaults.institution_domain),
            institution_smtp_host: env::var("MAILER_INSTITUTION_SMTP_HOST")
                .unwrap_or(defaults.institution_smtp_host),
        }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.temp_dir.join("uploads")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.temp_dir.join("assets")
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!(
                "Valor inválido para {}='{}', usando {} por defecto",
                name,
                raw,
                default
            );
            default
        }),
        Err(_) => default,
    }
}
