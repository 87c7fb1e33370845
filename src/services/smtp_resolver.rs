//! services/smtp_resolver.rs
//! Dominio del remitente -> servidor SMTP (host, puerto, modo TLS). Sin red.

use crate::config::app_config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportSecurity {
    /// TLS desde el primer byte (465)
    ImplicitTls,
    /// Texto plano y luego STARTTLS (587)
    StartTls,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpTarget {
    pub host: String,
    pub port: u16,
    pub security: TransportSecurity,
}

impl SmtpTarget {
    fn implicit(host: &str) -> Self {
        Self {
            host: host.to_string(),
            port: 465,
            security: TransportSecurity::ImplicitTls,
        }
    }

    fn starttls(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 587,
            security: TransportSecurity::StartTls,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderResolver {
    institution_domain: String,
    institution_host: String,
}

impl Default for ProviderResolver {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ProviderResolver {
    pub fn new(institution_domain: impl Into<String>, institution_host: impl Into<String>) -> Self {
        Self {
            institution_domain: institution_domain.into().to_lowercase(),
            institution_host: institution_host.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.institution_domain, &config.institution_smtp_host)
    }

    /// Las reglas se evalúan en orden sobre el dominio; un dominio desconocido
    /// nunca falla, se asume `smtp.<dominio>`.
    pub fn resolve(&self, sender_email: &str) -> SmtpTarget {
        let domain = sender_email
            .rsplit('@')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if domain.contains("gmail.com") {
            SmtpTarget::implicit("smtp.gmail.com")
        } else if domain.contains("outlook")
            || domain.contains("hotmail")
            || domain.contains("live.com")
        {
            SmtpTarget::starttls("smtp-mail.outlook.com")
        } else if domain.contains("yahoo") {
            SmtpTarget::implicit("smtp.mail.yahoo.com")
        } else if !self.institution_domain.is_empty() && domain.contains(&self.institution_domain) {
            SmtpTarget::starttls(self.institution_host.clone())
        } else {
            SmtpTarget::starttls(format!("smtp.{}", domain))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_providers() {
        let resolver = ProviderResolver::default();

        let gmail = resolver.resolve("someone@gmail.com");
        assert_eq!(gmail.host, "smtp.gmail.com");
        assert_eq!(gmail.port, 465);
        assert_eq!(gmail.security, TransportSecurity::ImplicitTls);

        for sender in ["a@outlook.com", "a@hotmail.es", "a@live.com"] {
            let t = resolver.resolve(sender);
            assert_eq!(t.host, "smtp-mail.outlook.com", "{}", sender);
            assert_eq!(t.port, 587);
            assert_eq!(t.security, TransportSecurity::StartTls);
        }

        let yahoo = resolver.resolve("a@yahoo.com.pe");
        assert_eq!(yahoo.host, "smtp.mail.yahoo.com");
        assert_eq!(yahoo.port, 465);
    }

    #[test]
    fn institutional_domain_uses_fixed_host() {
        let resolver = ProviderResolver::default();
        let t = resolver.resolve("docente@UPT.edu.pe");
        assert_eq!(t.host, "smtp.upt.edu.pe");
        assert_eq!(t.port, 587);
        assert_eq!(t.security, TransportSecurity::StartTls);

        let custom = ProviderResolver::new("uni.example", "mail.uni.example");
        assert_eq!(custom.resolve("x@cs.uni.example").host, "mail.uni.example");
    }

    #[test]
    fn unknown_domain_synthesizes_host() {
        let t = ProviderResolver::default().resolve("ventas@empresa.com");
        assert_eq!(
            t,
            SmtpTarget {
                host: "smtp.empresa.com".to_string(),
                port: 587,
                security: TransportSecurity::StartTls,
            }
        );
    }
}
