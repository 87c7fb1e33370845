//! models/recipient_model.rs
//! Un destinatario = una fila importada (columna -> valor), en el orden de
//! las columnas del archivo.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Columnas candidatas para el correo, en orden de prioridad.
pub const EMAIL_FIELDS: [&str; 3] = ["Correo", "Email", "correo"];
/// Columnas candidatas para el nombre a mostrar en el reporte.
pub const NAME_FIELDS: [&str; 2] = ["Nombre", "nombre"];
/// Nombre por defecto cuando la fila no trae ninguno.
pub const DEFAULT_NAME: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient {
    fields: IndexMap<String, String>,
}

impl Recipient {
    /// Construye el destinatario recortando espacios en los nombres de columna.
    /// Conserva el orden de `pairs`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_string(), v.into()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Campos en el orden de las columnas.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Primer valor no vacío entre las columnas candidatas de correo.
    pub fn email(&self) -> Option<&str> {
        first_non_empty(&self.fields, &EMAIL_FIELDS)
    }

    pub fn display_name(&self) -> &str {
        first_non_empty(&self.fields, &NAME_FIELDS).unwrap_or(DEFAULT_NAME)
    }
}

fn first_non_empty<'a>(fields: &'a IndexMap<String, String>, candidates: &[&str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|key| fields.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_lookup_follows_candidate_order() {
        let r = Recipient::from_pairs([("Email", "b@x.com"), ("Correo", "a@x.com")]);
        assert_eq!(r.email(), Some("a@x.com"));

        let r = Recipient::from_pairs([("Correo", "  "), ("correo", "c@x.com")]);
        assert_eq!(r.email(), Some("c@x.com"));

        let r = Recipient::from_pairs([("Nombre", "Ana")]);
        assert_eq!(r.email(), None);
    }

    #[test]
    fn field_names_are_trimmed() {
        let r = Recipient::from_pairs([(" Correo ", "a@x.com"), ("Nombre\t", "Ana")]);
        assert_eq!(r.get("Correo"), Some("a@x.com"));
        assert_eq!(r.display_name(), "Ana");
    }

    #[test]
    fn fields_keep_column_order() {
        let r = Recipient::from_pairs([("Nombre", "Ana"), ("Correo", "a@x.com"), ("Cargo", "")]);
        let names: Vec<_> = r.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["Nombre", "Correo", "Cargo"]);

        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"Nombre":"Ana","Correo":"a@x.com","Cargo":""}"#);
    }

    #[test]
    fn missing_name_falls_back() {
        let r = Recipient::from_pairs([("Correo", "a@x.com"), ("nombre", "")]);
        assert_eq!(r.display_name(), DEFAULT_NAME);
    }
}
