//! models/report_model.rs
//! Filas del reporte de envío. Las claves JSON son las que consume el dashboard.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendStatus {
    #[serde(rename = "Enviado")]
    Sent,
    #[serde(rename = "Error")]
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendResult {
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "estado")]
    pub status: SendStatus,
    #[serde(rename = "intentos")]
    pub attempts: u32,
    /// Segundos del último intento, con dos decimales.
    #[serde(rename = "duracion")]
    pub duration: f64,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "hora")]
    pub time: String,
    #[serde(rename = "adjunto1")]
    pub attachment1: String,
    #[serde(rename = "adjunto2")]
    pub attachment2: String,
}

/// Reporte publicado al terminar una corrida (solo se agregan filas, nunca se editan).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub run_id: Option<String>,
    pub entries: Vec<SendResult>,
}

impl Report {
    pub fn new(run_id: impl Into<String>, entries: Vec<SendResult>) -> Self {
        Self {
            run_id: Some(run_id.into()),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sent_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == SendStatus::Sent)
            .count()
    }
}

/// Cuerpo de GET /api/get-report
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportResponse {
    Empty {
        report: Vec<SendResult>,
        message: String,
    },
    Ready {
        report: Vec<SendResult>,
        total: usize,
    },
}

impl From<&Report> for ReportResponse {
    fn from(report: &Report) -> Self {
        if report.is_empty() {
            ReportResponse::Empty {
                report: vec![],
                message: "No report available yet".to_string(),
            }
        } else {
            ReportResponse::Ready {
                report: report.entries.clone(),
                total: report.len(),
            }
        }
    }
}
