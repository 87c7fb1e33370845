//! handlers/campaign_handler.rs
//! Envío, reporte, limpieza y estado de la campaña.

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::{
    models::{
        campaign_model::{CampaignConfig, CampaignStatusResponse, SendStartedResponse},
        report_model::ReportResponse,
    },
    services::{
        campaign_service::{CampaignError, CampaignService},
        import_service,
    },
};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// POST /api/send
/// Responde apenas la corrida queda en segundo plano.
pub async fn send_campaign_endpoint(
    campaign_service: web::Data<CampaignService>,
    body: web::Json<CampaignConfig>,
) -> HttpResponse {
    let config = body.into_inner();
    log::info!("Solicitud de envío: {:?}", config);

    match campaign_service.start(config) {
        Ok((recipient_count, run_id)) => HttpResponse::Ok().json(SendStartedResponse {
            message: "Sending started in background".to_string(),
            recipient_count,
            run_id,
        }),
        Err(e) => {
            log::warn!("Envío rechazado: {}", e);
            let mut response = match &e {
                CampaignError::AlreadyRunning => HttpResponse::Conflict(),
                CampaignError::NoRecipients
                | CampaignError::InvalidSender(_)
                | CampaignError::Import(_) => HttpResponse::BadRequest(),
                CampaignError::Io(_) => HttpResponse::InternalServerError(),
            };
            response.json(json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}

/// GET /api/get-report
pub async fn get_report_endpoint(campaign_service: web::Data<CampaignService>) -> HttpResponse {
    let report = campaign_service.store().report();
    HttpResponse::Ok().json(ReportResponse::from(report.as_ref()))
}

/// POST /api/clear-campaign
pub async fn clear_campaign_endpoint(campaign_service: web::Data<CampaignService>) -> HttpResponse {
    campaign_service.reset();
    HttpResponse::Ok().json(json!({
        "message": "Campaign data cleared successfully"
    }))
}

/// POST /api/cancel
pub async fn cancel_campaign_endpoint(campaign_service: web::Data<CampaignService>) -> HttpResponse {
    let cancelled = campaign_service.cancel();
    HttpResponse::Ok().json(json!({ "cancelled": cancelled }))
}

/// GET /api/status
pub async fn campaign_status_endpoint(campaign_service: web::Data<CampaignService>) -> HttpResponse {
    HttpResponse::Ok().json(CampaignStatusResponse {
        running: campaign_service.is_running(),
        recipients: campaign_service.store().recipient_count(),
        report_total: campaign_service.store().report().len(),
    })
}

/// GET /api/download-template
pub async fn download_template_endpoint() -> HttpResponse {
    match import_service::template_xlsx() {
        Ok(bytes) => HttpResponse::Ok()
            .append_header(("Content-Type", XLSX_CONTENT_TYPE))
            .append_header((
                "Content-Disposition",
                "attachment; filename=\"plantilla_destinatarios.xlsx\"",
            ))
            .body(bytes),
        Err(e) => {
            log::error!("Error generando plantilla: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}
