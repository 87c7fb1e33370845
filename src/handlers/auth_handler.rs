//! handlers/auth_handler.rs
//! Login mínimo contra las credenciales configuradas. No emite tokens reales.

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::{config::app_config::AppConfig, models::campaign_model::LoginRequest};

/// POST /api/auth/login
pub async fn login_endpoint(
    config: web::Data<AppConfig>,
    body: web::Json<LoginRequest>,
) -> HttpResponse {
    let creds = body.into_inner();

    if creds.username == config.admin_user && creds.password == config.admin_password {
        HttpResponse::Ok().json(json!({
            "token": "fake-jwt-token-for-demo",
            "status": "success"
        }))
    } else {
        log::warn!("Login fallido para '{}'", creds.username);
        HttpResponse::Unauthorized().json(json!({
            "detail": "Invalid credentials"
        }))
    }
}
