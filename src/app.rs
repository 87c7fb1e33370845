//! app.rs
use std::path::Path;

use actix_files::Files;
use actix_web::web;

use crate::handlers::{auth_handler, campaign_handler, upload_handler};

/// El `body_html` de /send puede traer imágenes en línea (data URI).
const JSON_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn init_app(cfg: &mut web::ServiceConfig, temp_dir: &Path) {
    cfg.app_data(web::JsonConfig::default().limit(JSON_LIMIT_BYTES))
        .service(
            web::scope("/api")
                .route("/auth/login", web::post().to(auth_handler::login_endpoint))
                .service(
                    web::scope("/upload")
                        .route(
                            "/excel",
                            web::post().to(upload_handler::upload_recipients_endpoint),
                        )
                        .route("/asset", web::post().to(upload_handler::upload_asset_endpoint))
                        .route(
                            "/assets-folder",
                            web::post().to(upload_handler::upload_folder_endpoint),
                        ),
                )
                .route("/send", web::post().to(campaign_handler::send_campaign_endpoint))
                .route(
                    "/get-report",
                    web::get().to(campaign_handler::get_report_endpoint),
                )
                .route(
                    "/clear-campaign",
                    web::post().to(campaign_handler::clear_campaign_endpoint),
                )
                .route("/cancel", web::post().to(campaign_handler::cancel_campaign_endpoint))
                .route("/status", web::get().to(campaign_handler::campaign_status_endpoint))
                .route(
                    "/download-template",
                    web::get().to(campaign_handler::download_template_endpoint),
                ),
        )
        // Archivos subidos, solo lectura
        .service(Files::new("/temp", temp_dir));
}
