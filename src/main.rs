use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;

use crate::config::app_config::AppConfig;
use crate::logger::init_logger;
use crate::services::campaign_service::CampaignService;
use crate::services::campaign_store::CampaignStore;
use crate::services::email_service::EmailService;
use crate::services::retry_policy::TokioSleeper;
use crate::services::smtp_resolver::ProviderResolver;
use crate::services::upload_service::UploadService;

mod app;
mod config;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = AppConfig::from_env();
    log::info!("Configuración: {:?}", config);

    // Carpetas temporales para lo que suba la UI
    let upload_service = UploadService::new(&config);
    if let Err(e) = upload_service.ensure_dirs() {
        log::error!("{:?}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }

    // Dispatcher SMTP real
    let email_service = EmailService::new(ProviderResolver::from_config(&config), config.smtp_timeout);

    // Estado de la campaña + corridas en segundo plano
    let campaign_service = CampaignService::from_config(
        &config,
        CampaignStore::new(),
        Arc::new(email_service),
        Arc::new(TokioSleeper),
    );

    let bind = (config.bind_addr.clone(), config.port);
    let temp_dir = config.temp_dir.clone();

    log::info!("Levantando servidor en {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        let temp_dir = temp_dir.clone();
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(upload_service.clone()))
            .app_data(web::Data::new(campaign_service.clone()))
            .configure(move |cfg| app::init_app(cfg, &temp_dir))
    })
    .bind(bind)?
    .run()
    .await
}
