//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod attachment_service;
pub mod campaign_service;
pub mod campaign_store;
pub mod composer_service;
pub mod email_service;
pub mod import_service;
pub mod retry_policy;
pub mod smtp_resolver;
pub mod upload_service;
