//! handlers/mod.rs
//! Módulo que agrupa los handlers HTTP (login, subidas, campaña).

pub mod auth_handler;
pub mod campaign_handler;
pub mod upload_handler;
