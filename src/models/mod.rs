//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod attachment_model;
pub mod campaign_model;
pub mod recipient_model;
pub mod report_model;
