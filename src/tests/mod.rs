//! tests/mod.rs
//! Pruebas del motor de envío y de la API. Nunca se conectan a un SMTP real.

pub mod support;
