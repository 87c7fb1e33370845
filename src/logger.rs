//! logger.rs
//! Logs con env_logger. `RUST_LOG` manda; sin él, info para el servicio y
//! warn para el cliente SMTP (lettre es muy verboso en debug).

use env_logger::{Builder, Env};

const DEFAULT_FILTER: &str = "info,lettre=warn";

fn builder() -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    builder.format_timestamp_secs();
    builder
}

pub fn init_logger() {
    builder().init();
}

/// Para tests: no falla si otro test ya inicializó el logger.
#[cfg(test)]
pub fn init_test_logger() {
    let _ = builder().is_test(true).try_init();
}
