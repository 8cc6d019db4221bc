//! Tracing setup, generalised from the teacher's daily rolling file
//! appender + env-filter, with the `LOG_FORMAT=json` switch spec §6 adds.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::application::config::configuration::{Configuration, LogFormat};

static LOGGER_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

pub fn tracing_subscribe(config: &Configuration) -> bool {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::daily(config.log_dir(), "kodit.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOGGER_GUARD.set(guard);

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(non_blocking).with_ansi(false))
            .with(fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
            .with(fmt::layer())
            .try_init(),
    };

    result.is_ok()
}
