//! Logging setup shared by the workspace binaries.
mod config;
mod error;
mod format;
mod level;
mod logger;
mod timezone;

pub use config::LoggerConfig;
pub use error::{LoggerError, LoggerResult};
pub use format::LoggerFormat;
pub use level::LoggerLevel;
pub use timezone::{LoggerTimeZone, Rfc3339Timer, init_local_offset};

/// Install the global tracing subscriber described by `cfg`.
///
/// With [`LoggerTimeZone::Local`], call [`init_local_offset`] first, before
/// any thread is spawned.
///
/// ```no_run
/// use w2k_observe::{LoggerConfig, init_logger};
///
/// init_logger(&LoggerConfig::default()).unwrap();
/// tracing::info!("ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    match cfg.format {
        LoggerFormat::Text => logger::text(cfg)?,
        LoggerFormat::Json => logger::json(cfg)?,
        LoggerFormat::Journald => logger::journald(cfg)?,
    }
    tracing::debug!(format = %cfg.format, level = %cfg.level, tz = %cfg.tz, "logger initialized");
    Ok(())
}
