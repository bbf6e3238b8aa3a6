mod config;
mod error;
mod format;
mod init;
mod level;
mod timer;

pub use config::LoggerConfig;
pub use error::{LoggerError, LoggerResult};
pub use format::LoggerFormat;
pub use level::LoggerLevel;
pub use timer::{LoggerTimeZone, init_local_offset};

/// Install the global tracing subscriber described by `cfg`.
///
/// Call once, early in `main`. With [`LoggerTimeZone::Local`] also call
/// [`init_local_offset`] before the async runtime starts, otherwise timestamps
/// fall back to UTC.
///
/// # Examples
/// ```rust
/// use atc_observe::{LoggerConfig, init_logger};
///
/// let config = LoggerConfig::default();
/// init_logger(&config).expect("logger");
/// tracing::info!("tower online");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => init::install_text(cfg),
        LoggerFormat::Json => init::install_json(cfg),
    }
}
