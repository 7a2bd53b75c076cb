use crate::command::Reply;
use log::{debug, info, log_enabled, warn, Level};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Initializes the logger with the `env_logger` crate.
///
/// `RUST_LOG` wins when set; otherwise [`DEFAULT_LOG_FILTER`] applies. Calling
/// it again after a logger is installed does nothing.
pub fn init_logger() {
    init_logger_with_filter(DEFAULT_LOG_FILTER);
}

/// Like [`init_logger`] with a caller-chosen fallback filter (e.g. `"debug"`
/// for `relay -v`).
pub fn init_logger_with_filter(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        debug!("Logger already initialized");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}

/// Logs one console exchange: the line at debug level, plus a warning when
/// the reply is an error.
pub fn log_exchange(line: &str, reply: &Reply) {
    if log_enabled!(Level::Debug) {
        debug!("{} -> {}", line.trim_end(), reply.status_line());
    }
    if !reply.is_ok() && log_enabled!(Level::Warn) {
        warn!("Console command rejected: {} ({})", line.trim_end(), reply.status_line());
    }
}
