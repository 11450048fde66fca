use std::{path::PathBuf, sync::OnceLock};

use serde_json::{json, Value};

use crate::logging::{LogLevel, RuntimeLogger};

static RUNTIME_LOGGER: OnceLock<RuntimeLogger> = OnceLock::new();

pub(crate) fn init_runtime_logger(path: PathBuf) -> &'static RuntimeLogger {
    RUNTIME_LOGGER.get_or_init(|| RuntimeLogger::new(path))
}

pub(crate) fn runtime_logger() -> Option<&'static RuntimeLogger> {
    RUNTIME_LOGGER.get()
}

/// Mirrors to the console, then appends to the runtime log once it exists.
pub(crate) fn append_runtime_log(level: LogLevel, message: &str, context: Value) {
    match level {
        LogLevel::Info => log::info!("{message} {context}"),
        LogLevel::Warn => log::warn!("{message} {context}"),
        LogLevel::Error => log::error!("{message} {context}"),
    }
    if let Some(logger) = runtime_logger() {
        logger.append(level, message, context);
    }
}

pub(crate) fn log_info(message: &str) {
    append_runtime_log(LogLevel::Info, message, json!({}));
}

pub(crate) fn log_warn(message: &str) {
    append_runtime_log(LogLevel::Warn, message, json!({}));
}

pub(crate) fn log_error(message: &str) {
    append_runtime_log(LogLevel::Error, message, json!({}));
}
