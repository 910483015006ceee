//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

use ash::vk;

/// Initialize the logging system
///
/// Honors `RUST_LOG`. Calling it more than once is harmless.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize logging with `default_filter` used when `RUST_LOG` is unset
pub fn init_with_level(default_filter: &str) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).try_init()
}

/// Name of the most severe bit in `severity`
pub fn severity_name(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> &'static str {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        "ERROR"
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        "WARNING"
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        "INFO"
    } else {
        "VERBOSE"
    }
}

/// `|`-joined names of the bits in `message_types`
pub fn message_type_names(message_types: vk::DebugUtilsMessageTypeFlagsEXT) -> String {
    let names: Vec<&str> = [
        (vk::DebugUtilsMessageTypeFlagsEXT::GENERAL, "GENERAL"),
        (vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION, "VALIDATION"),
        (vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE, "PERFORMANCE"),
    ]
    .into_iter()
    .filter(|(bit, _)| message_types.contains(*bit))
    .map(|(_, name)| name)
    .collect();

    if names.is_empty() {
        "UNKNOWN".to_string()
    } else {
        names.join("|")
    }
}

/// Format a driver message as `[SEVERITY] (TYPE) validation layer: message`
pub fn format_driver_message(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_types: vk::DebugUtilsMessageTypeFlagsEXT,
    message: &str,
) -> String {
    format!(
        "[{}] ({}) validation layer: {}",
        severity_name(severity),
        message_type_names(message_types),
        message
    )
}

/// Route a driver message to the `log` facade by severity
pub fn log_driver_message(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_types: vk::DebugUtilsMessageTypeFlagsEXT,
    message: &str,
) {
    let line = format_driver_message(severity, message_types, message);
    if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("{line}");
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("{line}");
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::INFO {
        log::info!("{line}");
    } else {
        log::debug!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_driver_message() {
        let line = format_driver_message(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
            vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            "image layout mismatch",
        );
        assert_eq!(line, "[WARNING] (VALIDATION|PERFORMANCE) validation layer: image layout mismatch");
    }

    #[test]
    fn test_severity_names() {
        assert_eq!(severity_name(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE), "VERBOSE");
        assert_eq!(severity_name(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR), "ERROR");
        assert_eq!(message_type_names(vk::DebugUtilsMessageTypeFlagsEXT::empty()), "UNKNOWN");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
    }
}
