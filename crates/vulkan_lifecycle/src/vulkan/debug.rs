//! Debug messenger logger and the native callback adapter
//!
//! The driver only knows about an `extern "system"` function and an opaque
//! `user_data` pointer. [`debug_callback`] is the single place where that
//! pointer is turned back into a [`DebugLogger`]; everything else deals with
//! the typed closure.

use ash::vk;
use std::cell::RefCell;
use std::ffi::{c_void, CStr};
use std::fmt;

use crate::foundation::logging;

/// Closure receiving `(severity, message types, text)`
pub type LogFunction =
    Box<dyn Fn(vk::DebugUtilsMessageSeverityFlagsEXT, vk::DebugUtilsMessageTypeFlagsEXT, &str)>;

/// Receives driver debug messages
///
/// Messages below `min_severity` are dropped. The first message at or above
/// `error_severity` is also kept so the caller can turn it into an error once
/// control is back on its side of the FFI boundary.
pub struct DebugLogger {
    function: LogFunction,
    min_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    error_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    first_error: RefCell<Option<String>>,
}

impl DebugLogger {
    /// Logger forwarding every message to `function`
    pub fn new(function: LogFunction) -> Self {
        Self {
            function,
            min_severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
            error_severity: vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            first_error: RefCell::new(None),
        }
    }

    /// Logger routing messages into the `log` facade
    pub fn to_log() -> Self {
        Self::new(Box::new(logging::log_driver_message))
    }

    /// Drop messages less severe than `severity`
    pub fn with_min_severity(mut self, severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Self {
        self.min_severity = severity;
        self
    }

    /// Remember messages at least as severe as `severity`
    pub fn with_error_severity(mut self, severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Self {
        self.error_severity = severity;
        self
    }

    /// Handle one message
    pub fn log(
        &self,
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
        message_types: vk::DebugUtilsMessageTypeFlagsEXT,
        message: &str,
    ) {
        if severity >= self.error_severity {
            let mut first_error = self.first_error.borrow_mut();
            if first_error.is_none() {
                *first_error = Some(logging::format_driver_message(severity, message_types, message));
            }
        }
        if severity >= self.min_severity {
            (self.function)(severity, message_types, message);
        }
    }

    /// Take the first error-level message seen since the last call
    pub fn take_error(&self) -> Option<String> {
        self.first_error.borrow_mut().take()
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::to_log()
    }
}

impl fmt::Debug for DebugLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugLogger")
            .field("min_severity", &self.min_severity)
            .field("error_severity", &self.error_severity)
            .finish_non_exhaustive()
    }
}

/// Debug callback handed to the driver
///
/// # Safety
///
/// `user_data` must be null or point at a live [`DebugLogger`], and
/// `callback_data` must be null or point at valid callback data.
pub unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    user_data: *mut c_void,
) -> vk::Bool32 {
    if user_data.is_null() || callback_data.is_null() {
        return vk::FALSE;
    }

    let logger = &*user_data.cast::<DebugLogger>();
    let callback_data = &*callback_data;
    let message = if callback_data.p_message.is_null() {
        std::borrow::Cow::Borrowed("")
    } else {
        CStr::from_ptr(callback_data.p_message).to_string_lossy()
    };

    logger.log(message_severity, message_type, &message);

    vk::FALSE
}
