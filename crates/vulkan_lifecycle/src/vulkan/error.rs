//! Error taxonomy for device selection and resource lifecycle operations
//!
//! Every layer wraps the failure it receives with its own context, so an
//! error walked through [`std::error::Error::source`] reads from the entry
//! point down to the native call that actually failed.

use ash::vk;
use thiserror::Error;

use super::kind::ResourceKind;

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// A native create/destroy call failed for a resource kind
    #[error("failed to {operation} {kind}")]
    CallFailed {
        /// Operation that was attempted (`create`, `allocate memory for`, ...)
        operation: &'static str,
        /// Resource kind the operation targeted
        kind: ResourceKind,
        /// Underlying failure
        #[source]
        source: Box<VulkanError>,
    },

    /// A native call reported success but handed back a null handle
    #[error("{operation} returned a null {kind} handle")]
    NullHandle {
        /// Operation that was attempted
        operation: &'static str,
        /// Resource kind the operation targeted
        kind: ResourceKind,
    },

    /// A handle was passed to the driver that it never created
    #[error("unknown {kind} handle {raw:#x}")]
    UnknownHandle {
        /// Kind of the handle
        kind: ResourceKind,
        /// Raw handle value
        raw: u64,
    },

    /// A precondition of the operation did not hold
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// An argument was rejected before any native call was made
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A resource was used while its handle is null
    #[error("{kind} #{id} is not initialized")]
    Uninitialized {
        /// Kind of the resource
        kind: ResourceKind,
        /// Registry id of the resource
        id: u32,
    },

    /// Resource with specified ID could not be found
    #[error("{kind} #{id} not found")]
    ResourceNotFound {
        /// Kind of the resource
        kind: ResourceKind,
        /// The registry id that was looked up
        id: u32,
    },

    /// No physical device satisfied the configuration
    #[error("No suitable physical device: {0}")]
    NoSuitableDevice(String),

    /// No suitable memory type found for allocation
    #[error("No suitable memory type found (filter {type_filter:#b}, flags {properties:?})")]
    NoSuitableMemoryType {
        /// Memory type bit mask from the resource requirements
        type_filter: u32,
        /// Property flags that had to be present
        properties: vk::MemoryPropertyFlags,
    },

    /// None of the candidate formats supports the requested features
    #[error("No supported format among {0:?}")]
    NoSupportedFormat(Vec<vk::Format>),

    /// Vulkan loader initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Reading an external file (shader byte code) failed
    #[error("failed to read {path}")]
    Io {
        /// Path that was read
        path: String,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// Context added by an outer layer
    #[error("{context}")]
    Context {
        /// What the outer layer was doing
        context: String,
        /// The failure being wrapped
        #[source]
        source: Box<VulkanError>,
    },
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

impl VulkanError {
    /// Wrap this error as the failure of `operation` on `kind`.
    pub fn failed(self, operation: &'static str, kind: ResourceKind) -> Self {
        Self::CallFailed {
            operation,
            kind,
            source: Box::new(self),
        }
    }

    /// Wrap this error with a description of the enclosing operation.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error in the wrapping chain.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::CallFailed { source, .. } | Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether the chain ends in a "nothing suitable" outcome.
    pub fn is_selection_failure(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::NoSuitableDevice(_) | Self::NoSuitableMemoryType { .. } | Self::NoSupportedFormat(_)
        )
    }

    /// Whether the chain ends in a violated precondition.
    pub fn is_precondition_failure(&self) -> bool {
        matches!(self.root_cause(), Self::Precondition(_) | Self::InvalidArgument(_))
    }

    /// The native result code at the bottom of the chain, if any.
    pub fn vk_result(&self) -> Option<vk::Result> {
        match self.root_cause() {
            Self::Api(result) => Some(*result),
            _ => None,
        }
    }

    /// Render the full chain as `outer: inner: ... : root`.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(error) = source {
            message.push_str(": ");
            message.push_str(&error.to_string());
            source = error.source();
        }
        message
    }
}

impl From<vk::Result> for VulkanError {
    fn from(result: vk::Result) -> Self {
        Self::Api(result)
    }
}

/// Context helpers for results flowing out of lower layers
pub trait ResultExt<T> {
    /// Wrap the error with a description of the enclosing operation.
    fn context(self, context: impl Into<String>) -> VulkanResult<T>;

    /// Wrap the error as the failure of `operation` on `kind`.
    fn failed(self, operation: &'static str, kind: ResourceKind) -> VulkanResult<T>;
}

impl<T, E: Into<VulkanError>> ResultExt<T> for Result<T, E> {
    fn context(self, context: impl Into<String>) -> VulkanResult<T> {
        self.map_err(|e| e.into().context(context))
    }

    fn failed(self, operation: &'static str, kind: ResourceKind) -> VulkanResult<T> {
        self.map_err(|e| e.into().failed(operation, kind))
    }
}
