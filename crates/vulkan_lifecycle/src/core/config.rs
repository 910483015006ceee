//! # Session Configuration
//!
//! The value object that drives instance creation and device selection:
//! application metadata, validation layers, instance and device extensions,
//! which queue roles must be resolved and whether anisotropic filtering is
//! mandatory.
//!
//! Configurations can be built in code with the `with_*` setters or loaded
//! from TOML/RON files through the [`Config`] trait. Missing fields in a file
//! fall back to [`Configuration::default`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub use crate::config::{Config, ConfigError};

/// Name of the Khronos validation layer
pub const KHRONOS_VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Environment variable the loader reads explicit layer manifests from
pub const LAYER_PATH_VARIABLE: &str = "VK_LAYER_PATH";

/// # Session Configuration
///
/// Immutable input to instance creation and physical device selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Application name for Vulkan instance creation
    pub application_name: String,
    /// Application version (major, minor, patch)
    pub application_version: (u32, u32, u32),
    /// Engine name for Vulkan instance creation
    pub engine_name: String,
    /// Engine version (major, minor, patch)
    pub engine_version: (u32, u32, u32),
    /// Whether validation layers are requested
    pub validation_layers_enabled: bool,
    /// Validation layer names
    pub validation_layers: Vec<String>,
    /// Instance extension names
    pub extensions: Vec<String>,
    /// Device extension names every candidate must support
    pub device_extensions: Vec<String>,
    /// A compute-capable family must exist
    pub compute_queue_family_required: bool,
    /// A transfer-capable family must exist
    pub transfer_queue_family_required: bool,
    /// A graphics-capable family must exist
    pub graphics_queue_family_required: bool,
    /// A family able to present to the surface must exist
    pub present_queue_family_required: bool,
    /// The device must support sampler anisotropy
    pub anisotropy_required: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            application_name: "Vulkan Application".to_string(),
            application_version: (1, 0, 0),
            engine_name: "Vulkan Lifecycle".to_string(),
            engine_version: (1, 0, 0),
            validation_layers_enabled: true,
            validation_layers: vec![KHRONOS_VALIDATION_LAYER.to_string()],
            extensions: vec!["VK_EXT_debug_utils".to_string()],
            device_extensions: vec!["VK_KHR_swapchain".to_string()],
            compute_queue_family_required: true,
            transfer_queue_family_required: true,
            graphics_queue_family_required: true,
            present_queue_family_required: true,
            anisotropy_required: true,
        }
    }
}

impl Configuration {
    /// Configuration for compute or offscreen work: no surface, no swap-chain.
    pub fn headless() -> Self {
        Self {
            device_extensions: Vec::new(),
            present_queue_family_required: false,
            ..Self::default()
        }
    }

    /// Set application name
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Set application version
    pub fn with_version(mut self, major: u32, minor: u32, patch: u32) -> Self {
        self.application_version = (major, minor, patch);
        self
    }

    /// Enable or disable validation layers
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validation_layers_enabled = enabled;
        self
    }

    /// Append instance extensions, skipping ones already listed
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for extension in extensions {
            let extension = extension.into();
            if !self.extensions.contains(&extension) {
                self.extensions.push(extension);
            }
        }
        self
    }

    /// Replace the required device extensions
    pub fn with_device_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.device_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set which queue roles must be resolved: compute, transfer, graphics, present
    pub fn with_required_queues(mut self, compute: bool, transfer: bool, graphics: bool, present: bool) -> Self {
        self.compute_queue_family_required = compute;
        self.transfer_queue_family_required = transfer;
        self.graphics_queue_family_required = graphics;
        self.present_queue_family_required = present;
        self
    }

    /// Require or relax sampler anisotropy
    pub fn with_anisotropy(mut self, required: bool) -> Self {
        self.anisotropy_required = required;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_name.is_empty() {
            return Err(ConfigError::Invalid("application name cannot be empty".to_string()));
        }
        if self.validation_layers_enabled && self.validation_layers.is_empty() {
            return Err(ConfigError::Invalid(
                "validation is enabled but no validation layers are listed".to_string(),
            ));
        }
        let names = self
            .validation_layers
            .iter()
            .chain(&self.extensions)
            .chain(&self.device_extensions);
        for name in names {
            if name.is_empty() || name.contains('\0') {
                return Err(ConfigError::Invalid(format!("malformed layer or extension name {name:?}")));
            }
        }
        Ok(())
    }

    /// Environment variables the loader needs to find layers shipped next to the executable.
    pub fn environment_variables(executable_dir: impl AsRef<Path>) -> BTreeMap<String, String> {
        let mut variables = BTreeMap::new();
        variables.insert(
            LAYER_PATH_VARIABLE.to_string(),
            executable_dir.as_ref().display().to_string(),
        );
        variables
    }

    /// Export [`Self::environment_variables`] into the current process.
    ///
    /// Must run before the Vulkan loader is initialized and before other
    /// threads are spawned.
    pub fn apply_environment_variables(executable_dir: impl AsRef<Path>) {
        for (name, value) in Self::environment_variables(executable_dir) {
            log::debug!("Setting {name}={value}");
            std::env::set_var(name, value);
        }
    }
}

impl Config for Configuration {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_requires_everything() {
        let config = Configuration::default();
        assert!(config.compute_queue_family_required);
        assert!(config.transfer_queue_family_required);
        assert!(config.graphics_queue_family_required);
        assert!(config.present_queue_family_required);
        assert!(config.anisotropy_required);
        assert_eq!(config.validation_layers, vec![KHRONOS_VALIDATION_LAYER.to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_headless_drops_presentation() {
        let config = Configuration::headless();
        assert!(!config.present_queue_family_required);
        assert!(config.device_extensions.is_empty());
    }

    #[test]
    fn test_builder_pattern() {
        let config = Configuration::default()
            .with_application_name("Probe")
            .with_version(2, 1, 3)
            .with_extensions(["VK_KHR_surface", "VK_EXT_debug_utils"])
            .with_anisotropy(false);

        assert_eq!(config.application_name, "Probe");
        assert_eq!(config.application_version, (2, 1, 3));
        assert_eq!(config.extensions, vec!["VK_EXT_debug_utils", "VK_KHR_surface"]);
        assert!(!config.anisotropy_required);
    }

    #[test]
    fn test_validation_errors() {
        let config = Configuration::default().with_application_name("");
        assert!(config.validate().is_err());

        let config = Configuration {
            validation_layers: Vec::new(),
            ..Configuration::default()
        };
        assert!(config.validate().is_err());

        let config = Configuration::default().with_device_extensions([""]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_points_at_executable_dir() {
        let variables = Configuration::environment_variables("/opt/app/bin");
        assert_eq!(variables.get(LAYER_PATH_VARIABLE).map(String::as_str), Some("/opt/app/bin"));
    }

    #[test]
    fn test_toml_and_ron_round_trip_through_files() {
        let dir = std::env::temp_dir();
        let config = Configuration::headless().with_application_name("File Test");

        for name in ["vulkan_lifecycle_config_test.toml", "vulkan_lifecycle_config_test.ron"] {
            let path = dir.join(name);
            config.save_to_file(&path).unwrap();
            let loaded = Configuration::load_from_file(&path).unwrap();
            assert_eq!(loaded, config);
            let _ = std::fs::remove_file(&path);
        }
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Configuration = toml::from_str("anisotropy_required = false").unwrap();
        assert!(!config.anisotropy_required);
        assert!(config.graphics_queue_family_required);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = Configuration::load_from_file("settings.json");
        assert!(matches!(result, Err(ConfigError::Io(_) | ConfigError::UnsupportedFormat(_))));
    }
}
