//! Instance, debug messenger, surface and physical device

use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::collections::BTreeSet;
use std::rc::Rc;

use super::{destroy_with, Factory};
use crate::core::config::Configuration;
use crate::vulkan::create_info::{DebugMessengerCreateInfo, InstanceCreateInfo, SurfaceCreateInfo};
use crate::vulkan::debug::DebugLogger;
use crate::vulkan::driver::Driver;
use crate::vulkan::error::{ResultExt, VulkanError, VulkanResult};
use crate::vulkan::kind::ResourceKind;
use crate::vulkan::resource::{DebugMessenger, Instance, Surface};
use crate::vulkan::selection::{select_physical_device, PhysicalDevice};

impl<D: Driver> Factory<D> {
    /// Fail unless every layer in `layers` is installed.
    pub fn check_validation_layer_support(&self, layers: &[String]) -> VulkanResult<()> {
        let available: BTreeSet<String> = self
            .driver
            .enumerate_instance_layers()
            .context("enumerate instance layers")?
            .into_iter()
            .collect();
        let missing: Vec<&str> = layers
            .iter()
            .filter(|layer| !available.contains(*layer))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(VulkanError::Precondition(format!(
                "validation layers requested, but not available: {}",
                missing.join(", ")
            )))
        }
    }

    /// Create the instance described by `configuration`.
    ///
    /// With validation enabled the requested layers must be installed, and a
    /// debug messenger create-info is chained in so messages emitted while
    /// the instance is being created or destroyed reach `logger` too.
    pub fn create_instance(&mut self, configuration: &Configuration, logger: Rc<DebugLogger>) -> VulkanResult<Instance> {
        if configuration.validation_layers_enabled {
            self.check_validation_layer_support(&configuration.validation_layers)?;
        }

        let info = InstanceCreateInfo::from_configuration(configuration, logger)?;
        let application_info = info.application_info();
        let layers = info.layer_name_ptrs();
        let extensions = info.extension_name_ptrs();
        let chained = info
            .debug_logger
            .as_ref()
            .map(|logger| DebugMessengerCreateInfo::new(vk::Instance::null(), Rc::clone(logger)));
        let mut chained_native = chained.as_ref().map(|chained| chained.finalize().build());

        let mut native = vk::InstanceCreateInfo::builder()
            .application_info(&application_info)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions);
        if let Some(chained_native) = chained_native.as_mut() {
            native = native.push_next(chained_native);
        }

        let created = self.driver.create_instance(&native);
        self.register(ResourceKind::Instance, created, info)
    }

    /// Destroy the instance. Every object created from it must be gone.
    pub fn destroy_instance(&mut self, instance: &mut Instance) -> VulkanResult<()> {
        let driver = &mut self.driver;
        destroy_with(instance, |handle| driver.destroy_instance(handle))
    }

    /// Register `logger` for driver debug messages on `instance`.
    pub fn create_debug_messenger(
        &mut self,
        instance: &Instance,
        logger: Rc<DebugLogger>,
    ) -> VulkanResult<DebugMessenger> {
        let info = DebugMessengerCreateInfo::new(instance.handle()?, logger);
        let created = self.driver.create_debug_messenger(info.instance, &info.finalize());
        self.register(ResourceKind::DebugMessenger, created, info)
    }

    /// Unregister the debug messenger.
    pub fn destroy_debug_messenger(&mut self, messenger: &mut DebugMessenger) -> VulkanResult<()> {
        let instance = messenger.create_info.instance;
        let driver = &self.driver;
        destroy_with(messenger, |handle| driver.destroy_debug_messenger(instance, handle))
    }

    /// Create a presentation surface for a window owned by the caller.
    pub fn create_surface(
        &mut self,
        instance: &Instance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VulkanResult<Surface> {
        let info = SurfaceCreateInfo {
            instance: instance.handle()?,
        };
        let created = self.driver.create_surface(info.instance, display, window);
        self.register(ResourceKind::Surface, created, info)
    }

    /// Destroy the surface.
    pub fn destroy_surface(&mut self, surface: &mut Surface) -> VulkanResult<()> {
        let instance = surface.create_info.instance;
        let driver = &self.driver;
        destroy_with(surface, |handle| driver.destroy_surface(instance, handle))
    }

    /// Select the physical device for the session, see [`select_physical_device`].
    pub fn create_physical_device(
        &mut self,
        instance: &Instance,
        configuration: &Configuration,
        surface: Option<&Surface>,
    ) -> VulkanResult<PhysicalDevice> {
        let surface = surface.map(Surface::handle).transpose()?;
        let mut physical_device = select_physical_device(&self.driver, instance.handle()?, configuration, surface)?;
        physical_device.id = self.ids.next(ResourceKind::PhysicalDevice);
        Ok(physical_device)
    }

    /// Forget the physical device. Nothing is destroyed natively.
    pub fn destroy_physical_device(&mut self, physical_device: &mut PhysicalDevice) -> VulkanResult<()> {
        physical_device.release();
        Ok(())
    }
}
