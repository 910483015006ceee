//! Logical device and queues

use ash::vk;

use super::{destroy_with, Factory};
use crate::core::config::Configuration;
use crate::vulkan::create_info::{DeviceCreateInfo, QueueCreateInfo};
use crate::vulkan::driver::Driver;
use crate::vulkan::error::VulkanResult;
use crate::vulkan::kind::ResourceKind;
use crate::vulkan::resource::{Device, Queue};
use crate::vulkan::selection::PhysicalDevice;

impl<D: Driver> Factory<D> {
    /// Create the logical device with one queue per unique queue family.
    pub fn create_device(
        &mut self,
        physical_device: &PhysicalDevice,
        configuration: &Configuration,
    ) -> VulkanResult<Device> {
        let queue_family_indices = physical_device
            .queue_family_index_info
            .unique_queue_family_indices
            .iter()
            .copied()
            .collect();
        let info = DeviceCreateInfo::new(physical_device.handle()?, queue_family_indices, configuration)?;

        let queue_create_infos = info.queue_create_infos();
        let extensions = info.extension_name_ptrs();
        let layers = info.layer_name_ptrs();
        let native = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers)
            .enabled_features(&info.features);

        let created = self.driver.create_device(info.physical_device, &native);
        self.register(ResourceKind::Device, created, info)
    }

    /// Destroy the logical device. Every object allocated from it must be gone.
    pub fn destroy_device(&mut self, device: &mut Device) -> VulkanResult<()> {
        let driver = &mut self.driver;
        destroy_with(device, |handle| driver.destroy_device(handle))
    }

    /// Retrieve queue `queue_index` of `queue_family_index`.
    ///
    /// Queues belong to their device; the resource only records where the
    /// queue came from.
    pub fn create_queue(&mut self, device: &Device, queue_family_index: u32, queue_index: u32) -> VulkanResult<Queue> {
        let info = QueueCreateInfo {
            device: device.handle()?,
            queue_family_index,
            queue_index,
        };
        let created = self.driver.device_queue(info.device, queue_family_index, queue_index);
        self.register(ResourceKind::Queue, created, info)
    }

    /// Forget the queue. Queues are released with their device.
    pub fn destroy_queue(&mut self, queue: &mut Queue) -> VulkanResult<()> {
        destroy_with(queue, |_| Ok(()))
    }
}
