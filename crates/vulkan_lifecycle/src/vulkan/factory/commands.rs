//! Command pools and command buffers

use super::{destroy_with, Factory};
use crate::vulkan::create_info::{CommandBufferCreateInfo, CommandPoolCreateInfo};
use crate::vulkan::driver::Driver;
use crate::vulkan::error::{ResultExt, VulkanError, VulkanResult};
use crate::vulkan::kind::ResourceKind;
use crate::vulkan::resource::{CommandBuffer, CommandPool};

impl<D: Driver> Factory<D> {
    /// Create a command pool
    pub fn create_command_pool(&mut self, info: CommandPoolCreateInfo) -> VulkanResult<CommandPool> {
        let created = self.driver.create_command_pool(info.device, &info.finalize());
        self.register(ResourceKind::CommandPool, created, info)
    }

    /// Destroy a command pool. Its buffers must already be freed.
    pub fn destroy_command_pool(&mut self, pool: &mut CommandPool) -> VulkanResult<()> {
        let device = pool.create_info.device;
        let driver = &self.driver;
        destroy_with(pool, |handle| driver.destroy_command_pool(device, handle))
    }

    /// Allocate one command buffer
    pub fn create_command_buffer(&mut self, info: CommandBufferCreateInfo) -> VulkanResult<CommandBuffer> {
        let created = self
            .driver
            .allocate_command_buffers(info.device, &info.finalize())
            .and_then(|buffers| {
                buffers.first().copied().ok_or(VulkanError::NullHandle {
                    operation: "allocate",
                    kind: ResourceKind::CommandBuffer,
                })
            });
        self.register(ResourceKind::CommandBuffer, created, info)
    }

    /// Allocate one command buffer per create-info, all or nothing
    pub fn create_command_buffers(&mut self, infos: Vec<CommandBufferCreateInfo>) -> VulkanResult<Vec<CommandBuffer>> {
        self.create_batch(infos, Self::create_command_buffer, Self::destroy_command_buffer)
            .context("create command buffers")
    }

    /// Free a command buffer back to its pool
    pub fn destroy_command_buffer(&mut self, buffer: &mut CommandBuffer) -> VulkanResult<()> {
        let CommandBufferCreateInfo {
            device,
            command_pool,
            ..
        } = buffer.create_info;
        let driver = &self.driver;
        destroy_with(buffer, |handle| driver.free_command_buffers(device, command_pool, &[handle]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Configuration;
    use crate::vulkan::driver::mock::{MockDriver, MockPhysicalDevice};
    use crate::vulkan::resource::{Device, Tracked};
    use ash::vk;
    use std::rc::Rc;

    fn device_factory() -> (Factory<MockDriver>, Device) {
        let mut factory = Factory::new(MockDriver::new(vec![MockPhysicalDevice::discrete()]));
        let configuration = Configuration::headless().with_validation(false);
        let instance = factory.create_instance(&configuration, Rc::default()).unwrap();
        let physical_device = factory
            .create_physical_device(&instance, &configuration, None)
            .unwrap();
        let device = factory.create_device(&physical_device, &configuration).unwrap();
        (factory, device)
    }

    fn pool(factory: &mut Factory<MockDriver>, device: &Device) -> CommandPool {
        factory
            .create_command_pool(CommandPoolCreateInfo {
                device: device.value,
                queue_family_index: 0,
                flags: vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            })
            .unwrap()
    }

    #[test]
    fn test_buffers_are_independent() {
        let (mut factory, device) = device_factory();
        let mut pool = pool(&mut factory, &device);
        let info = CommandBufferCreateInfo {
            device: device.value,
            command_pool: pool.value,
            level: vk::CommandBufferLevel::PRIMARY,
        };

        let mut buffers = factory.create_command_buffers(vec![info; 3]).unwrap();
        assert_eq!(buffers.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        factory.destroy_command_buffer(&mut buffers[1]).unwrap();
        assert!(buffers[0].is_live());
        assert!(!buffers[1].is_live());
        assert_eq!(factory.driver().live_count_of(ResourceKind::CommandBuffer), 2);

        for buffer in &mut buffers {
            factory.destroy_command_buffer(buffer).unwrap();
        }
        factory.destroy_command_pool(&mut pool).unwrap();
        assert_eq!(factory.driver().live_count_of(ResourceKind::CommandPool), 0);
    }

    #[test]
    fn test_failed_batch_frees_what_it_allocated() {
        let (mut factory, device) = device_factory();
        let pool = pool(&mut factory, &device);
        let info = CommandBufferCreateInfo {
            device: device.value,
            command_pool: pool.value,
            level: vk::CommandBufferLevel::PRIMARY,
        };
        factory.driver().fail_after(ResourceKind::CommandBuffer, 2);

        let error = factory.create_command_buffers(vec![info; 4]).unwrap_err();
        assert_eq!(error.vk_result(), Some(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY));
        assert_eq!(factory.driver().live_count_of(ResourceKind::CommandBuffer), 0);
    }
}
