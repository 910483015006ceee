//! Semaphores and fences

use ash::vk;

use super::{destroy_with, Factory};
use crate::vulkan::create_info::{FenceCreateInfo, SemaphoreCreateInfo};
use crate::vulkan::driver::Driver;
use crate::vulkan::error::{ResultExt, VulkanResult};
use crate::vulkan::kind::ResourceKind;
use crate::vulkan::resource::{Fence, Semaphore};

impl<D: Driver> Factory<D> {
    /// Create a binary semaphore
    pub fn create_semaphore(&mut self, info: SemaphoreCreateInfo) -> VulkanResult<Semaphore> {
        let created = self
            .driver
            .create_semaphore(info.device, &vk::SemaphoreCreateInfo::builder());
        self.register(ResourceKind::Semaphore, created, info)
    }

    /// Create one semaphore per create-info, all or nothing
    pub fn create_semaphores(&mut self, infos: Vec<SemaphoreCreateInfo>) -> VulkanResult<Vec<Semaphore>> {
        self.create_batch(infos, Self::create_semaphore, Self::destroy_semaphore)
            .context("create semaphores")
    }

    /// Destroy a semaphore
    pub fn destroy_semaphore(&mut self, semaphore: &mut Semaphore) -> VulkanResult<()> {
        let device = semaphore.create_info.device;
        let driver = &self.driver;
        destroy_with(semaphore, |handle| driver.destroy_semaphore(device, handle))
    }

    /// Create a fence
    pub fn create_fence(&mut self, info: FenceCreateInfo) -> VulkanResult<Fence> {
        let created = self.driver.create_fence(info.device, &info.finalize());
        self.register(ResourceKind::Fence, created, info)
    }

    /// Create one fence per create-info, all or nothing
    pub fn create_fences(&mut self, infos: Vec<FenceCreateInfo>) -> VulkanResult<Vec<Fence>> {
        self.create_batch(infos, Self::create_fence, Self::destroy_fence)
            .context("create fences")
    }

    /// Destroy a fence
    pub fn destroy_fence(&mut self, fence: &mut Fence) -> VulkanResult<()> {
        let device = fence.create_info.device;
        let driver = &self.driver;
        destroy_with(fence, |handle| driver.destroy_fence(device, handle))
    }
}
