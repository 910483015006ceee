//! Descriptor pools, descriptor sets and samplers

use ash::vk;

use super::{checked, destroy_with, Factory};
use crate::vulkan::create_info::{DescriptorPoolCreateInfo, DescriptorSetCreateInfo, SamplerCreateInfo};
use crate::vulkan::driver::Driver;
use crate::vulkan::error::{ResultExt, VulkanError, VulkanResult};
use crate::vulkan::kind::ResourceKind;
use crate::vulkan::resource::{DescriptorPool, DescriptorSet, Device, Sampler};
use crate::vulkan::selection::PhysicalDevice;

impl<D: Driver> Factory<D> {
    /// Create a descriptor pool
    pub fn create_descriptor_pool(&mut self, info: DescriptorPoolCreateInfo) -> VulkanResult<DescriptorPool> {
        let created = self.driver.create_descriptor_pool(info.device, &info.finalize());
        self.register(ResourceKind::DescriptorPool, created, info)
    }

    /// Destroy a descriptor pool, which frees every set allocated from it
    pub fn destroy_descriptor_pool(&mut self, pool: &mut DescriptorPool) -> VulkanResult<()> {
        let device = pool.create_info.device;
        let driver = &self.driver;
        destroy_with(pool, |handle| driver.destroy_descriptor_pool(device, handle))
    }

    /// Allocate a descriptor set and apply its writes
    ///
    /// The id is only assigned once the writes went through.
    pub fn create_descriptor_set(&mut self, info: DescriptorSetCreateInfo) -> VulkanResult<DescriptorSet> {
        let layouts = [info.layout];
        let native = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(info.descriptor_pool)
            .set_layouts(&layouts);
        let created = self
            .driver
            .allocate_descriptor_sets(info.device, &native)
            .and_then(|sets| {
                sets.first().copied().ok_or(VulkanError::NullHandle {
                    operation: "allocate",
                    kind: ResourceKind::DescriptorSet,
                })
            });
        let set = checked(ResourceKind::DescriptorSet, "create", created)?;

        if !info.writes.is_empty() {
            let writes: Vec<vk::WriteDescriptorSet> = info.writes.iter().map(|write| write.finalize(set)).collect();
            // Sets are owned by the pool, nothing to undo on failure
            self.driver
                .update_descriptor_sets(info.device, &writes)
                .failed("update", ResourceKind::DescriptorSet)?;
        }
        self.register(ResourceKind::DescriptorSet, Ok(set), info)
    }

    /// Forget a descriptor set. It is freed with its pool.
    pub fn destroy_descriptor_set(&mut self, set: &mut DescriptorSet) -> VulkanResult<()> {
        destroy_with(set, |_| Ok(()))
    }

    /// Create a sampler
    pub fn create_sampler(&mut self, info: SamplerCreateInfo) -> VulkanResult<Sampler> {
        let created = self.driver.create_sampler(info.device, &info.finalize());
        self.register(ResourceKind::Sampler, created, info)
    }

    /// Linear repeating sampler, anisotropic at the device limit when the
    /// logical device was created with anisotropy enabled
    pub fn create_texture_sampler(&mut self, device: &Device, physical_device: &PhysicalDevice) -> VulkanResult<Sampler> {
        let max_anisotropy = (device.create_info.features.sampler_anisotropy == vk::TRUE)
            .then_some(physical_device.properties.limits.max_sampler_anisotropy);
        self.create_sampler(SamplerCreateInfo {
            device: device.handle()?,
            filter: vk::Filter::LINEAR,
            address_mode: vk::SamplerAddressMode::REPEAT,
            max_anisotropy,
        })
    }

    /// Destroy a sampler
    pub fn destroy_sampler(&mut self, sampler: &mut Sampler) -> VulkanResult<()> {
        let device = sampler.create_info.device;
        let driver = &self.driver;
        destroy_with(sampler, |handle| driver.destroy_sampler(device, handle))
    }
}
