//! Memory-backed buffers and images
//!
//! Each buffer or image gets its own allocation bound at offset 0. Creation
//! runs handle → requirements → memory type → allocate → bind and unwinds
//! whatever it already made when a later step fails, so callers only ever
//! see a resource with both halves set or an error.

use ash::vk::{self, Handle};
use std::ffi::c_void;

use super::{checked, Factory};
use crate::vulkan::create_info::{BufferCreateInfo, ImageCreateInfo};
use crate::vulkan::driver::Driver;
use crate::vulkan::error::{ResultExt, VulkanError, VulkanResult};
use crate::vulkan::kind::ResourceKind;
use crate::vulkan::memory::find_memory_type;
use crate::vulkan::resource::{Buffer, Image, MemoryResource, Resource, Tracked};
use crate::vulkan::selection::PhysicalDevice;

struct Allocation {
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl<D: Driver> Factory<D> {
    /// Create a buffer with dedicated memory of the given properties
    pub fn create_buffer(
        &mut self,
        physical_device: &PhysicalDevice,
        info: BufferCreateInfo,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Buffer> {
        let device = info.device;
        let buffer = checked(
            ResourceKind::Buffer,
            "create",
            self.driver.create_buffer(device, &info.finalize()),
        )?;

        let allocation = self
            .driver
            .buffer_memory_requirements(device, buffer)
            .failed("query memory requirements of", ResourceKind::Buffer)
            .and_then(|requirements| {
                self.allocate_and_bind(physical_device, device, requirements, properties, |driver, memory| {
                    driver.bind_buffer_memory(device, buffer, memory, 0)
                })
            })
            .failed("back", ResourceKind::Buffer);

        match allocation {
            Ok(allocation) => Ok(self.memory_resource(ResourceKind::Buffer, buffer, info, allocation, properties)),
            Err(error) => {
                if let Err(cleanup) = self.driver.destroy_buffer(device, buffer) {
                    log::warn!("Failed to destroy unbacked buffer: {}", cleanup.report());
                }
                Err(error)
            }
        }
    }

    /// Destroy a buffer: unmap when asked to, free its memory, destroy the handle.
    pub fn destroy_buffer(&mut self, buffer: &mut Buffer, unmap_memory: bool) -> VulkanResult<()> {
        let device = buffer.create_info.device;
        self.release_memory(device, buffer, unmap_memory)?;
        if buffer.resource.is_live() {
            self.driver
                .destroy_buffer(device, buffer.resource.value)
                .failed("destroy", ResourceKind::Buffer)?;
            buffer.resource.release();
        }
        Ok(())
    }

    /// Create a 2D image with dedicated memory of the given properties
    pub fn create_image(
        &mut self,
        physical_device: &PhysicalDevice,
        info: ImageCreateInfo,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Image> {
        let device = info.device;
        let image = checked(
            ResourceKind::Image,
            "create",
            self.driver.create_image(device, &info.finalize()),
        )?;

        let allocation = self
            .driver
            .image_memory_requirements(device, image)
            .failed("query memory requirements of", ResourceKind::Image)
            .and_then(|requirements| {
                self.allocate_and_bind(physical_device, device, requirements, properties, |driver, memory| {
                    driver.bind_image_memory(device, image, memory, 0)
                })
            })
            .failed("back", ResourceKind::Image);

        match allocation {
            Ok(allocation) => Ok(self.memory_resource(ResourceKind::Image, image, info, allocation, properties)),
            Err(error) => {
                if let Err(cleanup) = self.driver.destroy_image(device, image) {
                    log::warn!("Failed to destroy unbacked image: {}", cleanup.report());
                }
                Err(error)
            }
        }
    }

    /// Destroy an image: unmap when asked to, free its memory, destroy the handle.
    pub fn destroy_image(&mut self, image: &mut Image, unmap_memory: bool) -> VulkanResult<()> {
        let device = image.create_info.device;
        self.release_memory(device, image, unmap_memory)?;
        if image.resource.is_live() {
            self.driver
                .destroy_image(device, image.resource.value)
                .failed("destroy", ResourceKind::Image)?;
            image.resource.release();
        }
        Ok(())
    }

    /// Map the whole allocation of a host-visible resource
    pub fn map_memory<T: Handle + Copy, C>(
        &self,
        device: vk::Device,
        resource: &MemoryResource<T, C>,
    ) -> VulkanResult<*mut c_void> {
        if !resource.is_host_visible() {
            return Err(VulkanError::Precondition(format!(
                "{} #{} is not host visible",
                resource.kind, resource.id
            )));
        }
        let memory = resource.memory_handle()?;
        let mapped = self
            .driver
            .map_memory(device, memory, 0, resource.memory_size)
            .failed("map memory of", resource.kind)?;
        if mapped.is_null() {
            return Err(VulkanError::NullHandle {
                operation: "map memory of",
                kind: resource.kind,
            });
        }
        Ok(mapped)
    }

    /// Unmap a previously mapped resource
    pub fn unmap_memory<T: Handle + Copy, C>(
        &self,
        device: vk::Device,
        resource: &MemoryResource<T, C>,
    ) -> VulkanResult<()> {
        self.driver
            .unmap_memory(device, resource.memory_handle()?)
            .failed("unmap memory of", resource.kind)
    }

    /// Copy `data` to the start of a host-visible resource through a
    /// temporary mapping
    pub fn write_memory<T: Handle + Copy, C, P: bytemuck::Pod>(
        &self,
        device: vk::Device,
        resource: &MemoryResource<T, C>,
        data: &[P],
    ) -> VulkanResult<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if bytes.len() as vk::DeviceSize > resource.memory_size {
            return Err(VulkanError::InvalidArgument(format!(
                "{} bytes do not fit in {} #{} ({} bytes)",
                bytes.len(),
                resource.kind,
                resource.id,
                resource.memory_size
            )));
        }

        let mapped = self.map_memory(device, resource)?;
        // SAFETY: the mapping covers the whole allocation and the length was checked above
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped.cast::<u8>(), bytes.len());
        }
        self.unmap_memory(device, resource)
    }

    fn allocate_and_bind<F>(
        &self,
        physical_device: &PhysicalDevice,
        device: vk::Device,
        requirements: vk::MemoryRequirements,
        properties: vk::MemoryPropertyFlags,
        bind: F,
    ) -> VulkanResult<Allocation>
    where
        F: FnOnce(&D, vk::DeviceMemory) -> VulkanResult<()>,
    {
        let memory_type_index = find_memory_type(
            &self.driver,
            physical_device.handle()?,
            requirements.memory_type_bits,
            properties,
        )?;
        let allocate_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        let memory = checked(
            ResourceKind::DeviceMemory,
            "allocate",
            self.driver.allocate_memory(device, &allocate_info),
        )?;

        if let Err(error) = bind(&self.driver, memory) {
            if let Err(cleanup) = self.driver.free_memory(device, memory) {
                log::warn!("Failed to free unbound memory: {}", cleanup.report());
            }
            return Err(error.failed("bind", ResourceKind::DeviceMemory));
        }

        Ok(Allocation {
            memory,
            size: requirements.size,
        })
    }

    fn memory_resource<T: Handle + Copy, C>(
        &mut self,
        kind: ResourceKind,
        value: T,
        create_info: C,
        allocation: Allocation,
        properties: vk::MemoryPropertyFlags,
    ) -> MemoryResource<T, C> {
        MemoryResource {
            resource: Resource::new(self.ids.next(kind), kind, value, create_info),
            memory: allocation.memory,
            memory_size: allocation.size,
            memory_properties: properties,
        }
    }

    /// Unmap (if requested and host visible) and free the memory half
    fn release_memory<T: Handle + Copy, C>(
        &self,
        device: vk::Device,
        resource: &mut MemoryResource<T, C>,
        unmap_memory: bool,
    ) -> VulkanResult<()> {
        if resource.memory == vk::DeviceMemory::null() {
            return Ok(());
        }
        if unmap_memory && resource.is_host_visible() {
            self.unmap_memory(device, resource)?;
        }
        self.driver
            .free_memory(device, resource.memory)
            .failed("free memory of", resource.kind)?;
        resource.memory = vk::DeviceMemory::null();
        Ok(())
    }
}
