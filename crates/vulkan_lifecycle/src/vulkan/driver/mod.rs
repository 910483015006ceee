//! Native driver boundary
//!
//! Everything above this trait speaks in `ash::vk` handles and create-info
//! structs; everything below it talks to a real or simulated Vulkan driver.
//! [`AshDriver`] is the production implementation.

mod ash_driver;
#[cfg(test)]
pub(crate) mod mock;

pub use ash_driver::AshDriver;

use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::c_void;

use super::error::VulkanResult;

/// Vulkan-shaped driver interface
///
/// Creation of instances and devices takes `&mut self` because the
/// implementation has to remember the function tables it loaded for them.
/// Destroying a handle the driver does not know fails with
/// [`super::VulkanError::UnknownHandle`].
pub trait Driver {
    // Instance level

    /// Names of the instance layers available on this system
    fn enumerate_instance_layers(&self) -> VulkanResult<Vec<String>>;

    /// `vkCreateInstance`
    fn create_instance(&mut self, info: &vk::InstanceCreateInfo) -> VulkanResult<vk::Instance>;

    /// `vkDestroyInstance`
    fn destroy_instance(&mut self, instance: vk::Instance) -> VulkanResult<()>;

    /// `vkCreateDebugUtilsMessengerEXT`, looked up through the instance
    fn create_debug_messenger(
        &self,
        instance: vk::Instance,
        info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> VulkanResult<vk::DebugUtilsMessengerEXT>;

    /// `vkDestroyDebugUtilsMessengerEXT`
    fn destroy_debug_messenger(
        &self,
        instance: vk::Instance,
        messenger: vk::DebugUtilsMessengerEXT,
    ) -> VulkanResult<()>;

    /// Platform surface for a window owned by the caller
    fn create_surface(
        &self,
        instance: vk::Instance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VulkanResult<vk::SurfaceKHR>;

    /// `vkDestroySurfaceKHR`
    fn destroy_surface(&self, instance: vk::Instance, surface: vk::SurfaceKHR) -> VulkanResult<()>;

    /// `vkEnumeratePhysicalDevices`
    fn enumerate_physical_devices(&self, instance: vk::Instance) -> VulkanResult<Vec<vk::PhysicalDevice>>;

    /// `vkGetPhysicalDeviceQueueFamilyProperties`
    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<vk::QueueFamilyProperties>>;

    /// `vkGetPhysicalDeviceSurfaceSupportKHR`
    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<bool>;

    /// Names from `vkEnumerateDeviceExtensionProperties`
    fn device_extensions(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<Vec<String>>;

    /// `vkGetPhysicalDeviceSurfaceCapabilitiesKHR`
    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<vk::SurfaceCapabilitiesKHR>;

    /// `vkGetPhysicalDeviceSurfaceFormatsKHR`
    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::SurfaceFormatKHR>>;

    /// `vkGetPhysicalDeviceSurfacePresentModesKHR`
    fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::PresentModeKHR>>;

    /// `vkGetPhysicalDeviceFeatures`
    fn physical_device_features(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::PhysicalDeviceFeatures>;

    /// `vkGetPhysicalDeviceProperties`
    fn physical_device_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::PhysicalDeviceProperties>;

    /// `vkGetPhysicalDeviceMemoryProperties`
    fn memory_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::PhysicalDeviceMemoryProperties>;

    /// `vkGetPhysicalDeviceFormatProperties`
    fn format_properties(
        &self,
        physical_device: vk::PhysicalDevice,
        format: vk::Format,
    ) -> VulkanResult<vk::FormatProperties>;

    // Device level

    /// `vkCreateDevice`
    fn create_device(
        &mut self,
        physical_device: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo,
    ) -> VulkanResult<vk::Device>;

    /// `vkDestroyDevice`, after waiting for the device to go idle
    fn destroy_device(&mut self, device: vk::Device) -> VulkanResult<()>;

    /// `vkGetDeviceQueue`
    fn device_queue(&self, device: vk::Device, queue_family_index: u32, queue_index: u32) -> VulkanResult<vk::Queue>;

    /// `vkCreateCommandPool`
    fn create_command_pool(
        &self,
        device: vk::Device,
        info: &vk::CommandPoolCreateInfo,
    ) -> VulkanResult<vk::CommandPool>;

    /// `vkDestroyCommandPool`
    fn destroy_command_pool(&self, device: vk::Device, pool: vk::CommandPool) -> VulkanResult<()>;

    /// `vkAllocateCommandBuffers`
    fn allocate_command_buffers(
        &self,
        device: vk::Device,
        info: &vk::CommandBufferAllocateInfo,
    ) -> VulkanResult<Vec<vk::CommandBuffer>>;

    /// `vkFreeCommandBuffers`
    fn free_command_buffers(
        &self,
        device: vk::Device,
        pool: vk::CommandPool,
        buffers: &[vk::CommandBuffer],
    ) -> VulkanResult<()>;

    /// `vkCreateSwapchainKHR`
    fn create_swap_chain(
        &self,
        device: vk::Device,
        info: &vk::SwapchainCreateInfoKHR,
    ) -> VulkanResult<vk::SwapchainKHR>;

    /// `vkDestroySwapchainKHR`
    fn destroy_swap_chain(&self, device: vk::Device, swap_chain: vk::SwapchainKHR) -> VulkanResult<()>;

    /// `vkGetSwapchainImagesKHR`
    fn swap_chain_images(&self, device: vk::Device, swap_chain: vk::SwapchainKHR) -> VulkanResult<Vec<vk::Image>>;

    /// `vkCreateImageView`
    fn create_image_view(&self, device: vk::Device, info: &vk::ImageViewCreateInfo) -> VulkanResult<vk::ImageView>;

    /// `vkDestroyImageView`
    fn destroy_image_view(&self, device: vk::Device, view: vk::ImageView) -> VulkanResult<()>;

    /// `vkCreateRenderPass`
    fn create_render_pass(&self, device: vk::Device, info: &vk::RenderPassCreateInfo) -> VulkanResult<vk::RenderPass>;

    /// `vkDestroyRenderPass`
    fn destroy_render_pass(&self, device: vk::Device, render_pass: vk::RenderPass) -> VulkanResult<()>;

    /// `vkCreateDescriptorSetLayout`
    fn create_descriptor_set_layout(
        &self,
        device: vk::Device,
        info: &vk::DescriptorSetLayoutCreateInfo,
    ) -> VulkanResult<vk::DescriptorSetLayout>;

    /// `vkDestroyDescriptorSetLayout`
    fn destroy_descriptor_set_layout(&self, device: vk::Device, layout: vk::DescriptorSetLayout) -> VulkanResult<()>;

    /// `vkCreateShaderModule`
    fn create_shader_module(
        &self,
        device: vk::Device,
        info: &vk::ShaderModuleCreateInfo,
    ) -> VulkanResult<vk::ShaderModule>;

    /// `vkDestroyShaderModule`
    fn destroy_shader_module(&self, device: vk::Device, module: vk::ShaderModule) -> VulkanResult<()>;

    /// `vkCreatePipelineLayout`
    fn create_pipeline_layout(
        &self,
        device: vk::Device,
        info: &vk::PipelineLayoutCreateInfo,
    ) -> VulkanResult<vk::PipelineLayout>;

    /// `vkDestroyPipelineLayout`
    fn destroy_pipeline_layout(&self, device: vk::Device, layout: vk::PipelineLayout) -> VulkanResult<()>;

    /// `vkCreateGraphicsPipelines` for a single pipeline without a cache
    fn create_graphics_pipeline(
        &self,
        device: vk::Device,
        info: &vk::GraphicsPipelineCreateInfo,
    ) -> VulkanResult<vk::Pipeline>;

    /// `vkDestroyPipeline`
    fn destroy_pipeline(&self, device: vk::Device, pipeline: vk::Pipeline) -> VulkanResult<()>;

    /// `vkCreateFramebuffer`
    fn create_frame_buffer(&self, device: vk::Device, info: &vk::FramebufferCreateInfo) -> VulkanResult<vk::Framebuffer>;

    /// `vkDestroyFramebuffer`
    fn destroy_frame_buffer(&self, device: vk::Device, frame_buffer: vk::Framebuffer) -> VulkanResult<()>;

    /// `vkCreateDescriptorPool`
    fn create_descriptor_pool(
        &self,
        device: vk::Device,
        info: &vk::DescriptorPoolCreateInfo,
    ) -> VulkanResult<vk::DescriptorPool>;

    /// `vkDestroyDescriptorPool`
    fn destroy_descriptor_pool(&self, device: vk::Device, pool: vk::DescriptorPool) -> VulkanResult<()>;

    /// `vkAllocateDescriptorSets`
    fn allocate_descriptor_sets(
        &self,
        device: vk::Device,
        info: &vk::DescriptorSetAllocateInfo,
    ) -> VulkanResult<Vec<vk::DescriptorSet>>;

    /// `vkUpdateDescriptorSets` without copies
    fn update_descriptor_sets(&self, device: vk::Device, writes: &[vk::WriteDescriptorSet]) -> VulkanResult<()>;

    /// `vkCreateSampler`
    fn create_sampler(&self, device: vk::Device, info: &vk::SamplerCreateInfo) -> VulkanResult<vk::Sampler>;

    /// `vkDestroySampler`
    fn destroy_sampler(&self, device: vk::Device, sampler: vk::Sampler) -> VulkanResult<()>;

    /// `vkCreateSemaphore`
    fn create_semaphore(&self, device: vk::Device, info: &vk::SemaphoreCreateInfo) -> VulkanResult<vk::Semaphore>;

    /// `vkDestroySemaphore`
    fn destroy_semaphore(&self, device: vk::Device, semaphore: vk::Semaphore) -> VulkanResult<()>;

    /// `vkCreateFence`
    fn create_fence(&self, device: vk::Device, info: &vk::FenceCreateInfo) -> VulkanResult<vk::Fence>;

    /// `vkDestroyFence`
    fn destroy_fence(&self, device: vk::Device, fence: vk::Fence) -> VulkanResult<()>;

    /// `vkCreateBuffer`
    fn create_buffer(&self, device: vk::Device, info: &vk::BufferCreateInfo) -> VulkanResult<vk::Buffer>;

    /// `vkDestroyBuffer`
    fn destroy_buffer(&self, device: vk::Device, buffer: vk::Buffer) -> VulkanResult<()>;

    /// `vkGetBufferMemoryRequirements`
    fn buffer_memory_requirements(&self, device: vk::Device, buffer: vk::Buffer) -> VulkanResult<vk::MemoryRequirements>;

    /// `vkBindBufferMemory`
    fn bind_buffer_memory(
        &self,
        device: vk::Device,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VulkanResult<()>;

    /// `vkCreateImage`
    fn create_image(&self, device: vk::Device, info: &vk::ImageCreateInfo) -> VulkanResult<vk::Image>;

    /// `vkDestroyImage`
    fn destroy_image(&self, device: vk::Device, image: vk::Image) -> VulkanResult<()>;

    /// `vkGetImageMemoryRequirements`
    fn image_memory_requirements(&self, device: vk::Device, image: vk::Image) -> VulkanResult<vk::MemoryRequirements>;

    /// `vkBindImageMemory`
    fn bind_image_memory(
        &self,
        device: vk::Device,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VulkanResult<()>;

    /// `vkAllocateMemory`
    fn allocate_memory(&self, device: vk::Device, info: &vk::MemoryAllocateInfo) -> VulkanResult<vk::DeviceMemory>;

    /// `vkFreeMemory`
    fn free_memory(&self, device: vk::Device, memory: vk::DeviceMemory) -> VulkanResult<()>;

    /// `vkMapMemory`
    fn map_memory(
        &self,
        device: vk::Device,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> VulkanResult<*mut c_void>;

    /// `vkUnmapMemory`
    fn unmap_memory(&self, device: vk::Device, memory: vk::DeviceMemory) -> VulkanResult<()>;
}
