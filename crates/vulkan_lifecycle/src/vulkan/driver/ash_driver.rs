//! `ash` implementation of the driver boundary

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::vk::{self, Handle};
use ash::{Device, Entry, Instance};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_void, CStr};

use super::Driver;
use crate::vulkan::error::{VulkanError, VulkanResult};
use crate::vulkan::kind::ResourceKind;

struct InstanceFunctions {
    instance: Instance,
    surface: Surface,
    debug_utils: Option<DebugUtils>,
}

struct DeviceFunctions {
    device: Device,
    swapchain: SwapchainLoader,
}

/// Driver backed by the system Vulkan loader
///
/// Keeps the function tables of every instance and device it created, keyed
/// by handle, so callers only ever pass raw `vk` handles around.
pub struct AshDriver {
    entry: Entry,
    instances: HashMap<vk::Instance, InstanceFunctions>,
    devices: HashMap<vk::Device, DeviceFunctions>,
    physical_devices: RefCell<HashMap<vk::PhysicalDevice, vk::Instance>>,
}

impl AshDriver {
    /// Load the Vulkan loader library
    pub fn load() -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::InitializationFailed(format!("Failed to load Vulkan: {e}")))?;
        Ok(Self::from_entry(entry))
    }

    /// Wrap an already loaded entry
    pub fn from_entry(entry: Entry) -> Self {
        Self {
            entry,
            instances: HashMap::new(),
            devices: HashMap::new(),
            physical_devices: RefCell::new(HashMap::new()),
        }
    }

    /// Vulkan entry point
    pub const fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Instance extensions needed to create surfaces on `display`
    pub fn required_surface_extensions(display: RawDisplayHandle) -> VulkanResult<Vec<String>> {
        let names = ash_window::enumerate_required_extensions(display).map_err(VulkanError::Api)?;
        Ok(names
            .iter()
            .map(|&name| unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
            .collect())
    }

    fn instance(&self, instance: vk::Instance) -> VulkanResult<&InstanceFunctions> {
        self.instances.get(&instance).ok_or(VulkanError::UnknownHandle {
            kind: ResourceKind::Instance,
            raw: instance.as_raw(),
        })
    }

    fn instance_of(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<&InstanceFunctions> {
        let instance = self
            .physical_devices
            .borrow()
            .get(&physical_device)
            .copied()
            .ok_or(VulkanError::UnknownHandle {
                kind: ResourceKind::PhysicalDevice,
                raw: physical_device.as_raw(),
            })?;
        self.instance(instance)
    }

    fn device(&self, device: vk::Device) -> VulkanResult<&DeviceFunctions> {
        self.devices.get(&device).ok_or(VulkanError::UnknownHandle {
            kind: ResourceKind::Device,
            raw: device.as_raw(),
        })
    }

    fn debug_utils(&self, instance: vk::Instance) -> VulkanResult<&DebugUtils> {
        self.instance(instance)?
            .debug_utils
            .as_ref()
            .ok_or(VulkanError::Api(vk::Result::ERROR_EXTENSION_NOT_PRESENT))
    }
}

fn extension_names(properties: &[vk::ExtensionProperties]) -> Vec<String> {
    properties
        .iter()
        .map(|p| unsafe { CStr::from_ptr(p.extension_name.as_ptr()) }.to_string_lossy().into_owned())
        .collect()
}

impl Driver for AshDriver {
    fn enumerate_instance_layers(&self) -> VulkanResult<Vec<String>> {
        #[allow(unused_unsafe)]
        let layers = unsafe { self.entry.enumerate_instance_layer_properties() }.map_err(VulkanError::Api)?;
        Ok(layers
            .iter()
            .map(|l| unsafe { CStr::from_ptr(l.layer_name.as_ptr()) }.to_string_lossy().into_owned())
            .collect())
    }

    fn create_instance(&mut self, info: &vk::InstanceCreateInfo) -> VulkanResult<vk::Instance> {
        let instance = unsafe { self.entry.create_instance(info, None) }.map_err(VulkanError::Api)?;
        let handle = instance.handle();

        // Only present when VK_EXT_debug_utils was enabled on the instance
        let create_messenger = unsafe {
            self.entry
                .get_instance_proc_addr(handle, c"vkCreateDebugUtilsMessengerEXT".as_ptr())
        };
        let debug_utils = create_messenger.map(|_| DebugUtils::new(&self.entry, &instance));
        let surface = Surface::new(&self.entry, &instance);

        self.instances.insert(
            handle,
            InstanceFunctions {
                instance,
                surface,
                debug_utils,
            },
        );
        Ok(handle)
    }

    fn destroy_instance(&mut self, instance: vk::Instance) -> VulkanResult<()> {
        let functions = self.instances.remove(&instance).ok_or(VulkanError::UnknownHandle {
            kind: ResourceKind::Instance,
            raw: instance.as_raw(),
        })?;
        self.physical_devices.borrow_mut().retain(|_, owner| *owner != instance);
        unsafe { functions.instance.destroy_instance(None) };
        Ok(())
    }

    fn create_debug_messenger(
        &self,
        instance: vk::Instance,
        info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let debug_utils = self.debug_utils(instance)?;
        unsafe { debug_utils.create_debug_utils_messenger(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_debug_messenger(
        &self,
        instance: vk::Instance,
        messenger: vk::DebugUtilsMessengerEXT,
    ) -> VulkanResult<()> {
        let debug_utils = self.debug_utils(instance)?;
        unsafe { debug_utils.destroy_debug_utils_messenger(messenger, None) };
        Ok(())
    }

    fn create_surface(
        &self,
        instance: vk::Instance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VulkanResult<vk::SurfaceKHR> {
        let functions = self.instance(instance)?;
        unsafe { ash_window::create_surface(&self.entry, &functions.instance, display, window, None) }
            .map_err(VulkanError::Api)
    }

    fn destroy_surface(&self, instance: vk::Instance, surface: vk::SurfaceKHR) -> VulkanResult<()> {
        let functions = self.instance(instance)?;
        unsafe { functions.surface.destroy_surface(surface, None) };
        Ok(())
    }

    fn enumerate_physical_devices(&self, instance: vk::Instance) -> VulkanResult<Vec<vk::PhysicalDevice>> {
        let functions = self.instance(instance)?;
        let devices = unsafe { functions.instance.enumerate_physical_devices() }.map_err(VulkanError::Api)?;
        let mut owners = self.physical_devices.borrow_mut();
        for device in &devices {
            owners.insert(*device, instance);
        }
        Ok(devices)
    }

    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<vk::QueueFamilyProperties>> {
        let functions = self.instance_of(physical_device)?;
        Ok(unsafe {
            functions
                .instance
                .get_physical_device_queue_family_properties(physical_device)
        })
    }

    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<bool> {
        let functions = self.instance_of(physical_device)?;
        unsafe {
            functions
                .surface
                .get_physical_device_surface_support(physical_device, queue_family_index, surface)
        }
        .map_err(VulkanError::Api)
    }

    fn device_extensions(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<Vec<String>> {
        let functions = self.instance_of(physical_device)?;
        let properties = unsafe {
            functions
                .instance
                .enumerate_device_extension_properties(physical_device)
        }
        .map_err(VulkanError::Api)?;
        Ok(extension_names(&properties))
    }

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<vk::SurfaceCapabilitiesKHR> {
        let functions = self.instance_of(physical_device)?;
        unsafe {
            functions
                .surface
                .get_physical_device_surface_capabilities(physical_device, surface)
        }
        .map_err(VulkanError::Api)
    }

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::SurfaceFormatKHR>> {
        let functions = self.instance_of(physical_device)?;
        unsafe {
            functions
                .surface
                .get_physical_device_surface_formats(physical_device, surface)
        }
        .map_err(VulkanError::Api)
    }

    fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::PresentModeKHR>> {
        let functions = self.instance_of(physical_device)?;
        unsafe {
            functions
                .surface
                .get_physical_device_surface_present_modes(physical_device, surface)
        }
        .map_err(VulkanError::Api)
    }

    fn physical_device_features(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::PhysicalDeviceFeatures> {
        let functions = self.instance_of(physical_device)?;
        Ok(unsafe { functions.instance.get_physical_device_features(physical_device) })
    }

    fn physical_device_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::PhysicalDeviceProperties> {
        let functions = self.instance_of(physical_device)?;
        Ok(unsafe { functions.instance.get_physical_device_properties(physical_device) })
    }

    fn memory_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::PhysicalDeviceMemoryProperties> {
        let functions = self.instance_of(physical_device)?;
        Ok(unsafe {
            functions
                .instance
                .get_physical_device_memory_properties(physical_device)
        })
    }

    fn format_properties(
        &self,
        physical_device: vk::PhysicalDevice,
        format: vk::Format,
    ) -> VulkanResult<vk::FormatProperties> {
        let functions = self.instance_of(physical_device)?;
        Ok(unsafe {
            functions
                .instance
                .get_physical_device_format_properties(physical_device, format)
        })
    }

    fn create_device(
        &mut self,
        physical_device: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo,
    ) -> VulkanResult<vk::Device> {
        let functions = self.instance_of(physical_device)?;
        let device = unsafe { functions.instance.create_device(physical_device, info, None) }
            .map_err(VulkanError::Api)?;
        let swapchain = SwapchainLoader::new(&functions.instance, &device);
        let handle = device.handle();

        self.devices.insert(handle, DeviceFunctions { device, swapchain });
        Ok(handle)
    }

    fn destroy_device(&mut self, device: vk::Device) -> VulkanResult<()> {
        let functions = self.devices.remove(&device).ok_or(VulkanError::UnknownHandle {
            kind: ResourceKind::Device,
            raw: device.as_raw(),
        })?;
        unsafe {
            // Ensure device is idle before destruction
            let _ = functions.device.device_wait_idle();
            functions.device.destroy_device(None);
        }
        Ok(())
    }

    fn device_queue(&self, device: vk::Device, queue_family_index: u32, queue_index: u32) -> VulkanResult<vk::Queue> {
        let functions = self.device(device)?;
        Ok(unsafe { functions.device.get_device_queue(queue_family_index, queue_index) })
    }

    fn create_command_pool(
        &self,
        device: vk::Device,
        info: &vk::CommandPoolCreateInfo,
    ) -> VulkanResult<vk::CommandPool> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_command_pool(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_command_pool(&self, device: vk::Device, pool: vk::CommandPool) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_command_pool(pool, None) };
        Ok(())
    }

    fn allocate_command_buffers(
        &self,
        device: vk::Device,
        info: &vk::CommandBufferAllocateInfo,
    ) -> VulkanResult<Vec<vk::CommandBuffer>> {
        let functions = self.device(device)?;
        unsafe { functions.device.allocate_command_buffers(info) }.map_err(VulkanError::Api)
    }

    fn free_command_buffers(
        &self,
        device: vk::Device,
        pool: vk::CommandPool,
        buffers: &[vk::CommandBuffer],
    ) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.free_command_buffers(pool, buffers) };
        Ok(())
    }

    fn create_swap_chain(
        &self,
        device: vk::Device,
        info: &vk::SwapchainCreateInfoKHR,
    ) -> VulkanResult<vk::SwapchainKHR> {
        let functions = self.device(device)?;
        unsafe { functions.swapchain.create_swapchain(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_swap_chain(&self, device: vk::Device, swap_chain: vk::SwapchainKHR) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.swapchain.destroy_swapchain(swap_chain, None) };
        Ok(())
    }

    fn swap_chain_images(&self, device: vk::Device, swap_chain: vk::SwapchainKHR) -> VulkanResult<Vec<vk::Image>> {
        let functions = self.device(device)?;
        unsafe { functions.swapchain.get_swapchain_images(swap_chain) }.map_err(VulkanError::Api)
    }

    fn create_image_view(&self, device: vk::Device, info: &vk::ImageViewCreateInfo) -> VulkanResult<vk::ImageView> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_image_view(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_image_view(&self, device: vk::Device, view: vk::ImageView) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_image_view(view, None) };
        Ok(())
    }

    fn create_render_pass(&self, device: vk::Device, info: &vk::RenderPassCreateInfo) -> VulkanResult<vk::RenderPass> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_render_pass(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_render_pass(&self, device: vk::Device, render_pass: vk::RenderPass) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_render_pass(render_pass, None) };
        Ok(())
    }

    fn create_descriptor_set_layout(
        &self,
        device: vk::Device,
        info: &vk::DescriptorSetLayoutCreateInfo,
    ) -> VulkanResult<vk::DescriptorSetLayout> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_descriptor_set_layout(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_descriptor_set_layout(&self, device: vk::Device, layout: vk::DescriptorSetLayout) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_descriptor_set_layout(layout, None) };
        Ok(())
    }

    fn create_shader_module(
        &self,
        device: vk::Device,
        info: &vk::ShaderModuleCreateInfo,
    ) -> VulkanResult<vk::ShaderModule> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_shader_module(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_shader_module(&self, device: vk::Device, module: vk::ShaderModule) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_shader_module(module, None) };
        Ok(())
    }

    fn create_pipeline_layout(
        &self,
        device: vk::Device,
        info: &vk::PipelineLayoutCreateInfo,
    ) -> VulkanResult<vk::PipelineLayout> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_pipeline_layout(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_pipeline_layout(&self, device: vk::Device, layout: vk::PipelineLayout) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_pipeline_layout(layout, None) };
        Ok(())
    }

    fn create_graphics_pipeline(
        &self,
        device: vk::Device,
        info: &vk::GraphicsPipelineCreateInfo,
    ) -> VulkanResult<vk::Pipeline> {
        let functions = self.device(device)?;
        let pipelines = unsafe {
            functions.device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                std::slice::from_ref(info),
                None,
            )
        }
        .map_err(|(_, result)| VulkanError::Api(result))?;
        pipelines.into_iter().next().ok_or(VulkanError::NullHandle {
            operation: "vkCreateGraphicsPipelines",
            kind: ResourceKind::Pipeline,
        })
    }

    fn destroy_pipeline(&self, device: vk::Device, pipeline: vk::Pipeline) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_pipeline(pipeline, None) };
        Ok(())
    }

    fn create_frame_buffer(&self, device: vk::Device, info: &vk::FramebufferCreateInfo) -> VulkanResult<vk::Framebuffer> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_framebuffer(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_frame_buffer(&self, device: vk::Device, frame_buffer: vk::Framebuffer) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_framebuffer(frame_buffer, None) };
        Ok(())
    }

    fn create_descriptor_pool(
        &self,
        device: vk::Device,
        info: &vk::DescriptorPoolCreateInfo,
    ) -> VulkanResult<vk::DescriptorPool> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_descriptor_pool(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_descriptor_pool(&self, device: vk::Device, pool: vk::DescriptorPool) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_descriptor_pool(pool, None) };
        Ok(())
    }

    fn allocate_descriptor_sets(
        &self,
        device: vk::Device,
        info: &vk::DescriptorSetAllocateInfo,
    ) -> VulkanResult<Vec<vk::DescriptorSet>> {
        let functions = self.device(device)?;
        unsafe { functions.device.allocate_descriptor_sets(info) }.map_err(VulkanError::Api)
    }

    fn update_descriptor_sets(&self, device: vk::Device, writes: &[vk::WriteDescriptorSet]) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.update_descriptor_sets(writes, &[]) };
        Ok(())
    }

    fn create_sampler(&self, device: vk::Device, info: &vk::SamplerCreateInfo) -> VulkanResult<vk::Sampler> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_sampler(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_sampler(&self, device: vk::Device, sampler: vk::Sampler) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_sampler(sampler, None) };
        Ok(())
    }

    fn create_semaphore(&self, device: vk::Device, info: &vk::SemaphoreCreateInfo) -> VulkanResult<vk::Semaphore> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_semaphore(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_semaphore(&self, device: vk::Device, semaphore: vk::Semaphore) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_semaphore(semaphore, None) };
        Ok(())
    }

    fn create_fence(&self, device: vk::Device, info: &vk::FenceCreateInfo) -> VulkanResult<vk::Fence> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_fence(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_fence(&self, device: vk::Device, fence: vk::Fence) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_fence(fence, None) };
        Ok(())
    }

    fn create_buffer(&self, device: vk::Device, info: &vk::BufferCreateInfo) -> VulkanResult<vk::Buffer> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_buffer(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_buffer(&self, device: vk::Device, buffer: vk::Buffer) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_buffer(buffer, None) };
        Ok(())
    }

    fn buffer_memory_requirements(&self, device: vk::Device, buffer: vk::Buffer) -> VulkanResult<vk::MemoryRequirements> {
        let functions = self.device(device)?;
        Ok(unsafe { functions.device.get_buffer_memory_requirements(buffer) })
    }

    fn bind_buffer_memory(
        &self,
        device: vk::Device,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.bind_buffer_memory(buffer, memory, offset) }.map_err(VulkanError::Api)
    }

    fn create_image(&self, device: vk::Device, info: &vk::ImageCreateInfo) -> VulkanResult<vk::Image> {
        let functions = self.device(device)?;
        unsafe { functions.device.create_image(info, None) }.map_err(VulkanError::Api)
    }

    fn destroy_image(&self, device: vk::Device, image: vk::Image) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.destroy_image(image, None) };
        Ok(())
    }

    fn image_memory_requirements(&self, device: vk::Device, image: vk::Image) -> VulkanResult<vk::MemoryRequirements> {
        let functions = self.device(device)?;
        Ok(unsafe { functions.device.get_image_memory_requirements(image) })
    }

    fn bind_image_memory(
        &self,
        device: vk::Device,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.bind_image_memory(image, memory, offset) }.map_err(VulkanError::Api)
    }

    fn allocate_memory(&self, device: vk::Device, info: &vk::MemoryAllocateInfo) -> VulkanResult<vk::DeviceMemory> {
        let functions = self.device(device)?;
        unsafe { functions.device.allocate_memory(info, None) }.map_err(VulkanError::Api)
    }

    fn free_memory(&self, device: vk::Device, memory: vk::DeviceMemory) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.free_memory(memory, None) };
        Ok(())
    }

    fn map_memory(
        &self,
        device: vk::Device,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> VulkanResult<*mut c_void> {
        let functions = self.device(device)?;
        unsafe {
            functions
                .device
                .map_memory(memory, offset, size, vk::MemoryMapFlags::empty())
        }
        .map_err(VulkanError::Api)
    }

    fn unmap_memory(&self, device: vk::Device, memory: vk::DeviceMemory) -> VulkanResult<()> {
        let functions = self.device(device)?;
        unsafe { functions.device.unmap_memory(memory) };
        Ok(())
    }
}
