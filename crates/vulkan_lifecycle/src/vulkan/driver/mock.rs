//! In-memory driver for tests
//!
//! Hands out increasing fake handles, tracks which ones are alive, rejects
//! destroying anything twice or through a dead parent, and records the order
//! of destroy calls. Device memory is backed by real byte vectors so mapped
//! pointers can be written to.

use ash::vk::{self, Handle};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::ffi::{c_void, CString};

use super::Driver;
use crate::vulkan::error::{VulkanError, VulkanResult};
use crate::vulkan::kind::ResourceKind;

const PHYSICAL_DEVICE_BASE: u64 = 0x1000;

/// Simulated physical device
#[derive(Debug, Clone)]
pub(crate) struct MockPhysicalDevice {
    pub name: String,
    pub queue_families: Vec<vk::QueueFlags>,
    pub present_families: Vec<u32>,
    pub extensions: Vec<String>,
    pub features: vk::PhysicalDeviceFeatures,
    pub max_sampler_anisotropy: f32,
    pub memory_types: Vec<vk::MemoryPropertyFlags>,
    pub format_features: HashMap<vk::Format, vk::FormatFeatureFlags>,
    pub surface_capabilities: vk::SurfaceCapabilitiesKHR,
    pub surface_formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl MockPhysicalDevice {
    /// A device that satisfies the default configuration
    pub fn discrete() -> Self {
        Self {
            name: "Mock Discrete GPU".to_string(),
            queue_families: vec![vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER],
            present_families: vec![0],
            extensions: vec!["VK_KHR_swapchain".to_string()],
            features: vk::PhysicalDeviceFeatures {
                sampler_anisotropy: vk::TRUE,
                ..Default::default()
            },
            max_sampler_anisotropy: 16.0,
            memory_types: vec![
                vk::MemoryPropertyFlags::DEVICE_LOCAL,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            ],
            format_features: HashMap::new(),
            surface_capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: vk::Extent2D { width: 800, height: 600 },
                min_image_extent: vk::Extent2D { width: 1, height: 1 },
                max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                ..Default::default()
            },
            surface_formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
        }
    }
}

/// What the mock saw of the last graphics pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PipelineSnapshot {
    pub stage_count: u32,
    pub front_face: vk::FrontFace,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub layout: vk::PipelineLayout,
}

type Messenger = (vk::PFN_vkDebugUtilsMessengerCallbackEXT, usize);

/// Driver that simulates handles without touching a GPU
pub(crate) struct MockDriver {
    devices: Vec<MockPhysicalDevice>,
    layers: Vec<String>,
    next_handle: Cell<u64>,
    live: RefCell<HashMap<u64, ResourceKind>>,
    parents: RefCell<HashMap<u64, u64>>,
    destroyed: RefCell<Vec<ResourceKind>>,
    remaining_successes: RefCell<HashMap<ResourceKind, usize>>,
    memory: RefCell<HashMap<u64, Vec<u8>>>,
    sizes: RefCell<HashMap<u64, vk::DeviceSize>>,
    mapped: RefCell<HashSet<u64>>,
    bindings: RefCell<HashMap<u64, u64>>,
    swap_chain_image_counts: RefCell<HashMap<u64, u32>>,
    messengers: RefCell<HashMap<u64, Messenger>>,
    enumerations: Cell<usize>,
    descriptor_writes: Cell<usize>,
    last_pipeline: Cell<Option<PipelineSnapshot>>,
    last_sampler_anisotropy: Cell<Option<f32>>,
}

impl MockDriver {
    pub fn new(devices: Vec<MockPhysicalDevice>) -> Self {
        Self {
            devices,
            layers: vec!["VK_LAYER_KHRONOS_validation".to_string()],
            next_handle: Cell::new(0x10_0000),
            live: RefCell::default(),
            parents: RefCell::default(),
            destroyed: RefCell::default(),
            remaining_successes: RefCell::default(),
            memory: RefCell::default(),
            sizes: RefCell::default(),
            mapped: RefCell::default(),
            bindings: RefCell::default(),
            swap_chain_image_counts: RefCell::default(),
            messengers: RefCell::default(),
            enumerations: Cell::new(0),
            descriptor_writes: Cell::new(0),
            last_pipeline: Cell::new(None),
            last_sampler_anisotropy: Cell::new(None),
        }
    }

    /// Replace the layers reported as installed
    pub fn with_layers(mut self, layers: &[&str]) -> Self {
        self.layers = layers.iter().map(ToString::to_string).collect();
        self
    }

    /// Let `successes` more creations of `kind` succeed, then fail them all
    ///
    /// For [`ResourceKind::DescriptorSet`] the budget counts descriptor updates.
    pub fn fail_after(&self, kind: ResourceKind, successes: usize) {
        self.remaining_successes.borrow_mut().insert(kind, successes);
    }

    /// Handle of the simulated device at `index`
    pub fn physical_device_handle(&self, index: usize) -> vk::PhysicalDevice {
        vk::PhysicalDevice::from_raw(PHYSICAL_DEVICE_BASE + index as u64)
    }

    /// Number of `vkEnumeratePhysicalDevices` calls so far
    pub fn enumeration_count(&self) -> usize {
        self.enumerations.get()
    }

    /// Kinds of destroyed handles in destroy order
    pub fn destroyed(&self) -> Vec<ResourceKind> {
        self.destroyed.borrow().clone()
    }

    /// Number of handles still alive
    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    /// Number of live handles of `kind`
    pub fn live_count_of(&self, kind: ResourceKind) -> usize {
        self.live.borrow().values().filter(|k| **k == kind).count()
    }

    /// Bytes currently stored in `memory`
    pub fn memory_contents(&self, memory: vk::DeviceMemory) -> Option<Vec<u8>> {
        self.memory.borrow().get(&memory.as_raw()).cloned()
    }

    /// Whether `memory` is currently mapped
    pub fn is_mapped(&self, memory: vk::DeviceMemory) -> bool {
        self.mapped.borrow().contains(&memory.as_raw())
    }

    /// Memory bound to a buffer or image handle
    pub fn bound_memory(&self, raw: u64) -> Option<vk::DeviceMemory> {
        self.bindings.borrow().get(&raw).map(|&m| vk::DeviceMemory::from_raw(m))
    }

    /// Number of descriptor writes applied so far
    pub fn descriptor_write_count(&self) -> usize {
        self.descriptor_writes.get()
    }

    /// Fixed-function state of the last pipeline created
    pub fn last_pipeline(&self) -> Option<PipelineSnapshot> {
        self.last_pipeline.get()
    }

    /// Anisotropy requested by the last sampler, `None` when disabled
    pub fn last_sampler_anisotropy(&self) -> Option<f32> {
        self.last_sampler_anisotropy.get()
    }

    /// Deliver a message through every registered debug messenger
    pub fn emit(&self, severity: vk::DebugUtilsMessageSeverityFlagsEXT, message: &str) {
        let messengers: Vec<Messenger> = self.messengers.borrow().values().copied().collect();
        for (callback, user_data) in messengers {
            deliver(callback, user_data as *mut c_void, severity, message);
        }
    }

    fn device(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<&MockPhysicalDevice> {
        physical_device
            .as_raw()
            .checked_sub(PHYSICAL_DEVICE_BASE)
            .and_then(|index| self.devices.get(usize::try_from(index).ok()?))
            .ok_or(VulkanError::UnknownHandle {
                kind: ResourceKind::PhysicalDevice,
                raw: physical_device.as_raw(),
            })
    }

    fn require_live(&self, kind: ResourceKind, raw: u64) -> VulkanResult<()> {
        match self.live.borrow().get(&raw) {
            Some(live_kind) if *live_kind == kind => Ok(()),
            _ => Err(VulkanError::UnknownHandle { kind, raw }),
        }
    }

    fn spend(&self, kind: ResourceKind) -> VulkanResult<()> {
        if let Some(remaining) = self.remaining_successes.borrow_mut().get_mut(&kind) {
            if *remaining == 0 {
                return Err(VulkanError::Api(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY));
            }
            *remaining -= 1;
        }
        Ok(())
    }

    fn create(&self, kind: ResourceKind, parent: u64) -> VulkanResult<u64> {
        self.spend(kind)?;
        let raw = self.next_handle.get();
        self.next_handle.set(raw + 1);
        self.live.borrow_mut().insert(raw, kind);
        self.parents.borrow_mut().insert(raw, parent);
        Ok(raw)
    }

    fn create_on_device(&self, kind: ResourceKind, device: vk::Device) -> VulkanResult<u64> {
        self.require_live(ResourceKind::Device, device.as_raw())?;
        self.create(kind, device.as_raw())
    }

    fn destroy(&self, kind: ResourceKind, raw: u64, parent_kind: ResourceKind, parent: u64) -> VulkanResult<()> {
        self.require_live(parent_kind, parent)?;
        self.require_live(kind, raw)?;
        if self.parents.borrow().get(&raw) != Some(&parent) {
            return Err(VulkanError::UnknownHandle { kind, raw });
        }
        self.live.borrow_mut().remove(&raw);
        self.destroyed.borrow_mut().push(kind);
        Ok(())
    }

    fn destroy_on_device(&self, kind: ResourceKind, raw: u64, device: vk::Device) -> VulkanResult<()> {
        self.destroy(kind, raw, ResourceKind::Device, device.as_raw())
    }
}

fn deliver(
    callback: vk::PFN_vkDebugUtilsMessengerCallbackEXT,
    user_data: *mut c_void,
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message: &str,
) {
    let Some(callback) = callback else { return };
    let text = CString::new(message).unwrap();
    let data = vk::DebugUtilsMessengerCallbackDataEXT {
        p_message: text.as_ptr(),
        ..Default::default()
    };
    unsafe {
        callback(severity, vk::DebugUtilsMessageTypeFlagsEXT::GENERAL, &data, user_data);
    }
}

impl Driver for MockDriver {
    fn enumerate_instance_layers(&self) -> VulkanResult<Vec<String>> {
        Ok(self.layers.clone())
    }

    fn create_instance(&mut self, info: &vk::InstanceCreateInfo) -> VulkanResult<vk::Instance> {
        let raw = self.create(ResourceKind::Instance, 0)?;

        // A debug messenger chained into instance creation hears about it
        if !info.p_next.is_null() {
            let chained = unsafe { &*info.p_next.cast::<vk::DebugUtilsMessengerCreateInfoEXT>() };
            if chained.s_type == vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT {
                deliver(
                    chained.pfn_user_callback,
                    chained.p_user_data,
                    vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
                    "vkCreateInstance",
                );
            }
        }
        Ok(vk::Instance::from_raw(raw))
    }

    fn destroy_instance(&mut self, instance: vk::Instance) -> VulkanResult<()> {
        self.require_live(ResourceKind::Instance, instance.as_raw())?;
        let children = self
            .parents
            .borrow()
            .iter()
            .filter(|(raw, parent)| **parent == instance.as_raw() && self.live.borrow().contains_key(raw))
            .count();
        if children > 0 {
            return Err(VulkanError::Precondition(format!(
                "instance destroyed with {children} live children"
            )));
        }
        self.live.borrow_mut().remove(&instance.as_raw());
        self.destroyed.borrow_mut().push(ResourceKind::Instance);
        Ok(())
    }

    fn create_debug_messenger(
        &self,
        instance: vk::Instance,
        info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        self.require_live(ResourceKind::Instance, instance.as_raw())?;
        let raw = self.create(ResourceKind::DebugMessenger, instance.as_raw())?;
        self.messengers
            .borrow_mut()
            .insert(raw, (info.pfn_user_callback, info.p_user_data as usize));
        Ok(vk::DebugUtilsMessengerEXT::from_raw(raw))
    }

    fn destroy_debug_messenger(
        &self,
        instance: vk::Instance,
        messenger: vk::DebugUtilsMessengerEXT,
    ) -> VulkanResult<()> {
        self.destroy(
            ResourceKind::DebugMessenger,
            messenger.as_raw(),
            ResourceKind::Instance,
            instance.as_raw(),
        )?;
        self.messengers.borrow_mut().remove(&messenger.as_raw());
        Ok(())
    }

    fn create_surface(
        &self,
        instance: vk::Instance,
        _display: RawDisplayHandle,
        _window: RawWindowHandle,
    ) -> VulkanResult<vk::SurfaceKHR> {
        self.require_live(ResourceKind::Instance, instance.as_raw())?;
        self.create(ResourceKind::Surface, instance.as_raw())
            .map(vk::SurfaceKHR::from_raw)
    }

    fn destroy_surface(&self, instance: vk::Instance, surface: vk::SurfaceKHR) -> VulkanResult<()> {
        self.destroy(ResourceKind::Surface, surface.as_raw(), ResourceKind::Instance, instance.as_raw())
    }

    fn enumerate_physical_devices(&self, _instance: vk::Instance) -> VulkanResult<Vec<vk::PhysicalDevice>> {
        self.enumerations.set(self.enumerations.get() + 1);
        Ok((0..self.devices.len()).map(|i| self.physical_device_handle(i)).collect())
    }

    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<vk::QueueFamilyProperties>> {
        Ok(self
            .device(physical_device)?
            .queue_families
            .iter()
            .map(|&queue_flags| vk::QueueFamilyProperties {
                queue_flags,
                queue_count: 1,
                ..Default::default()
            })
            .collect())
    }

    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> VulkanResult<bool> {
        Ok(self
            .device(physical_device)?
            .present_families
            .contains(&queue_family_index))
    }

    fn device_extensions(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<Vec<String>> {
        Ok(self.device(physical_device)?.extensions.clone())
    }

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VulkanResult<vk::SurfaceCapabilitiesKHR> {
        Ok(self.device(physical_device)?.surface_capabilities)
    }

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::SurfaceFormatKHR>> {
        Ok(self.device(physical_device)?.surface_formats.clone())
    }

    fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::PresentModeKHR>> {
        Ok(self.device(physical_device)?.present_modes.clone())
    }

    fn physical_device_features(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::PhysicalDeviceFeatures> {
        Ok(self.device(physical_device)?.features)
    }

    fn physical_device_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::PhysicalDeviceProperties> {
        let device = self.device(physical_device)?;
        let mut properties = vk::PhysicalDeviceProperties::default();
        for (slot, byte) in properties.device_name.iter_mut().zip(device.name.bytes()) {
            *slot = byte as std::ffi::c_char;
        }
        properties.limits.max_sampler_anisotropy = device.max_sampler_anisotropy;
        properties.device_type = vk::PhysicalDeviceType::DISCRETE_GPU;
        Ok(properties)
    }

    fn memory_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::PhysicalDeviceMemoryProperties> {
        let device = self.device(physical_device)?;
        let mut properties = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: device.memory_types.len() as u32,
            memory_heap_count: 1,
            ..Default::default()
        };
        for (slot, flags) in properties.memory_types.iter_mut().zip(&device.memory_types) {
            slot.property_flags = *flags;
        }
        Ok(properties)
    }

    fn format_properties(
        &self,
        physical_device: vk::PhysicalDevice,
        format: vk::Format,
    ) -> VulkanResult<vk::FormatProperties> {
        let device = self.device(physical_device)?;
        Ok(vk::FormatProperties {
            optimal_tiling_features: device.format_features.get(&format).copied().unwrap_or_default(),
            ..Default::default()
        })
    }

    fn create_device(
        &mut self,
        physical_device: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo,
    ) -> VulkanResult<vk::Device> {
        let device = self.device(physical_device)?;
        if info.queue_create_info_count == 0 {
            return Err(VulkanError::Api(vk::Result::ERROR_INITIALIZATION_FAILED));
        }
        let family_count = device.queue_families.len() as u32;
        let queues = unsafe {
            std::slice::from_raw_parts(info.p_queue_create_infos, info.queue_create_info_count as usize)
        };
        if queues.iter().any(|q| q.queue_family_index >= family_count) {
            return Err(VulkanError::Api(vk::Result::ERROR_INITIALIZATION_FAILED));
        }
        self.create(ResourceKind::Device, 0).map(vk::Device::from_raw)
    }

    fn destroy_device(&mut self, device: vk::Device) -> VulkanResult<()> {
        self.require_live(ResourceKind::Device, device.as_raw())?;
        let children = self
            .parents
            .borrow()
            .iter()
            .filter(|(raw, parent)| **parent == device.as_raw() && self.live.borrow().contains_key(raw))
            .count();
        if children > 0 {
            return Err(VulkanError::Precondition(format!(
                "device destroyed with {children} live children"
            )));
        }
        self.live.borrow_mut().remove(&device.as_raw());
        self.destroyed.borrow_mut().push(ResourceKind::Device);
        Ok(())
    }

    fn device_queue(&self, device: vk::Device, _queue_family_index: u32, _queue_index: u32) -> VulkanResult<vk::Queue> {
        self.require_live(ResourceKind::Device, device.as_raw())?;
        let raw = self.next_handle.get();
        self.next_handle.set(raw + 1);
        Ok(vk::Queue::from_raw(raw))
    }

    fn create_command_pool(
        &self,
        device: vk::Device,
        _info: &vk::CommandPoolCreateInfo,
    ) -> VulkanResult<vk::CommandPool> {
        self.create_on_device(ResourceKind::CommandPool, device)
            .map(vk::CommandPool::from_raw)
    }

    fn destroy_command_pool(&self, device: vk::Device, pool: vk::CommandPool) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::CommandPool, pool.as_raw(), device)
    }

    fn allocate_command_buffers(
        &self,
        device: vk::Device,
        info: &vk::CommandBufferAllocateInfo,
    ) -> VulkanResult<Vec<vk::CommandBuffer>> {
        self.require_live(ResourceKind::CommandPool, info.command_pool.as_raw())?;
        (0..info.command_buffer_count)
            .map(|_| {
                self.create_on_device(ResourceKind::CommandBuffer, device)
                    .map(vk::CommandBuffer::from_raw)
            })
            .collect()
    }

    fn free_command_buffers(
        &self,
        device: vk::Device,
        pool: vk::CommandPool,
        buffers: &[vk::CommandBuffer],
    ) -> VulkanResult<()> {
        self.require_live(ResourceKind::CommandPool, pool.as_raw())?;
        for buffer in buffers {
            self.destroy_on_device(ResourceKind::CommandBuffer, buffer.as_raw(), device)?;
        }
        Ok(())
    }

    fn create_swap_chain(
        &self,
        device: vk::Device,
        info: &vk::SwapchainCreateInfoKHR,
    ) -> VulkanResult<vk::SwapchainKHR> {
        let raw = self.create_on_device(ResourceKind::SwapChain, device)?;
        self.swap_chain_image_counts
            .borrow_mut()
            .insert(raw, info.min_image_count);
        Ok(vk::SwapchainKHR::from_raw(raw))
    }

    fn destroy_swap_chain(&self, device: vk::Device, swap_chain: vk::SwapchainKHR) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::SwapChain, swap_chain.as_raw(), device)
    }

    fn swap_chain_images(&self, device: vk::Device, swap_chain: vk::SwapchainKHR) -> VulkanResult<Vec<vk::Image>> {
        self.require_live(ResourceKind::Device, device.as_raw())?;
        self.require_live(ResourceKind::SwapChain, swap_chain.as_raw())?;
        let count = self
            .swap_chain_image_counts
            .borrow()
            .get(&swap_chain.as_raw())
            .copied()
            .unwrap_or(0);
        Ok((0..count)
            .map(|_| {
                let raw = self.next_handle.get();
                self.next_handle.set(raw + 1);
                vk::Image::from_raw(raw)
            })
            .collect())
    }

    fn create_image_view(&self, device: vk::Device, _info: &vk::ImageViewCreateInfo) -> VulkanResult<vk::ImageView> {
        self.create_on_device(ResourceKind::ImageView, device)
            .map(vk::ImageView::from_raw)
    }

    fn destroy_image_view(&self, device: vk::Device, view: vk::ImageView) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::ImageView, view.as_raw(), device)
    }

    fn create_render_pass(&self, device: vk::Device, _info: &vk::RenderPassCreateInfo) -> VulkanResult<vk::RenderPass> {
        self.create_on_device(ResourceKind::RenderPass, device)
            .map(vk::RenderPass::from_raw)
    }

    fn destroy_render_pass(&self, device: vk::Device, render_pass: vk::RenderPass) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::RenderPass, render_pass.as_raw(), device)
    }

    fn create_descriptor_set_layout(
        &self,
        device: vk::Device,
        _info: &vk::DescriptorSetLayoutCreateInfo,
    ) -> VulkanResult<vk::DescriptorSetLayout> {
        self.create_on_device(ResourceKind::DescriptorSetLayout, device)
            .map(vk::DescriptorSetLayout::from_raw)
    }

    fn destroy_descriptor_set_layout(&self, device: vk::Device, layout: vk::DescriptorSetLayout) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::DescriptorSetLayout, layout.as_raw(), device)
    }

    fn create_shader_module(
        &self,
        device: vk::Device,
        info: &vk::ShaderModuleCreateInfo,
    ) -> VulkanResult<vk::ShaderModule> {
        if info.code_size == 0 || info.code_size % 4 != 0 {
            return Err(VulkanError::Api(vk::Result::ERROR_INVALID_SHADER_NV));
        }
        self.create_on_device(ResourceKind::ShaderModule, device)
            .map(vk::ShaderModule::from_raw)
    }

    fn destroy_shader_module(&self, device: vk::Device, module: vk::ShaderModule) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::ShaderModule, module.as_raw(), device)
    }

    fn create_pipeline_layout(
        &self,
        device: vk::Device,
        _info: &vk::PipelineLayoutCreateInfo,
    ) -> VulkanResult<vk::PipelineLayout> {
        self.create_on_device(ResourceKind::PipelineLayout, device)
            .map(vk::PipelineLayout::from_raw)
    }

    fn destroy_pipeline_layout(&self, device: vk::Device, layout: vk::PipelineLayout) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::PipelineLayout, layout.as_raw(), device)
    }

    fn create_graphics_pipeline(
        &self,
        device: vk::Device,
        info: &vk::GraphicsPipelineCreateInfo,
    ) -> VulkanResult<vk::Pipeline> {
        self.require_live(ResourceKind::PipelineLayout, info.layout.as_raw())?;
        let stages = unsafe { std::slice::from_raw_parts(info.p_stages, info.stage_count as usize) };
        for stage in stages {
            self.require_live(ResourceKind::ShaderModule, stage.module.as_raw())?;
        }
        let rasterization = unsafe { &*info.p_rasterization_state };
        let viewport_state = unsafe { &*info.p_viewport_state };
        let viewport = unsafe { &*viewport_state.p_viewports };
        let raw = self.create_on_device(ResourceKind::Pipeline, device)?;
        self.last_pipeline.set(Some(PipelineSnapshot {
            stage_count: info.stage_count,
            front_face: rasterization.front_face,
            viewport_width: viewport.width,
            viewport_height: viewport.height,
            layout: info.layout,
        }));
        Ok(vk::Pipeline::from_raw(raw))
    }

    fn destroy_pipeline(&self, device: vk::Device, pipeline: vk::Pipeline) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::Pipeline, pipeline.as_raw(), device)
    }

    fn create_frame_buffer(&self, device: vk::Device, _info: &vk::FramebufferCreateInfo) -> VulkanResult<vk::Framebuffer> {
        self.create_on_device(ResourceKind::FrameBuffer, device)
            .map(vk::Framebuffer::from_raw)
    }

    fn destroy_frame_buffer(&self, device: vk::Device, frame_buffer: vk::Framebuffer) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::FrameBuffer, frame_buffer.as_raw(), device)
    }

    fn create_descriptor_pool(
        &self,
        device: vk::Device,
        _info: &vk::DescriptorPoolCreateInfo,
    ) -> VulkanResult<vk::DescriptorPool> {
        self.create_on_device(ResourceKind::DescriptorPool, device)
            .map(vk::DescriptorPool::from_raw)
    }

    fn destroy_descriptor_pool(&self, device: vk::Device, pool: vk::DescriptorPool) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::DescriptorPool, pool.as_raw(), device)
    }

    fn allocate_descriptor_sets(
        &self,
        device: vk::Device,
        info: &vk::DescriptorSetAllocateInfo,
    ) -> VulkanResult<Vec<vk::DescriptorSet>> {
        self.require_live(ResourceKind::Device, device.as_raw())?;
        self.require_live(ResourceKind::DescriptorPool, info.descriptor_pool.as_raw())?;
        Ok((0..info.descriptor_set_count)
            .map(|_| {
                let raw = self.next_handle.get();
                self.next_handle.set(raw + 1);
                vk::DescriptorSet::from_raw(raw)
            })
            .collect())
    }

    fn update_descriptor_sets(&self, device: vk::Device, writes: &[vk::WriteDescriptorSet]) -> VulkanResult<()> {
        self.require_live(ResourceKind::Device, device.as_raw())?;
        // Descriptor sets are never created through `create`, so writes take their budget
        self.spend(ResourceKind::DescriptorSet)?;
        self.descriptor_writes
            .set(self.descriptor_writes.get() + writes.len());
        Ok(())
    }

    fn create_sampler(&self, device: vk::Device, info: &vk::SamplerCreateInfo) -> VulkanResult<vk::Sampler> {
        let raw = self.create_on_device(ResourceKind::Sampler, device)?;
        self.last_sampler_anisotropy
            .set((info.anisotropy_enable == vk::TRUE).then_some(info.max_anisotropy));
        Ok(vk::Sampler::from_raw(raw))
    }

    fn destroy_sampler(&self, device: vk::Device, sampler: vk::Sampler) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::Sampler, sampler.as_raw(), device)
    }

    fn create_semaphore(&self, device: vk::Device, _info: &vk::SemaphoreCreateInfo) -> VulkanResult<vk::Semaphore> {
        self.create_on_device(ResourceKind::Semaphore, device)
            .map(vk::Semaphore::from_raw)
    }

    fn destroy_semaphore(&self, device: vk::Device, semaphore: vk::Semaphore) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::Semaphore, semaphore.as_raw(), device)
    }

    fn create_fence(&self, device: vk::Device, _info: &vk::FenceCreateInfo) -> VulkanResult<vk::Fence> {
        self.create_on_device(ResourceKind::Fence, device)
            .map(vk::Fence::from_raw)
    }

    fn destroy_fence(&self, device: vk::Device, fence: vk::Fence) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::Fence, fence.as_raw(), device)
    }

    fn create_buffer(&self, device: vk::Device, info: &vk::BufferCreateInfo) -> VulkanResult<vk::Buffer> {
        let raw = self.create_on_device(ResourceKind::Buffer, device)?;
        self.sizes.borrow_mut().insert(raw, info.size);
        Ok(vk::Buffer::from_raw(raw))
    }

    fn destroy_buffer(&self, device: vk::Device, buffer: vk::Buffer) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::Buffer, buffer.as_raw(), device)?;
        self.bindings.borrow_mut().remove(&buffer.as_raw());
        Ok(())
    }

    fn buffer_memory_requirements(&self, device: vk::Device, buffer: vk::Buffer) -> VulkanResult<vk::MemoryRequirements> {
        self.require_live(ResourceKind::Device, device.as_raw())?;
        self.require_live(ResourceKind::Buffer, buffer.as_raw())?;
        let size = self.sizes.borrow().get(&buffer.as_raw()).copied().unwrap_or(0);
        Ok(vk::MemoryRequirements {
            size: size.next_multiple_of(256),
            alignment: 256,
            memory_type_bits: u32::MAX,
        })
    }

    fn bind_buffer_memory(
        &self,
        device: vk::Device,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VulkanResult<()> {
        self.require_live(ResourceKind::Device, device.as_raw())?;
        self.require_live(ResourceKind::Buffer, buffer.as_raw())?;
        self.require_live(ResourceKind::DeviceMemory, memory.as_raw())?;
        if offset != 0 {
            return Err(VulkanError::Api(vk::Result::ERROR_VALIDATION_FAILED_EXT));
        }
        self.bindings.borrow_mut().insert(buffer.as_raw(), memory.as_raw());
        Ok(())
    }

    fn create_image(&self, device: vk::Device, info: &vk::ImageCreateInfo) -> VulkanResult<vk::Image> {
        let raw = self.create_on_device(ResourceKind::Image, device)?;
        let size = u64::from(info.extent.width) * u64::from(info.extent.height) * 4;
        self.sizes.borrow_mut().insert(raw, size);
        Ok(vk::Image::from_raw(raw))
    }

    fn destroy_image(&self, device: vk::Device, image: vk::Image) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::Image, image.as_raw(), device)?;
        self.bindings.borrow_mut().remove(&image.as_raw());
        Ok(())
    }

    fn image_memory_requirements(&self, device: vk::Device, image: vk::Image) -> VulkanResult<vk::MemoryRequirements> {
        self.require_live(ResourceKind::Device, device.as_raw())?;
        self.require_live(ResourceKind::Image, image.as_raw())?;
        let size = self.sizes.borrow().get(&image.as_raw()).copied().unwrap_or(0);
        Ok(vk::MemoryRequirements {
            size,
            alignment: 4096,
            memory_type_bits: 0b01,
        })
    }

    fn bind_image_memory(
        &self,
        device: vk::Device,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VulkanResult<()> {
        self.require_live(ResourceKind::Device, device.as_raw())?;
        self.require_live(ResourceKind::Image, image.as_raw())?;
        self.require_live(ResourceKind::DeviceMemory, memory.as_raw())?;
        if offset != 0 {
            return Err(VulkanError::Api(vk::Result::ERROR_VALIDATION_FAILED_EXT));
        }
        self.bindings.borrow_mut().insert(image.as_raw(), memory.as_raw());
        Ok(())
    }

    fn allocate_memory(&self, device: vk::Device, info: &vk::MemoryAllocateInfo) -> VulkanResult<vk::DeviceMemory> {
        let raw = self.create_on_device(ResourceKind::DeviceMemory, device)?;
        let size = usize::try_from(info.allocation_size).unwrap_or(0);
        self.memory.borrow_mut().insert(raw, vec![0; size]);
        Ok(vk::DeviceMemory::from_raw(raw))
    }

    fn free_memory(&self, device: vk::Device, memory: vk::DeviceMemory) -> VulkanResult<()> {
        self.destroy_on_device(ResourceKind::DeviceMemory, memory.as_raw(), device)?;
        self.memory.borrow_mut().remove(&memory.as_raw());
        self.mapped.borrow_mut().remove(&memory.as_raw());
        Ok(())
    }

    fn map_memory(
        &self,
        device: vk::Device,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        _size: vk::DeviceSize,
    ) -> VulkanResult<*mut c_void> {
        self.require_live(ResourceKind::Device, device.as_raw())?;
        self.require_live(ResourceKind::DeviceMemory, memory.as_raw())?;
        if !self.mapped.borrow_mut().insert(memory.as_raw()) {
            return Err(VulkanError::Api(vk::Result::ERROR_MEMORY_MAP_FAILED));
        }
        let mut backing = self.memory.borrow_mut();
        let bytes = backing
            .get_mut(&memory.as_raw())
            .ok_or(VulkanError::Api(vk::Result::ERROR_MEMORY_MAP_FAILED))?;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        if offset > bytes.len() {
            return Err(VulkanError::Api(vk::Result::ERROR_MEMORY_MAP_FAILED));
        }
        Ok(unsafe { bytes.as_mut_ptr().add(offset) }.cast::<c_void>())
    }

    fn unmap_memory(&self, device: vk::Device, memory: vk::DeviceMemory) -> VulkanResult<()> {
        self.require_live(ResourceKind::Device, device.as_raw())?;
        self.require_live(ResourceKind::DeviceMemory, memory.as_raw())?;
        if !self.mapped.borrow_mut().remove(&memory.as_raw()) {
            return Err(VulkanError::Precondition("memory is not mapped".to_string()));
        }
        Ok(())
    }
}
