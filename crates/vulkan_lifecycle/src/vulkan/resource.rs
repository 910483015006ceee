//! Handle registry entries
//!
//! A [`Resource`] pairs one native handle with a session-unique id and the
//! parameters it was created from. A null handle means the resource was
//! destroyed (or never created); destroying sets the handle back to null,
//! which is what makes every destroy call idempotent.

use ash::vk::{self, Handle};
use std::collections::HashMap;
use std::ops::Deref;

use super::create_info::{
    BufferCreateInfo, CommandBufferCreateInfo, CommandPoolCreateInfo, DebugMessengerCreateInfo,
    DescriptorPoolCreateInfo, DescriptorSetCreateInfo, DescriptorSetLayoutCreateInfo,
    DeviceCreateInfo, FenceCreateInfo, FrameBufferCreateInfo, GraphicsPipelineCreateInfo,
    ImageCreateInfo, ImageViewCreateInfo, InstanceCreateInfo, QueueCreateInfo, RenderPassCreateInfo,
    SamplerCreateInfo, SemaphoreCreateInfo, ShaderCreateInfo, SurfaceCreateInfo,
    SwapChainCreateInfo, SwapChainImageCreateInfo,
};
use super::error::{VulkanError, VulkanResult};
use super::kind::ResourceKind;

/// Common view over every registry entry
pub trait Tracked {
    /// Registry id, unique per kind within one context
    fn id(&self) -> u32;
    /// Kind of the entry
    fn kind(&self) -> ResourceKind;
    /// Whether the native handle is non-null
    fn is_live(&self) -> bool;
}

/// One native handle and the parameters that produced it
#[derive(Debug, Clone)]
pub struct Resource<T, C> {
    /// Registry id
    pub id: u32,
    /// Kind of the handle
    pub kind: ResourceKind,
    /// Native handle, null once destroyed
    pub value: T,
    /// Parameters used at creation
    pub create_info: C,
}

impl<T: Handle + Copy, C> Resource<T, C> {
    pub(crate) const fn new(id: u32, kind: ResourceKind, value: T, create_info: C) -> Self {
        Self {
            id,
            kind,
            value,
            create_info,
        }
    }

    /// The handle, or an error if the resource is not initialized
    pub fn handle(&self) -> VulkanResult<T> {
        if self.value.as_raw() == 0 {
            Err(VulkanError::Uninitialized {
                kind: self.kind,
                id: self.id,
            })
        } else {
            Ok(self.value)
        }
    }

    /// Null the handle, returning it if it was live
    pub(crate) fn release(&mut self) -> Option<T> {
        let value = self.handle().ok()?;
        self.value = T::from_raw(0);
        Some(value)
    }
}

impl<T: Handle + Copy, C> Tracked for Resource<T, C> {
    fn id(&self) -> u32 {
        self.id
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn is_live(&self) -> bool {
        self.value.as_raw() != 0
    }
}

/// A resource backed by its own dedicated device memory allocation
///
/// `memory` is non-null exactly when the handle is non-null, except in the
/// middle of a destroy.
#[derive(Debug, Clone)]
pub struct MemoryResource<T, C> {
    /// The handle half
    pub resource: Resource<T, C>,
    /// Dedicated allocation bound at offset 0
    pub memory: vk::DeviceMemory,
    /// Size of the allocation in bytes
    pub memory_size: vk::DeviceSize,
    /// Properties the memory type was selected for
    pub memory_properties: vk::MemoryPropertyFlags,
}

impl<T: Handle + Copy, C> MemoryResource<T, C> {
    /// Whether the memory can be mapped
    pub fn is_host_visible(&self) -> bool {
        self.memory_properties.contains(vk::MemoryPropertyFlags::HOST_VISIBLE)
    }

    /// The memory handle, or an error if it was freed
    pub fn memory_handle(&self) -> VulkanResult<vk::DeviceMemory> {
        if self.memory == vk::DeviceMemory::null() {
            Err(VulkanError::Uninitialized {
                kind: ResourceKind::DeviceMemory,
                id: self.resource.id,
            })
        } else {
            Ok(self.memory)
        }
    }
}

impl<T, C> Deref for MemoryResource<T, C> {
    type Target = Resource<T, C>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

impl<T: Handle + Copy, C> Tracked for MemoryResource<T, C> {
    fn id(&self) -> u32 {
        self.resource.id
    }

    fn kind(&self) -> ResourceKind {
        self.resource.kind
    }

    fn is_live(&self) -> bool {
        self.resource.is_live() || self.memory != vk::DeviceMemory::null()
    }
}

/// A graphics pipeline and the layout created for it
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// The pipeline handle half
    pub resource: Resource<vk::Pipeline, GraphicsPipelineCreateInfo>,
    /// Pipeline layout, destroyed together with the pipeline
    pub layout: vk::PipelineLayout,
}

impl Deref for Pipeline {
    type Target = Resource<vk::Pipeline, GraphicsPipelineCreateInfo>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

impl Tracked for Pipeline {
    fn id(&self) -> u32 {
        self.resource.id
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Pipeline
    }

    fn is_live(&self) -> bool {
        self.resource.is_live() || self.layout != vk::PipelineLayout::null()
    }
}

/// `VkInstance`
pub type Instance = Resource<vk::Instance, InstanceCreateInfo>;
/// `VkDebugUtilsMessengerEXT`
pub type DebugMessenger = Resource<vk::DebugUtilsMessengerEXT, DebugMessengerCreateInfo>;
/// `VkSurfaceKHR`
pub type Surface = Resource<vk::SurfaceKHR, SurfaceCreateInfo>;
/// `VkDevice`
pub type Device = Resource<vk::Device, DeviceCreateInfo>;
/// `VkQueue`, owned by its device
pub type Queue = Resource<vk::Queue, QueueCreateInfo>;
/// `VkCommandPool`
pub type CommandPool = Resource<vk::CommandPool, CommandPoolCreateInfo>;
/// `VkCommandBuffer`
pub type CommandBuffer = Resource<vk::CommandBuffer, CommandBufferCreateInfo>;
/// `VkSwapchainKHR`
pub type SwapChain = Resource<vk::SwapchainKHR, SwapChainCreateInfo>;
/// `VkImage` owned by a swap-chain
pub type SwapChainImage = Resource<vk::Image, SwapChainImageCreateInfo>;
/// `VkImageView`
pub type ImageView = Resource<vk::ImageView, ImageViewCreateInfo>;
/// `VkRenderPass`
pub type RenderPass = Resource<vk::RenderPass, RenderPassCreateInfo>;
/// `VkDescriptorSetLayout`
pub type DescriptorSetLayout = Resource<vk::DescriptorSetLayout, DescriptorSetLayoutCreateInfo>;
/// `VkShaderModule`
pub type Shader = Resource<vk::ShaderModule, ShaderCreateInfo>;
/// `VkFramebuffer`
pub type FrameBuffer = Resource<vk::Framebuffer, FrameBufferCreateInfo>;
/// `VkDescriptorPool`
pub type DescriptorPool = Resource<vk::DescriptorPool, DescriptorPoolCreateInfo>;
/// `VkDescriptorSet`, freed with its pool
pub type DescriptorSet = Resource<vk::DescriptorSet, DescriptorSetCreateInfo>;
/// `VkSampler`
pub type Sampler = Resource<vk::Sampler, SamplerCreateInfo>;
/// `VkSemaphore`
pub type Semaphore = Resource<vk::Semaphore, SemaphoreCreateInfo>;
/// `VkFence`
pub type Fence = Resource<vk::Fence, FenceCreateInfo>;
/// `VkBuffer` with dedicated memory
pub type Buffer = MemoryResource<vk::Buffer, BufferCreateInfo>;
/// `VkImage` with dedicated memory
pub type Image = MemoryResource<vk::Image, ImageCreateInfo>;

/// Per-kind monotonic id counters
///
/// Ids start at 1 and are never reused; a fresh set of counters comes only
/// with a fresh factory.
#[derive(Debug, Default)]
pub struct ResourceIds {
    next: HashMap<ResourceKind, u32>,
}

impl ResourceIds {
    /// Take the next id for `kind`
    pub fn next(&mut self, kind: ResourceKind) -> u32 {
        let counter = self.next.entry(kind).or_insert(1);
        let id = *counter;
        *counter += 1;
        id
    }
}
