//! Resource lifecycle orchestration
//!
//! [`Context`] exclusively owns every resource created for a session, one
//! registry per kind, and tears them all down in
//! [`ResourceKind::TEARDOWN_ORDER`]. Destroying mutates a resource in place
//! to its null state; only [`Context::destroy_all`] empties the registries.
//!
//! Instance, surface, physical device and logical device are per-session
//! singletons: creates that need them use the most recently created live one.

use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::c_void;
use std::io;
use std::path::Path;
use std::rc::Rc;

use super::create_info::{
    BufferCreateInfo, CommandBufferCreateInfo, CommandPoolCreateInfo, DescriptorPoolCreateInfo,
    DescriptorSetCreateInfo, DescriptorSetLayoutCreateInfo, FenceCreateInfo, FrameBufferCreateInfo,
    GraphicsPipelineCreateInfo, ImageCreateInfo, ImageViewCreateInfo, RenderPassCreateInfo,
    SamplerCreateInfo, SemaphoreCreateInfo,
};
use super::debug::DebugLogger;
use super::driver::Driver;
use super::error::{ResultExt, VulkanError, VulkanResult};
use super::factory::Factory;
use super::kind::ResourceKind;
use super::memory;
use super::resource::{
    Buffer, CommandBuffer, CommandPool, DebugMessenger, DescriptorPool, DescriptorSet,
    DescriptorSetLayout, Device, Fence, FrameBuffer, Image, ImageView, Instance, Pipeline, Queue,
    RenderPass, Sampler, Semaphore, Surface, SwapChain, SwapChainImage, Tracked,
};
use super::selection::PhysicalDevice;
use crate::core::config::Configuration;

/// Every resource a [`Context`] owns, one collection per kind
#[derive(Debug, Default)]
pub struct Registry {
    /// Instances
    pub instances: Vec<Instance>,
    /// Debug messengers
    pub debug_messengers: Vec<DebugMessenger>,
    /// Presentation surfaces
    pub surfaces: Vec<Surface>,
    /// Selected physical devices
    pub physical_devices: Vec<PhysicalDevice>,
    /// Logical devices
    pub devices: Vec<Device>,
    /// Retrieved queues
    pub queues: Vec<Queue>,
    /// Command pools
    pub command_pools: Vec<CommandPool>,
    /// Command buffers
    pub command_buffers: Vec<CommandBuffer>,
    /// Swap-chains
    pub swap_chains: Vec<SwapChain>,
    /// Images owned by the swap-chains
    pub swap_chain_images: Vec<SwapChainImage>,
    /// Image views
    pub image_views: Vec<ImageView>,
    /// Render passes
    pub render_passes: Vec<RenderPass>,
    /// Descriptor-set layouts
    pub descriptor_set_layouts: Vec<DescriptorSetLayout>,
    /// Graphics pipelines
    pub pipelines: Vec<Pipeline>,
    /// Frame buffers
    pub frame_buffers: Vec<FrameBuffer>,
    /// Descriptor pools
    pub descriptor_pools: Vec<DescriptorPool>,
    /// Descriptor sets
    pub descriptor_sets: Vec<DescriptorSet>,
    /// Samplers
    pub samplers: Vec<Sampler>,
    /// Semaphores
    pub semaphores: Vec<Semaphore>,
    /// Fences
    pub fences: Vec<Fence>,
    /// Buffers with their memory
    pub buffers: Vec<Buffer>,
    /// Images with their memory
    pub images: Vec<Image>,
}

impl Registry {
    /// Number of tracked resources that are still live
    pub fn live_count(&self) -> usize {
        fn live<T: Tracked>(items: &[T]) -> usize {
            items.iter().filter(|item| item.is_live()).count()
        }

        live(&self.instances)
            + live(&self.debug_messengers)
            + live(&self.surfaces)
            + live(&self.physical_devices)
            + live(&self.devices)
            + live(&self.queues)
            + live(&self.command_pools)
            + live(&self.command_buffers)
            + live(&self.swap_chains)
            + live(&self.swap_chain_images)
            + live(&self.image_views)
            + live(&self.render_passes)
            + live(&self.descriptor_set_layouts)
            + live(&self.pipelines)
            + live(&self.frame_buffers)
            + live(&self.descriptor_pools)
            + live(&self.descriptor_sets)
            + live(&self.samplers)
            + live(&self.semaphores)
            + live(&self.fences)
            + live(&self.buffers)
            + live(&self.images)
    }
}

/// Owns a session's resources and drives their teardown
pub struct Context<D: Driver> {
    factory: Factory<D>,
    configuration: Configuration,
    logger: Rc<DebugLogger>,
    registry: Registry,
}

impl<D: Driver> Context<D> {
    /// Empty context; driver messages go to the `log` facade
    pub fn new(driver: D, configuration: Configuration) -> Self {
        Self {
            factory: Factory::new(driver),
            configuration,
            logger: Rc::new(DebugLogger::to_log()),
            registry: Registry::default(),
        }
    }

    /// Route driver debug messages to `logger` instead
    #[must_use]
    pub fn with_logger(mut self, logger: Rc<DebugLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Replace the loader used for shader files
    #[must_use]
    pub fn with_file_reader(mut self, read_file: impl Fn(&Path) -> io::Result<Vec<u8>> + 'static) -> Self {
        self.factory = self.factory.with_file_reader(read_file);
        self
    }

    /// The underlying driver
    pub fn driver(&self) -> &D {
        self.factory.driver()
    }

    /// The session configuration
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Read access to every tracked resource
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The live instance
    pub fn instance(&self) -> VulkanResult<&Instance> {
        current(&self.registry.instances, ResourceKind::Instance)
    }

    /// The live surface
    pub fn surface(&self) -> VulkanResult<&Surface> {
        current(&self.registry.surfaces, ResourceKind::Surface)
    }

    /// The selected physical device
    pub fn physical_device(&self) -> VulkanResult<&PhysicalDevice> {
        current(&self.registry.physical_devices, ResourceKind::PhysicalDevice)
    }

    /// The live logical device
    pub fn device(&self) -> VulkanResult<&Device> {
        current(&self.registry.devices, ResourceKind::Device)
    }

    // Instance level

    /// Create the instance
    pub fn create_instance(&mut self) -> VulkanResult<&Instance> {
        let instance = self
            .factory
            .create_instance(&self.configuration, Rc::clone(&self.logger))
            .context("Context::create_instance")?;
        Ok(track(&mut self.registry.instances, instance))
    }

    /// Register the session logger as a debug messenger on the instance
    pub fn create_debug_messenger(&mut self) -> VulkanResult<&DebugMessenger> {
        let instance = current(&self.registry.instances, ResourceKind::Instance)?;
        let messenger = self
            .factory
            .create_debug_messenger(instance, Rc::clone(&self.logger))
            .context("Context::create_debug_messenger")?;
        Ok(track(&mut self.registry.debug_messengers, messenger))
    }

    /// Create a surface for a window owned by the caller
    pub fn create_surface(&mut self, display: RawDisplayHandle, window: RawWindowHandle) -> VulkanResult<&Surface> {
        let instance = current(&self.registry.instances, ResourceKind::Instance)?;
        let surface = self
            .factory
            .create_surface(instance, display, window)
            .context("Context::create_surface")?;
        Ok(track(&mut self.registry.surfaces, surface))
    }

    /// Select the physical device, against the live surface if there is one
    pub fn create_physical_device(&mut self) -> VulkanResult<&PhysicalDevice> {
        let instance = current(&self.registry.instances, ResourceKind::Instance)?;
        let surface = current(&self.registry.surfaces, ResourceKind::Surface).ok();
        let physical_device = self
            .factory
            .create_physical_device(instance, &self.configuration, surface)
            .context("Context::create_physical_device")?;
        Ok(track(&mut self.registry.physical_devices, physical_device))
    }

    /// Re-query surface support of the selected device, before recreating the swap-chain
    pub fn refresh_swap_chain_support(&mut self) -> VulkanResult<()> {
        let surface = current(&self.registry.surfaces, ResourceKind::Surface)?.handle()?;
        let physical_device = current_mut(&mut self.registry.physical_devices, ResourceKind::PhysicalDevice)?;
        physical_device.refresh_swap_chain_support(self.factory.driver(), surface)
    }

    /// Best depth attachment format of the selected device
    pub fn find_depth_format(&self) -> VulkanResult<vk::Format> {
        let physical_device = self.physical_device()?.handle()?;
        memory::find_depth_format(self.factory.driver(), physical_device)
    }

    // Device level

    /// Create the logical device on the selected physical device
    pub fn create_device(&mut self) -> VulkanResult<&Device> {
        let physical_device = current(&self.registry.physical_devices, ResourceKind::PhysicalDevice)?;
        let device = self
            .factory
            .create_device(physical_device, &self.configuration)
            .context("Context::create_device")?;
        Ok(track(&mut self.registry.devices, device))
    }

    /// Retrieve a queue of the live device
    pub fn create_queue(&mut self, queue_family_index: u32, queue_index: u32) -> VulkanResult<&Queue> {
        let device = current(&self.registry.devices, ResourceKind::Device)?;
        let queue = self
            .factory
            .create_queue(device, queue_family_index, queue_index)
            .context("Context::create_queue")?;
        Ok(track(&mut self.registry.queues, queue))
    }

    /// Create a command pool for `queue_family_index`
    pub fn create_command_pool(
        &mut self,
        queue_family_index: u32,
        flags: vk::CommandPoolCreateFlags,
    ) -> VulkanResult<&CommandPool> {
        let device = self.device()?.handle()?;
        let pool = self
            .factory
            .create_command_pool(CommandPoolCreateInfo {
                device,
                queue_family_index,
                flags,
            })
            .context("Context::create_command_pool")?;
        Ok(track(&mut self.registry.command_pools, pool))
    }

    /// Allocate `count` primary command buffers from pool `pool_id`
    pub fn create_command_buffers(&mut self, pool_id: u32, count: usize) -> VulkanResult<&[CommandBuffer]> {
        let pool = find(&self.registry.command_pools, ResourceKind::CommandPool, pool_id)?;
        let info = CommandBufferCreateInfo {
            device: pool.create_info.device,
            command_pool: pool.handle()?,
            level: vk::CommandBufferLevel::PRIMARY,
        };
        let buffers = self
            .factory
            .create_command_buffers(vec![info; count])
            .context("Context::create_command_buffers")?;
        Ok(track_all(&mut self.registry.command_buffers, buffers))
    }

    // Presentation

    /// Create a swap-chain on the live surface
    pub fn create_swap_chain(&mut self, width: u32, height: u32) -> VulkanResult<&SwapChain> {
        let registry = &self.registry;
        let swap_chain = self
            .factory
            .create_swap_chain(
                current(&registry.devices, ResourceKind::Device)?,
                current(&registry.physical_devices, ResourceKind::PhysicalDevice)?,
                current(&registry.surfaces, ResourceKind::Surface)?,
                width,
                height,
                None,
            )
            .context("Context::create_swap_chain")?;
        Ok(track(&mut self.registry.swap_chains, swap_chain))
    }

    /// Replace the live swap-chain after the surface changed.
    ///
    /// Views and frame buffers built on the old swap-chain images must be
    /// destroyed by id first. Surface support is re-queried, the new
    /// swap-chain is created from the old one, then the old one and its
    /// images are destroyed.
    pub fn recreate_swap_chain(&mut self, width: u32, height: u32) -> VulkanResult<&SwapChain> {
        self.refresh_swap_chain_support()
            .context("Context::recreate_swap_chain")?;

        let registry = &self.registry;
        let old = current(&registry.swap_chains, ResourceKind::SwapChain)?;
        let (old_id, old_handle) = (old.id, old.handle()?);
        let swap_chain = self
            .factory
            .create_swap_chain(
                current(&registry.devices, ResourceKind::Device)?,
                current(&registry.physical_devices, ResourceKind::PhysicalDevice)?,
                current(&registry.surfaces, ResourceKind::Surface)?,
                width,
                height,
                Some(old),
            )
            .context("Context::recreate_swap_chain")?;
        let new_id = track(&mut self.registry.swap_chains, swap_chain).id;

        for image in &mut self.registry.swap_chain_images {
            if image.create_info.swap_chain == old_handle {
                self.factory.destroy_swap_chain_image(image)?;
            }
        }
        self.destroy(ResourceKind::SwapChain, old_id)?;
        find(&self.registry.swap_chains, ResourceKind::SwapChain, new_id)
    }

    /// Wrap the images of swap-chain `swap_chain_id`
    pub fn create_swap_chain_images(&mut self, swap_chain_id: u32) -> VulkanResult<&[SwapChainImage]> {
        let swap_chain = find(&self.registry.swap_chains, ResourceKind::SwapChain, swap_chain_id)?;
        let images = self
            .factory
            .create_swap_chain_images(swap_chain)
            .context("Context::create_swap_chain_images")?;
        Ok(track_all(&mut self.registry.swap_chain_images, images))
    }

    /// One color view per live image of swap-chain `swap_chain_id`
    pub fn create_swap_chain_image_views(&mut self, swap_chain_id: u32) -> VulkanResult<&[ImageView]> {
        let swap_chain = find(&self.registry.swap_chains, ResourceKind::SwapChain, swap_chain_id)?.handle()?;
        let images: Vec<SwapChainImage> = self
            .registry
            .swap_chain_images
            .iter()
            .filter(|image| image.is_live() && image.create_info.swap_chain == swap_chain)
            .cloned()
            .collect();
        let views = self
            .factory
            .create_swap_chain_image_views(&images)
            .context("Context::create_swap_chain_image_views")?;
        Ok(track_all(&mut self.registry.image_views, views))
    }

    /// Create image views
    pub fn create_image_views(&mut self, infos: Vec<ImageViewCreateInfo>) -> VulkanResult<&[ImageView]> {
        let views = self
            .factory
            .create_image_views(infos)
            .context("Context::create_image_views")?;
        Ok(track_all(&mut self.registry.image_views, views))
    }

    /// Create a render pass
    pub fn create_render_pass(&mut self, info: RenderPassCreateInfo) -> VulkanResult<&RenderPass> {
        let render_pass = self
            .factory
            .create_render_pass(info)
            .context("Context::create_render_pass")?;
        Ok(track(&mut self.registry.render_passes, render_pass))
    }

    /// Create frame buffers
    pub fn create_frame_buffers(&mut self, infos: Vec<FrameBufferCreateInfo>) -> VulkanResult<&[FrameBuffer]> {
        let frame_buffers = self
            .factory
            .create_frame_buffers(infos)
            .context("Context::create_frame_buffers")?;
        Ok(track_all(&mut self.registry.frame_buffers, frame_buffers))
    }

    // Pipelines and descriptors

    /// Create a descriptor-set layout
    pub fn create_descriptor_set_layout(
        &mut self,
        info: DescriptorSetLayoutCreateInfo,
    ) -> VulkanResult<&DescriptorSetLayout> {
        let layout = self
            .factory
            .create_descriptor_set_layout(info)
            .context("Context::create_descriptor_set_layout")?;
        Ok(track(&mut self.registry.descriptor_set_layouts, layout))
    }

    /// Create a graphics pipeline and its layout
    pub fn create_graphics_pipeline(&mut self, info: GraphicsPipelineCreateInfo) -> VulkanResult<&Pipeline> {
        let pipeline = self
            .factory
            .create_graphics_pipeline(info)
            .context("Context::create_graphics_pipeline")?;
        Ok(track(&mut self.registry.pipelines, pipeline))
    }

    /// Create a descriptor pool
    pub fn create_descriptor_pool(&mut self, info: DescriptorPoolCreateInfo) -> VulkanResult<&DescriptorPool> {
        let pool = self
            .factory
            .create_descriptor_pool(info)
            .context("Context::create_descriptor_pool")?;
        Ok(track(&mut self.registry.descriptor_pools, pool))
    }

    /// Allocate a descriptor set and apply its writes
    pub fn create_descriptor_set(&mut self, info: DescriptorSetCreateInfo) -> VulkanResult<&DescriptorSet> {
        let set = self
            .factory
            .create_descriptor_set(info)
            .context("Context::create_descriptor_set")?;
        Ok(track(&mut self.registry.descriptor_sets, set))
    }

    /// Create a sampler
    pub fn create_sampler(&mut self, info: SamplerCreateInfo) -> VulkanResult<&Sampler> {
        let sampler = self
            .factory
            .create_sampler(info)
            .context("Context::create_sampler")?;
        Ok(track(&mut self.registry.samplers, sampler))
    }

    /// Create a linear sampler, anisotropic when the device has it enabled
    pub fn create_texture_sampler(&mut self) -> VulkanResult<&Sampler> {
        let registry = &self.registry;
        let sampler = self
            .factory
            .create_texture_sampler(
                current(&registry.devices, ResourceKind::Device)?,
                current(&registry.physical_devices, ResourceKind::PhysicalDevice)?,
            )
            .context("Context::create_texture_sampler")?;
        Ok(track(&mut self.registry.samplers, sampler))
    }

    // Synchronization

    /// Create `count` semaphores on the live device
    pub fn create_semaphores(&mut self, count: usize) -> VulkanResult<&[Semaphore]> {
        let device = self.device()?.handle()?;
        let semaphores = self
            .factory
            .create_semaphores(vec![SemaphoreCreateInfo { device }; count])
            .context("Context::create_semaphores")?;
        Ok(track_all(&mut self.registry.semaphores, semaphores))
    }

    /// Create `count` fences on the live device
    pub fn create_fences(&mut self, count: usize, signaled: bool) -> VulkanResult<&[Fence]> {
        let device = self.device()?.handle()?;
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let fences = self
            .factory
            .create_fences(vec![FenceCreateInfo { device, flags }; count])
            .context("Context::create_fences")?;
        Ok(track_all(&mut self.registry.fences, fences))
    }

    // Memory-backed resources

    /// Create a buffer with its own memory
    pub fn create_buffer(
        &mut self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<&Buffer> {
        let registry = &self.registry;
        let device = current(&registry.devices, ResourceKind::Device)?.handle()?;
        let physical_device = current(&registry.physical_devices, ResourceKind::PhysicalDevice)?;
        let buffer = self
            .factory
            .create_buffer(physical_device, BufferCreateInfo::new(device, size, usage), properties)
            .context("Context::create_buffer")?;
        Ok(track(&mut self.registry.buffers, buffer))
    }

    /// Create an image with its own memory
    pub fn create_image(&mut self, info: ImageCreateInfo, properties: vk::MemoryPropertyFlags) -> VulkanResult<&Image> {
        let physical_device = current(&self.registry.physical_devices, ResourceKind::PhysicalDevice)?;
        let image = self
            .factory
            .create_image(physical_device, info, properties)
            .context("Context::create_image")?;
        Ok(track(&mut self.registry.images, image))
    }

    /// Map the memory of buffer `id`
    pub fn map_buffer(&self, id: u32) -> VulkanResult<*mut c_void> {
        let buffer = find(&self.registry.buffers, ResourceKind::Buffer, id)?;
        self.factory.map_memory(buffer.create_info.device, buffer)
    }

    /// Unmap the memory of buffer `id`
    pub fn unmap_buffer(&self, id: u32) -> VulkanResult<()> {
        let buffer = find(&self.registry.buffers, ResourceKind::Buffer, id)?;
        self.factory.unmap_memory(buffer.create_info.device, buffer)
    }

    /// Copy `data` into buffer `id`
    pub fn write_buffer<P: bytemuck::Pod>(&self, id: u32, data: &[P]) -> VulkanResult<()> {
        let buffer = find(&self.registry.buffers, ResourceKind::Buffer, id)?;
        self.factory
            .write_memory(buffer.create_info.device, buffer, data)
            .context(format!("Context::write_buffer #{id}"))
    }

    /// Destroy buffer `id`, unmapping first if the caller left it mapped
    pub fn destroy_buffer(&mut self, id: u32, unmap_memory: bool) -> VulkanResult<()> {
        let buffer = find_mut(&mut self.registry.buffers, ResourceKind::Buffer, id)?;
        self.factory
            .destroy_buffer(buffer, unmap_memory)
            .context(format!("Context::destroy_buffer #{id}"))
    }

    /// Destroy image `id`, unmapping first if the caller left it mapped
    pub fn destroy_image(&mut self, id: u32, unmap_memory: bool) -> VulkanResult<()> {
        let image = find_mut(&mut self.registry.images, ResourceKind::Image, id)?;
        self.factory
            .destroy_image(image, unmap_memory)
            .context(format!("Context::destroy_image #{id}"))
    }

    // Teardown

    /// Destroy one resource by kind and id, leaving it in the registry as destroyed.
    ///
    /// Memory-backed resources are destroyed without unmapping; use
    /// [`Self::destroy_buffer`] or [`Self::destroy_image`] to unmap first.
    pub fn destroy(&mut self, kind: ResourceKind, id: u32) -> VulkanResult<()> {
        let factory = &mut self.factory;
        let r = &mut self.registry;
        let destroyed = match kind {
            ResourceKind::Instance => find_mut(&mut r.instances, kind, id).and_then(|x| factory.destroy_instance(x)),
            ResourceKind::DebugMessenger => {
                find_mut(&mut r.debug_messengers, kind, id).and_then(|x| factory.destroy_debug_messenger(x))
            }
            ResourceKind::Surface => find_mut(&mut r.surfaces, kind, id).and_then(|x| factory.destroy_surface(x)),
            ResourceKind::PhysicalDevice => {
                find_mut(&mut r.physical_devices, kind, id).and_then(|x| factory.destroy_physical_device(x))
            }
            ResourceKind::Device => find_mut(&mut r.devices, kind, id).and_then(|x| factory.destroy_device(x)),
            ResourceKind::Queue => find_mut(&mut r.queues, kind, id).and_then(|x| factory.destroy_queue(x)),
            ResourceKind::CommandPool => {
                find_mut(&mut r.command_pools, kind, id).and_then(|x| factory.destroy_command_pool(x))
            }
            ResourceKind::CommandBuffer => {
                find_mut(&mut r.command_buffers, kind, id).and_then(|x| factory.destroy_command_buffer(x))
            }
            ResourceKind::SwapChain => find_mut(&mut r.swap_chains, kind, id).and_then(|x| factory.destroy_swap_chain(x)),
            ResourceKind::SwapChainImage => {
                find_mut(&mut r.swap_chain_images, kind, id).and_then(|x| factory.destroy_swap_chain_image(x))
            }
            ResourceKind::ImageView => find_mut(&mut r.image_views, kind, id).and_then(|x| factory.destroy_image_view(x)),
            ResourceKind::RenderPass => {
                find_mut(&mut r.render_passes, kind, id).and_then(|x| factory.destroy_render_pass(x))
            }
            ResourceKind::DescriptorSetLayout => find_mut(&mut r.descriptor_set_layouts, kind, id)
                .and_then(|x| factory.destroy_descriptor_set_layout(x)),
            ResourceKind::Pipeline => find_mut(&mut r.pipelines, kind, id).and_then(|x| factory.destroy_pipeline(x)),
            ResourceKind::FrameBuffer => {
                find_mut(&mut r.frame_buffers, kind, id).and_then(|x| factory.destroy_frame_buffer(x))
            }
            ResourceKind::DescriptorPool => {
                find_mut(&mut r.descriptor_pools, kind, id).and_then(|x| factory.destroy_descriptor_pool(x))
            }
            ResourceKind::DescriptorSet => {
                find_mut(&mut r.descriptor_sets, kind, id).and_then(|x| factory.destroy_descriptor_set(x))
            }
            ResourceKind::Sampler => find_mut(&mut r.samplers, kind, id).and_then(|x| factory.destroy_sampler(x)),
            ResourceKind::Semaphore => find_mut(&mut r.semaphores, kind, id).and_then(|x| factory.destroy_semaphore(x)),
            ResourceKind::Fence => find_mut(&mut r.fences, kind, id).and_then(|x| factory.destroy_fence(x)),
            ResourceKind::Buffer => find_mut(&mut r.buffers, kind, id).and_then(|x| factory.destroy_buffer(x, false)),
            ResourceKind::Image => find_mut(&mut r.images, kind, id).and_then(|x| factory.destroy_image(x, false)),
            ResourceKind::ShaderModule | ResourceKind::PipelineLayout | ResourceKind::DeviceMemory => {
                Err(VulkanError::InvalidArgument(format!(
                    "{kind} is not tracked on its own and cannot be destroyed by id"
                )))
            }
        };
        if destroyed.is_ok() {
            log::debug!("Destroyed {kind} #{id}");
        }
        destroyed.context(format!("Context::destroy {kind} #{id}"))
    }

    /// Destroy everything, in [`ResourceKind::TEARDOWN_ORDER`].
    ///
    /// Each registry is emptied once all of its resources are destroyed.
    /// Calling this again, or after a partial failure, only touches what is
    /// still live.
    pub fn destroy_all(&mut self) -> VulkanResult<()> {
        self.teardown(|kind, count| {
            if count > 0 {
                log::debug!("Teardown released {count} {kind} resource(s)");
            }
        })
    }

    /// Run every teardown step, reporting how many live resources each released.
    fn teardown(&mut self, mut on_step: impl FnMut(ResourceKind, usize)) -> VulkanResult<()> {
        for kind in ResourceKind::TEARDOWN_ORDER {
            let count = self
                .destroy_kind(kind)
                .context(format!("Context::destroy_all at {kind}"))?;
            on_step(kind, count);
        }
        Ok(())
    }

    fn destroy_kind(&mut self, kind: ResourceKind) -> VulkanResult<usize> {
        let factory = &mut self.factory;
        let r = &mut self.registry;
        match kind {
            ResourceKind::Fence => destroy_each(&mut r.fences, |x| factory.destroy_fence(x)),
            ResourceKind::Semaphore => destroy_each(&mut r.semaphores, |x| factory.destroy_semaphore(x)),
            ResourceKind::CommandBuffer => destroy_each(&mut r.command_buffers, |x| factory.destroy_command_buffer(x)),
            ResourceKind::CommandPool => destroy_each(&mut r.command_pools, |x| factory.destroy_command_pool(x)),
            ResourceKind::Queue => destroy_each(&mut r.queues, |x| factory.destroy_queue(x)),
            // Images first, they belong to the swap-chain
            ResourceKind::SwapChain => {
                destroy_each(&mut r.swap_chain_images, |x| factory.destroy_swap_chain_image(x))?;
                destroy_each(&mut r.swap_chains, |x| factory.destroy_swap_chain(x))
            }
            ResourceKind::Surface => destroy_each(&mut r.surfaces, |x| factory.destroy_surface(x)),
            ResourceKind::FrameBuffer => destroy_each(&mut r.frame_buffers, |x| factory.destroy_frame_buffer(x)),
            ResourceKind::Pipeline => destroy_each(&mut r.pipelines, |x| factory.destroy_pipeline(x)),
            ResourceKind::DescriptorSet => destroy_each(&mut r.descriptor_sets, |x| factory.destroy_descriptor_set(x)),
            ResourceKind::DescriptorPool => destroy_each(&mut r.descriptor_pools, |x| factory.destroy_descriptor_pool(x)),
            ResourceKind::DescriptorSetLayout => {
                destroy_each(&mut r.descriptor_set_layouts, |x| factory.destroy_descriptor_set_layout(x))
            }
            ResourceKind::RenderPass => destroy_each(&mut r.render_passes, |x| factory.destroy_render_pass(x)),
            ResourceKind::Sampler => destroy_each(&mut r.samplers, |x| factory.destroy_sampler(x)),
            ResourceKind::ImageView => destroy_each(&mut r.image_views, |x| factory.destroy_image_view(x)),
            ResourceKind::Image => destroy_each(&mut r.images, |x| factory.destroy_image(x, false)),
            ResourceKind::Buffer => destroy_each(&mut r.buffers, |x| factory.destroy_buffer(x, false)),
            ResourceKind::Device => destroy_each(&mut r.devices, |x| factory.destroy_device(x)),
            ResourceKind::PhysicalDevice => {
                destroy_each(&mut r.physical_devices, |x| factory.destroy_physical_device(x))
            }
            ResourceKind::DebugMessenger => {
                destroy_each(&mut r.debug_messengers, |x| factory.destroy_debug_messenger(x))
            }
            ResourceKind::Instance => destroy_each(&mut r.instances, |x| factory.destroy_instance(x)),
            // Released together with their owners
            ResourceKind::SwapChainImage
            | ResourceKind::ShaderModule
            | ResourceKind::PipelineLayout
            | ResourceKind::DeviceMemory => Ok(0),
        }
    }
}

fn track<T: Tracked>(items: &mut Vec<T>, item: T) -> &T {
    log::debug!("Created {} #{}", item.kind(), item.id());
    items.push(item);
    &items[items.len() - 1]
}

fn track_all<T: Tracked>(items: &mut Vec<T>, created: Vec<T>) -> &[T] {
    let start = items.len();
    for item in created {
        log::debug!("Created {} #{}", item.kind(), item.id());
        items.push(item);
    }
    &items[start..]
}

fn current<T: Tracked>(items: &[T], kind: ResourceKind) -> VulkanResult<&T> {
    items
        .iter()
        .rev()
        .find(|item| item.is_live())
        .ok_or_else(|| VulkanError::Precondition(format!("no live {kind} has been created")))
}

fn current_mut<T: Tracked>(items: &mut [T], kind: ResourceKind) -> VulkanResult<&mut T> {
    items
        .iter_mut()
        .rev()
        .find(|item| item.is_live())
        .ok_or_else(|| VulkanError::Precondition(format!("no live {kind} has been created")))
}

fn find<T: Tracked>(items: &[T], kind: ResourceKind, id: u32) -> VulkanResult<&T> {
    items
        .iter()
        .find(|item| item.id() == id)
        .ok_or(VulkanError::ResourceNotFound { kind, id })
}

fn find_mut<T: Tracked>(items: &mut [T], kind: ResourceKind, id: u32) -> VulkanResult<&mut T> {
    items
        .iter_mut()
        .find(|item| item.id() == id)
        .ok_or(VulkanError::ResourceNotFound { kind, id })
}

/// Destroy every item and empty `items`, returning how many were still live.
fn destroy_each<T: Tracked>(items: &mut Vec<T>, mut destroy: impl FnMut(&mut T) -> VulkanResult<()>) -> VulkanResult<usize> {
    let live = items.iter().filter(|item| item.is_live()).count();
    if let Some(first) = items.first() {
        log::debug!("Destroying {} {} resource(s)", items.len(), first.kind());
    }
    for item in items.iter_mut() {
        destroy(item)?;
    }
    items.clear();
    Ok(live)
}
