//! Swap-chain, its images, image views, render passes and frame buffers

use ash::vk;

use super::{checked, destroy_with, Factory};
use crate::vulkan::create_info::{
    FrameBufferCreateInfo, ImageViewCreateInfo, RenderPassCreateInfo, SwapChainCreateInfo,
    SwapChainImageCreateInfo,
};
use crate::vulkan::driver::Driver;
use crate::vulkan::error::{ResultExt, VulkanResult};
use crate::vulkan::kind::ResourceKind;
use crate::vulkan::resource::{
    Device, FrameBuffer, ImageView, RenderPass, Resource, Surface, SwapChain, SwapChainImage,
};
use crate::vulkan::selection::PhysicalDevice;
use crate::vulkan::swapchain;

impl<D: Driver> Factory<D> {
    /// Negotiate and create a swap-chain for `surface`.
    ///
    /// Uses the swap-chain support stored on `physical_device`; refresh it
    /// first when recreating after a resize. `old_swap_chain` is handed to
    /// the driver so it can recycle resources, it still has to be destroyed
    /// by the caller.
    pub fn create_swap_chain(
        &mut self,
        device: &Device,
        physical_device: &PhysicalDevice,
        surface: &Surface,
        width: u32,
        height: u32,
        old_swap_chain: Option<&SwapChain>,
    ) -> VulkanResult<SwapChain> {
        let support = physical_device.swap_chain_support()?;
        let capabilities = &support.capabilities;
        let surface_format = swapchain::choose_surface_format(&support.formats)?;
        let queues = &physical_device.queue_family_index_info;
        let (sharing_mode, queue_family_indices) = swapchain::choose_sharing(queues.graphics()?, queues.present()?);

        let info = SwapChainCreateInfo {
            device: device.handle()?,
            surface: surface.handle()?,
            min_image_count: swapchain::choose_image_count(capabilities),
            image_format: surface_format.format,
            image_color_space: surface_format.color_space,
            image_extent: swapchain::choose_extent(capabilities, width, height),
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            sharing_mode,
            queue_family_indices,
            pre_transform: capabilities.current_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode: swapchain::choose_present_mode(&support.present_modes),
            old_swap_chain: old_swap_chain.map_or(vk::SwapchainKHR::null(), |old| old.value),
        };

        let created = self.driver.create_swap_chain(info.device, &info.finalize());
        self.register(ResourceKind::SwapChain, created, info)
    }

    /// Destroy the swap-chain, which also releases its images.
    pub fn destroy_swap_chain(&mut self, swap_chain: &mut SwapChain) -> VulkanResult<()> {
        let device = swap_chain.create_info.device;
        let driver = &self.driver;
        destroy_with(swap_chain, |handle| driver.destroy_swap_chain(device, handle))
    }

    /// Wrap the images owned by `swap_chain`
    pub fn create_swap_chain_images(&mut self, swap_chain: &SwapChain) -> VulkanResult<Vec<SwapChainImage>> {
        let handle = swap_chain.handle()?;
        let info = &swap_chain.create_info;
        let images = self
            .driver
            .swap_chain_images(info.device, handle)
            .failed("get", ResourceKind::SwapChainImage)?;

        (0u32..)
            .zip(images)
            .map(|(index, image)| {
                let image = checked(ResourceKind::SwapChainImage, "get", Ok(image))?;
                let image_info = SwapChainImageCreateInfo {
                    device: info.device,
                    swap_chain: handle,
                    index,
                    format: info.image_format,
                    extent: info.image_extent,
                };
                Ok(Resource::new(
                    self.ids.next(ResourceKind::SwapChainImage),
                    ResourceKind::SwapChainImage,
                    image,
                    image_info,
                ))
            })
            .collect()
    }

    /// Forget a swap-chain image. It is released with its swap-chain.
    pub fn destroy_swap_chain_image(&mut self, image: &mut SwapChainImage) -> VulkanResult<()> {
        destroy_with(image, |_| Ok(()))
    }

    /// Create an image view
    pub fn create_image_view(&mut self, info: ImageViewCreateInfo) -> VulkanResult<ImageView> {
        let created = self.driver.create_image_view(info.device, &info.finalize());
        self.register(ResourceKind::ImageView, created, info)
    }

    /// Create one image view per create-info, all or nothing
    pub fn create_image_views(&mut self, infos: Vec<ImageViewCreateInfo>) -> VulkanResult<Vec<ImageView>> {
        self.create_batch(infos, Self::create_image_view, Self::destroy_image_view)
            .context("create image views")
    }

    /// One color view per swap-chain image
    pub fn create_swap_chain_image_views(&mut self, images: &[SwapChainImage]) -> VulkanResult<Vec<ImageView>> {
        let infos = images
            .iter()
            .map(|image| {
                Ok(ImageViewCreateInfo {
                    device: image.create_info.device,
                    image: image.handle()?,
                    format: image.create_info.format,
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_levels: 1,
                })
            })
            .collect::<VulkanResult<Vec<_>>>()?;
        self.create_image_views(infos)
    }

    /// Destroy an image view
    pub fn destroy_image_view(&mut self, view: &mut ImageView) -> VulkanResult<()> {
        let device = view.create_info.device;
        let driver = &self.driver;
        destroy_with(view, |handle| driver.destroy_image_view(device, handle))
    }

    /// Create a single-subpass render pass
    pub fn create_render_pass(&mut self, info: RenderPassCreateInfo) -> VulkanResult<RenderPass> {
        let mut subpass = vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&info.color_attachments);
        if let Some(depth) = info.depth_attachment.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth);
        }
        let subpasses = [subpass.build()];
        let native = vk::RenderPassCreateInfo::builder()
            .attachments(&info.attachments)
            .subpasses(&subpasses)
            .dependencies(&info.dependencies);

        let created = self.driver.create_render_pass(info.device, &native);
        self.register(ResourceKind::RenderPass, created, info)
    }

    /// Destroy a render pass
    pub fn destroy_render_pass(&mut self, render_pass: &mut RenderPass) -> VulkanResult<()> {
        let device = render_pass.create_info.device;
        let driver = &self.driver;
        destroy_with(render_pass, |handle| driver.destroy_render_pass(device, handle))
    }

    /// Create a frame buffer
    pub fn create_frame_buffer(&mut self, info: FrameBufferCreateInfo) -> VulkanResult<FrameBuffer> {
        let created = self.driver.create_frame_buffer(info.device, &info.finalize());
        self.register(ResourceKind::FrameBuffer, created, info)
    }

    /// Create one frame buffer per create-info, all or nothing
    pub fn create_frame_buffers(&mut self, infos: Vec<FrameBufferCreateInfo>) -> VulkanResult<Vec<FrameBuffer>> {
        self.create_batch(infos, Self::create_frame_buffer, Self::destroy_frame_buffer)
            .context("create frame buffers")
    }

    /// Destroy a frame buffer
    pub fn destroy_frame_buffer(&mut self, frame_buffer: &mut FrameBuffer) -> VulkanResult<()> {
        let device = frame_buffer.create_info.device;
        let driver = &self.driver;
        destroy_with(frame_buffer, |handle| driver.destroy_frame_buffer(device, handle))
    }
}
