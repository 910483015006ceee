//! Owned create parameters for every resource kind
//!
//! Each resource keeps the parameters that produced it. The models own their
//! variable-length arrays; `finalize` builds the native create-info struct
//! borrowing those arrays, so the native pointers are only wired for the
//! duration of the create call.

use ash::vk;
use std::ffi::{c_char, c_void, CString};
use std::path::PathBuf;
use std::rc::Rc;

use crate::core::config::Configuration;

use super::debug::{debug_callback, DebugLogger};
use super::error::{VulkanError, VulkanResult};

fn to_cstring(value: &str) -> VulkanResult<CString> {
    CString::new(value)
        .map_err(|_| VulkanError::InvalidArgument(format!("{value:?} contains an interior NUL byte")))
}

fn to_cstrings(values: &[String]) -> VulkanResult<Vec<CString>> {
    values.iter().map(|value| to_cstring(value)).collect()
}

fn name_ptrs(names: &[CString]) -> Vec<*const c_char> {
    names.iter().map(|name| name.as_ptr()).collect()
}

/// Parameters of the Vulkan instance
#[derive(Debug, Clone)]
pub struct InstanceCreateInfo {
    /// Application name reported to the driver
    pub application_name: CString,
    /// Packed application version
    pub application_version: u32,
    /// Engine name reported to the driver
    pub engine_name: CString,
    /// Packed engine version
    pub engine_version: u32,
    /// Requested API version
    pub api_version: u32,
    /// Layers enabled on the instance
    pub enabled_layers: Vec<CString>,
    /// Instance extensions
    pub enabled_extensions: Vec<CString>,
    /// Logger receiving messages emitted while the instance itself is created
    /// and destroyed, set only when validation is enabled
    pub debug_logger: Option<Rc<DebugLogger>>,
}

impl InstanceCreateInfo {
    /// Derive instance parameters from the session configuration.
    ///
    /// Layers and the chained debug logger are only used when validation is
    /// enabled.
    pub fn from_configuration(configuration: &Configuration, logger: Rc<DebugLogger>) -> VulkanResult<Self> {
        let (major, minor, patch) = configuration.application_version;
        let (engine_major, engine_minor, engine_patch) = configuration.engine_version;
        let enabled_layers = if configuration.validation_layers_enabled {
            to_cstrings(&configuration.validation_layers)?
        } else {
            Vec::new()
        };

        Ok(Self {
            application_name: to_cstring(&configuration.application_name)?,
            application_version: vk::make_api_version(0, major, minor, patch),
            engine_name: to_cstring(&configuration.engine_name)?,
            engine_version: vk::make_api_version(0, engine_major, engine_minor, engine_patch),
            api_version: vk::API_VERSION_1_0,
            enabled_layers,
            enabled_extensions: to_cstrings(&configuration.extensions)?,
            debug_logger: configuration.validation_layers_enabled.then_some(logger),
        })
    }

    /// Application info borrowing the owned names
    pub fn application_info(&self) -> vk::ApplicationInfoBuilder<'_> {
        vk::ApplicationInfo::builder()
            .application_name(&self.application_name)
            .application_version(self.application_version)
            .engine_name(&self.engine_name)
            .engine_version(self.engine_version)
            .api_version(self.api_version)
    }

    /// Pointers to the layer names, valid while `self` is alive
    pub fn layer_name_ptrs(&self) -> Vec<*const c_char> {
        name_ptrs(&self.enabled_layers)
    }

    /// Pointers to the extension names, valid while `self` is alive
    pub fn extension_name_ptrs(&self) -> Vec<*const c_char> {
        name_ptrs(&self.enabled_extensions)
    }
}

/// Parameters of a debug messenger
#[derive(Debug, Clone)]
pub struct DebugMessengerCreateInfo {
    /// Owning instance, null while chained into instance creation
    pub instance: vk::Instance,
    /// Severities forwarded to the logger
    pub severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    /// Message types forwarded to the logger
    pub message_types: vk::DebugUtilsMessageTypeFlagsEXT,
    /// Receiver of the messages, kept alive as long as the messenger
    pub logger: Rc<DebugLogger>,
}

impl DebugMessengerCreateInfo {
    /// Every severity and message type, filtering is left to the logger
    pub fn new(instance: vk::Instance, logger: Rc<DebugLogger>) -> Self {
        Self {
            instance,
            severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            message_types: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            logger,
        }
    }

    /// Native create-info whose `user_data` points at the logger
    pub fn finalize(&self) -> vk::DebugUtilsMessengerCreateInfoEXTBuilder<'_> {
        vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(self.severity)
            .message_type(self.message_types)
            .pfn_user_callback(Some(debug_callback))
            .user_data(Rc::as_ptr(&self.logger).cast_mut().cast::<c_void>())
    }
}

/// Parameters of a presentation surface
#[derive(Debug, Clone, Copy)]
pub struct SurfaceCreateInfo {
    /// Owning instance
    pub instance: vk::Instance,
}

/// Parameters of the logical device
#[derive(Debug, Clone)]
pub struct DeviceCreateInfo {
    /// Physical device the logical device is created on
    pub physical_device: vk::PhysicalDevice,
    /// One queue is requested from each of these families
    pub queue_family_indices: Vec<u32>,
    /// Priority of the single queue requested per family
    pub queue_priorities: Vec<f32>,
    /// Device extensions
    pub enabled_extensions: Vec<CString>,
    /// Device layers (ignored by modern loaders, kept for older ones)
    pub enabled_layers: Vec<CString>,
    /// Features enabled on the device
    pub features: vk::PhysicalDeviceFeatures,
}

impl DeviceCreateInfo {
    /// Derive device parameters from the selection result and configuration.
    pub fn new(
        physical_device: vk::PhysicalDevice,
        queue_family_indices: Vec<u32>,
        configuration: &Configuration,
    ) -> VulkanResult<Self> {
        let features = vk::PhysicalDeviceFeatures {
            sampler_anisotropy: vk::Bool32::from(configuration.anisotropy_required),
            ..Default::default()
        };
        let enabled_layers = if configuration.validation_layers_enabled {
            to_cstrings(&configuration.validation_layers)?
        } else {
            Vec::new()
        };

        Ok(Self {
            physical_device,
            queue_family_indices,
            queue_priorities: vec![1.0],
            enabled_extensions: to_cstrings(&configuration.device_extensions)?,
            enabled_layers,
            features,
        })
    }

    /// One queue create-info per family, borrowing the owned priorities
    pub fn queue_create_infos(&self) -> Vec<vk::DeviceQueueCreateInfo> {
        self.queue_family_indices
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&self.queue_priorities)
                    .build()
            })
            .collect()
    }

    /// Pointers to the extension names, valid while `self` is alive
    pub fn extension_name_ptrs(&self) -> Vec<*const c_char> {
        name_ptrs(&self.enabled_extensions)
    }

    /// Pointers to the layer names, valid while `self` is alive
    pub fn layer_name_ptrs(&self) -> Vec<*const c_char> {
        name_ptrs(&self.enabled_layers)
    }
}

/// Location of a queue inside its device
#[derive(Debug, Clone, Copy)]
pub struct QueueCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Family the queue belongs to
    pub queue_family_index: u32,
    /// Index of the queue within the family
    pub queue_index: u32,
}

/// Parameters of a command pool
#[derive(Debug, Clone, Copy)]
pub struct CommandPoolCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Family whose queues execute the pool's buffers
    pub queue_family_index: u32,
    /// Pool flags
    pub flags: vk::CommandPoolCreateFlags,
}

impl CommandPoolCreateInfo {
    /// Native create-info
    pub fn finalize(&self) -> vk::CommandPoolCreateInfoBuilder<'_> {
        vk::CommandPoolCreateInfo::builder()
            .flags(self.flags)
            .queue_family_index(self.queue_family_index)
    }
}

/// Parameters of a command buffer allocation
#[derive(Debug, Clone, Copy)]
pub struct CommandBufferCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Pool the buffer is allocated from
    pub command_pool: vk::CommandPool,
    /// Primary or secondary
    pub level: vk::CommandBufferLevel,
}

impl CommandBufferCreateInfo {
    /// Native allocate-info for a single buffer
    pub fn finalize(&self) -> vk::CommandBufferAllocateInfoBuilder<'_> {
        vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.command_pool)
            .level(self.level)
            .command_buffer_count(1)
    }
}

/// Parameters of a swap-chain
#[derive(Debug, Clone)]
pub struct SwapChainCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Surface presented to
    pub surface: vk::SurfaceKHR,
    /// Minimum number of images requested
    pub min_image_count: u32,
    /// Format of the images
    pub image_format: vk::Format,
    /// Color space of the images
    pub image_color_space: vk::ColorSpaceKHR,
    /// Size of the images
    pub image_extent: vk::Extent2D,
    /// Usage of the images
    pub image_usage: vk::ImageUsageFlags,
    /// Exclusive unless graphics and present families differ
    pub sharing_mode: vk::SharingMode,
    /// Families sharing the images in concurrent mode
    pub queue_family_indices: Vec<u32>,
    /// Transform applied before presentation
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    /// Alpha compositing mode
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
    /// Presentation mode
    pub present_mode: vk::PresentModeKHR,
    /// Swap-chain being replaced, if any
    pub old_swap_chain: vk::SwapchainKHR,
}

impl SwapChainCreateInfo {
    /// Native create-info borrowing the family list
    pub fn finalize(&self) -> vk::SwapchainCreateInfoKHRBuilder<'_> {
        vk::SwapchainCreateInfoKHR::builder()
            .surface(self.surface)
            .min_image_count(self.min_image_count)
            .image_format(self.image_format)
            .image_color_space(self.image_color_space)
            .image_extent(self.image_extent)
            .image_array_layers(1)
            .image_usage(self.image_usage)
            .image_sharing_mode(self.sharing_mode)
            .queue_family_indices(&self.queue_family_indices)
            .pre_transform(self.pre_transform)
            .composite_alpha(self.composite_alpha)
            .present_mode(self.present_mode)
            .clipped(true)
            .old_swapchain(self.old_swap_chain)
    }
}

/// Where a swap-chain image came from
#[derive(Debug, Clone, Copy)]
pub struct SwapChainImageCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Swap-chain that owns the image
    pub swap_chain: vk::SwapchainKHR,
    /// Position in the swap-chain image array
    pub index: u32,
    /// Image format
    pub format: vk::Format,
    /// Image size
    pub extent: vk::Extent2D,
}

/// Parameters of an image view
#[derive(Debug, Clone, Copy)]
pub struct ImageViewCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Viewed image
    pub image: vk::Image,
    /// View format
    pub format: vk::Format,
    /// Color, depth or stencil aspect
    pub aspect_mask: vk::ImageAspectFlags,
    /// Number of mip levels visible through the view
    pub mip_levels: u32,
}

impl ImageViewCreateInfo {
    /// Native create-info for a single-layer 2D view
    pub fn finalize(&self) -> vk::ImageViewCreateInfoBuilder<'_> {
        vk::ImageViewCreateInfo::builder()
            .image(self.image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(self.format)
            .components(vk::ComponentMapping::default())
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: self.aspect_mask,
                base_mip_level: 0,
                level_count: self.mip_levels,
                base_array_layer: 0,
                layer_count: 1,
            })
    }
}

/// Parameters of a single-subpass render pass
#[derive(Debug, Clone)]
pub struct RenderPassCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Attachment descriptions
    pub attachments: Vec<vk::AttachmentDescription>,
    /// Color attachments of the subpass
    pub color_attachments: Vec<vk::AttachmentReference>,
    /// Optional depth attachment of the subpass
    pub depth_attachment: Option<vk::AttachmentReference>,
    /// Subpass dependencies
    pub dependencies: Vec<vk::SubpassDependency>,
}

impl RenderPassCreateInfo {
    /// One color attachment cleared on load and presented after the pass.
    pub fn presentable(device: vk::Device, format: vk::Format) -> Self {
        Self {
            device,
            attachments: vec![vk::AttachmentDescription {
                format,
                samples: vk::SampleCountFlags::TYPE_1,
                load_op: vk::AttachmentLoadOp::CLEAR,
                store_op: vk::AttachmentStoreOp::STORE,
                stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
                ..Default::default()
            }],
            color_attachments: vec![vk::AttachmentReference {
                attachment: 0,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            }],
            depth_attachment: None,
            dependencies: vec![vk::SubpassDependency {
                src_subpass: vk::SUBPASS_EXTERNAL,
                dst_subpass: 0,
                src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                dst_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                src_access_mask: vk::AccessFlags::empty(),
                dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                ..Default::default()
            }],
        }
    }

    /// Add a depth attachment of `format`, cleared on load and discarded after.
    pub fn with_depth(mut self, format: vk::Format) -> Self {
        let attachment = u32::try_from(self.attachments.len()).unwrap_or(u32::MAX);
        self.attachments.push(vk::AttachmentDescription {
            format,
            samples: vk::SampleCountFlags::TYPE_1,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::DONT_CARE,
            stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
            stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            ..Default::default()
        });
        self.depth_attachment = Some(vk::AttachmentReference {
            attachment,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        });
        for dependency in &mut self.dependencies {
            dependency.src_stage_mask |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
            dependency.dst_stage_mask |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
            dependency.dst_access_mask |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
        }
        self
    }
}

/// Parameters of a descriptor-set layout
#[derive(Debug, Clone)]
pub struct DescriptorSetLayoutCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Layout bindings
    pub bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutCreateInfo {
    /// Native create-info borrowing the bindings
    pub fn finalize(&self) -> vk::DescriptorSetLayoutCreateInfoBuilder<'_> {
        vk::DescriptorSetLayoutCreateInfo::builder().bindings(&self.bindings)
    }
}

/// Parameters of a shader module
#[derive(Debug, Clone)]
pub struct ShaderCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Path the byte code was read from
    pub path: PathBuf,
    /// Stage derived from the path suffix
    pub stage: vk::ShaderStageFlags,
}

/// Parameters of a graphics pipeline and its layout
#[derive(Debug, Clone)]
pub struct GraphicsPipelineCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Render pass the pipeline is used with
    pub render_pass: vk::RenderPass,
    /// Subpass index inside the render pass
    pub subpass: u32,
    /// Viewport and scissor size
    pub extent: vk::Extent2D,
    /// SPIR-V files, one per stage
    pub shader_paths: Vec<PathBuf>,
    /// Winding considered front facing
    pub front_face: vk::FrontFace,
    /// Faces culled by the rasterizer
    pub cull_mode: vk::CullModeFlags,
    /// Primitive topology
    pub topology: vk::PrimitiveTopology,
    /// Descriptor-set layouts of the pipeline layout
    pub set_layouts: Vec<vk::DescriptorSetLayout>,
    /// Push-constant ranges of the pipeline layout
    pub push_constant_ranges: Vec<vk::PushConstantRange>,
    /// Vertex buffer bindings
    pub vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    /// Vertex attributes
    pub vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
    /// Enable depth test and write
    pub depth_test: bool,
}

impl GraphicsPipelineCreateInfo {
    /// Triangle-list pipeline with back-face culling and no vertex input.
    pub fn new(
        device: vk::Device,
        render_pass: vk::RenderPass,
        extent: vk::Extent2D,
        shader_paths: Vec<PathBuf>,
        front_face: vk::FrontFace,
    ) -> Self {
        Self {
            device,
            render_pass,
            subpass: 0,
            extent,
            shader_paths,
            front_face,
            cull_mode: vk::CullModeFlags::BACK,
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            set_layouts: Vec::new(),
            push_constant_ranges: Vec::new(),
            vertex_bindings: Vec::new(),
            vertex_attributes: Vec::new(),
            depth_test: false,
        }
    }

    /// Native pipeline-layout create-info borrowing the layouts and ranges
    pub fn layout_info(&self) -> vk::PipelineLayoutCreateInfoBuilder<'_> {
        vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(&self.set_layouts)
            .push_constant_ranges(&self.push_constant_ranges)
    }
}

/// Parameters of a frame buffer
#[derive(Debug, Clone)]
pub struct FrameBufferCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Compatible render pass
    pub render_pass: vk::RenderPass,
    /// Attached image views
    pub attachments: Vec<vk::ImageView>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl FrameBufferCreateInfo {
    /// Native create-info borrowing the attachments
    pub fn finalize(&self) -> vk::FramebufferCreateInfoBuilder<'_> {
        vk::FramebufferCreateInfo::builder()
            .render_pass(self.render_pass)
            .attachments(&self.attachments)
            .width(self.width)
            .height(self.height)
            .layers(1)
    }
}

/// Parameters of a descriptor pool
#[derive(Debug, Clone)]
pub struct DescriptorPoolCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Descriptor counts per type
    pub pool_sizes: Vec<vk::DescriptorPoolSize>,
    /// Maximum number of sets allocated from the pool
    pub max_sets: u32,
    /// Pool flags
    pub flags: vk::DescriptorPoolCreateFlags,
}

impl DescriptorPoolCreateInfo {
    /// Pool holding `max_sets` sets of one uniform buffer and one combined image sampler each.
    pub fn uniform_and_sampler(device: vk::Device, max_sets: u32) -> Self {
        Self {
            device,
            pool_sizes: vec![
                vk::DescriptorPoolSize {
                    ty: vk::DescriptorType::UNIFORM_BUFFER,
                    descriptor_count: max_sets,
                },
                vk::DescriptorPoolSize {
                    ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    descriptor_count: max_sets,
                },
            ],
            max_sets,
            flags: vk::DescriptorPoolCreateFlags::empty(),
        }
    }

    /// Native create-info borrowing the pool sizes
    pub fn finalize(&self) -> vk::DescriptorPoolCreateInfoBuilder<'_> {
        vk::DescriptorPoolCreateInfo::builder()
            .flags(self.flags)
            .pool_sizes(&self.pool_sizes)
            .max_sets(self.max_sets)
    }
}

/// Resources bound by one descriptor write
#[derive(Debug, Clone)]
pub enum DescriptorResources {
    /// Buffer descriptors
    Buffers(Vec<vk::DescriptorBufferInfo>),
    /// Image or sampler descriptors
    Images(Vec<vk::DescriptorImageInfo>),
}

/// One write applied to a freshly allocated descriptor set
#[derive(Debug, Clone)]
pub struct DescriptorWrite {
    /// Binding written
    pub binding: u32,
    /// First array element written
    pub array_element: u32,
    /// Descriptor type of the binding
    pub descriptor_type: vk::DescriptorType,
    /// Bound resources
    pub resources: DescriptorResources,
}

impl DescriptorWrite {
    /// Native write into `set`, borrowing the resource infos
    pub fn finalize(&self, set: vk::DescriptorSet) -> vk::WriteDescriptorSet {
        let builder = vk::WriteDescriptorSet::builder()
            .dst_set(set)
            .dst_binding(self.binding)
            .dst_array_element(self.array_element)
            .descriptor_type(self.descriptor_type);
        match &self.resources {
            DescriptorResources::Buffers(infos) => builder.buffer_info(infos).build(),
            DescriptorResources::Images(infos) => builder.image_info(infos).build(),
        }
    }
}

/// Parameters of a descriptor set
#[derive(Debug, Clone)]
pub struct DescriptorSetCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Pool the set is allocated from
    pub descriptor_pool: vk::DescriptorPool,
    /// Layout of the set
    pub layout: vk::DescriptorSetLayout,
    /// Writes applied after allocation
    pub writes: Vec<DescriptorWrite>,
}

/// Parameters of a sampler
#[derive(Debug, Clone, Copy)]
pub struct SamplerCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Filter for magnification and minification
    pub filter: vk::Filter,
    /// Addressing mode on all axes
    pub address_mode: vk::SamplerAddressMode,
    /// Anisotropy level, `None` disables anisotropic filtering
    pub max_anisotropy: Option<f32>,
}

impl SamplerCreateInfo {
    /// Native create-info
    pub fn finalize(&self) -> vk::SamplerCreateInfoBuilder<'_> {
        vk::SamplerCreateInfo::builder()
            .mag_filter(self.filter)
            .min_filter(self.filter)
            .address_mode_u(self.address_mode)
            .address_mode_v(self.address_mode)
            .address_mode_w(self.address_mode)
            .anisotropy_enable(self.max_anisotropy.is_some())
            .max_anisotropy(self.max_anisotropy.unwrap_or(1.0))
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(0.0)
    }
}

/// Parameters of a semaphore
#[derive(Debug, Clone, Copy)]
pub struct SemaphoreCreateInfo {
    /// Owning device
    pub device: vk::Device,
}

/// Parameters of a fence
#[derive(Debug, Clone, Copy)]
pub struct FenceCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Fence flags, `SIGNALED` creates it already signaled
    pub flags: vk::FenceCreateFlags,
}

impl FenceCreateInfo {
    /// Native create-info
    pub fn finalize(&self) -> vk::FenceCreateInfoBuilder<'_> {
        vk::FenceCreateInfo::builder().flags(self.flags)
    }
}

/// Parameters of a buffer
#[derive(Debug, Clone)]
pub struct BufferCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Size in bytes
    pub size: vk::DeviceSize,
    /// Buffer usage
    pub usage: vk::BufferUsageFlags,
    /// Sharing mode
    pub sharing_mode: vk::SharingMode,
    /// Families sharing the buffer in concurrent mode
    pub queue_family_indices: Vec<u32>,
}

impl BufferCreateInfo {
    /// Exclusive buffer of `size` bytes.
    pub fn new(device: vk::Device, size: vk::DeviceSize, usage: vk::BufferUsageFlags) -> Self {
        Self {
            device,
            size,
            usage,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            queue_family_indices: Vec::new(),
        }
    }

    /// Native create-info borrowing the family list
    pub fn finalize(&self) -> vk::BufferCreateInfoBuilder<'_> {
        vk::BufferCreateInfo::builder()
            .size(self.size)
            .usage(self.usage)
            .sharing_mode(self.sharing_mode)
            .queue_family_indices(&self.queue_family_indices)
    }
}

/// Parameters of a 2D image
#[derive(Debug, Clone, Copy)]
pub struct ImageCreateInfo {
    /// Owning device
    pub device: vk::Device,
    /// Texel format
    pub format: vk::Format,
    /// Size in texels
    pub extent: vk::Extent2D,
    /// Mip level count
    pub mip_levels: u32,
    /// Memory tiling
    pub tiling: vk::ImageTiling,
    /// Image usage
    pub usage: vk::ImageUsageFlags,
}

impl ImageCreateInfo {
    /// Native create-info for an exclusive single-sample 2D image
    pub fn finalize(&self) -> vk::ImageCreateInfoBuilder<'_> {
        vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .format(self.format)
            .extent(vk::Extent3D {
                width: self.extent.width,
                height: self.extent.height,
                depth: 1,
            })
            .mip_levels(self.mip_levels)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(self.tiling)
            .usage(self.usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
    }
}
