//! Resource kinds and the teardown order between them

use std::fmt;

/// Every kind of native object the lifecycle layer creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// `VkInstance`
    Instance,
    /// `VkDebugUtilsMessengerEXT`
    DebugMessenger,
    /// `VkSurfaceKHR`
    Surface,
    /// `VkPhysicalDevice` selected for the session
    PhysicalDevice,
    /// `VkDevice`
    Device,
    /// `VkQueue` retrieved from the device
    Queue,
    /// `VkCommandPool`
    CommandPool,
    /// `VkCommandBuffer`
    CommandBuffer,
    /// `VkSwapchainKHR`
    SwapChain,
    /// `VkImage` owned by a swap-chain
    SwapChainImage,
    /// `VkImageView`
    ImageView,
    /// `VkRenderPass`
    RenderPass,
    /// `VkDescriptorSetLayout`
    DescriptorSetLayout,
    /// `VkShaderModule`
    ShaderModule,
    /// `VkPipelineLayout`
    PipelineLayout,
    /// `VkPipeline` together with its layout
    Pipeline,
    /// `VkFramebuffer`
    FrameBuffer,
    /// `VkDescriptorPool`
    DescriptorPool,
    /// `VkDescriptorSet`
    DescriptorSet,
    /// `VkSampler`
    Sampler,
    /// `VkSemaphore`
    Semaphore,
    /// `VkFence`
    Fence,
    /// `VkBuffer` with dedicated memory
    Buffer,
    /// `VkImage` with dedicated memory
    Image,
    /// `VkDeviceMemory`
    DeviceMemory,
}

impl ResourceKind {
    /// Order in which [`crate::vulkan::Context::destroy_all`] releases registries.
    ///
    /// Dependents come before the objects they were created from. Swap-chain
    /// images are released together with their swap-chain, shader modules never
    /// outlive pipeline creation and device memory is freed with its owner.
    pub const TEARDOWN_ORDER: [Self; 21] = [
        Self::Fence,
        Self::Semaphore,
        Self::CommandBuffer,
        Self::CommandPool,
        Self::Queue,
        Self::SwapChain,
        Self::Surface,
        Self::FrameBuffer,
        Self::Pipeline,
        Self::DescriptorSet,
        Self::DescriptorPool,
        Self::DescriptorSetLayout,
        Self::RenderPass,
        Self::Sampler,
        Self::ImageView,
        Self::Image,
        Self::Buffer,
        Self::Device,
        Self::PhysicalDevice,
        Self::DebugMessenger,
        Self::Instance,
    ];

    /// Human readable name used in error messages and logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::DebugMessenger => "debug messenger",
            Self::Surface => "surface",
            Self::PhysicalDevice => "physical device",
            Self::Device => "logical device",
            Self::Queue => "queue",
            Self::CommandPool => "command pool",
            Self::CommandBuffer => "command buffer",
            Self::SwapChain => "swap-chain",
            Self::SwapChainImage => "swap-chain image",
            Self::ImageView => "image view",
            Self::RenderPass => "render pass",
            Self::DescriptorSetLayout => "descriptor set layout",
            Self::ShaderModule => "shader module",
            Self::PipelineLayout => "pipeline layout",
            Self::Pipeline => "pipeline",
            Self::FrameBuffer => "frame buffer",
            Self::DescriptorPool => "descriptor pool",
            Self::DescriptorSet => "descriptor set",
            Self::Sampler => "sampler",
            Self::Semaphore => "semaphore",
            Self::Fence => "fence",
            Self::Buffer => "buffer",
            Self::Image => "image",
            Self::DeviceMemory => "device memory",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
