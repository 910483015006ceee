//! Vulkan device selection and resource lifecycle
//!
//! Organized bottom-up: the [`Driver`] boundary, the [`Factory`] that pairs
//! every create with its destroy, and the [`Context`] that owns what the
//! factory produced and tears it down in dependency order.

/// Error taxonomy and context chaining
pub mod error;

/// Resource kinds and teardown order
pub mod kind;

/// Registry entries and id counters
pub mod resource;

/// Creation parameters kept with every resource
pub mod create_info;

/// Debug messenger callback routing
pub mod debug;

/// Native driver boundary
pub mod driver;

/// Physical device selection
pub mod selection;

/// Memory type and format selection
pub mod memory;

/// Swap-chain parameter negotiation
pub mod swapchain;

/// Create/destroy pairs for every resource kind
pub mod factory;

/// Session-level resource ownership
pub mod context;

pub use context::{Context, Registry};
pub use debug::{DebugLogger, LogFunction};
pub use driver::{AshDriver, Driver};
pub use error::{ResultExt, VulkanError, VulkanResult};
pub use factory::Factory;
pub use kind::ResourceKind;
pub use resource::{
    Buffer, CommandBuffer, CommandPool, DebugMessenger, DescriptorPool, DescriptorSet,
    DescriptorSetLayout, Device, Fence, FrameBuffer, Image, ImageView, Instance, MemoryResource,
    Pipeline, Queue, RenderPass, Resource, Sampler, Semaphore, Shader, Surface, SwapChain,
    SwapChainImage, Tracked,
};
pub use selection::{select_physical_device, PhysicalDevice, QueueFamilyIndexInfo, SwapChainSupportDetails};
