//! Foundation utilities shared by the Vulkan layer

pub mod logging;
