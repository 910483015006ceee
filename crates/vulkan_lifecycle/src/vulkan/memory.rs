//! Memory type and format selection

use ash::vk;

use super::driver::Driver;
use super::error::{VulkanError, VulkanResult};

/// Depth formats tried by [`find_depth_format`], most precise first
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// First memory type allowed by `type_filter` whose flags contain `properties`
pub fn select_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
) -> VulkanResult<u32> {
    let count = memory_properties
        .memory_type_count
        .min(vk::MAX_MEMORY_TYPES as u32);

    (0..count)
        .find(|&i| {
            (type_filter & (1 << i)) != 0
                && memory_properties.memory_types[i as usize]
                    .property_flags
                    .contains(properties)
        })
        .ok_or(VulkanError::NoSuitableMemoryType {
            type_filter,
            properties,
        })
}

/// Find memory type with required properties
pub fn find_memory_type<D: Driver + ?Sized>(
    driver: &D,
    physical_device: vk::PhysicalDevice,
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
) -> VulkanResult<u32> {
    let memory_properties = driver.memory_properties(physical_device)?;
    select_memory_type(&memory_properties, type_filter, properties)
}

/// First candidate whose tiling-specific features contain `features`
pub fn find_supported_format<D: Driver + ?Sized>(
    driver: &D,
    physical_device: vk::PhysicalDevice,
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
) -> VulkanResult<vk::Format> {
    for &format in candidates {
        let properties = driver.format_properties(physical_device, format)?;
        let supported = match tiling {
            vk::ImageTiling::LINEAR => properties.linear_tiling_features,
            vk::ImageTiling::OPTIMAL => properties.optimal_tiling_features,
            _ => vk::FormatFeatureFlags::empty(),
        };
        if supported.contains(features) {
            return Ok(format);
        }
    }
    Err(VulkanError::NoSupportedFormat(candidates.to_vec()))
}

/// Optimal-tiling depth/stencil attachment format
pub fn find_depth_format<D: Driver + ?Sized>(
    driver: &D,
    physical_device: vk::PhysicalDevice,
) -> VulkanResult<vk::Format> {
    find_supported_format(
        driver,
        physical_device,
        &DEPTH_FORMAT_CANDIDATES,
        vk::ImageTiling::OPTIMAL,
        vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
    )
}

/// Whether `format` carries a stencil component
pub fn has_stencil_component(format: vk::Format) -> bool {
    format == vk::Format::D32_SFLOAT_S8_UINT || format == vk::Format::D24_UNORM_S8_UINT
}
