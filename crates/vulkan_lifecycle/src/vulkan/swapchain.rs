//! Swap-chain negotiation
//!
//! Pure choices over the capability data queried during device selection.

use ash::vk;

use super::error::{VulkanError, VulkanResult};

/// Prefer `B8G8R8A8_SRGB` with the sRGB non-linear color space, else the first format.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> VulkanResult<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|sf| {
            sf.format == vk::Format::B8G8R8A8_SRGB && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
        .ok_or_else(|| VulkanError::Precondition("surface reports no formats".to_string()))
}

/// Mailbox when available, otherwise FIFO which every driver must support.
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    present_modes
        .iter()
        .copied()
        .find(|&mode| mode == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// The surface's current extent, or the requested size clamped to the surface limits
/// when the surface lets the swap-chain decide (`current_extent.width == u32::MAX`).
///
/// The maximum wins when a surface reports limits that cross, as a minimized
/// window can.
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        let (min, max) = (capabilities.min_image_extent, capabilities.max_image_extent);
        vk::Extent2D {
            width: width.max(min.width).min(max.width),
            height: height.max(min.height).min(max.height),
        }
    }
}

/// One more than the minimum, capped by the maximum when the surface has one.
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    }
}

/// Concurrent sharing across both families when graphics and present differ.
pub fn choose_sharing(graphics_family: u32, present_family: u32) -> (vk::SharingMode, Vec<u32>) {
    if graphics_family == present_family {
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    } else {
        (vk::SharingMode::CONCURRENT, vec![graphics_family, present_family])
    }
}
