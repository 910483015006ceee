//! Physical device selection
//!
//! Candidates are evaluated in enumeration order against four predicates,
//! short-circuiting on the first failure:
//!
//! 1. every required queue role resolves to a family
//! 2. every required device extension is available
//! 3. the surface (if any) reports formats and present modes
//! 4. sampler anisotropy is supported (if required)
//!
//! The first candidate passing all of them wins.

use ash::vk;
use std::collections::BTreeSet;

use crate::core::config::Configuration;

use super::driver::Driver;
use super::error::{ResultExt, VulkanError, VulkanResult};
use super::kind::ResourceKind;
use super::resource::Tracked;

/// Queue family chosen for each role
///
/// Each role keeps the first family, by index, that supports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueFamilyIndexInfo {
    /// Compute role must resolve
    pub compute_family_required: bool,
    /// First compute-capable family
    pub compute_family: Option<u32>,
    /// Transfer role must resolve
    pub transfer_family_required: bool,
    /// First transfer-capable family
    pub transfer_family: Option<u32>,
    /// Graphics role must resolve
    pub graphics_family_required: bool,
    /// First graphics-capable family
    pub graphics_family: Option<u32>,
    /// Present role must resolve
    pub present_family_required: bool,
    /// First family able to present to the surface
    pub present_family: Option<u32>,
    /// Every required role resolved
    pub complete: bool,
    /// Distinct families among the required roles
    pub unique_queue_family_indices: BTreeSet<u32>,
}

impl QueueFamilyIndexInfo {
    /// Resolve the required roles over `families`.
    ///
    /// Roles that are not required are never scanned and stay `None`.
    /// `present_support` is only consulted when a surface was supplied and is
    /// only called until the present role is resolved.
    pub fn resolve(
        families: &[vk::QueueFamilyProperties],
        configuration: &Configuration,
        mut present_support: Option<&mut dyn FnMut(u32) -> VulkanResult<bool>>,
    ) -> VulkanResult<Self> {
        let mut info = Self {
            compute_family_required: configuration.compute_queue_family_required,
            transfer_family_required: configuration.transfer_queue_family_required,
            graphics_family_required: configuration.graphics_queue_family_required,
            present_family_required: configuration.present_queue_family_required,
            ..Self::default()
        };

        for (index, family) in (0u32..).zip(families) {
            let flags = family.queue_flags;
            if info.compute_family_required
                && info.compute_family.is_none()
                && flags.contains(vk::QueueFlags::COMPUTE)
            {
                info.compute_family = Some(index);
            }
            if info.transfer_family_required
                && info.transfer_family.is_none()
                && flags.contains(vk::QueueFlags::TRANSFER)
            {
                info.transfer_family = Some(index);
            }
            if info.graphics_family_required
                && info.graphics_family.is_none()
                && flags.contains(vk::QueueFlags::GRAPHICS)
            {
                info.graphics_family = Some(index);
            }
            if info.present_family_required && info.present_family.is_none() {
                if let Some(supports) = present_support.as_deref_mut() {
                    if supports(index)? {
                        info.present_family = Some(index);
                    }
                }
            }
        }

        let roles = [
            (info.compute_family_required, info.compute_family),
            (info.transfer_family_required, info.transfer_family),
            (info.graphics_family_required, info.graphics_family),
            (info.present_family_required, info.present_family),
        ];
        info.complete = roles.iter().all(|(required, family)| !required || family.is_some());
        info.unique_queue_family_indices = roles
            .into_iter()
            .filter_map(|(required, family)| family.filter(|_| required))
            .collect();

        Ok(info)
    }

    /// Graphics family, which must have been resolved
    pub fn graphics(&self) -> VulkanResult<u32> {
        self.graphics_family
            .ok_or_else(|| VulkanError::Precondition("no graphics queue family was resolved".to_string()))
    }

    /// Present family, which must have been resolved
    pub fn present(&self) -> VulkanResult<u32> {
        self.present_family
            .ok_or_else(|| VulkanError::Precondition("no present queue family was resolved".to_string()))
    }

    fn missing_roles(&self) -> Vec<&'static str> {
        [
            ("compute", self.compute_family_required, self.compute_family),
            ("transfer", self.transfer_family_required, self.transfer_family),
            ("graphics", self.graphics_family_required, self.graphics_family),
            ("present", self.present_family_required, self.present_family),
        ]
        .into_iter()
        .filter(|(_, required, family)| *required && family.is_none())
        .map(|(role, _, _)| role)
        .collect()
    }
}

/// Surface capabilities of a physical device
#[derive(Debug, Clone, Default)]
pub struct SwapChainSupportDetails {
    /// Image count, extent and transform limits
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapChainSupportDetails {
    /// Query the surface support of `physical_device`
    pub fn query<D: Driver + ?Sized>(
        driver: &D,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Self> {
        Ok(Self {
            capabilities: driver.surface_capabilities(physical_device, surface)?,
            formats: driver.surface_formats(physical_device, surface)?,
            present_modes: driver.surface_present_modes(physical_device, surface)?,
        })
    }

    /// A swap-chain can be built: at least one format and one present mode
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// The physical device chosen for the session
#[derive(Debug, Clone)]
pub struct PhysicalDevice {
    /// Registry id
    pub id: u32,
    /// Native handle, null once released
    pub value: vk::PhysicalDevice,
    /// Queue family mapping
    pub queue_family_index_info: QueueFamilyIndexInfo,
    /// Surface support, present only when selected against a surface
    pub swap_chain_support_details: Option<SwapChainSupportDetails>,
    /// Features reported by the device
    pub features: vk::PhysicalDeviceFeatures,
    /// Properties and limits reported by the device
    pub properties: vk::PhysicalDeviceProperties,
}

impl PhysicalDevice {
    /// The handle, or an error if the device was released
    pub fn handle(&self) -> VulkanResult<vk::PhysicalDevice> {
        if self.value == vk::PhysicalDevice::null() {
            Err(VulkanError::Uninitialized {
                kind: ResourceKind::PhysicalDevice,
                id: self.id,
            })
        } else {
            Ok(self.value)
        }
    }

    /// Device name as reported by the driver
    pub fn name(&self) -> String {
        device_name(&self.properties)
    }

    /// Surface support, which only exists when the device was selected against a surface
    pub fn swap_chain_support(&self) -> VulkanResult<&SwapChainSupportDetails> {
        self.swap_chain_support_details.as_ref().ok_or_else(|| {
            VulkanError::Precondition(format!("{} was selected without a surface", self.name()))
        })
    }

    /// Re-query surface support, needed before recreating a swap-chain
    pub fn refresh_swap_chain_support<D: Driver + ?Sized>(
        &mut self,
        driver: &D,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<()> {
        let details = SwapChainSupportDetails::query(driver, self.handle()?, surface)
            .context("re-query swap-chain support")?;
        self.swap_chain_support_details = Some(details);
        Ok(())
    }

    pub(crate) fn release(&mut self) -> Option<vk::PhysicalDevice> {
        let value = self.handle().ok()?;
        self.value = vk::PhysicalDevice::null();
        self.queue_family_index_info = QueueFamilyIndexInfo::default();
        self.swap_chain_support_details = None;
        Some(value)
    }
}

impl Tracked for PhysicalDevice {
    fn id(&self) -> u32 {
        self.id
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::PhysicalDevice
    }

    fn is_live(&self) -> bool {
        self.value != vk::PhysicalDevice::null()
    }
}

fn device_name(properties: &vk::PhysicalDeviceProperties) -> String {
    let bytes: Vec<u8> = properties
        .device_name
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c.to_ne_bytes()[0])
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

enum Evaluation {
    Suitable(PhysicalDevice),
    Rejected(String),
}

/// Select the first physical device that satisfies `configuration`.
///
/// The returned device has id 0; the factory assigns the registry id.
pub fn select_physical_device<D: Driver + ?Sized>(
    driver: &D,
    instance: vk::Instance,
    configuration: &Configuration,
    surface: Option<vk::SurfaceKHR>,
) -> VulkanResult<PhysicalDevice> {
    if configuration.present_queue_family_required && surface.is_none() {
        return Err(VulkanError::Precondition(
            "a present queue family is required but no surface was supplied".to_string(),
        ));
    }

    let candidates = driver
        .enumerate_physical_devices(instance)
        .context("enumerate physical devices")?;
    if candidates.is_empty() {
        return Err(VulkanError::NoSuitableDevice(
            "no physical devices with Vulkan support".to_string(),
        ));
    }

    for &candidate in &candidates {
        match evaluate_device(driver, candidate, configuration, surface)? {
            Evaluation::Suitable(device) => {
                log::info!("Selected GPU: {}", device.name());
                return Ok(device);
            }
            Evaluation::Rejected(reason) => log::debug!("Rejected GPU: {reason}"),
        }
    }

    Err(VulkanError::NoSuitableDevice(format!(
        "none of {} physical device(s) satisfies the configuration",
        candidates.len()
    )))
}

fn evaluate_device<D: Driver + ?Sized>(
    driver: &D,
    device: vk::PhysicalDevice,
    configuration: &Configuration,
    surface: Option<vk::SurfaceKHR>,
) -> VulkanResult<Evaluation> {
    let properties = driver.physical_device_properties(device)?;
    let name = device_name(&properties);
    let context = || format!("evaluate physical device {name}");

    let families = driver.queue_family_properties(device).context(context())?;
    let mut present_support =
        |index: u32| surface.map_or(Ok(false), |surface| driver.surface_support(device, index, surface));
    let present_query: Option<&mut dyn FnMut(u32) -> VulkanResult<bool>> = if surface.is_some() {
        Some(&mut present_support)
    } else {
        None
    };
    let queue_family_index_info =
        QueueFamilyIndexInfo::resolve(&families, configuration, present_query).context(context())?;
    if !queue_family_index_info.complete {
        return Ok(Evaluation::Rejected(format!(
            "{name} has no queue family for {}",
            queue_family_index_info.missing_roles().join(", ")
        )));
    }

    let available: BTreeSet<String> = driver.device_extensions(device).context(context())?.into_iter().collect();
    let missing: Vec<&str> = configuration
        .device_extensions
        .iter()
        .filter(|required| !available.contains(*required))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Ok(Evaluation::Rejected(format!(
            "{name} lacks device extensions {}",
            missing.join(", ")
        )));
    }

    let swap_chain_support_details = match surface {
        Some(surface) => {
            let details = SwapChainSupportDetails::query(driver, device, surface).context(context())?;
            if !details.is_adequate() {
                return Ok(Evaluation::Rejected(format!(
                    "{name} reports no surface formats or present modes"
                )));
            }
            Some(details)
        }
        None => None,
    };

    let features = driver.physical_device_features(device).context(context())?;
    if configuration.anisotropy_required && features.sampler_anisotropy != vk::TRUE {
        return Ok(Evaluation::Rejected(format!(
            "{name} does not support sampler anisotropy"
        )));
    }

    Ok(Evaluation::Suitable(PhysicalDevice {
        id: 0,
        value: device,
        queue_family_index_info,
        swap_chain_support_details,
        features,
        properties,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vulkan::driver::mock::{MockDriver, MockPhysicalDevice};
    use ash::vk::Handle;

    fn surface() -> Option<vk::SurfaceKHR> {
        Some(vk::SurfaceKHR::from_raw(0xabc))
    }

    fn instance() -> vk::Instance {
        vk::Instance::from_raw(0x1)
    }

    #[test]
    fn test_single_family_serves_graphics_and_present() {
        let mut device = MockPhysicalDevice::discrete();
        device.extensions = vec!["VK_X_test".to_string()];
        let driver = MockDriver::new(vec![device]);
        let configuration = Configuration::default()
            .with_required_queues(false, false, true, true)
            .with_device_extensions(["VK_X_test"])
            .with_anisotropy(false);

        let selected = select_physical_device(&driver, instance(), &configuration, surface()).unwrap();
        let info = &selected.queue_family_index_info;

        assert_eq!(info.graphics_family, Some(0));
        assert_eq!(info.present_family, Some(0));
        assert!(info.complete);
        assert_eq!(info.unique_queue_family_indices, BTreeSet::from([0]));
    }

    #[test]
    fn test_missing_anisotropy_is_a_selection_failure() {
        let mut device = MockPhysicalDevice::discrete();
        device.features.sampler_anisotropy = vk::FALSE;
        let driver = MockDriver::new(vec![device]);

        let error = select_physical_device(&driver, instance(), &Configuration::default(), surface()).unwrap_err();
        assert!(error.is_selection_failure());
    }

    #[test]
    fn test_present_without_surface_fails_before_enumeration() {
        let driver = MockDriver::new(vec![MockPhysicalDevice::discrete()]);

        let error = select_physical_device(&driver, instance(), &Configuration::default(), None).unwrap_err();
        assert!(error.is_precondition_failure());
        assert_eq!(driver.enumeration_count(), 0);
    }

    #[test]
    fn test_no_devices() {
        let driver = MockDriver::new(Vec::new());
        let error = select_physical_device(&driver, instance(), &Configuration::headless(), None).unwrap_err();
        assert!(error.is_selection_failure());
    }

    #[test]
    fn test_selection_is_deterministic_and_first_fit() {
        let mut without_swapchain = MockPhysicalDevice::discrete();
        without_swapchain.extensions.clear();
        let driver = MockDriver::new(vec![
            without_swapchain,
            MockPhysicalDevice::discrete(),
            MockPhysicalDevice::discrete(),
        ]);
        let configuration = Configuration::default();

        let first = select_physical_device(&driver, instance(), &configuration, surface()).unwrap();
        let second = select_physical_device(&driver, instance(), &configuration, surface()).unwrap();

        assert_eq!(first.value, driver.physical_device_handle(1));
        assert_eq!(first.value, second.value);
        assert_eq!(first.queue_family_index_info, second.queue_family_index_info);
    }

    #[test]
    fn test_first_matching_family_wins() {
        let mut device = MockPhysicalDevice::discrete();
        device.queue_families = vec![
            vk::QueueFlags::TRANSFER,
            vk::QueueFlags::GRAPHICS,
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE,
            vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
        ];
        device.present_families = vec![2, 3];
        let driver = MockDriver::new(vec![device]);

        let selected = select_physical_device(&driver, instance(), &Configuration::default(), surface()).unwrap();
        let info = selected.queue_family_index_info;

        assert_eq!(info.transfer_family, Some(0));
        assert_eq!(info.graphics_family, Some(1));
        assert_eq!(info.compute_family, Some(2));
        assert_eq!(info.present_family, Some(2));
        assert_eq!(info.unique_queue_family_indices, BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn test_unique_indices_cover_each_resolved_role_once() {
        let mut device = MockPhysicalDevice::discrete();
        device.queue_families = vec![vk::QueueFlags::GRAPHICS, vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER];
        device.present_families = vec![0];
        let driver = MockDriver::new(vec![device]);

        let selected = select_physical_device(&driver, instance(), &Configuration::default(), surface()).unwrap();
        let info = selected.queue_family_index_info;
        let resolved: BTreeSet<u32> = [info.compute_family, info.transfer_family, info.graphics_family, info.present_family]
            .into_iter()
            .flatten()
            .collect();

        assert_eq!(info.unique_queue_family_indices, resolved);
        assert_eq!(info.unique_queue_family_indices.len(), 2);
    }

    #[test]
    fn test_roles_that_are_not_required_are_not_scanned() {
        let mut device = MockPhysicalDevice::discrete();
        device.queue_families = vec![vk::QueueFlags::GRAPHICS, vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER];
        device.present_families = vec![0];
        let driver = MockDriver::new(vec![device]);
        let configuration = Configuration::default().with_required_queues(false, false, true, true);

        let selected = select_physical_device(&driver, instance(), &configuration, surface()).unwrap();
        let info = selected.queue_family_index_info;

        assert_eq!(info.compute_family, None);
        assert_eq!(info.transfer_family, None);
        assert_eq!(info.graphics_family, Some(0));
        assert_eq!(info.present_family, Some(0));
        assert!(info.complete);
        // graphics and present share family 0
        assert_eq!(info.unique_queue_family_indices, BTreeSet::from([0]));
        assert!(info.unique_queue_family_indices.len() < 2);
    }

    #[test]
    fn test_present_is_not_scanned_unless_required() {
        let families = [vk::QueueFamilyProperties {
            queue_flags: vk::QueueFlags::GRAPHICS,
            queue_count: 1,
            ..Default::default()
        }];
        let configuration = Configuration::default().with_required_queues(false, false, true, false);
        let mut queried = 0;
        let mut supports = |_: u32| -> VulkanResult<bool> {
            queried += 1;
            Ok(true)
        };

        let info = QueueFamilyIndexInfo::resolve(&families, &configuration, Some(&mut supports)).unwrap();

        assert_eq!(queried, 0);
        assert_eq!(info.present_family, None);
        assert_eq!(info.unique_queue_family_indices, BTreeSet::from([0]));
    }

    #[test]
    fn test_inadequate_surface_rejects_device() {
        let mut device = MockPhysicalDevice::discrete();
        device.present_modes.clear();
        let driver = MockDriver::new(vec![device]);

        let error = select_physical_device(&driver, instance(), &Configuration::default(), surface()).unwrap_err();
        assert!(error.is_selection_failure());
    }

    #[test]
    fn test_headless_selection_has_no_swap_chain_details() {
        let mut device = MockPhysicalDevice::discrete();
        device.present_families.clear();
        let driver = MockDriver::new(vec![device]);

        let selected = select_physical_device(&driver, instance(), &Configuration::headless(), None).unwrap();
        assert!(selected.swap_chain_support_details.is_none());
        assert_eq!(selected.queue_family_index_info.present_family, None);
        assert!(selected.swap_chain_support().is_err());
    }

    #[test]
    fn test_refresh_swap_chain_support() {
        let driver = MockDriver::new(vec![MockPhysicalDevice::discrete()]);
        let mut selected = select_physical_device(&driver, instance(), &Configuration::default(), surface()).unwrap();
        selected.swap_chain_support_details = None;

        selected.refresh_swap_chain_support(&driver, vk::SurfaceKHR::from_raw(0xabc)).unwrap();
        assert!(selected.swap_chain_support().unwrap().is_adequate());
        assert_eq!(selected.name(), "Mock Discrete GPU");
    }
}
