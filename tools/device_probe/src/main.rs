//! Headless device probe
//!
//! Creates an instance, selects a physical device against the given
//! configuration and prints what was chosen. With `--smoke` it also creates
//! the logical device and round-trips a small host-visible buffer.

use anyhow::{Context as _, Result};
use ash::vk;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

use vulkan_lifecycle::config::Config;
use vulkan_lifecycle::core::Configuration;
use vulkan_lifecycle::foundation::logging;
use vulkan_lifecycle::vulkan::{AshDriver, Context, Driver, PhysicalDevice};

fn main() -> Result<()> {
    let matches = Command::new("device_probe")
        .about("Selects a Vulkan physical device and reports it")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Session configuration (.toml or .ron); headless defaults otherwise"),
        )
        .arg(
            Arg::new("validation")
                .long("validation")
                .help("Enable validation layers and the debug messenger")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("smoke")
                .long("smoke")
                .help("Create the logical device and write a test buffer")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("write-config")
                .long("write-config")
                .value_name("FILE")
                .help("Write the effective configuration to FILE and exit"),
        )
        .get_matches();

    logging::init();

    let mut configuration = match matches.get_one::<String>("config") {
        Some(path) => Configuration::load_from_file(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => Configuration::headless().with_validation(false),
    };
    if matches.get_flag("validation") {
        configuration = configuration.with_validation(true);
    }
    configuration.validate()?;

    if let Some(path) = matches.get_one::<String>("write-config") {
        configuration.save_to_file(PathBuf::from(path))?;
        println!("Wrote {path}");
        return Ok(());
    }

    if let Ok(executable) = std::env::current_exe() {
        if let Some(dir) = executable.parent() {
            Configuration::apply_environment_variables(dir);
        }
    }

    let driver = AshDriver::load()?;
    let mut context = Context::new(driver, configuration);
    let probed = probe(&mut context, matches.get_flag("smoke"));
    let teardown = context.destroy_all();

    // Report the probe failure first; teardown errors only matter on success
    if let Err(error) = probed {
        log::error!("{}", error.report());
        return Err(error).context("device probe failed");
    }
    teardown.map_err(|error| anyhow::anyhow!(error.report()))
}

fn probe<D: Driver>(context: &mut Context<D>, smoke: bool) -> vulkan_lifecycle::vulkan::VulkanResult<()> {
    context.create_instance()?;
    if context.configuration().validation_layers_enabled {
        context.create_debug_messenger()?;
    }

    let physical_device = context.create_physical_device()?;
    print_device(physical_device);
    if !smoke {
        return Ok(());
    }

    let graphics = physical_device.queue_family_index_info.graphics()?;
    context.create_device()?;
    context.create_queue(graphics, 0)?;

    let values: Vec<u32> = (0..64).collect();
    let buffer = context
        .create_buffer(
            std::mem::size_of_val(values.as_slice()) as vk::DeviceSize,
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?
        .id;
    context.write_buffer(buffer, &values)?;
    context.destroy_buffer(buffer, false)?;
    println!("Smoke test passed");
    Ok(())
}

fn print_device(physical_device: &PhysicalDevice) {
    let families = &physical_device.queue_family_index_info;
    let show = |family: Option<u32>| family.map_or_else(|| "-".to_string(), |index| index.to_string());
    let limits = &physical_device.properties.limits;

    println!("Selected: {}", physical_device.name());
    println!("  type:                {:?}", physical_device.properties.device_type);
    println!(
        "  api version:         {}.{}.{}",
        vk::api_version_major(physical_device.properties.api_version),
        vk::api_version_minor(physical_device.properties.api_version),
        vk::api_version_patch(physical_device.properties.api_version),
    );
    println!("  graphics family:     {}", show(families.graphics_family));
    println!("  compute family:      {}", show(families.compute_family));
    println!("  transfer family:     {}", show(families.transfer_family));
    println!("  present family:      {}", show(families.present_family));
    println!("  max anisotropy:      {}", limits.max_sampler_anisotropy);
    println!("  max 2D image size:   {}", limits.max_image_dimension2_d);
}
