//! # Vulkan Lifecycle
//!
//! Device selection and GPU resource lifecycle management on top of `ash`.
//!
//! ## Features
//!
//! - **Device Selection**: Picks the first physical device that satisfies the session configuration
//! - **Paired Create/Destroy**: Every resource kind has an idempotent destroy
//! - **Ordered Teardown**: The context destroys everything children-first
//! - **Error Context**: Failures carry the chain of operations that led to them
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vulkan_lifecycle::core::Configuration;
//! use vulkan_lifecycle::vulkan::{AshDriver, Context};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     vulkan_lifecycle::foundation::logging::init();
//!
//!     let driver = AshDriver::load()?;
//!     let mut context = Context::new(driver, Configuration::headless());
//!     context.create_instance()?;
//!     let name = context.create_physical_device()?.name();
//!     println!("Selected {name}");
//!     context.destroy_all()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Session configuration
pub mod core;
pub mod config;

// Shared utilities
pub mod foundation;

// Device selection and resource lifecycle
pub mod vulkan;
