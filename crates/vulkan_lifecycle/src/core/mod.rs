//! Core session types

pub mod config;

pub use config::Configuration;
