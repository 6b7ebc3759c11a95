//! Core types and configuration for lumber.
//!
//! This crate provides the shared data structures used across the lumber
//! workspace: the per-container descriptor, the prefix color palette, and
//! the registry of containers currently being followed.

mod config;
mod descriptor;
mod error;
mod palette;
mod registry;

pub use config::Config;
pub use descriptor::ContainerDescriptor;
pub use error::{Error, Result};
pub use palette::Palette;
pub use registry::{StyledPrefix, WatchRegistry};
