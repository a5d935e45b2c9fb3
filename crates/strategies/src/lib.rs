//! Strategy catalog and shared vocabulary for LoopForge.

pub mod context;
pub mod profile;
pub mod registry;
pub mod strategy;

pub use context::*;
pub use profile::*;
pub use registry::*;
pub use strategy::*;
