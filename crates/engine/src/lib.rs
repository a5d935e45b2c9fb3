//! LoopForge engine facade.

#[cfg(feature = "cli")]
pub mod cli;
pub mod engine;
pub mod suite;

#[cfg(feature = "cli")]
pub use cli::*;
pub use engine::*;
pub use suite::*;
