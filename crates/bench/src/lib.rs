//! Empirical benchmarking of iteration strategies for LoopForge.

pub mod runner;
pub mod runners;
pub mod workload;

pub use runner::*;
pub use runners::*;
pub use workload::*;
