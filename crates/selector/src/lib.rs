//! Cost-model estimation and strategy ranking for LoopForge.

pub mod estimator;
pub mod recommend;
pub mod selector;

pub use estimator::*;
pub use recommend::*;
pub use selector::*;
