//! Loop source generation, shape detection, and rewriting for LoopForge.

pub mod detect;
pub mod enhancer;
pub mod optimizer;
pub mod shape;
pub mod templates;

pub use detect::*;
pub use enhancer::*;
pub use optimizer::*;
pub use shape::*;
