//! Tree rewriting and analysis passes
//!
//! These run between lowering and code generation: guard folding rewrites
//! optional-access idioms into single unwrap nodes, and local analysis
//! collects the declaration facts the generator needs up front.

pub mod locals;
pub mod unwrap;

pub use locals::*;
pub use unwrap::*;
