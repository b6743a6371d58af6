//! Rust emission for compiled strategies: the strategy module itself, the
//! integration test scaffold, and the registry that wires modules into the
//! engine build.

pub mod codegen;
pub mod params;
pub mod registry;
pub mod testgen;

pub use codegen::RustGenerator;
pub use registry::{generate_mod_rs, scan_strategy_file, StrategyFileInfo};
pub use testgen::{Archetype, TestGenerator};
