pub mod ast;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod meta;
pub mod passes;

// Re-export commonly used items for convenience
pub use tracing;

pub use diagnostics::{Diagnostic, DiagnosticReport, Severity};
pub use meta::{ParamValue, StrategyMetadata};

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
