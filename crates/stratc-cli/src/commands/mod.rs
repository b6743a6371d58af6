//! Command implementations for the stratc CLI

pub mod compile;
pub mod validate;

// Re-export command functions
pub use compile::compile_command;
pub use validate::validate_command;
