//! stratc CLI library
//!
//! This crate wires the Python frontend, the validation passes, and the
//! Rust code generator into the `stratc` command-line tool that keeps an
//! engine's `src/strategies/` directory in sync with the Python sources.

pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod pipeline;
pub mod utils;

// CLI-specific error handling
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum CliError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Compilation error: {0}")]
        Compilation(String),

        #[error("Invalid input: {0}")]
        InvalidInput(String),
    }

    impl From<stratc_core::Error> for CliError {
        fn from(err: stratc_core::Error) -> Self {
            CliError::Compilation(err.to_string())
        }
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};
