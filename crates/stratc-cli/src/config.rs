//! CLI configuration and settings management
//!
//! Settings live in a `stratc.toml` next to the strategy sources. Every
//! section is optional; defaults assume the conventional layout where the
//! transpiler checkout sits beside the engine crate.

use crate::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration loaded from config files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Source and output locations
    pub paths: PathsConfig,

    /// Target engine settings
    pub engine: EngineConfig,

    /// Code generation settings
    pub codegen: CodegenConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory scanned for Python strategy sources
    pub strategies: PathBuf,

    /// Directory receiving the generated strategy modules
    pub output: PathBuf,

    /// Directory receiving the generated integration tests
    pub tests: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            strategies: PathBuf::from("strategies"),
            output: PathBuf::from("../engine/src/strategies"),
            tests: PathBuf::from("../engine/tests"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Crate name the generated tests import
    pub crate_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            crate_name: "engine".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Emit test scaffolds alongside strategy modules
    pub emit_tests: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self { emit_tests: false }
    }
}

impl CliConfig {
    /// Load configuration from file, falling back to defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }
        let local = Path::new("stratc.toml");
        if local.exists() {
            return Self::load_from_file(local);
        }
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            CliError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }
}
