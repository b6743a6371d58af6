//! Rebuilds the engine's `strategies/mod.rs` from the generated modules
//! on disk.
//!
//! The registry is derived from file contents rather than compile state:
//! each module is scanned for its public struct, and an empty `tokens`
//! vector marks the strategy as discovery-driven. Scanning keeps the
//! registry correct even when modules were generated by older runs.

use std::fs;
use std::path::Path;

use itertools::Itertools;
use regex::Regex;
use stratc_core::tracing::debug;
use stratc_core::{Error, Result};

/// What the registry records about one generated strategy module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFileInfo {
    /// Module name, the file stem of the generated `.rs` file.
    pub module: String,
    /// The `pub struct` the module exports.
    pub struct_name: String,
    /// True when the module subscribes to no tokens and expects the
    /// engine to feed it discovered markets.
    pub requires_market_discovery: bool,
}

/// Extracts registry facts from a single generated module. Returns
/// `Ok(None)` when the file exports no public struct, which excludes
/// helper files from the registry.
pub fn scan_strategy_file(path: &Path) -> Result<Option<StrategyFileInfo>> {
    let struct_pattern =
        Regex::new(r"pub struct (\w+)\s*\{").map_err(|e| Error::Generic(e.to_string()))?;
    let empty_tokens =
        Regex::new(r"tokens:\s*vec!\[\s*\]").map_err(|e| Error::Generic(e.to_string()))?;

    let source = fs::read_to_string(path)?;
    let Some(captures) = struct_pattern.captures(&source) else {
        debug!(path = %path.display(), "no public struct, skipping");
        return Ok(None);
    };
    let module = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| Error::Generic(format!("unreadable file name: {}", path.display())))?
        .to_string();

    Ok(Some(StrategyFileInfo {
        module,
        struct_name: captures[1].to_string(),
        requires_market_discovery: empty_tokens.is_match(&source),
    }))
}

/// Scans `dir` for strategy modules and renders a fresh `mod.rs`. The
/// caller decides where and how to write the result.
pub fn generate_mod_rs(dir: &Path) -> Result<String> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_module = path.extension().is_some_and(|ext| ext == "rs")
            && path.file_name().is_some_and(|name| name != "mod.rs");
        if !is_module {
            continue;
        }
        if let Some(info) = scan_strategy_file(&path)? {
            entries.push(info);
        }
    }
    entries.sort_by(|a, b| a.module.cmp(&b.module));
    debug!(count = entries.len(), "rendering strategy registry");
    Ok(render_mod_rs(&entries))
}

fn render_mod_rs(entries: &[StrategyFileInfo]) -> String {
    let mut out = String::from(
        "//! Auto-generated strategy registry - DO NOT EDIT MANUALLY\n\
         //! Regenerate with `stratc compile --all`\n\n",
    );
    for info in entries {
        out.push_str(&format!("mod {};\n", info.module));
    }
    out.push_str("\nuse std::collections::HashMap;\n\nuse crate::strategy::Strategy;\n\n");
    for info in entries {
        out.push_str(&format!("pub use {}::{};\n", info.module, info.struct_name));
    }
    out.push_str("\n/// Everything the engine needs to run one registered strategy.\n");
    out.push_str("pub struct StrategyInfo {\n");
    out.push_str("    /// Builds a fresh boxed instance.\n");
    out.push_str("    pub factory: fn() -> Box<dyn Strategy>,\n");
    out.push_str("    /// True when the strategy subscribes to nothing and relies on\n");
    out.push_str("    /// the market scanner to populate its context.\n");
    out.push_str("    pub requires_market_discovery: bool,\n");
    out.push_str("}\n\n");
    out.push_str("pub fn registry() -> HashMap<&'static str, StrategyInfo> {\n");
    out.push_str("    let mut strategies: HashMap<&'static str, StrategyInfo> = HashMap::new();\n");
    let inserts = entries
        .iter()
        .map(|info| {
            format!(
                "    strategies.insert(\n        \"{module}\",\n        StrategyInfo {{\n            factory: || Box::new({module}::{struct_name}::new()),\n            requires_market_discovery: {discovery},\n        }},\n    );",
                module = info.module,
                struct_name = info.struct_name,
                discovery = info.requires_market_discovery,
            )
        })
        .join("\n");
    if !inserts.is_empty() {
        out.push_str(&inserts);
        out.push('\n');
    }
    out.push_str("    strategies\n}\n");
    out
}
