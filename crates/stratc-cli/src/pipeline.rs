//! Compilation pipeline from Python strategy source to Rust artifacts
//!
//! Stages run in a fixed order: parse and extract metadata, validate,
//! fold Option guards, analyze locals, then generate the module and its
//! test scaffold. Every stage contributes to one `DiagnosticReport` so a
//! caller renders findings the same way regardless of where they arose.

use std::path::Path;

use stratc_core::diagnostics::{Diagnostic, DiagnosticReport};
use stratc_core::meta::StrategyMetadata;
use stratc_core::passes::{analyze_locals, fold_option_guards};
use stratc_python::{validate, PythonFrontend};
use stratc_rust::{RustGenerator, TestGenerator};
use tracing::{debug, info, warn};

use crate::config::CliConfig;

/// Everything generated for one transpilable strategy.
pub struct CompiledStrategy {
    pub meta: StrategyMetadata,
    pub rust_code: String,
    pub test_code: String,
}

pub enum CompileOutcome {
    Compiled(Box<CompiledStrategy>),
    /// The strategy opted out with `transpilable=False`.
    Skipped { name: String },
}

pub struct Pipeline {
    engine_crate: String,
    force: bool,
}

impl Pipeline {
    /// `force` lets generation run past validation errors; the output is
    /// then best effort and may carry placeholder comments.
    pub fn new(config: &CliConfig, force: bool) -> Self {
        Self {
            engine_crate: config.engine.crate_name.clone(),
            force,
        }
    }

    /// Compiles one strategy source. Validation errors block generation
    /// unless the pipeline was forced; warnings never block.
    pub fn compile_source(
        &self,
        source: &str,
        path: Option<&Path>,
    ) -> DiagnosticReport<CompileOutcome> {
        let parsed = match PythonFrontend::parse(source, path) {
            Ok(parsed) => parsed,
            Err(err) => {
                return DiagnosticReport::failure(vec![Diagnostic::error(err.to_string())])
            }
        };
        let meta = parsed.metadata().clone();
        if !meta.transpilable {
            debug!(strategy = %meta.name, "marked transpilable=False, skipping");
            return DiagnosticReport::success(CompileOutcome::Skipped { name: meta.name });
        }

        let mut diagnostics = validate(&parsed);
        if diagnostics.iter().any(Diagnostic::is_error) {
            if !self.force {
                return DiagnosticReport::failure(diagnostics);
            }
            warn!(strategy = %meta.name, "compiling past validation errors");
        }

        let (tree, fold_diagnostics) = fold_option_guards(parsed.lower());
        diagnostics.extend(fold_diagnostics);

        let usage = analyze_locals(&tree, &meta);
        let rust_code = RustGenerator::new(&meta, &usage).generate(&tree);
        let test_code = TestGenerator::new(&meta, &self.engine_crate).generate();
        info!(strategy = %meta.name, struct_name = %meta.struct_name(), "compiled");

        DiagnosticReport::success_with_diagnostics(
            CompileOutcome::Compiled(Box::new(CompiledStrategy {
                meta,
                rust_code,
                test_code,
            })),
            diagnostics,
        )
    }

    /// Parses and validates without generating code.
    pub fn check_source(
        &self,
        source: &str,
        path: Option<&Path>,
    ) -> DiagnosticReport<StrategyMetadata> {
        let parsed = match PythonFrontend::parse(source, path) {
            Ok(parsed) => parsed,
            Err(err) => {
                return DiagnosticReport::failure(vec![Diagnostic::error(err.to_string())])
            }
        };
        let meta = parsed.metadata().clone();
        let diagnostics = validate(&parsed);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return DiagnosticReport::failure(diagnostics);
        }
        DiagnosticReport::success_with_diagnostics(meta, diagnostics)
    }
}
