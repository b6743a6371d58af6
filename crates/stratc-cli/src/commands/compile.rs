//! Strategy compilation command implementation

use crate::config::CliConfig;
use crate::diagnostics::print_finding_summary;
use crate::pipeline::{CompileOutcome, Pipeline};
use crate::utils::file_utils::FileUtils;
use crate::{CliError, Result};
use clap::Args;
use console::style;
use std::fs;
use std::path::{Path, PathBuf};
use stratc_rust::{generate_mod_rs, TestGenerator};
use tracing::debug;

/// Arguments for the compile command
#[derive(Debug, Clone, Args)]
pub struct CompileArgs {
    /// Strategy to compile, the file stem under the strategies directory
    pub name: Option<String>,

    /// Compile every strategy in the strategies directory
    #[arg(long)]
    pub all: bool,

    /// Recompile up-to-date strategies and generate past validation errors
    #[arg(long)]
    pub force: bool,

    /// Also write integration test scaffolds
    #[arg(long)]
    pub emit_tests: bool,
}

/// Execute the compile command
pub fn compile_command(args: CompileArgs, config: &CliConfig) -> Result<()> {
    let sources = select_sources(&args, config)?;
    let pipeline = Pipeline::new(config, args.force);
    let emit_tests = args.emit_tests || config.codegen.emit_tests;

    let mut compiled = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    let mut wrote_module = false;
    let mut wrote_discovery_tests = false;

    for path in &sources {
        let display = path.display().to_string();

        if !args.force && is_up_to_date(path, &config.paths.output) {
            debug!(source = %path.display(), "output newer than source, skipping");
            println!("{} {} up to date", style("-").dim(), display);
            skipped += 1;
            continue;
        }

        let source = fs::read_to_string(path)?;
        let report = pipeline.compile_source(&source, Some(path));
        for finding in &report.diagnostics {
            print_finding_summary(&display, finding);
        }

        match report.value {
            None => {
                println!("{} {} failed", style("✗").red(), display);
                failed += 1;
            }
            Some(CompileOutcome::Skipped { name }) => {
                println!(
                    "{} {} skipped (transpilable=False)",
                    style("-").dim(),
                    name
                );
                skipped += 1;
            }
            Some(CompileOutcome::Compiled(strategy)) => {
                let out_path = config
                    .paths
                    .output
                    .join(format!("{}.rs", strategy.meta.name));
                FileUtils::write_atomic(&out_path, &strategy.rust_code)?;
                if emit_tests {
                    let test_path = config
                        .paths
                        .tests
                        .join(format!("{}_test.rs", strategy.meta.name));
                    FileUtils::write_atomic(&test_path, &strategy.test_code)?;
                    wrote_discovery_tests |= strategy.meta.is_dynamic_discovery();
                }
                println!(
                    "{} {} -> {}",
                    style("✓").green(),
                    strategy.meta.name,
                    out_path.display()
                );
                compiled += 1;
                wrote_module = true;
            }
        }
    }

    // discovery scaffolds share one fixtures module
    if wrote_discovery_tests {
        let fixtures_path = config.paths.tests.join("fixtures.rs");
        FileUtils::write_atomic(
            &fixtures_path,
            &TestGenerator::fixtures_module(&config.engine.crate_name),
        )?;
    }

    // the registry is rebuilt from the output directory as a whole, so
    // strategies compiled in earlier runs stay registered
    if wrote_module {
        let mod_rs = generate_mod_rs(&config.paths.output)?;
        let mod_path = config.paths.output.join("mod.rs");
        FileUtils::write_atomic(&mod_path, &mod_rs)?;
        println!(
            "{} regenerated {}",
            style("✓").green(),
            mod_path.display()
        );
    }

    if failed > 0 {
        return Err(CliError::Compilation(format!(
            "{} of {} strategies failed",
            failed,
            sources.len()
        )));
    }

    println!(
        "{} compiled {} strategies ({} skipped)",
        style("✓").green(),
        compiled,
        skipped
    );
    Ok(())
}

fn select_sources(args: &CompileArgs, config: &CliConfig) -> Result<Vec<PathBuf>> {
    match (&args.name, args.all) {
        (Some(_), true) => Err(CliError::InvalidInput(
            "Pass a strategy name or --all, not both".to_string(),
        )),
        (None, false) => Err(CliError::InvalidInput(
            "Pass a strategy name or --all".to_string(),
        )),
        (Some(name), false) => {
            let path = config.paths.strategies.join(format!("{name}.py"));
            if !path.exists() {
                return Err(CliError::InvalidInput(format!(
                    "No strategy named '{}' under {}",
                    name,
                    config.paths.strategies.display()
                )));
            }
            Ok(vec![path])
        }
        (None, true) => FileUtils::find_strategy_files(&config.paths.strategies),
    }
}

/// Fast path when the generated module is already newer than its source.
/// The check assumes the decorator name matches the file stem; when it
/// does not, the miss only costs a recompile.
fn is_up_to_date(source: &Path, output_dir: &Path) -> bool {
    let Some(stem) = source.file_stem().and_then(|stem| stem.to_str()) else {
        return false;
    };
    let output = output_dir.join(format!("{stem}.rs"));
    if !output.exists() {
        return false;
    }
    FileUtils::is_newer(&output, source).unwrap_or(false)
}
