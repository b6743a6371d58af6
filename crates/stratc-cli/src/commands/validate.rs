//! Strategy validation command implementation

use crate::config::CliConfig;
use crate::diagnostics::{print_finding, print_finding_summary};
use crate::pipeline::Pipeline;
use crate::utils::file_utils::FileUtils;
use crate::{CliError, Result};
use clap::Args;
use console::style;
use std::fs;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Strategy to validate, the file stem under the strategies directory
    pub name: Option<String>,

    /// Validate every strategy in the strategies directory
    #[arg(long)]
    pub all: bool,

    /// Show findings with source context
    #[arg(long)]
    pub explain: bool,
}

/// Execute the validate command
pub fn validate_command(args: ValidateArgs, config: &CliConfig) -> Result<()> {
    let sources = select_sources(&args, config)?;
    let pipeline = Pipeline::new(config, false);

    let mut failed = 0usize;

    for path in &sources {
        let display = path.display().to_string();
        let source = fs::read_to_string(path)?;
        let report = pipeline.check_source(&source, Some(path));

        for finding in &report.diagnostics {
            if args.explain {
                print_finding(finding, &display, &source);
            } else {
                print_finding_summary(&display, finding);
            }
        }

        match &report.value {
            Some(meta) => {
                let warnings = report.warnings().count();
                if warnings > 0 {
                    println!(
                        "{} {} ({} warnings)",
                        style("✓").green(),
                        meta.name,
                        warnings
                    );
                } else {
                    println!("{} {}", style("✓").green(), meta.name);
                }
                if !meta.transpilable {
                    println!(
                        "  {} marked transpilable=False, compile will skip it",
                        style("note:").dim()
                    );
                }
            }
            None => {
                println!("{} {} failed validation", style("✗").red(), display);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(CliError::Compilation(format!(
            "{} of {} strategies failed validation",
            failed,
            sources.len()
        )));
    }
    Ok(())
}

fn select_sources(args: &ValidateArgs, config: &CliConfig) -> Result<Vec<PathBuf>> {
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
